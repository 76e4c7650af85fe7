//! Print pagination: one document page per output sheet, scaled to fit.

use crate::backend::RenderedBitmap;

/// Printable area of one output sheet, in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintArea {
    pub width: f32,
    pub height: f32,
}

/// Placement of one document page on its sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrintPage {
    /// The page had no bitmap (rasterization failed); the sheet is blank.
    Missing,
    Placed {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        /// Uniform bitmap-to-sheet scale, never upsampling past fit.
        scale: f32,
    },
}

/// Lays out one sheet per bitmap: aspect-preserving fit, centered both
/// ways. Degenerate bitmaps and degenerate areas produce [`PrintPage::Missing`].
pub fn paginate(bitmaps: &[Option<RenderedBitmap>], area: PrintArea) -> Vec<PrintPage> {
    bitmaps
        .iter()
        .map(|slot| place(slot.as_ref(), area))
        .collect()
}

fn place(bitmap: Option<&RenderedBitmap>, area: PrintArea) -> PrintPage {
    let Some(bitmap) = bitmap else {
        return PrintPage::Missing;
    };
    if bitmap.width == 0 || bitmap.height == 0 || area.width <= 0.0 || area.height <= 0.0 {
        return PrintPage::Missing;
    }
    let bw = bitmap.width as f32;
    let bh = bitmap.height as f32;
    let scale = (area.width / bw).min(area.height / bh);
    let width = bw * scale;
    let height = bh * scale;
    PrintPage::Placed {
        x: (area.width - width) / 2.0,
        y: (area.height - height) / 2.0,
        width,
        height,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(width: u32, height: u32) -> RenderedBitmap {
        RenderedBitmap {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    #[test]
    fn wide_page_fits_by_width_and_centers_vertically() {
        let pages = paginate(
            &[Some(bitmap(200, 100))],
            PrintArea {
                width: 100.0,
                height: 100.0,
            },
        );
        assert_eq!(
            pages[0],
            PrintPage::Placed {
                x: 0.0,
                y: 25.0,
                width: 100.0,
                height: 50.0,
                scale: 0.5,
            }
        );
    }

    #[test]
    fn tall_page_fits_by_height_and_centers_horizontally() {
        let pages = paginate(
            &[Some(bitmap(100, 200))],
            PrintArea {
                width: 100.0,
                height: 100.0,
            },
        );
        assert_eq!(
            pages[0],
            PrintPage::Placed {
                x: 25.0,
                y: 0.0,
                width: 50.0,
                height: 100.0,
                scale: 0.5,
            }
        );
    }

    #[test]
    fn missing_and_degenerate_bitmaps_yield_blank_sheets() {
        let area = PrintArea {
            width: 100.0,
            height: 100.0,
        };
        let pages = paginate(&[None, Some(bitmap(0, 50)), Some(bitmap(50, 50))], area);
        assert_eq!(pages[0], PrintPage::Missing);
        assert_eq!(pages[1], PrintPage::Missing);
        assert!(matches!(pages[2], PrintPage::Placed { .. }));
    }

    #[test]
    fn one_sheet_per_document_page() {
        let area = PrintArea {
            width: 100.0,
            height: 100.0,
        };
        let pages = paginate(&[Some(bitmap(10, 10)), Some(bitmap(10, 10))], area);
        assert_eq!(pages.len(), 2);
    }
}
