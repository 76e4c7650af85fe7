//! Headless driver for the viewport engine: opens a document, waits for
//! the first render pass, optionally runs a search, and reports what the
//! engine saw. Useful for scripting and for exercising the engine without
//! a windowing host.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use folio_core::{ViewerCommand, ViewerEngine, ViewerEvent};
use folio_render::PdfiumRenderFactory;
use serde::Serialize;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

const RENDER_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "headless driver for the folio document viewport engine"
)]
struct Args {
    /// Path to the document to open
    file: PathBuf,

    /// Page to jump to after opening (1-based)
    #[arg(short = 'p', long = "page")]
    page: Option<usize>,

    /// Zoom level to apply before reporting
    #[arg(short = 'z', long = "zoom")]
    zoom: Option<f32>,

    /// Search the document text and report every match
    #[arg(short = 's', long = "search")]
    search: Option<String>,

    /// Dump the glyph text of every page
    #[arg(long = "dump-text")]
    dump_text: bool,

    /// Emit the report as JSON
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    path: PathBuf,
    page_count: usize,
    current_page: usize,
    zoom: f32,
    match_summary: Option<String>,
    matches: Vec<MatchReport>,
    pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
struct MatchReport {
    page: usize,
    start: usize,
    end: usize,
}

#[derive(Debug, Serialize)]
struct PageReport {
    index: usize,
    width: f32,
    height: f32,
    rendered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("dev", "folio", "folio")
        .context("failed to resolve platform directories")?;
    let _guard = init_logging(&project_dirs)?;

    let factory = PdfiumRenderFactory::new().context("failed to initialize the pdf backend")?;
    let mut engine = ViewerEngine::new(1.0);

    engine.open_with(&factory, &args.file).await?;
    let mut events = wait_for_render(&mut engine)?;

    if let Some(page) = args.page {
        let index = page
            .checked_sub(1)
            .with_context(|| format!("page numbers start at 1, got {page}"))?;
        engine.apply(ViewerCommand::GoToPage { page: index }, Instant::now())?;
    }
    if let Some(level) = args.zoom {
        engine.apply(ViewerCommand::SetZoom { level }, Instant::now())?;
    }

    let (match_summary, matches) = match &args.search {
        Some(query) => {
            engine.apply(
                ViewerCommand::Search {
                    query: query.clone(),
                },
                Instant::now(),
            )?;
            let matches = (0..engine.page_count())
                .flat_map(|page| engine.search_highlights(page))
                .map(|(m, _)| MatchReport {
                    page: m.page,
                    start: m.start,
                    end: m.end,
                })
                .collect();
            (Some(engine.search_summary()), matches)
        }
        None => (None, Vec::new()),
    };
    events.extend(engine.take_events());

    let pages = (0..engine.page_count())
        .map(|index| {
            let info = engine.page_info(index);
            PageReport {
                index,
                width: info.map_or(0.0, |i| i.width),
                height: info.map_or(0.0, |i| i.height),
                rendered: engine.rendered_page(index).is_some(),
                text: args.dump_text.then(|| engine.page_text(index)),
            }
        })
        .collect();

    let report = Report {
        path: args.file.clone(),
        page_count: engine.page_count(),
        current_page: engine.current_page(),
        zoom: engine.zoom_level(),
        match_summary,
        matches,
        pages,
    };

    for event in &events {
        debug!(?event, "engine event");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &events);
    }

    Ok(())
}

fn print_report(report: &Report, events: &[ViewerEvent]) {
    println!(
        "{}: {} pages, zoom {:.2}, current page {}",
        report.path.display(),
        report.page_count,
        report.zoom,
        report.current_page + 1
    );
    for page in &report.pages {
        println!(
            "  page {:>3}: {:.1} x {:.1} pts{}",
            page.index + 1,
            page.width,
            page.height,
            if page.rendered { "" } else { " (not rendered)" }
        );
        if let Some(text) = &page.text {
            for line in text.lines() {
                println!("    {line}");
            }
        }
    }
    if let Some(summary) = &report.match_summary {
        println!("matches ({summary}):");
        for m in &report.matches {
            println!("  page {} glyphs {}..{}", m.page + 1, m.start, m.end);
        }
    }
    for event in events {
        if let ViewerEvent::DocumentFailed { path, cause } = event {
            println!("failed to open {}: {cause}", path.display());
        }
    }
}

/// Pumps the engine until the initial render pass completes.
fn wait_for_render(engine: &mut ViewerEngine) -> Result<Vec<ViewerEvent>> {
    let deadline = Instant::now() + RENDER_WAIT;
    let mut events = Vec::new();
    loop {
        engine.pump(Instant::now());
        events.extend(engine.take_events());
        if events
            .iter()
            .any(|e| matches!(e, ViewerEvent::RenderingComplete { .. }))
        {
            return Ok(events);
        }
        if Instant::now() > deadline {
            bail!("timed out waiting for the initial render pass");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "folio.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
