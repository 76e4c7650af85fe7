//! Case-insensitive substring search over the per-page glyph text.
//!
//! Matching works on one lowercased character per glyph so a match's
//! `start..end` range indexes directly into the page's glyph slice and can
//! be highlighted without any re-mapping. Overlapping occurrences are all
//! reported: the scan resumes one position after each match start.

use tracing::debug;

/// One occurrence of the query on a page, as a glyph index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub page: usize,
    /// Index of the first matched glyph on the page.
    pub start: usize,
    /// One past the last matched glyph.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    NoMatches,
    HasMatches,
}

/// Holds the match list for the most recent query and the cursor into it.
pub struct SearchEngine {
    matches: Vec<SearchMatch>,
    current: Option<usize>,
    last_query: String,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
            current: None,
            last_query: String::new(),
        }
    }

    pub fn state(&self) -> SearchState {
        if self.last_query.is_empty() {
            SearchState::Idle
        } else if self.matches.is_empty() {
            SearchState::NoMatches
        } else {
            SearchState::HasMatches
        }
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.current.map(|i| self.matches[i])
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// "current/total" counter for a status bar, e.g. "3/17".
    pub fn summary(&self) -> String {
        match self.current {
            Some(i) => format!("{}/{}", i + 1, self.matches.len()),
            None => format!("0/{}", self.matches.len()),
        }
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.current = None;
        self.last_query.clear();
    }

    /// Runs `query` over every page, in page order. `page_chars` yields the
    /// page's glyph text, one `char` per glyph, in backend order. The
    /// current match starts at the first hit on or after `current_page`,
    /// wrapping to the first hit overall.
    pub fn run<F>(&mut self, query: &str, current_page: usize, page_count: usize, mut page_chars: F)
    where
        F: FnMut(usize) -> Vec<char>,
    {
        self.clear();
        let needle: Vec<char> = query
            .chars()
            .map(|c| c.to_lowercase().next().unwrap_or(c))
            .collect();
        if needle.is_empty() {
            return;
        }
        self.last_query = query.to_string();

        for page in 0..page_count {
            let haystack: Vec<char> = page_chars(page)
                .into_iter()
                .map(|c| c.to_lowercase().next().unwrap_or(c))
                .collect();
            if haystack.len() < needle.len() {
                continue;
            }
            let mut start = 0;
            while start + needle.len() <= haystack.len() {
                if haystack[start..start + needle.len()] == needle[..] {
                    self.matches.push(SearchMatch {
                        page,
                        start,
                        end: start + needle.len(),
                    });
                }
                start += 1;
            }
        }

        if !self.matches.is_empty() {
            let from_here = self
                .matches
                .iter()
                .position(|m| m.page >= current_page)
                .unwrap_or(0);
            self.current = Some(from_here);
        }
        debug!(
            query,
            matches = self.matches.len(),
            "search pass complete"
        );
    }

    /// Advances to the next match, wrapping past the end.
    pub fn next(&mut self) -> Option<SearchMatch> {
        let i = self.current?;
        let next = (i + 1) % self.matches.len();
        self.current = Some(next);
        Some(self.matches[next])
    }

    /// Steps back to the previous match, wrapping past the start.
    pub fn previous(&mut self) -> Option<SearchMatch> {
        let i = self.current?;
        let prev = if i == 0 { self.matches.len() - 1 } else { i - 1 };
        self.current = Some(prev);
        Some(self.matches[prev])
    }

    /// Glyph ranges to highlight on `page`, with the current match flagged.
    pub fn highlights_on_page(&self, page: usize) -> Vec<(SearchMatch, bool)> {
        let current = self.current();
        self.matches
            .iter()
            .filter(|m| m.page == page)
            .map(|m| (*m, current == Some(*m)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_page_doc(page: usize) -> Vec<char> {
        match page {
            0 => "helloworld".chars().collect(),
            1 => "worldwide".chars().collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn finds_matches_across_pages_in_order() {
        let mut engine = SearchEngine::new();
        engine.run("world", 0, 2, two_page_doc);

        assert_eq!(
            engine.matches(),
            &[
                SearchMatch { page: 0, start: 5, end: 10 },
                SearchMatch { page: 1, start: 0, end: 5 },
            ]
        );
        assert_eq!(engine.current(), Some(SearchMatch { page: 0, start: 5, end: 10 }));
        assert_eq!(engine.state(), SearchState::HasMatches);
    }

    #[test]
    fn initial_current_prefers_match_on_or_after_current_page() {
        let mut engine = SearchEngine::new();
        engine.run("world", 1, 2, two_page_doc);
        assert_eq!(engine.current(), Some(SearchMatch { page: 1, start: 0, end: 5 }));
        assert_eq!(engine.summary(), "2/2");
    }

    #[test]
    fn initial_current_wraps_when_no_later_page_matches() {
        let mut engine = SearchEngine::new();
        engine.run("hello", 1, 2, two_page_doc);
        assert_eq!(engine.current(), Some(SearchMatch { page: 0, start: 0, end: 5 }));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut engine = SearchEngine::new();
        engine.run("WORLD", 0, 2, two_page_doc);
        assert_eq!(engine.matches().len(), 2);
    }

    #[test]
    fn overlapping_occurrences_are_all_reported() {
        let mut engine = SearchEngine::new();
        engine.run("aa", 0, 1, |_| "aaaa".chars().collect());
        assert_eq!(engine.matches().len(), 3);
    }

    #[test]
    fn next_and_previous_wrap_around() {
        let mut engine = SearchEngine::new();
        engine.run("world", 0, 2, two_page_doc);

        let count = engine.matches().len();
        let start = engine.current();
        for _ in 0..count {
            engine.next();
        }
        assert_eq!(engine.current(), start);

        let prev = engine.previous();
        assert_eq!(prev, Some(SearchMatch { page: 1, start: 0, end: 5 }));
        engine.next();
        assert_eq!(engine.current(), start);
    }

    #[test]
    fn empty_query_clears_to_idle() {
        let mut engine = SearchEngine::new();
        engine.run("world", 0, 2, two_page_doc);
        engine.run("", 0, 2, two_page_doc);

        assert!(engine.matches().is_empty());
        assert_eq!(engine.current(), None);
        assert_eq!(engine.state(), SearchState::Idle);
    }

    #[test]
    fn no_hits_reports_no_matches_state() {
        let mut engine = SearchEngine::new();
        engine.run("zebra", 0, 2, two_page_doc);
        assert_eq!(engine.state(), SearchState::NoMatches);
        assert_eq!(engine.next(), None);
        assert_eq!(engine.summary(), "0/0");
    }

    #[test]
    fn highlights_flag_the_current_match() {
        let mut engine = SearchEngine::new();
        engine.run("world", 0, 2, two_page_doc);

        let page0 = engine.highlights_on_page(0);
        assert_eq!(page0.len(), 1);
        assert!(page0[0].1);

        let page1 = engine.highlights_on_page(1);
        assert_eq!(page1.len(), 1);
        assert!(!page1[0].1);
    }
}
