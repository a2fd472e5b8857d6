//! Form-feed separated page text (as written by `pdftotext -layout`) turned
//! into positioned page lines.

use glance_core::pages::{PageLine, PageLines};

const FORM_FEED: char = '\u{c}';

pub fn looks_paginated(text: &str) -> bool {
    text.contains(FORM_FEED)
}

/// One entry per page. Line order gives the vertical position: line `n` of a
/// page with `h` lines sits at `n + 0.5` on a page of height `h`.
pub fn pages_from_text(text: &str) -> Vec<PageLines> {
    let mut raw_pages: Vec<&str> = text.split(FORM_FEED).collect();
    if raw_pages.len() > 1 && raw_pages.last().is_some_and(|page| page.trim().is_empty()) {
        raw_pages.pop();
    }

    raw_pages
        .into_iter()
        .enumerate()
        .map(|(page_index, page)| {
            let lines: Vec<&str> = page.lines().collect();
            let page_height = lines.len().max(1) as f32;
            PageLines {
                page_index,
                page_height,
                lines: lines
                    .iter()
                    .enumerate()
                    .map(|(row, line)| PageLine::new(line.trim(), row as f32 + 0.5))
                    .collect(),
            }
        })
        .collect()
}
