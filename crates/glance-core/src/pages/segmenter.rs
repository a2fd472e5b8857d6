use alloc::{string::String, vec::Vec};

use log::debug;

use super::{
    PageLines, PageRange,
    filter::{LineSignature, PhraseMatcher, RepeatTracker, is_page_number, is_protected, matches_any},
};
use crate::{
    settings::ReaderSettings,
    text::{Token, count_words, tokenize},
};

pub const DEFAULT_MARGIN_PERCENT: u8 = 15;
pub const DEFAULT_MIN_PAGE_SHARE_PERCENT: u8 = 35;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SegmentOptions {
    pub strip_headers_footers: bool,
    /// Height of the top and bottom margin bands, in percent of page height.
    pub margin_percent: u8,
    /// Share of pages a margin line must repeat on to count as running text.
    pub min_page_share_percent: u8,
    pub ignore_phrases: Vec<String>,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            strip_headers_footers: true,
            margin_percent: DEFAULT_MARGIN_PERCENT,
            min_page_share_percent: DEFAULT_MIN_PAGE_SHARE_PERCENT,
            ignore_phrases: Vec::new(),
        }
    }
}

impl SegmentOptions {
    pub fn from_settings(settings: &ReaderSettings) -> Self {
        Self {
            strip_headers_footers: settings.strip_headers_footers,
            ignore_phrases: settings.ignore_phrases().map(String::from).collect(),
            ..Self::default()
        }
    }
}

/// Counts of lines dropped from one page, by rule.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RemovedLines {
    pub repeated: usize,
    pub page_numbers: usize,
    pub phrases: usize,
}

impl RemovedLines {
    pub const fn total(&self) -> usize {
        self.repeated + self.page_numbers + self.phrases
    }
}

/// Cleaned text of one source page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CleanPage {
    pub page: u32,
    pub text: String,
    pub removed: RemovedLines,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SegmentedDocument {
    pub tokens: Vec<Token>,
    pub page_ranges: Vec<PageRange>,
    pub pages: Vec<CleanPage>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Verdict {
    Keep,
    Repeated,
    PageNumber,
    Phrase,
}

/// Strip running heads/feet and folios, tokenize each page and stitch the
/// global stream with one [`PageRange`] per source page.
pub fn segment_pages(pages: &[PageLines], options: &SegmentOptions) -> SegmentedDocument {
    let mut ordered: Vec<&PageLines> = pages.iter().collect();
    ordered.sort_by_key(|page| page.page_index);

    let mut tracker = RepeatTracker::default();
    if options.strip_headers_footers {
        for (ordinal, page) in ordered.iter().enumerate() {
            for line in &page.lines {
                if in_margin_band(line.y, page.page_height, options.margin_percent)
                    && !is_protected(&line.text)
                {
                    tracker.observe(ordinal, &LineSignature::of(&line.text));
                }
            }
        }
    }
    let removable = tracker.removable(ordered.len(), options.min_page_share_percent);
    let phrases = PhraseMatcher::new(options.ignore_phrases.iter().map(String::as_str));

    let mut out = SegmentedDocument::default();
    let mut word_cursor = 0usize;

    for page in ordered {
        let mut lines: Vec<_> = page.lines.iter().collect();
        lines.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut removed = RemovedLines::default();
        let mut text = String::new();

        for line in lines {
            // Blank lines keep paragraph structure inside a page.
            if line.text.trim().is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                continue;
            }

            let signature = LineSignature::of(&line.text);
            let verdict = if phrases.matches(&signature) {
                Verdict::Phrase
            } else if options.strip_headers_footers
                && in_margin_band(line.y, page.page_height, options.margin_percent)
                && !is_protected(&line.text)
            {
                if is_page_number(&line.text) {
                    Verdict::PageNumber
                } else if matches_any(&signature, &removable) {
                    Verdict::Repeated
                } else {
                    Verdict::Keep
                }
            } else {
                Verdict::Keep
            };

            match verdict {
                Verdict::Keep => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&line.text);
                }
                Verdict::Repeated => removed.repeated += 1,
                Verdict::PageNumber => removed.page_numbers += 1,
                Verdict::Phrase => removed.phrases += 1,
            }
        }

        let page_number = (page.page_index + 1) as u32;
        let tokens = tokenize(&text);
        let word_count = count_words(&tokens);
        let range = PageRange::new(page_number, word_cursor, word_count);
        word_cursor += word_count;

        if removed.total() > 0 {
            debug!(
                "segment: page={} words={} removed_repeated={} removed_folios={} removed_phrases={}",
                page_number, word_count, removed.repeated, removed.page_numbers, removed.phrases
            );
        }

        out.tokens.extend(tokens);
        out.page_ranges.push(range);
        out.pages.push(CleanPage {
            page: page_number,
            text,
            removed,
        });
    }

    out
}

fn in_margin_band(y: f32, page_height: f32, margin_percent: u8) -> bool {
    if !(page_height > 0.0) || !y.is_finite() {
        return false;
    }
    let band = page_height * margin_percent as f32 / 100.0;
    y <= band || y >= page_height - band
}
