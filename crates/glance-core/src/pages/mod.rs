//! Paginated sources: per-page line data in, cleaned token stream and page
//! ranges out.

mod filter;
mod segmenter;

use alloc::{string::String, vec::Vec};

pub use segmenter::{CleanPage, RemovedLines, SegmentOptions, SegmentedDocument, segment_pages};

/// One line as positioned by the text extractor.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLine {
    pub text: String,
    /// Distance from the top edge of the page, in the same unit as
    /// [`PageLines::page_height`].
    pub y: f32,
}

impl PageLine {
    pub fn new(text: impl Into<String>, y: f32) -> Self {
        Self {
            text: text.into(),
            y,
        }
    }
}

/// Raw extractor output for one page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLines {
    /// Zero-based page index in the source.
    pub page_index: usize,
    pub page_height: f32,
    pub lines: Vec<PageLine>,
}

/// Span of word indices that came from one source page.
///
/// A page that kept no words has `word_count == 0` and `start == end`, both
/// equal to the next page's first word index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRange {
    /// 1-based page number.
    pub page: u32,
    pub start_word_index: usize,
    pub end_word_index: usize,
    pub word_count: usize,
}

impl PageRange {
    pub const fn new(page: u32, start_word_index: usize, word_count: usize) -> Self {
        let end_word_index = if word_count == 0 {
            start_word_index
        } else {
            start_word_index + word_count - 1
        };
        Self {
            page,
            start_word_index,
            end_word_index,
            word_count,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    pub const fn contains(&self, word_index: usize) -> bool {
        !self.is_empty()
            && word_index >= self.start_word_index
            && word_index <= self.end_word_index
    }
}

/// Page holding `word_index`.
///
/// Binary search over the sorted ranges. Zero-width ranges never match: a word
/// sitting at an empty page's start belongs to the next non-empty page.
/// Indices past the end clamp to the last word.
pub fn page_for_word(ranges: &[PageRange], word_index: usize) -> Option<u32> {
    let last_word = ranges.iter().rev().find(|range| !range.is_empty())?.end_word_index;
    let target = word_index.min(last_word);

    let at = ranges.partition_point(|range| {
        if range.is_empty() {
            range.start_word_index <= target
        } else {
            range.end_word_index < target
        }
    });
    ranges.get(at).map(|range| range.page)
}

/// Recorded first word of a page.
pub fn start_word_for_page(ranges: &[PageRange], page: u32) -> Option<usize> {
    ranges
        .binary_search_by_key(&page, |range| range.page)
        .ok()
        .map(|at| ranges[at].start_word_index)
}

/// Whether the ranges are sorted and cover `[0, total_words - 1]` exactly once.
pub fn is_partition(ranges: &[PageRange], total_words: usize) -> bool {
    let mut cursor = 0usize;
    let mut previous_page = 0u32;

    for range in ranges {
        if range.page <= previous_page || range.start_word_index != cursor {
            return false;
        }
        if range.is_empty() {
            if range.end_word_index != range.start_word_index {
                return false;
            }
        } else if range.end_word_index + 1 != range.start_word_index + range.word_count {
            return false;
        }
        cursor += range.word_count;
        previous_page = range.page;
    }

    cursor == total_words
}

/// Rebuild contiguous ranges from per-page word counts.
pub fn ranges_from_counts<I>(counts: I) -> Vec<PageRange>
where
    I: IntoIterator<Item = (u32, usize)>,
{
    let mut cursor = 0usize;
    counts
        .into_iter()
        .map(|(page, word_count)| {
            let range = PageRange::new(page, cursor, word_count);
            cursor += word_count;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_ranges() -> [PageRange; 3] {
        [
            PageRange::new(1, 0, 5),
            PageRange::new(2, 5, 5),
            PageRange::new(3, 10, 3),
        ]
    }

    #[test]
    fn looks_up_literal_ranges() {
        let ranges = literal_ranges();
        assert_eq!(ranges[2].end_word_index, 12);
        assert_eq!(page_for_word(&ranges, 0), Some(1));
        assert_eq!(page_for_word(&ranges, 4), Some(1));
        assert_eq!(page_for_word(&ranges, 5), Some(2));
        assert_eq!(page_for_word(&ranges, 9), Some(2));
        assert_eq!(page_for_word(&ranges, 12), Some(3));
        assert_eq!(page_for_word(&ranges, 400), Some(3));
        assert!(is_partition(&ranges, 13));
    }

    #[test]
    fn zero_width_pages_keep_search_correct() {
        // page 2 stripped entirely, page 5 too (trailing)
        let ranges = ranges_from_counts([(1, 3), (2, 0), (3, 2), (4, 4), (5, 0)]);
        assert_eq!(ranges[1], PageRange::new(2, 3, 0));
        assert_eq!(ranges[1].start_word_index, ranges[1].end_word_index);
        assert!(is_partition(&ranges, 9));

        assert_eq!(page_for_word(&ranges, 2), Some(1));
        assert_eq!(page_for_word(&ranges, 3), Some(3));
        assert_eq!(page_for_word(&ranges, 4), Some(3));
        assert_eq!(page_for_word(&ranges, 5), Some(4));
        assert_eq!(page_for_word(&ranges, 8), Some(4));
        assert_eq!(page_for_word(&ranges, 9), Some(4));

        assert_eq!(start_word_for_page(&ranges, 2), Some(3));
        assert_eq!(start_word_for_page(&ranges, 5), Some(9));
        assert_eq!(start_word_for_page(&ranges, 6), None);
    }

    #[test]
    fn leading_empty_page_is_skipped() {
        let ranges = ranges_from_counts([(1, 0), (2, 2)]);
        assert_eq!(page_for_word(&ranges, 0), Some(2));
        assert_eq!(page_for_word(&ranges, 1), Some(2));
    }

    #[test]
    fn all_empty_has_no_page() {
        let ranges = ranges_from_counts([(1, 0), (2, 0)]);
        assert_eq!(page_for_word(&ranges, 0), None);
        assert!(is_partition(&ranges, 0));
    }

    #[test]
    fn partition_check_rejects_gaps_and_overlaps() {
        let gap = [PageRange::new(1, 0, 2), PageRange::new(2, 3, 2)];
        assert!(!is_partition(&gap, 5));
        let overlap = [PageRange::new(1, 0, 3), PageRange::new(2, 2, 2)];
        assert!(!is_partition(&overlap, 4));
    }
}
