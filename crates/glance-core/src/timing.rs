//! Per-step timing: base cadence from wpm plus punctuation pauses.

use crate::text::Token;

pub const MIN_WPM: u16 = 150;
pub const MAX_WPM: u16 = 1_200;
pub const DEFAULT_WPM: u16 = 300;

/// Pause intensity is a percentage; 100 means factors apply unscaled.
pub const MAX_PAUSE_INTENSITY: u16 = 200;
pub const DEFAULT_PAUSE_INTENSITY: u16 = 80;

const PARAGRAPH_PAUSE_PERMILLE: u64 = 1_200;
const HARD_PAUSE_PERMILLE: u64 = 800;
const SOFT_PAUSE_PERMILLE: u64 = 350;
const MAX_EXTRA_BASE_MULTIPLE: u32 = 2;

/// Closing characters skipped before looking at a word's final punctuation.
const WRAPPER_CHARS: [char; 10] = [')', ']', '}', '"', '\'', '”', '’', '»', '›', '*'];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PauseDecision {
    pub extra_delay_ms: u32,
    pub counts_as_pause: bool,
}

impl PauseDecision {
    pub const NONE: Self = Self {
        extra_delay_ms: 0,
        counts_as_pause: false,
    };
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Punctuation {
    /// Sentence end: `. ! ? …`
    Hard,
    /// Clause break: `, ; :`
    Soft,
    None,
}

/// Milliseconds per word at the given rate, after clamping the rate.
pub fn base_delay_ms(wpm: u16) -> u32 {
    60_000 / wpm.clamp(MIN_WPM, MAX_WPM) as u32
}

/// Classify the punctuation a word ends with, looking through closing
/// brackets and quotes (`end.”` is a sentence end).
pub fn trailing_punctuation(word: &str) -> Punctuation {
    let stripped = word.trim_end_matches(WRAPPER_CHARS);
    match stripped.chars().next_back() {
        Some('.' | '!' | '?' | '…') => Punctuation::Hard,
        Some(',' | ';' | ':') => Punctuation::Soft,
        _ => Punctuation::None,
    }
}

pub fn ends_sentence(token: &Token) -> bool {
    token
        .as_word()
        .is_some_and(|word| trailing_punctuation(word) == Punctuation::Hard)
}

/// Extra delay to hold `token` on screen beyond the base cadence.
pub fn pause_for(
    token: &Token,
    base_delay_ms: u32,
    pause_intensity: u16,
    auto_pause: bool,
) -> PauseDecision {
    if !auto_pause {
        return PauseDecision::NONE;
    }

    let permille = match token {
        Token::ParagraphBreak => PARAGRAPH_PAUSE_PERMILLE,
        Token::Word(word) => match trailing_punctuation(word) {
            Punctuation::Hard => HARD_PAUSE_PERMILLE,
            Punctuation::Soft => SOFT_PAUSE_PERMILLE,
            Punctuation::None => return PauseDecision::NONE,
        },
    };

    let intensity = pause_intensity.min(MAX_PAUSE_INTENSITY) as u64;
    let scaled = base_delay_ms as u64 * permille * intensity / 100_000;
    let cap = base_delay_ms.saturating_mul(MAX_EXTRA_BASE_MULTIPLE);

    PauseDecision {
        extra_delay_ms: (scaled.min(cap as u64)) as u32,
        counts_as_pause: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_delay_clamps_rate() {
        assert_eq!(base_delay_ms(300), 200);
        assert_eq!(base_delay_ms(10), 400);
        assert_eq!(base_delay_ms(5_000), 50);
    }

    #[test]
    fn hard_punctuation_at_default_intensity() {
        let decision = pause_for(&Token::word("end."), base_delay_ms(300), 80, true);
        assert_eq!(
            decision,
            PauseDecision {
                extra_delay_ms: 128,
                counts_as_pause: true,
            }
        );
    }

    #[test]
    fn soft_and_paragraph_factors() {
        let base = base_delay_ms(300);
        assert_eq!(pause_for(&Token::word("and,"), base, 100, true).extra_delay_ms, 70);
        assert_eq!(pause_for(&Token::ParagraphBreak, base, 100, true).extra_delay_ms, 240);
        assert_eq!(pause_for(&Token::word("plain"), base, 100, true), PauseDecision::NONE);
    }

    #[test]
    fn extra_is_capped_at_twice_base() {
        let base = base_delay_ms(300);
        let decision = pause_for(&Token::ParagraphBreak, base, 200, true);
        assert_eq!(decision.extra_delay_ms, 400);
        assert!(decision.counts_as_pause);
    }

    #[test]
    fn wrappers_are_looked_through() {
        assert_eq!(trailing_punctuation("said.”"), Punctuation::Hard);
        assert_eq!(trailing_punctuation("(aside),"), Punctuation::Soft);
        assert_eq!(trailing_punctuation("wait…)"), Punctuation::Hard);
        assert_eq!(trailing_punctuation("(aside)"), Punctuation::None);
    }

    #[test]
    fn auto_pause_off_never_delays() {
        for token in [
            Token::word("end."),
            Token::word("list,"),
            Token::word("word"),
            Token::ParagraphBreak,
        ] {
            assert_eq!(pause_for(&token, 200, 200, false), PauseDecision::NONE);
        }
    }

    #[test]
    fn zero_intensity_counts_but_adds_nothing() {
        let decision = pause_for(&Token::word("end!"), 200, 0, true);
        assert_eq!(decision.extra_delay_ms, 0);
        assert!(decision.counts_as_pause);
    }
}
