use alloc::{string::String, vec::Vec};

use super::{Fragment, Token};

/// Fold punctuation fragments into neighbouring words.
///
/// Punctuation after a word in the same run becomes its suffix; punctuation
/// with no preceding word in the run is held and prefixed to the next word,
/// even across a paragraph break. Punctuation that never finds a word is
/// dropped. Leading, trailing and repeated paragraph breaks are dropped too,
/// so the output is a fixed point of this function.
pub fn merge_fragments<'a, I>(fragments: I) -> Vec<Token>
where
    I: IntoIterator<Item = Fragment<'a>>,
{
    let mut tokens = Vec::new();
    let mut pending_prefix = String::new();
    let mut run_has_word = false;

    for fragment in fragments {
        match fragment {
            Fragment::Word(text) => {
                let mut word = core::mem::take(&mut pending_prefix);
                word.push_str(text);
                tokens.push(Token::Word(word));
                run_has_word = true;
            }
            Fragment::Punctuation(text) => match tokens.last_mut() {
                Some(Token::Word(previous)) if run_has_word => previous.push_str(text),
                _ => pending_prefix.push_str(text),
            },
            Fragment::ParagraphBreak => {
                run_has_word = false;
                if matches!(tokens.last(), Some(Token::Word(_))) {
                    tokens.push(Token::ParagraphBreak);
                }
            }
        }
    }

    if matches!(tokens.last(), Some(Token::ParagraphBreak)) {
        tokens.pop();
    }

    tokens
}

/// Re-run the merge over a stored stream.
///
/// Streams written by an older merge rule may still hold punctuation-only
/// words. Returns the healed stream, or `None` when the input is already
/// merged.
pub fn remerge(tokens: &[Token]) -> Option<Vec<Token>> {
    let fragments = tokens.iter().map(|token| match token {
        Token::Word(text) => Fragment::classify(text),
        Token::ParagraphBreak => Fragment::ParagraphBreak,
    });
    let merged = merge_fragments(fragments);

    if merged.as_slice() == tokens {
        None
    } else {
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heals_standalone_punctuation_words() {
        let legacy = [
            Token::word("Hello"),
            Token::word(","),
            Token::word("world"),
            Token::ParagraphBreak,
            Token::ParagraphBreak,
            Token::word("("),
            Token::word("aside"),
            Token::word(")"),
            Token::ParagraphBreak,
        ];

        let healed = remerge(&legacy).unwrap();
        assert_eq!(
            healed,
            [
                Token::word("Hello,"),
                Token::word("world"),
                Token::ParagraphBreak,
                Token::word("(aside)"),
            ]
        );
        assert_eq!(remerge(&healed), None);
    }

    #[test]
    fn punctuation_only_stream_heals_to_empty() {
        let legacy = [Token::word("—"), Token::ParagraphBreak, Token::word("…")];
        assert_eq!(remerge(&legacy), Some(Vec::new()));
    }
}
