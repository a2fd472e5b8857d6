use alloc::string::String;

/// Canonical text layout fed to the fragment splitter.
///
/// Line endings become `\n`, trailing whitespace is trimmed per line, words
/// wrapped with a hyphen across a line break are joined, and any run of blank
/// lines collapses into a single blank line (the paragraph separator).
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_lines = 0usize;

    for line in unified.split('\n').map(str::trim_end) {
        if line.trim_start().is_empty() {
            blank_lines += 1;
            continue;
        }

        if out.is_empty() {
            out.push_str(line);
        } else if blank_lines > 0 {
            out.push_str("\n\n");
            out.push_str(line);
        } else if ends_with_wrap_hyphen(&out) && starts_with_letter(line) {
            out.pop();
            out.push_str(line.trim_start());
        } else {
            out.push('\n');
            out.push_str(line);
        }
        blank_lines = 0;
    }

    out
}

fn ends_with_wrap_hyphen(text: &str) -> bool {
    let mut tail = text.chars().rev();
    matches!(
        (tail.next(), tail.next()),
        (Some('-'), Some(before)) if before.is_alphanumeric()
    )
}

fn starts_with_letter(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings_and_trims() {
        assert_eq!(normalize("a  \r\nb\t\rc   "), "a\nb\nc");
    }

    #[test]
    fn repairs_hyphen_wraps() {
        assert_eq!(normalize("extra-\n  ordinary day"), "extraordinary day");
        assert_eq!(normalize("pages 10-\n12"), "pages 10-\n12");
        assert_eq!(normalize("dash -\nthen"), "dash -\nthen");
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(normalize("\n\none\n\n\n\n two\n\n"), "one\n\n two");
        assert_eq!(normalize("one\n   \ntwo"), "one\n\ntwo");
    }

    #[test]
    fn hyphen_is_kept_across_paragraphs() {
        assert_eq!(normalize("co-\n\nop"), "co-\n\nop");
    }
}
