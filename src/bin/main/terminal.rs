//! Line-oriented terminal front end: typed commands in, engine events out.

use glance_core::{
    input::ReaderCommand,
    render::{EngineEvent, PlaybackState, RenderEvent},
    settings::ReaderSettings,
};

/// Column the pivot character is aligned on.
const PIVOT_COLUMN: usize = 24;

pub const HELP: &str = "\
commands:
  <enter> | p        play / pause
  b [n] | f [n]      back / forward n words (default 1)
  [ | ]              previous / next sentence
  s <word>           scrub to word index
  g <page>           go to page
  m [note]           bookmark current word
  j <slot>           jump to bookmark
  x <word>           remove bookmark at word index
  w <wpm>            set reading speed
  c <1-4>            set chunk size
  r                  stop and reset session
  i                  session info
  q                  quit";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    Command(ReaderCommand),
    Info,
    Help,
    Quit,
}

/// Parse one typed line. `settings` is the base for speed and chunk edits.
pub fn parse_line(line: &str, settings: &ReaderSettings) -> Result<Input, String> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    let command = match head {
        "" | "p" => ReaderCommand::TogglePlay,
        "b" => ReaderCommand::Step(-count_arg(rest)?),
        "f" => ReaderCommand::Step(count_arg(rest)?),
        "[" => ReaderCommand::SentenceBack,
        "]" => ReaderCommand::SentenceForward,
        "s" => ReaderCommand::Scrub(number_arg(rest, "word index")?),
        "g" => ReaderCommand::JumpToPage(number_arg(rest, "page")?),
        "m" => ReaderCommand::AddBookmark {
            note: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "j" => ReaderCommand::JumpToBookmark(number_arg(rest, "bookmark slot")?),
        "x" => ReaderCommand::RemoveBookmark {
            word_index: number_arg(rest, "word index")?,
        },
        "w" => ReaderCommand::UpdateSettings(ReaderSettings {
            wpm: number_arg(rest, "wpm")?,
            ..settings.clone()
        }),
        "c" => ReaderCommand::UpdateSettings(ReaderSettings {
            chunk_size: number_arg(rest, "chunk size")?,
            ..settings.clone()
        }),
        "r" => ReaderCommand::Reset,
        "i" => return Ok(Input::Info),
        "h" | "?" => return Ok(Input::Help),
        "q" => return Ok(Input::Quit),
        other => return Err(format!("unknown command {other:?}, type ? for help")),
    };
    Ok(Input::Command(command))
}

/// Word count for `b`/`f`: a positive number that still fits a signed step.
fn count_arg(rest: &str) -> Result<i32, String> {
    if rest.is_empty() {
        return Ok(1);
    }
    let count: u32 = number_arg(rest, "count")?;
    i32::try_from(count).map_err(|_| format!("count {count} is too large"))
}

fn number_arg<T: std::str::FromStr>(rest: &str, what: &str) -> Result<T, String> {
    rest.parse()
        .map_err(|_| format!("expected a number for {what}, got {rest:?}"))
}

/// Terminal line for an engine event, if it has one.
pub fn describe(event: &EngineEvent) -> Option<String> {
    let line = match event {
        EngineEvent::Render(RenderEvent::Word { parts, .. }) => {
            let left_width = parts.left.chars().count();
            let pad = PIVOT_COLUMN.saturating_sub(left_width);
            format!(
                "{:pad$}{}[{}]{}",
                "", parts.left, parts.pivot, parts.right
            )
        }
        EngineEvent::Render(RenderEvent::Glyph { glyph, label }) => {
            format!("{:pad$}{glyph}  ({label})", "", pad = PIVOT_COLUMN)
        }
        EngineEvent::Progress(_) => return None,
        EngineEvent::PageSync(page) => format!("-- page {page} --"),
        EngineEvent::State(state) => match state {
            PlaybackState::Idle => String::from("[stopped]"),
            PlaybackState::Playing => String::from("[playing]"),
            PlaybackState::Paused => String::from("[paused]"),
        },
        EngineEvent::Loading(id) => format!("[loading {id}]"),
        EngineEvent::NoReadableText(id) => format!("[{id} has no readable text]"),
        EngineEvent::StorageWarning(operation) => {
            format!("[warning: storage unavailable during {operation:?}, continuing in memory]")
        }
        EngineEvent::Finished(stats) => format!(
            "[finished: {} words, {} pauses, {:.1}s, {} wpm]",
            stats.words_shown,
            stats.pause_count,
            stats.elapsed_ms as f64 / 1_000.0,
            stats.average_wpm
        ),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::render::ProgressView;

    fn parse(line: &str) -> Input {
        parse_line(line, &ReaderSettings::default()).unwrap()
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(parse(""), Input::Command(ReaderCommand::TogglePlay));
        assert_eq!(parse("b"), Input::Command(ReaderCommand::Step(-1)));
        assert_eq!(parse("f 12"), Input::Command(ReaderCommand::Step(12)));
        assert_eq!(parse("g 3"), Input::Command(ReaderCommand::JumpToPage(3)));
        assert_eq!(
            parse("m  check   this "),
            Input::Command(ReaderCommand::AddBookmark {
                note: Some(String::from("check   this")),
            })
        );
        assert_eq!(parse("q"), Input::Quit);
    }

    #[test]
    fn speed_edits_keep_other_settings() {
        let settings = ReaderSettings {
            chunk_size: 2,
            ..ReaderSettings::default()
        };
        let Ok(Input::Command(ReaderCommand::UpdateSettings(updated))) =
            parse_line("w 450", &settings)
        else {
            panic!("expected a settings update");
        };
        assert_eq!((updated.wpm, updated.chunk_size), (450, 2));
    }

    #[test]
    fn rejects_bad_arguments() {
        let settings = ReaderSettings::default();
        assert!(parse_line("s x", &settings).is_err());
        assert!(parse_line("zz", &settings).is_err());
    }

    #[test]
    fn step_counts_must_be_positive_and_fit() {
        let settings = ReaderSettings::default();
        assert!(parse_line("b -3", &settings).is_err());
        assert!(parse_line("f -3", &settings).is_err());
        assert!(parse_line("b -2147483648", &settings).is_err());
        assert!(parse_line("b 2147483648", &settings).is_err());
        assert_eq!(
            parse("b 2147483647"),
            Input::Command(ReaderCommand::Step(-2_147_483_647))
        );
    }

    #[test]
    fn aligns_pivot_column() {
        let line = describe(&EngineEvent::Render(RenderEvent::word(String::from("reading")))).unwrap();
        assert_eq!(line.find('[').unwrap(), PIVOT_COLUMN);
        assert!(line.ends_with("re[a]ding"));
        assert_eq!(describe(&EngineEvent::Progress(ProgressView::new(0, 1, None))), None);
    }
}
