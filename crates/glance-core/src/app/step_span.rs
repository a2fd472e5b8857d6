/// Token indices shown together in one step: a single token, or a run of up
/// to `MAX_CHUNK_SIZE` consecutive words.
type StepSpan = heapless::Vec<usize, { crate::settings::MAX_CHUNK_SIZE as usize }>;

fn step_span(tokens: &[Token], start: usize, chunk_size: u8) -> StepSpan {
    let mut span = StepSpan::new();
    if start >= tokens.len() {
        return span;
    }
    let _ = span.push(start);

    if !tokens[start].is_word() {
        return span;
    }

    let mut next = start + 1;
    while span.len() < chunk_size as usize && next < tokens.len() && tokens[next].is_word() {
        if span.push(next).is_err() {
            break;
        }
        next += 1;
    }
    span
}

fn render_span(tokens: &[Token], span: &[usize]) -> Option<RenderEvent> {
    let mut text = String::new();
    for &index in span {
        match tokens.get(index)? {
            Token::Word(word) => {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(word);
            }
            Token::ParagraphBreak => return Some(RenderEvent::paragraph()),
        }
    }
    (!text.is_empty()).then(|| RenderEvent::word(text))
}
