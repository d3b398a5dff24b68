//! Splitting raw model output into reasoning and answer.
//!
//! Models are prompted to answer as `<think>reasoning</think>answer`. The
//! last well-formed closing tag is the boundary; everything before it is the
//! explanation and everything after it is the reply.

use super::Reply;

/// Split `raw` at its last `</tag>`.
///
/// Without a closing tag the whole (trimmed) text is the reply and the
/// explanation is empty.
pub fn split_thought(raw: &str) -> Reply {
    let raw = raw.trim();
    match last_closing_tag(raw) {
        Some((start, end)) => {
            let thought = strip_opening_tag(raw[..start].trim());
            Reply::new(raw[end..].trim(), thought)
        }
        None => Reply::new(raw, ""),
    }
}

/// Byte range of the last `</word>` in `text`.
fn last_closing_tag(text: &str) -> Option<(usize, usize)> {
    text.rmatch_indices("</").find_map(|(start, _)| {
        let rest = &text[start + 2..];
        let name_len = rest
            .find(|c: char| !is_word_char(c))
            .unwrap_or(rest.len());
        (name_len > 0 && rest[name_len..].starts_with('>'))
            .then_some((start, start + 2 + name_len + 1))
    })
}

/// Drop a leading `<word>` from the reasoning block.
fn strip_opening_tag(thought: &str) -> &str {
    let Some(rest) = thought.strip_prefix('<') else {
        return thought;
    };
    let name_len = rest
        .find(|c: char| !is_word_char(c))
        .unwrap_or(rest.len());
    match rest[name_len..].strip_prefix('>') {
        Some(body) if name_len > 0 => body.trim_start(),
        _ => thought,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_think_block_from_answer() {
        let reply = split_thought(
            "<think>The user wants battery info.</think>\nThe Aura lasts 24 hours in total.",
        );
        assert_eq!(reply.explanation, "The user wants battery info.");
        assert_eq!(reply.content, "The Aura lasts 24 hours in total.");
    }

    #[test]
    fn missing_opening_tag_keeps_reasoning_text() {
        let reply = split_thought("checking section 2.2</think>Six hours.");
        assert_eq!(reply.explanation, "checking section 2.2");
        assert_eq!(reply.content, "Six hours.");
    }

    #[test]
    fn no_closing_tag_is_all_answer() {
        let reply = split_thought("  Just an answer. ");
        assert_eq!(reply.content, "Just an answer.");
        assert_eq!(reply.explanation, "");
    }

    #[test]
    fn last_closing_tag_wins() {
        let reply = split_thought("<think>a</think> b </note> c");
        assert_eq!(reply.content, "c");
        assert_eq!(reply.explanation, "a</think> b");
    }

    #[test]
    fn malformed_closing_tags_are_ignored() {
        let reply = split_thought("x </ > y </>");
        assert_eq!(reply.content, "x </ > y </>");
        assert!(reply.explanation.is_empty());
    }
}
