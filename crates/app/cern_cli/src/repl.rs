//! Line input parsing and transcript rendering for the interactive chat.

use cern_api_client::{TranscriptEntry, TranscriptRole};

/// One line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Prompt(&'a str),
    Thought(usize),
    Reset,
    Quit,
    Empty,
    Unknown(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Prompt(line.trim_end_matches(['\r', '\n']));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), None) => Input::Quit,
        (Some("reset"), None) => Input::Reset,
        (Some("thought"), Some(n)) => n.parse().map_or(Input::Unknown(trimmed), Input::Thought),
        _ => Input::Unknown(trimmed),
    }
}

/// Render one transcript entry with its index, so `/thought N` can refer to it.
pub fn render_entry(index: usize, entry: &TranscriptEntry) -> String {
    let who = match entry.role {
        TranscriptRole::User => "you",
        TranscriptRole::Cern => "cern",
    };
    let mut out = format!("[{index}] {who}: {}", entry.content);
    if let Some(thought) = &entry.thought {
        if entry.thought_visible {
            out.push_str(&format!("\n    Cern's Thought Process: {thought}"));
        } else {
            out.push_str(&format!("\n    (show thought: /thought {index})"));
        }
    }
    out
}
