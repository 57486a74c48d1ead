//! Strict parsing of model replies that are supposed to be JSON.

use serde::de::DeserializeOwned;

/// Outcome of parsing a reply into `T`. Never guesses at partial JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured<T> {
    Parsed(T),
    /// The reply as received, for logging or a second attempt.
    Malformed(String),
}

impl<T> Structured<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Malformed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool { matches!(self, Self::Parsed(_)) }
}

/// Accepts either a reply that is entirely JSON, or one containing exactly
/// one fenced code block whose body is JSON.
pub fn parse_structured<T: DeserializeOwned>(reply: &str) -> Structured<T> {
    let trimmed = reply.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Structured::Parsed(v);
    }
    if let Some(body) = single_fenced_block(trimmed) {
        if let Ok(v) = serde_json::from_str(body) {
            return Structured::Parsed(v);
        }
    }
    Structured::Malformed(reply.to_string())
}

fn single_fenced_block(text: &str) -> Option<&str> {
    let parts: Vec<&str> = text.split("```").collect();
    // one block: prose ``` body ``` prose
    if parts.len() != 3 {
        return None;
    }
    let body = parts[1].trim();
    // drop an info string such as `json`, with or without a newline after it
    let tag_len = body.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(body.len());
    let rest = body[tag_len..].trim_start();
    let body = if tag_len > 0 && rest.starts_with(['{', '[', '"']) { rest } else { body };
    Some(body.trim())
}
