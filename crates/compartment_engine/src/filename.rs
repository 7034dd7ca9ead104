use std::fmt::Write;

use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;
const FALLBACK_STEM: &str = "summary";

/// Windows-safe, deterministic filename: `{sanitized_title}--{short_hash(task_id)}.md`.
pub fn summary_filename(title: &str, task_id: &str) -> String {
    format!("{}--{}.md", sanitize_title(title), short_hash(task_id))
}

fn sanitize_title(input: &str) -> String {
    // Forbidden characters and whitespace runs collapse into one underscore or space.
    let mut cleaned = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        let last = cleaned.chars().last();
        let repeated_underscore = c == '_' && last == Some('_');
        let repeated_space = c.is_whitespace() && last.is_some_and(char::is_whitespace);
        if repeated_underscore || repeated_space {
            continue;
        }
        cleaned.push(if c.is_whitespace() { ' ' } else { c });
    }

    let mut stem: String = cleaned
        .trim_matches(&['_', ' ', '.'][..])
        .chars()
        .take(MAX_STEM_LEN)
        .collect();
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .take(4)
        .fold(String::with_capacity(8), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
}
