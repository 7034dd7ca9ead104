use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").expect("bold pattern is valid"));

const BULLETS: [char; 3] = ['-', '*', '•'];

/// Renders the bold and bullet subset of Markdown into an HTML fragment.
///
/// Bold spans become `<strong>`, bullet lines become `<li>` and each run of
/// consecutive items is wrapped in one `<ul>`. All other lines pass through
/// untouched; nothing is escaped.
pub fn render_inline(text: &str) -> String {
    let bolded = BOLD.replace_all(text, |caps: &regex::Captures<'_>| {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<strong>{inner}</strong>")
    });

    let mut segments: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();
    for line in bolded.split('\n') {
        match bullet_item(line) {
            Some(item) => items.push(format!("<li>{item}</li>")),
            None => {
                flush_list(&mut items, &mut segments);
                segments.push(line.to_string());
            }
        }
    }
    flush_list(&mut items, &mut segments);
    segments.join("\n")
}

fn bullet_item(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    let marker = chars.next()?;
    if !BULLETS.contains(&marker) {
        return None;
    }
    let rest = chars.as_str();
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn flush_list(items: &mut Vec<String>, segments: &mut Vec<String>) {
    if items.is_empty() {
        return;
    }
    segments.push(format!("<ul>{}</ul>", items.concat()));
    items.clear();
}
