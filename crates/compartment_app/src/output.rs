use std::fmt::Write;

use compartment_core::{copy_text, ParsedSummary, ProgressUpdate};
use compartment_engine::ChatReply;

pub fn progress_line(update: &ProgressUpdate) -> String {
    format!("[{:>3}%] {}", update.percent, update.message)
}

/// Terminal rendering of an outline: one block per compartment.
pub fn outline_text(title: &str, outline: &ParsedSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {title} ==");
    for compartment in outline {
        let _ = writeln!(out, "\n# {}", compartment.heading);
        let _ = writeln!(out, "{}", copy_text(compartment));
    }
    out
}

/// Answer text followed by the distinct, non-empty sources.
pub fn chat_text(reply: &ChatReply) -> String {
    let mut sources: Vec<&str> = Vec::new();
    for source in reply.sources.iter().flatten().map(|source| source.trim()) {
        if !source.is_empty() && !sources.contains(&source) {
            sources.push(source);
        }
    }

    let mut out = reply.response.clone();
    if !sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in sources {
            let _ = write!(out, "\n- {source}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use compartment_core::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn progress_is_right_aligned() {
        assert_eq!(
            progress_line(&ProgressUpdate::new(5, "Uploading document...")),
            "[  5%] Uploading document..."
        );
    }

    #[test]
    fn outline_lists_every_compartment() {
        let outline = parse("# One\nplain\n# Two\n## Part\nbody\n");
        assert_eq!(
            outline_text("Doc", &outline),
            "== Doc ==\n\n# One\nplain\n\n# Two\nPart\nbody\n"
        );
    }

    #[test]
    fn sources_are_deduplicated_and_blank_ones_skipped() {
        let reply = ChatReply {
            response: "Answer.".to_string(),
            sources: vec![
                Some("p. 2".to_string()),
                None,
                Some(" ".to_string()),
                Some("p. 2".to_string()),
            ],
        };
        assert_eq!(chat_text(&reply), "Answer.\n\nSources:\n- p. 2");
    }
}
