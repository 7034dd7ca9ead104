use crate::{Compartment, CompartmentContent, ParsedSummary};

/// Serializes an outline back into the heading dialect it was parsed from.
///
/// Content is written as stored, so rendered inline markup stays rendered.
pub fn to_markdown(summary: &ParsedSummary) -> String {
    let mut out = String::new();
    for compartment in summary {
        out.push_str(&format!("# {}\n\n", compartment.heading));
        match &compartment.content {
            CompartmentContent::Text(text) => {
                out.push_str(&format!("{text}\n\n"));
            }
            CompartmentContent::Sections(sections) => {
                for section in sections {
                    out.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.content));
                }
            }
        }
    }
    out
}

/// Plain text for copying a single compartment.
pub fn copy_text(compartment: &Compartment) -> String {
    match &compartment.content {
        CompartmentContent::Text(text) => text.clone(),
        CompartmentContent::Sections(sections) => sections
            .iter()
            .map(|section| format!("{}\n{}", section.heading, section.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}
