//! Outline parser for generated summaries.
//!
//! Summaries use a two-level heading dialect: `# ` opens a compartment and
//! `## ` opens a sub-compartment inside it. Everything else is body text,
//! rendered through [`render_inline`].

use serde::{Deserialize, Serialize};

use crate::markup::render_inline;

/// Content of a compartment that had neither body text nor sections.
pub const EMPTY_PLACEHOLDER: &str = "No content provided";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCompartment {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompartmentContent {
    Text(String),
    Sections(Vec<SubCompartment>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compartment {
    pub heading: String,
    pub content: CompartmentContent,
}

impl Compartment {
    pub fn sections(&self) -> Option<&[SubCompartment]> {
        match &self.content {
            CompartmentContent::Sections(sections) => Some(sections),
            CompartmentContent::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            CompartmentContent::Text(text) => Some(text),
            CompartmentContent::Sections(_) => None,
        }
    }
}

pub type ParsedSummary = Vec<Compartment>;

#[derive(Debug)]
struct OpenSection {
    heading: String,
    body: String,
}

#[derive(Debug)]
struct OpenCompartment {
    heading: String,
    body: String,
    sections: Vec<SubCompartment>,
    /// Set by the first `##`; body text collected before it is discarded.
    in_sections: bool,
}

#[derive(Debug, Default)]
struct OutlineBuilder {
    result: ParsedSummary,
    compartment: Option<OpenCompartment>,
    section: Option<OpenSection>,
}

impl OutlineBuilder {
    fn open_compartment(&mut self, heading: &str) {
        self.close_compartment();
        self.compartment = Some(OpenCompartment {
            heading: heading.trim().to_string(),
            body: String::new(),
            sections: Vec::new(),
            in_sections: false,
        });
    }

    fn open_section(&mut self, heading: &str) {
        self.close_section();
        if let Some(compartment) = self.compartment.as_mut() {
            compartment.in_sections = true;
        }
        // Without a compartment the section is an orphan and its lines are dropped.
        self.section = Some(OpenSection {
            heading: heading.trim().to_string(),
            body: String::new(),
        });
    }

    fn push_line(&mut self, line: &str) {
        let target = match (self.section.as_mut(), self.compartment.as_mut()) {
            (Some(section), _) => &mut section.body,
            (None, Some(compartment)) if !compartment.in_sections => &mut compartment.body,
            _ => return,
        };
        target.push_str(line);
        target.push('\n');
    }

    fn close_section(&mut self) {
        let Some(section) = self.section.take() else {
            return;
        };
        if let Some(compartment) = self.compartment.as_mut() {
            compartment.sections.push(SubCompartment {
                heading: section.heading,
                content: render_inline(section.body.trim()),
            });
        }
    }

    fn close_compartment(&mut self) {
        self.close_section();
        let Some(compartment) = self.compartment.take() else {
            return;
        };
        let body = compartment.body.trim();
        let content = if !compartment.sections.is_empty() {
            CompartmentContent::Sections(compartment.sections)
        } else if !body.is_empty() {
            CompartmentContent::Text(render_inline(body))
        } else {
            CompartmentContent::Text(EMPTY_PLACEHOLDER.to_string())
        };
        self.result.push(Compartment {
            heading: compartment.heading,
            content,
        });
    }

    fn finish(mut self) -> ParsedSummary {
        self.close_compartment();
        self.result
    }
}

/// Parses a generated summary into its compartments, in document order.
///
/// Total over all input: unknown constructs become body text, text before
/// the first `# ` heading is dropped and duplicate headings stay separate.
pub fn parse(markdown: &str) -> ParsedSummary {
    let mut builder = OutlineBuilder::default();
    for line in markdown.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(heading) = line.strip_prefix("# ") {
            builder.open_compartment(heading);
        } else if let Some(heading) = line.strip_prefix("## ") {
            builder.open_section(heading);
        } else {
            builder.push_line(line);
        }
    }
    builder.finish()
}
