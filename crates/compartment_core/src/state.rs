use std::collections::HashSet;
use std::time::Duration;

/// Share of the progress bar covered by the byte transfer.
pub const TRANSFER_CEILING: u8 = 20;
/// Progress added for each new stage name reported by the server.
pub const STAGE_INCREMENT: u8 = 20;
pub const COMPLETE_PERCENT: u8 = 100;

pub const UPLOADING_MESSAGE: &str = "Uploading document...";
pub const ACCEPTED_MESSAGE: &str = "Processing document...";
/// Synthesized after the text payload; the backend does not send it in time.
pub const COMPARTMENT_HINT_MESSAGE: &str = "Creating compartments...";

/// Client-side delays that smooth over gaps in the server's status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTimings {
    /// Pause between reporting 100% and handing back the result.
    pub completion_grace: Duration,
    /// Delay between the text payload and the synthetic compartment status.
    pub compartment_hint_delay: Duration,
}

impl Default for ProgressTimings {
    fn default() -> Self {
        Self {
            completion_grace: Duration::from_millis(1_000),
            compartment_hint_delay: Duration::from_millis(2_500),
        }
    }
}

impl ProgressTimings {
    /// No artificial delays; used by tests and non-interactive callers.
    pub fn immediate() -> Self {
        Self {
            completion_grace: Duration::ZERO,
            compartment_hint_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    pub summary: String,
    /// Extracted document text from the interim payload; empty if none arrived.
    pub text: String,
}

impl UploadResult {
    pub fn outline(&self) -> crate::ParsedSummary {
        crate::parse(&self.summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uploading,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::Cancelled)
    }
}

/// State of one upload, from submit until the stream closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    phase: Phase,
    user_id: String,
    task_id: Option<String>,
    progress: u8,
    seen_messages: HashSet<String>,
    accumulated_text: String,
    timings: ProgressTimings,
}

impl UploadSession {
    pub fn new(user_id: impl Into<String>, timings: ProgressTimings) -> Self {
        Self {
            phase: Phase::Uploading,
            user_id: user_id.into(),
            task_id: None,
            progress: 0,
            seen_messages: HashSet::new(),
            accumulated_text: String::new(),
            timings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn timings(&self) -> ProgressTimings {
        self.timings
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_task_id(&mut self, task_id: String) {
        self.task_id = Some(task_id);
    }

    /// Raises progress to `percent`; never lowers it. Returns whether it moved.
    pub(crate) fn raise_progress(&mut self, percent: u8) -> bool {
        let percent = percent.min(COMPLETE_PERCENT);
        if percent > self.progress {
            self.progress = percent;
            true
        } else {
            false
        }
    }

    /// Records a stage name; `false` if it was already seen in this session.
    pub(crate) fn mark_seen(&mut self, message: &str) -> bool {
        self.seen_messages.insert(message.to_string())
    }

    pub(crate) fn set_accumulated_text(&mut self, text: String) {
        self.accumulated_text = text;
    }

    pub(crate) fn take_result(&mut self, summary: String, title: String) -> UploadResult {
        UploadResult {
            task_id: self.task_id.clone().unwrap_or_default(),
            user_id: self.user_id.clone(),
            title,
            summary,
            text: std::mem::take(&mut self.accumulated_text),
        }
    }
}
