use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::state::{
    ACCEPTED_MESSAGE, COMPARTMENT_HINT_MESSAGE, COMPLETE_PERCENT, STAGE_INCREMENT,
    TRANSFER_CEILING, UPLOADING_MESSAGE,
};
use crate::{
    Effect, FailureKind, Msg, Phase, ProgressUpdate, ServerEvent, UploadError, UploadSession,
};

const OVERSIZED_MARKER: &str = "too large";

/// Pure update function: applies a message to the session and returns any effects.
///
/// Once the session reached a terminal phase every message is ignored, so a
/// late stream event can never produce a second result or error.
pub fn update(mut session: UploadSession, msg: Msg) -> (UploadSession, Vec<Effect>) {
    if session.phase().is_terminal() {
        engine_debug!("Ignoring {:?} after session ended in {:?}", msg, session.phase());
        return (session, Vec::new());
    }

    let effects = match msg {
        Msg::TransferStarted { total } => {
            if session.phase() != Phase::Uploading {
                return (session, Vec::new());
            }
            engine_debug!("Transfer started, {} bytes", total);
            vec![Effect::Progress(ProgressUpdate::new(
                session.progress(),
                UPLOADING_MESSAGE,
            ))]
        }
        Msg::TransferProgress { sent, total } => {
            if session.phase() != Phase::Uploading {
                return (session, Vec::new());
            }
            let percent = scale_transfer(sent, total);
            if session.raise_progress(percent) {
                vec![Effect::Progress(ProgressUpdate::new(
                    session.progress(),
                    UPLOADING_MESSAGE,
                ))]
            } else {
                Vec::new()
            }
        }
        Msg::TaskAccepted { task_id } => {
            if session.phase() != Phase::Uploading {
                return (session, Vec::new());
            }
            engine_info!("Upload accepted as task {}", task_id);
            session.set_task_id(task_id.clone());
            session.set_phase(Phase::Streaming);
            session.raise_progress(TRANSFER_CEILING);
            vec![
                Effect::Progress(ProgressUpdate::new(session.progress(), ACCEPTED_MESSAGE)),
                Effect::OpenStream { task_id },
            ]
        }
        Msg::TransferFailed(error) | Msg::StreamFailed(error) => {
            engine_warn!("Upload failed: {}", error);
            session.set_phase(Phase::Failed);
            vec![Effect::Fail(error)]
        }
        Msg::ServerEvent(event) => {
            if session.phase() != Phase::Streaming {
                engine_warn!("Stream event before task acceptance: {:?}", event);
                return (session, Vec::new());
            }
            apply_event(&mut session, event)
        }
        Msg::SyntheticStatus(message) => {
            if session.phase() != Phase::Streaming {
                return (session, Vec::new());
            }
            apply_status(&mut session, message)
        }
        Msg::Cancelled => {
            engine_info!("Upload cancelled at {}%", session.progress());
            session.set_phase(Phase::Cancelled);
            vec![Effect::Fail(UploadError::cancelled())]
        }
    };

    (session, effects)
}

fn apply_event(session: &mut UploadSession, event: ServerEvent) -> Vec<Effect> {
    match event {
        ServerEvent::Error { message } => {
            let kind = if message.to_ascii_lowercase().contains(OVERSIZED_MARKER) {
                FailureKind::PayloadTooLarge
            } else {
                FailureKind::ServerReported
            };
            engine_warn!("Server reported error: {}", message);
            session.set_phase(Phase::Failed);
            vec![Effect::Fail(UploadError::new(kind, message))]
        }
        ServerEvent::Complete {
            status,
            summary,
            title,
        } => {
            session.raise_progress(COMPLETE_PERCENT);
            session.set_phase(Phase::Completed);
            let grace = session.timings().completion_grace;
            let result = session.take_result(summary, title);
            engine_info!(
                "Task {} completed: title={:?} summary_len={} text_len={}",
                result.task_id,
                result.title,
                result.summary.len(),
                result.text.len()
            );
            vec![
                Effect::Progress(ProgressUpdate::new(COMPLETE_PERCENT, status)),
                Effect::Complete { grace, result },
            ]
        }
        ServerEvent::Text { status, text } => {
            engine_debug!("Cached extracted text ({} bytes)", text.len());
            session.set_accumulated_text(text);
            vec![
                Effect::Progress(ProgressUpdate::new(session.progress(), status)),
                Effect::ScheduleStatus {
                    delay: session.timings().compartment_hint_delay,
                    message: COMPARTMENT_HINT_MESSAGE.to_string(),
                },
            ]
        }
        ServerEvent::Status(message) => apply_status(session, message),
    }
}

fn apply_status(session: &mut UploadSession, message: String) -> Vec<Effect> {
    if message.is_empty() {
        return Vec::new();
    }
    if is_error_marker(&message) {
        engine_warn!("Ignoring legacy error line: {}", message);
        return Vec::new();
    }
    if !session.mark_seen(&message) {
        engine_debug!("Duplicate status suppressed: {}", message);
        return Vec::new();
    }
    let next = session.progress().saturating_add(STAGE_INCREMENT);
    session.raise_progress(next);
    vec![Effect::Progress(ProgressUpdate::new(session.progress(), message))]
}

fn is_error_marker(message: &str) -> bool {
    message
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("error"))
}

/// Maps transferred bytes onto `0..=TRANSFER_CEILING`, rounding to nearest.
fn scale_transfer(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return TRANSFER_CEILING;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    let ceiling = u128::from(TRANSFER_CEILING);
    let scaled = (sent * ceiling * 2 + total) / (total * 2);
    scaled as u8
}
