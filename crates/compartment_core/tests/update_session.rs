use std::time::Duration;

use compartment_core::{
    update, Effect, FailureKind, Msg, Phase, ProgressTimings, ProgressUpdate, ServerEvent,
    UploadError, UploadSession, COMPARTMENT_HINT_MESSAGE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn timings() -> ProgressTimings {
    ProgressTimings {
        completion_grace: Duration::from_millis(1_000),
        compartment_hint_delay: Duration::from_millis(2_500),
    }
}

fn accepted_session() -> UploadSession {
    let session = UploadSession::new("user-1", timings());
    let (session, _) = update(
        session,
        Msg::TaskAccepted {
            task_id: "task-1".to_string(),
        },
    );
    session
}

fn feed(session: UploadSession, data: &str) -> (UploadSession, Vec<Effect>) {
    update(session, Msg::ServerEvent(ServerEvent::decode(data)))
}

fn progress_of(effects: &[Effect]) -> Vec<ProgressUpdate> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Progress(update) => Some(update.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn transfer_progress_stays_within_first_fifth() {
    init_logging();
    let mut session = UploadSession::new("user-1", timings());
    let mut seen = Vec::new();

    let (next, effects) = update(session, Msg::TransferStarted { total: 50 });
    seen.extend(progress_of(&effects));
    session = next;
    for sent in (0..=50).step_by(10) {
        let (next, effects) = update(session, Msg::TransferProgress { sent, total: 50 });
        seen.extend(progress_of(&effects));
        session = next;
    }

    assert_eq!(seen.first(), Some(&ProgressUpdate::new(0, "Uploading document...")));
    assert!(seen.iter().all(|update| update.percent <= 20));
    assert_eq!(session.progress(), 20);
    assert_eq!(session.phase(), Phase::Uploading);
}

#[test]
fn acceptance_opens_stream_at_twenty_percent() {
    init_logging();
    let session = UploadSession::new("user-1", timings());
    let (session, effects) = update(
        session,
        Msg::TaskAccepted {
            task_id: "task-9".to_string(),
        },
    );

    assert_eq!(session.phase(), Phase::Streaming);
    assert_eq!(session.task_id(), Some("task-9"));
    assert_eq!(
        effects,
        vec![
            Effect::Progress(ProgressUpdate::new(20, "Processing document...")),
            Effect::OpenStream {
                task_id: "task-9".to_string()
            },
        ]
    );
}

#[test]
fn duplicate_status_counts_once() {
    init_logging();
    let session = accepted_session();
    let mut updates = Vec::new();
    let mut session = session;
    for data in [
        "Splitting text into vectors...",
        "Splitting text into vectors...",
        "Storing vectors...",
    ] {
        let (next, effects) = feed(session, data);
        updates.extend(progress_of(&effects));
        session = next;
    }

    assert_eq!(
        updates,
        vec![
            ProgressUpdate::new(40, "Splitting text into vectors..."),
            ProgressUpdate::new(60, "Storing vectors..."),
        ]
    );
    assert_eq!(session.progress(), 60);
}

#[test]
fn progress_is_capped_at_one_hundred() {
    init_logging();
    let mut session = accepted_session();
    for stage in ["a", "b", "c", "d", "e", "f"] {
        let (next, _) = feed(session, stage);
        session = next;
    }
    assert_eq!(session.progress(), 100);
    assert_eq!(session.phase(), Phase::Streaming);
}

#[test]
fn text_payload_is_cached_and_schedules_hint() {
    init_logging();
    let (session, _) = feed(accepted_session(), "Storing vectors...");
    let (session, effects) = feed(
        session,
        r#"{"status":"Storing vectors...","text":"extracted body"}"#,
    );

    assert_eq!(session.accumulated_text(), "extracted body");
    assert_eq!(
        effects,
        vec![
            Effect::Progress(ProgressUpdate::new(40, "Storing vectors...")),
            Effect::ScheduleStatus {
                delay: Duration::from_millis(2_500),
                message: COMPARTMENT_HINT_MESSAGE.to_string(),
            },
        ]
    );

    // The synthetic status and the real one from the server count once.
    let (session, effects) = update(
        session,
        Msg::SyntheticStatus(COMPARTMENT_HINT_MESSAGE.to_string()),
    );
    assert_eq!(
        progress_of(&effects),
        vec![ProgressUpdate::new(60, COMPARTMENT_HINT_MESSAGE)]
    );
    let (session, effects) = feed(session, COMPARTMENT_HINT_MESSAGE);
    assert!(effects.is_empty());
    assert_eq!(session.progress(), 60);
}

#[test]
fn completion_resolves_with_accumulated_fields() {
    init_logging();
    let (session, _) = feed(accepted_session(), r#"{"status":"Storing vectors...","text":"body"}"#);
    let (session, effects) = feed(
        session,
        r##"{"status":"Done","summary":"# A\nx","title":"T"}"##,
    );

    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.progress(), 100);
    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::Progress(ProgressUpdate::new(100, "Done")));
    match &effects[1] {
        Effect::Complete { grace, result } => {
            assert_eq!(*grace, Duration::from_millis(1_000));
            assert_eq!(result.task_id, "task-1");
            assert_eq!(result.user_id, "user-1");
            assert_eq!(result.summary, "# A\nx");
            assert_eq!(result.title, "T");
            assert_eq!(result.text, "body");
            assert_eq!(result.outline().len(), 1);
        }
        other => panic!("expected completion, got {other:?}"),
    }

    let (_, effects) = feed(session, "Storing vectors again");
    assert!(effects.is_empty());
}

#[test]
fn error_event_fails_with_server_message() {
    init_logging();
    let (session, effects) = feed(accepted_session(), r#"{"status":"error","message":"too big"}"#);

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(
        effects,
        vec![Effect::Fail(UploadError::new(FailureKind::ServerReported, "too big"))]
    );

    let (_, effects) = feed(session, "Storing vectors...");
    assert!(progress_of(&effects).is_empty());
}

#[test]
fn oversized_document_error_is_distinct() {
    init_logging();
    let (_, effects) = feed(
        accepted_session(),
        r#"{"status":"error","message":"Document is too large to process."}"#,
    );
    assert_eq!(
        effects,
        vec![Effect::Fail(UploadError::new(
            FailureKind::PayloadTooLarge,
            "Document is too large to process."
        ))]
    );
}

#[test]
fn legacy_error_lines_do_not_advance() {
    init_logging();
    let (session, effects) = feed(accepted_session(), "Error splitting text: boom");
    assert!(effects.is_empty());
    assert_eq!(session.progress(), 20);
    assert_eq!(session.phase(), Phase::Streaming);
}

#[test]
fn cancellation_ends_session() {
    init_logging();
    let (session, effects) = update(accepted_session(), Msg::Cancelled);
    assert_eq!(session.phase(), Phase::Cancelled);
    assert_eq!(effects, vec![Effect::Fail(UploadError::cancelled())]);
}

#[test]
fn full_stage_sequence_moves_in_twenty_point_steps() {
    init_logging();
    let mut session = UploadSession::new("user-1", timings());
    let mut percents = Vec::new();
    let mut messages: Vec<Msg> = vec![
        Msg::TransferStarted { total: 50 },
        Msg::TransferProgress { sent: 50, total: 50 },
        Msg::TaskAccepted {
            task_id: "task-1".to_string(),
        },
    ];
    messages.extend(
        [
            "Splitting text into vectors...",
            "Storing vectors...",
            r#"{"status":"Storing vectors...","text":"t"}"#,
            "Creating compartments...",
            r##"{"status":"Compartments created successfully!","summary":"# A","title":"T"}"##,
        ]
        .into_iter()
        .map(|data| Msg::ServerEvent(ServerEvent::decode(data))),
    );

    for msg in messages {
        let (next, effects) = update(session, msg);
        percents.extend(progress_of(&effects).into_iter().map(|u| u.percent));
        session = next;
    }

    assert_eq!(percents, vec![0, 20, 20, 40, 60, 60, 80, 100]);
}
