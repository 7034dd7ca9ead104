use compartment_core::{update, Effect, Msg, Phase, ProgressTimings, ServerEvent, UploadSession};

fn completed_session() -> UploadSession {
    let session = UploadSession::new("user-1", ProgressTimings::immediate());
    let (session, _) = update(
        session,
        Msg::TaskAccepted {
            task_id: "task-1".to_string(),
        },
    );
    let (session, _) = update(
        session,
        Msg::ServerEvent(ServerEvent::decode(
            r##"{"status":"Done","summary":"# A\nx","title":"T"}"##,
        )),
    );
    session
}

#[test]
fn terminal_session_ignores_everything() {
    let session = completed_session();
    assert_eq!(session.phase(), Phase::Completed);

    for msg in [
        Msg::ServerEvent(ServerEvent::Status("Storing vectors...".to_string())),
        Msg::SyntheticStatus("Creating compartments...".to_string()),
        Msg::Cancelled,
        Msg::StreamFailed(compartment_core::UploadError::connection_lost()),
    ] {
        let (next, effects) = update(session.clone(), msg);
        assert_eq!(session, next);
        assert!(effects.is_empty());
    }
}

#[test]
fn stream_events_before_acceptance_are_ignored() {
    let session = UploadSession::new("user-1", ProgressTimings::immediate());
    let (next, effects) = update(
        session.clone(),
        Msg::ServerEvent(ServerEvent::Status("Splitting text into vectors...".to_string())),
    );

    assert_eq!(session, next);
    assert_eq!(effects, Vec::<Effect>::new());
}
