use serde::Deserialize;
use serde_json::Value;

const ERROR_STATUS: &str = "error";
const UNKNOWN_ERROR: &str = "Unknown error";

/// One decoded payload from the processing stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// `{"status": "error", "message": ...}`
    Error { message: String },
    /// `{"status", "summary", "title"}`; ends the session.
    Complete {
        status: String,
        summary: String,
        title: String,
    },
    /// `{"status", "text"}` carrying the extracted document text.
    Text { status: String, text: String },
    /// A bare stage name, either legacy plain text or a JSON status-only payload.
    Status(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    status: Option<String>,
    message: Option<String>,
    text: Option<String>,
    summary: Option<String>,
    title: Option<String>,
}

impl ServerEvent {
    /// Classifies a stream payload by shape.
    ///
    /// JSON objects are sorted by which fields are present; anything that is
    /// not a JSON object (or an object without a usable `status`) becomes a
    /// plain [`ServerEvent::Status`].
    pub fn decode(data: &str) -> Self {
        let trimmed = data.trim();
        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Object(_)) => value,
            _ => return ServerEvent::Status(trimmed.to_string()),
        };
        let raw = match RawPayload::deserialize(value) {
            Ok(raw) => raw,
            // Fields with unexpected types; keep the payload visible as a status line.
            Err(_) => return ServerEvent::Status(trimmed.to_string()),
        };

        match raw {
            RawPayload {
                status: Some(status),
                message,
                text,
                ..
            } if status.eq_ignore_ascii_case(ERROR_STATUS) => ServerEvent::Error {
                message: message
                    .or(text)
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            },
            RawPayload {
                status: Some(status),
                summary: Some(summary),
                title: Some(title),
                ..
            } => ServerEvent::Complete {
                status,
                summary,
                title,
            },
            RawPayload {
                status: Some(status),
                text: Some(text),
                summary: None,
                ..
            } => ServerEvent::Text { status, text },
            RawPayload {
                status: Some(status),
                ..
            } => ServerEvent::Status(status),
            RawPayload { status: None, .. } => ServerEvent::Status(trimmed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServerEvent;

    #[test]
    fn plain_line_is_status() {
        assert_eq!(
            ServerEvent::decode("Splitting text into vectors..."),
            ServerEvent::Status("Splitting text into vectors...".to_string())
        );
    }

    #[test]
    fn error_status_uses_message() {
        let event = ServerEvent::decode(r#"{"status":"error","message":"too big"}"#);
        assert_eq!(
            event,
            ServerEvent::Error {
                message: "too big".to_string()
            }
        );
    }

    #[test]
    fn error_without_message_falls_back() {
        assert_eq!(
            ServerEvent::decode(r#"{"status":"error"}"#),
            ServerEvent::Error {
                message: "Unknown error".to_string()
            }
        );
    }

    #[test]
    fn completion_needs_summary_and_title() {
        let event =
            ServerEvent::decode(r##"{"status":"Done","summary":"# A\nx","title":"T"}"##);
        assert_eq!(
            event,
            ServerEvent::Complete {
                status: "Done".to_string(),
                summary: "# A\nx".to_string(),
                title: "T".to_string(),
            }
        );

        // Missing title degrades to a status line.
        assert_eq!(
            ServerEvent::decode(r#"{"status":"Done","summary":"x"}"#),
            ServerEvent::Status("Done".to_string())
        );
    }

    #[test]
    fn text_payload_is_interim() {
        let event = ServerEvent::decode(r#"{"status":"Storing vectors...","text":"body"}"#);
        assert_eq!(
            event,
            ServerEvent::Text {
                status: "Storing vectors...".to_string(),
                text: "body".to_string(),
            }
        );
    }

    #[test]
    fn non_object_json_is_raw_status() {
        assert_eq!(ServerEvent::decode("42"), ServerEvent::Status("42".to_string()));
        assert_eq!(
            ServerEvent::decode(r#"{"progress":10}"#),
            ServerEvent::Status(r#"{"progress":10}"#.to_string())
        );
    }
}
