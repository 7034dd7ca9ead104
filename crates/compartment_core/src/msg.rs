use crate::{ServerEvent, UploadError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The upload request is about to be sent with a body of `total` bytes.
    TransferStarted { total: u64 },
    /// Bytes of the request body handed to the transport so far.
    TransferProgress { sent: u64, total: u64 },
    /// The upload endpoint answered with a task id.
    TaskAccepted { task_id: String },
    /// The upload request failed before a task id came back.
    TransferFailed(UploadError),
    /// Decoded payload from the progress stream.
    ServerEvent(ServerEvent),
    /// A status scheduled through `Effect::ScheduleStatus` came due.
    SyntheticStatus(String),
    /// The stream broke or ended without a terminal event.
    StreamFailed(UploadError),
    /// Caller asked to abandon the upload.
    Cancelled,
}
