use std::time::Duration;

use crate::{ProgressUpdate, UploadError, UploadResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Forward to the caller's progress sink.
    Progress(ProgressUpdate),
    /// Open the progress stream for this task.
    OpenStream { task_id: String },
    /// Feed `Msg::SyntheticStatus(message)` back after `delay`.
    ScheduleStatus { delay: Duration, message: String },
    /// Wait `grace`, close the stream and hand `result` to the caller.
    Complete { grace: Duration, result: UploadResult },
    /// Close everything and reject with `error`.
    Fail(UploadError),
}
