//! Compartment engine: HTTP transport, progress stream and effect execution.
mod chat;
mod coordinator;
mod filename;
mod persist;
mod settings;
mod sse;
mod transport;
mod types;

pub use chat::ChatClient;
pub use coordinator::{ProgressSink, UploadCoordinator};
pub use filename::summary_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, SummaryStore};
pub use settings::{ClientSettings, SettingsError};
pub use sse::{data_stream, EventStream, SseDecoder};
pub use transport::{ReqwestTransport, Transport};
pub use types::{ChatReply, DocumentFile, Route, TransferTick, UploadInput};

pub use compartment_core::{
    FailureKind, ProgressTimings, ProgressUpdate, UploadError, UploadResult,
};
