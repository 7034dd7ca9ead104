//! Compartment core: outline parser and the pure upload-progress state machine.
mod effect;
mod error;
mod event;
mod export;
mod markup;
mod msg;
mod outline;
mod state;
mod update;
mod validate;

pub use effect::Effect;
pub use error::{FailureKind, UploadError, CONNECTION_ERROR};
pub use event::ServerEvent;
pub use export::{copy_text, to_markdown};
pub use markup::render_inline;
pub use msg::Msg;
pub use outline::{
    parse, Compartment, CompartmentContent, ParsedSummary, SubCompartment, EMPTY_PLACEHOLDER,
};
pub use state::{
    Phase, ProgressTimings, ProgressUpdate, UploadResult, UploadSession, ACCEPTED_MESSAGE,
    COMPARTMENT_HINT_MESSAGE, COMPLETE_PERCENT, STAGE_INCREMENT, TRANSFER_CEILING,
    UPLOADING_MESSAGE,
};
pub use update::update;
pub use validate::{
    guess_mime, validate_document, validate_text, ACCEPTED_EXTENSIONS, ACCEPTED_MIME_TYPES,
};
