use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use compartment_core::{
    update, Effect, FailureKind, Msg, ProgressTimings, ProgressUpdate, ServerEvent, UploadError,
    UploadResult, UploadSession,
};
use engine_logging::{engine_debug, engine_info};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::settings::{ClientSettings, SettingsError};
use crate::transport::{ReqwestTransport, Transport};
use crate::UploadInput;

/// Receives normalized `(percent, message)` updates during an upload.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn emit(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Runs the two-phase upload: body transfer, then the processing stream.
///
/// One upload at a time per coordinator; a concurrent call fails with
/// [`FailureKind::Busy`]. Every exit path drops the stream, which closes the
/// connection, including when the caller drops the `upload` future.
pub struct UploadCoordinator<T = ReqwestTransport> {
    transport: T,
    timings: ProgressTimings,
    in_flight: AtomicBool,
}

impl UploadCoordinator<ReqwestTransport> {
    pub fn from_settings(settings: ClientSettings) -> Result<Self, SettingsError> {
        let timings = settings.timings;
        Ok(Self::new(ReqwestTransport::new(settings)?, timings))
    }
}

impl<T: Transport> UploadCoordinator<T> {
    pub fn new(transport: T, timings: ProgressTimings) -> Self {
        Self {
            transport,
            timings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn upload(
        &self,
        input: UploadInput,
        user_id: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(UploadError::new(
                FailureKind::Busy,
                "another upload is still in progress",
            ));
        };

        let route = input.route();
        let mut driver = SessionDriver::new(UploadSession::new(user_id, self.timings), sink);

        // Phase 1: transfer. Ticks are applied in order until the task id arrives.
        driver.dispatch(Msg::TransferStarted {
            total: input.payload_len(),
        });
        let accepted = {
            let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
            let submit = self.transport.submit(&input, user_id, tick_tx);
            tokio::pin!(submit);
            let msg = loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break Msg::Cancelled,
                    Some(tick) = tick_rx.recv() => driver.dispatch(Msg::TransferProgress {
                        sent: tick.sent,
                        total: tick.total,
                    }),
                    result = &mut submit => break match result {
                        Ok(task_id) => Msg::TaskAccepted { task_id },
                        Err(err) => Msg::TransferFailed(err),
                    },
                }
            };
            while let Ok(tick) = tick_rx.try_recv() {
                driver.dispatch(Msg::TransferProgress {
                    sent: tick.sent,
                    total: tick.total,
                });
            }
            msg
        };
        driver.dispatch(accepted);
        let Some(task_id) = driver.open_stream.take() else {
            return driver.finish(cancel).await;
        };

        // Phase 2: one event at a time until a terminal event or failure.
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.transport.open_stream(route, &task_id) => Some(opened),
        };
        let mut stream = match opened {
            Some(Ok(stream)) => stream,
            Some(Err(err)) => {
                driver.dispatch(Msg::StreamFailed(err));
                return driver.finish(cancel).await;
            }
            None => {
                driver.dispatch(Msg::Cancelled);
                return driver.finish(cancel).await;
            }
        };

        while driver.outcome.is_none() {
            let has_timers = !driver.timers.is_empty();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => driver.dispatch(Msg::Cancelled),
                Some(message) = driver.timers.next(), if has_timers => {
                    driver.dispatch(Msg::SyntheticStatus(message));
                }
                item = stream.next() => match item {
                    Some(Ok(data)) => {
                        engine_debug!("Stream event for {}: {}", task_id, data);
                        driver.dispatch(Msg::ServerEvent(ServerEvent::decode(&data)));
                    }
                    Some(Err(err)) => driver.dispatch(Msg::StreamFailed(err)),
                    None => driver.dispatch(Msg::StreamFailed(UploadError::connection_lost())),
                },
            }
        }

        engine_info!("Closing progress stream for task {}", task_id);
        drop(stream);
        driver.finish(cancel).await
    }
}

enum Outcome {
    Completed { grace: Duration, result: UploadResult },
    Failed(UploadError),
}

/// Feeds messages through the session and carries out the resulting effects.
struct SessionDriver<'a> {
    session: Option<UploadSession>,
    sink: &'a dyn ProgressSink,
    timers: FuturesUnordered<BoxFuture<'static, String>>,
    open_stream: Option<String>,
    outcome: Option<Outcome>,
}

impl<'a> SessionDriver<'a> {
    fn new(session: UploadSession, sink: &'a dyn ProgressSink) -> Self {
        Self {
            session: Some(session),
            sink,
            timers: FuturesUnordered::new(),
            open_stream: None,
            outcome: None,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let Some(session) = self.session.take() else {
            return;
        };
        let (session, effects) = update(session, msg);
        self.session = Some(session);
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Progress(update) => self.sink.emit(update),
            Effect::OpenStream { task_id } => self.open_stream = Some(task_id),
            Effect::ScheduleStatus { delay, message } => {
                self.timers.push(Box::pin(async move {
                    tokio::time::sleep(delay).await;
                    message
                }));
            }
            Effect::Complete { grace, result } => {
                self.outcome = Some(Outcome::Completed { grace, result });
            }
            Effect::Fail(error) => self.outcome = Some(Outcome::Failed(error)),
        }
    }

    /// Resolves the outcome. A cancel during the completion grace still wins.
    async fn finish(self, cancel: &CancellationToken) -> Result<UploadResult, UploadError> {
        match self.outcome {
            Some(Outcome::Completed { grace, result }) => {
                // Lets the UI show 100% before the result replaces the progress view.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        engine_info!("Upload {} cancelled during completion grace", result.task_id);
                        Err(UploadError::cancelled())
                    }
                    _ = tokio::time::sleep(grace) => Ok(result),
                }
            }
            Some(Outcome::Failed(error)) => Err(error),
            None => Err(UploadError::new(
                FailureKind::InvalidResponse,
                "upload ended without a result",
            )),
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
