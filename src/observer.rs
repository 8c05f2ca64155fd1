use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A diagnostic event emitted by an [`UploadBody`](crate::UploadBody).
#[derive(Debug)]
#[non_exhaustive]
pub enum Milestone<'a> {
    /// The multipart head and tail segments were built.
    SegmentsBuilt { head_len: usize, tail_len: usize },
    /// A read was requested with a buffer of this size. Only emitted while mirroring.
    BufferSize(usize),
    /// The mirror file was opened, or failed to open.
    MirrorOpened { path: &'a Path, error: Option<&'a io::Error> },
    /// Bytes were copied to the mirror file.
    Mirrored { written: usize, error: Option<&'a io::Error> },
    /// The stream was closed, either at exhaustion or explicitly.
    Closed { delivered: u64, source_bytes: u64 },
}

impl Display for Milestone<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::SegmentsBuilt { head_len, tail_len } => {
                write!(f, "segments built, head: {} bytes, tail: {} bytes", head_len, tail_len)
            }
            Milestone::BufferSize(size) => write!(f, "buffer size is: {}", size),
            Milestone::MirrorOpened { path, error: None } => write!(f, "opened mirror file {}", path.display()),
            Milestone::MirrorOpened { path, error: Some(err) } => {
                write!(f, "failed to open mirror file {}: {}", path.display(), err)
            }
            Milestone::Mirrored { written, error: None } => write!(f, "mirrored {} bytes", written),
            Milestone::Mirrored { written, error: Some(err) } => {
                write!(f, "mirrored {} bytes, then failed: {}", written, err)
            }
            Milestone::Closed { delivered, source_bytes } => {
                write!(f, "closed after {} bytes, file bytes: {}", delivered, source_bytes)
            }
        }
    }
}

/// Receives [`Milestone`]s of one upload stream, tagged with the stream's trace id.
///
/// Any `Fn(&str, &Milestone<'_>)` closure is an observer.
pub trait Observer: Send + Sync {
    fn on_milestone(&self, trace_id: &str, milestone: &Milestone<'_>);
}

impl<F> Observer for F
where
    F: Fn(&str, &Milestone<'_>) + Send + Sync,
{
    fn on_milestone(&self, trace_id: &str, milestone: &Milestone<'_>) {
        self(trace_id, milestone)
    }
}

/// An [`Observer`] forwarding every milestone to [`log::debug!`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_milestone(&self, trace_id: &str, milestone: &Milestone<'_>) {
        log::debug!("[{}] {}", trace_id, milestone);
    }
}

/// The trace id and optional observer of one stream.
#[derive(Clone, Default)]
pub(crate) struct Notifier {
    pub(crate) trace_id: String,
    pub(crate) observer: Option<Arc<dyn Observer>>,
}

impl Notifier {
    pub(crate) fn emit(&self, milestone: Milestone<'_>) {
        if let Some(observer) = &self.observer {
            observer.on_milestone(&self.trace_id, &milestone);
        }
    }
}
