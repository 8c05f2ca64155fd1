/// The stage of an [`UploadBody`](crate::UploadBody) stream.
///
/// Phases only ever move forward: `Head` -> `Body` -> `Tail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Sending the multipart preamble.
    #[default]
    Head,
    /// Sending the file content.
    Body,
    /// Sending the extra fields and the closing boundary.
    Tail,
}

impl Phase {
    /// The phase following this one, `None` for `Tail`.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Head => Some(Phase::Body),
            Phase::Body => Some(Phase::Tail),
            Phase::Tail => None,
        }
    }
}
