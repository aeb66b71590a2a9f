//! Error types for oggsniff

/// Errors that can surface from a detection call.
///
/// Inputs that are not Ogg at all, short payloads and unknown codecs are not
/// errors; they resolve to a [`Verdict`](crate::Verdict).
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The underlying byte source failed while being read or rewound
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = DetectError> = std::result::Result<T, E>;
