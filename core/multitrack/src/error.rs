use thiserror::Error;

/// Failure of the external decode step. Terminal for that `init` attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("failed to parse audio data: {0}")]
    Malformed(String),
    #[error("unsupported channel count {0}, only mono or stereo is supported")]
    UnsupportedChannels(u16),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("decoded buffer is empty")]
    Empty,
}

/// Misuse of a one-shot buffer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("buffer source has already been started")]
    AlreadyStarted,
    #[error("buffer source was stopped before it started")]
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("track is not ready, call init first")]
    NotReady,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("no track with id {0}")]
    UnknownTrack(String),
}
