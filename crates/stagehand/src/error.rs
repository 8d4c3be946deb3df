//! Error taxonomy for the orchestration engine.
//!
//! The engine itself performs no I/O; every failure here originates in a
//! host [`Transition`](crate::transition::Transition) implementation and is
//! tagged with the orchestration phase it surfaced in.

/// Convenience alias used throughout the crate.
pub type StagehandResult<T> = Result<T, StagehandError>;

/// Errors surfaced by the orchestration engine.
#[derive(thiserror::Error, Debug)]
pub enum StagehandError {
    /// A host transition failed while capturing pre-change values.
    #[error("start-state capture failed")]
    CaptureStart(#[source] anyhow::Error),

    /// A host transition failed while capturing post-change values at the
    /// frame boundary.
    #[error("end-state capture failed")]
    CaptureEnd(#[source] anyhow::Error),

    /// A host transition failed to start playback.
    #[error("playback failed")]
    Playback(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        let err = StagehandError::CaptureStart(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "start-state capture failed");

        let err = StagehandError::CaptureEnd(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "end-state capture failed");

        let err = StagehandError::Playback(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "playback failed");
    }

    #[test]
    fn source_is_preserved() {
        let base = std::io::Error::other("device lost");
        let err = StagehandError::Playback(anyhow::Error::new(base));
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("device lost"));
    }

    #[test]
    fn other_is_transparent() {
        let err: StagehandError = anyhow::anyhow!("from the host").into();
        assert_eq!(err.to_string(), "from the host");
    }
}
