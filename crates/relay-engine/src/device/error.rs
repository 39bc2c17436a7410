use std::fmt;
use std::thread::ThreadId;

/// High-level response after a swapchain error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Violation of the single-thread context contract.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextError {
    /// The calling thread does not own the context.
    WrongThread { owner: ThreadId, caller: ThreadId },
    /// A frame operation was issued without first making the context current.
    NotCurrent,
    /// Transfer attempted while some thread still has the context current.
    StillCurrent,
    /// The context has been invalidated (surface lost or torn down).
    Invalid,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongThread { owner, caller } => write!(
                f,
                "context is owned by thread {owner:?}, not by calling thread {caller:?}"
            ),
            Self::StillCurrent => f.write_str("context is still current; release it before transfer"),
            Self::NotCurrent => f.write_str("context is not current on the calling thread"),
            Self::Invalid => f.write_str("context is not valid"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Outcome of a failed frame acquisition or presentation.
#[derive(Debug)]
pub enum FrameError {
    /// Nothing was drawn this iteration; the loop continues.
    Skipped,
    /// The context is unusable; the loop terminates.
    Fatal(anyhow::Error),
}

impl FrameError {
    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        Self::Fatal(err.into())
    }
}

impl From<SurfaceErrorAction> for FrameError {
    fn from(action: SurfaceErrorAction) -> Self {
        match action {
            SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Self::Skipped,
            SurfaceErrorAction::Fatal => {
                Self::fatal(anyhow::anyhow!("surface reported an unrecoverable error"))
            }
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("frame skipped"),
            Self::Fatal(err) => write!(f, "fatal frame error: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_surface_errors_skip_the_frame() {
        assert!(matches!(FrameError::from(SurfaceErrorAction::Reconfigured), FrameError::Skipped));
        assert!(matches!(FrameError::from(SurfaceErrorAction::SkipFrame), FrameError::Skipped));
        assert!(matches!(FrameError::from(SurfaceErrorAction::Fatal), FrameError::Fatal(_)));
    }

    #[test]
    fn context_errors_convert_into_fatal_frame_errors() {
        let err = FrameError::fatal(ContextError::NotCurrent);
        assert_eq!(
            err.to_string(),
            "fatal frame error: context is not current on the calling thread"
        );
    }
}
