//! Error types shared by the pagination core and the window conveyor

use std::path::PathBuf;

/// Failures reported by a [`crate::surface::DocumentSurface`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("chapter {chapter_index} has malformed content: {reason}")]
    MalformedContent { chapter_index: usize, reason: String },

    #[error("layout flush failed: {0}")]
    LayoutFailed(String),
}

/// Contract violations and failures raised by a pagination session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaginationError {
    /// Segment mutation attempted on a window that has already been finalized
    #[error("cannot {operation} in window {window_index}: window is active")]
    InvalidState {
        operation: &'static str,
        window_index: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid font size {0}px")]
    InvalidFontSize(f32),

    #[error("chapter {0} is already loaded in this window")]
    DuplicateChapter(usize),

    #[error("window {window_index} holds {chapters} chapters, more than the {capacity} it can keep")]
    OverCapacity {
        window_index: usize,
        chapters: usize,
        capacity: usize,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl PaginationError {
    /// True for errors that indicate a caller broke the construction/active contract
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Failures from the external content supplier
#[derive(Debug, thiserror::Error)]
pub enum SupplyError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("window {window_index} is outside the book ({window_count} windows)")]
    WindowOutOfRange {
        window_index: usize,
        window_count: usize,
    },

    #[error("book has no chapters")]
    EmptyBook,

    #[error("construction worker: {detail}")]
    Worker { detail: String },
}

impl SupplyError {
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker { detail: msg.into() }
    }
}

/// Failures raised while building or rebuilding the window ring
#[derive(Debug, thiserror::Error)]
pub enum ConveyorError {
    #[error(transparent)]
    Supply(#[from] SupplyError),

    #[error("window {window_index}: {source}")]
    Window {
        window_index: usize,
        #[source]
        source: PaginationError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_is_detectable() {
        let err = PaginationError::InvalidState {
            operation: "append",
            window_index: 3,
        };
        assert!(err.is_invalid_state());
        assert_eq!(
            err.to_string(),
            "cannot append in window 3: window is active"
        );
        assert!(!PaginationError::DuplicateChapter(3).is_invalid_state());
    }

    #[test]
    fn surface_errors_convert() {
        let err: PaginationError = SurfaceError::LayoutFailed("detached".into()).into();
        assert_eq!(err.to_string(), "layout flush failed: detached");
    }
}
