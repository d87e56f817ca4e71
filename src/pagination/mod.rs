//! In-surface pagination: column layout, session state, segments, offsets and boundaries

mod boundary;
mod config;
mod diagnostics;
mod layout;
mod offsets;
mod retry;
mod segments;
mod session;

use std::time::Duration;

pub use boundary::BoundaryDetector;
pub use config::{PaginationMode, SessionConfig};
pub use diagnostics::DiagnosticsSnapshot;
pub use layout::{ColumnLayout, LayoutPass};
pub use offsets::CharacterOffsetIndex;
pub use retry::RetryPolicy;
pub use segments::{ChapterSegment, ConstructionState, EvictionReport, SegmentStore};
pub use session::{ChapterJump, LayoutStatus, PageTurn, PaginationSession, SessionState};

/// Viewport widths below this are treated as unmeasured
pub const MIN_MEASURABLE_WIDTH: f32 = 10.0;
/// Provisional column width used while the viewport is unmeasurable
pub const FALLBACK_COLUMN_WIDTH: f32 = 360.0;
pub const MAX_LAYOUT_RETRIES: u32 = 5;
pub const LAYOUT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Passive scroll updates are ignored for this long after a programmatic navigation
pub const NAVIGATION_GUARD_TIMEOUT: Duration = Duration::from_millis(600);
/// Upper bound on a smooth scroll; reached without a completion signal counts as completion
pub const SCROLL_FALLBACK_TIMEOUT: Duration = Duration::from_millis(500);

pub const SEGMENT_CAPACITY: usize = 5;
pub const EVICTION_HYSTERESIS: Duration = Duration::from_millis(500);

pub const BOUNDARY_THRESHOLD: f32 = 0.9;

/// Direction of travel through the book
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Next => Direction::Previous,
            Direction::Previous => Direction::Next,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}
