use serde::Serialize;

use crate::conveyor::Phase;

/// On-demand state dump for external logging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub client_width: f32,
    pub applied_column_width: f32,
    pub page_count: usize,
    pub current_page: usize,
    pub current_chapter: Option<usize>,
    pub loaded_segments: Vec<usize>,
    /// Filled in by the conveyor; a bare session has no phase
    pub phase: Option<Phase>,
}
