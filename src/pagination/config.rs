use serde::{Deserialize, Serialize};

use crate::error::PaginationError;

/// What one pagination document holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// A run of chapters managed by the window conveyor
    #[default]
    Window,
    /// A single chapter document
    Chapter,
}

/// Per-document session configuration, validated once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: PaginationMode,

    pub window_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_index: Option<usize>,

    /// Selector of the content container inside the host document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,

    /// Expose diagnostics snapshots
    #[serde(default)]
    pub diagnostics: bool,
}

impl SessionConfig {
    pub fn window(window_index: usize) -> Self {
        Self {
            mode: PaginationMode::Window,
            window_index,
            chapter_index: None,
            root_selector: None,
            diagnostics: false,
        }
    }

    pub fn chapter(window_index: usize, chapter_index: usize) -> Self {
        Self {
            mode: PaginationMode::Chapter,
            chapter_index: Some(chapter_index),
            ..Self::window(window_index)
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.mode == PaginationMode::Chapter && self.chapter_index.is_none() {
            return Err(PaginationError::InvalidConfig(
                "chapter mode requires a chapter index".to_string(),
            ));
        }
        if let Some(selector) = &self.root_selector {
            if selector.trim().is_empty() {
                return Err(PaginationError::InvalidConfig(
                    "root selector must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
