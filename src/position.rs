use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the reader is, in a form that survives relayout and restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub window_index: usize,
    pub chapter_index: Option<usize>,
    pub page_index: usize,
    /// Offset into the window's visible text; preferred over `page_index` on restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_offset: Option<usize>,
    pub recorded_at: DateTime<Utc>,
}

impl ReadingPosition {
    pub fn new(
        window_index: usize,
        chapter_index: Option<usize>,
        page_index: usize,
        char_offset: Option<usize>,
    ) -> Self {
        Self {
            window_index,
            chapter_index,
            page_index,
            char_offset,
            recorded_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
