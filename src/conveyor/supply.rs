//! Content supply: the book-parsing collaborator that hands out window contents

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::SupplyError;
use crate::pagination::SEGMENT_CAPACITY;

const CHAPTER_EXTENSIONS: &[&str] = &["html", "xhtml", "htm", "txt"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub chapter_index: usize,
    pub html: String,
}

/// Everything needed to build one window's document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDescription {
    pub window_index: usize,
    pub first_chapter_index: usize,
    pub last_chapter_index: usize,
    pub chapters: Vec<ChapterContent>,
}

/// Optional initial position inside the first active window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub entry_chapter_index: usize,
    /// Page offset from the start of the entry chapter
    pub entry_page_index: usize,
}

/// Source of window contents. Called from the construction worker thread.
pub trait ContentSupply: Send + Sync {
    fn window_count(&self) -> usize;

    fn describe_window(&self, window_index: usize) -> Result<WindowDescription, SupplyError>;

    /// Window holding a chapter
    fn window_for_chapter(&self, chapter_index: usize) -> Option<usize>;
}

fn chapter_range(
    window_index: usize,
    chapters_per_window: usize,
    chapter_count: usize,
) -> std::ops::Range<usize> {
    let first = window_index * chapters_per_window;
    first..(first + chapters_per_window).min(chapter_count)
}

/// A window can never hold more chapters than its segment store keeps
fn clamp_chapters_per_window(requested: usize) -> usize {
    let clamped = requested.clamp(1, SEGMENT_CAPACITY);
    if clamped != requested {
        warn!("chapters_per_window {requested} out of range, using {clamped}");
    }
    clamped
}

fn window_count(chapter_count: usize, chapters_per_window: usize) -> usize {
    chapter_count.div_ceil(chapters_per_window)
}

/// Chapters held in memory, grouped a fixed number per window
#[derive(Debug, Clone)]
pub struct InMemorySupply {
    chapters: Vec<String>,
    chapters_per_window: usize,
}

impl InMemorySupply {
    pub fn new(chapters: Vec<String>, chapters_per_window: usize) -> Self {
        Self {
            chapters,
            chapters_per_window: clamp_chapters_per_window(chapters_per_window),
        }
    }
}

impl ContentSupply for InMemorySupply {
    fn window_count(&self) -> usize {
        window_count(self.chapters.len(), self.chapters_per_window)
    }

    fn describe_window(&self, window_index: usize) -> Result<WindowDescription, SupplyError> {
        let count = self.window_count();
        if window_index >= count {
            return Err(SupplyError::WindowOutOfRange {
                window_index,
                window_count: count,
            });
        }
        let range = chapter_range(window_index, self.chapters_per_window, self.chapters.len());
        Ok(WindowDescription {
            window_index,
            first_chapter_index: range.start,
            last_chapter_index: range.end - 1,
            chapters: range
                .map(|chapter_index| ChapterContent {
                    chapter_index,
                    html: self.chapters[chapter_index].clone(),
                })
                .collect(),
        })
    }

    fn window_for_chapter(&self, chapter_index: usize) -> Option<usize> {
        (chapter_index < self.chapters.len()).then(|| chapter_index / self.chapters_per_window)
    }
}

/// Chapter files in a directory, ordered by file name and read on demand
#[derive(Debug, Clone)]
pub struct DirectorySupply {
    files: Vec<PathBuf>,
    chapters_per_window: usize,
}

impl DirectorySupply {
    pub fn open(dir: &Path, chapters_per_window: usize) -> Result<Self, SupplyError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SupplyError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();
            let is_chapter = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CHAPTER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if entry.file_type().is_file() && is_chapter {
                files.push(path.to_path_buf());
            }
        }
        if files.is_empty() {
            return Err(SupplyError::EmptyBook);
        }
        files.sort();
        info!("found {} chapters in {dir:?}", files.len());
        Ok(Self {
            files,
            chapters_per_window: clamp_chapters_per_window(chapters_per_window),
        })
    }

    pub fn chapter_count(&self) -> usize {
        self.files.len()
    }

    fn read_chapter(&self, chapter_index: usize) -> Result<String, SupplyError> {
        let path = &self.files[chapter_index];
        let content = fs::read_to_string(path).map_err(|source| SupplyError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("read chapter {chapter_index} from {path:?}");
        let is_text = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        Ok(if is_text {
            text_to_html(&content)
        } else {
            content
        })
    }
}

impl ContentSupply for DirectorySupply {
    fn window_count(&self) -> usize {
        window_count(self.files.len(), self.chapters_per_window)
    }

    fn describe_window(&self, window_index: usize) -> Result<WindowDescription, SupplyError> {
        let count = self.window_count();
        if window_index >= count {
            return Err(SupplyError::WindowOutOfRange {
                window_index,
                window_count: count,
            });
        }
        let range = chapter_range(window_index, self.chapters_per_window, self.files.len());
        let mut chapters = Vec::with_capacity(range.len());
        for chapter_index in range.clone() {
            chapters.push(ChapterContent {
                chapter_index,
                html: self.read_chapter(chapter_index)?,
            });
        }
        Ok(WindowDescription {
            window_index,
            first_chapter_index: range.start,
            last_chapter_index: range.end - 1,
            chapters,
        })
    }

    fn window_for_chapter(&self, chapter_index: usize) -> Option<usize> {
        (chapter_index < self.files.len()).then(|| chapter_index / self.chapters_per_window)
    }
}

/// Wrap blank-line separated paragraphs of plain text in `<p>` elements
pub fn text_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| {
            let escaped = para
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!("<p>{escaped}</p>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
