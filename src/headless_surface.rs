//! In-process document surface with a fixed-metric text layout.
//!
//! Models a column-layout document the way an embedded web view lays one out:
//! glyph advance and line height derive from the font size, each chapter
//! fragment starts on a fresh line, and text flows top-to-bottom through
//! viewport-height columns placed left-to-right. Used by the CLI and tests.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::SurfaceError;
use crate::surface::{ColumnStyle, DocumentSurface, FragmentPosition};

pub const DEFAULT_FONT_SIZE: f32 = 16.0;
const GLYPH_ADVANCE_EM: f32 = 0.5;
const LINE_HEIGHT_EM: f32 = 1.5;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)[^<>]*?(/?)>").expect("Failed to compile tag regex")
});
static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("Failed to compile markup regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

#[derive(Debug, Clone)]
struct Fragment {
    chapter_index: usize,
    chars: usize,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    viewport_width: f32,
    viewport_height: f32,
    style: ColumnStyle,
    fragments: Vec<Fragment>,
    content_width: Option<f32>,
    scroll_offset: f32,
    pending_scroll: Option<f32>,
    animate: bool,
    fail_next_flush: bool,
    flush_count: usize,
}

impl HeadlessSurface {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            style: ColumnStyle {
                column_width: viewport_width,
                column_gap: 0.0,
                font_size: None,
            },
            fragments: Vec::new(),
            content_width: None,
            scroll_offset: 0.0,
            pending_scroll: None,
            animate: false,
            fail_next_flush: false,
            flush_count: 0,
        }
    }

    /// Keep smooth scrolls pending until [`HeadlessSurface::settle_scroll`] is called
    pub fn with_animation(mut self) -> Self {
        self.animate = true;
        self
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }

    /// Make the next layout flush fail once
    pub fn fail_next_flush(&mut self) {
        self.fail_next_flush = true;
    }

    /// Land a pending smooth scroll, returning the offset it landed on
    pub fn settle_scroll(&mut self) -> Option<f32> {
        let target = self.pending_scroll.take()?;
        self.scroll_offset = target;
        Some(target)
    }

    /// Jump the scroll position without going through the session (user drag)
    pub fn drag_to(&mut self, offset: f32) {
        self.pending_scroll = None;
        self.scroll_offset = self.clamp_scroll(offset);
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn content_width(&self) -> Option<f32> {
        self.content_width
    }

    pub fn style(&self) -> ColumnStyle {
        self.style
    }

    pub fn chapter_indices(&self) -> Vec<usize> {
        self.fragments.iter().map(|f| f.chapter_index).collect()
    }

    fn font_size(&self) -> f32 {
        self.style.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    fn chars_per_line(&self) -> usize {
        let advance = self.font_size() * GLYPH_ADVANCE_EM;
        ((self.style.column_width / advance).floor() as usize).max(1)
    }

    fn lines_per_column(&self) -> usize {
        let line_height = self.font_size() * LINE_HEIGHT_EM;
        ((self.viewport_height / line_height).floor() as usize).max(1)
    }

    fn column_stride(&self) -> f32 {
        self.style.column_width + self.style.column_gap
    }

    fn fragment_lines(&self, fragment: &Fragment) -> usize {
        fragment.chars.div_ceil(self.chars_per_line()).max(1)
    }

    fn total_lines(&self) -> usize {
        self.fragments.iter().map(|f| self.fragment_lines(f)).sum()
    }

    fn clamp_scroll(&self, offset: f32) -> f32 {
        let max = self
            .content_width
            .map_or(f32::MAX, |w| (w - self.style.column_width).max(0.0));
        offset.clamp(0.0, max)
    }

    fn push_fragment(&mut self, position: FragmentPosition, chapter_index: usize, chars: usize) {
        let fragment = Fragment {
            chapter_index,
            chars,
        };
        match position {
            FragmentPosition::Start => self.fragments.insert(0, fragment),
            FragmentPosition::End => self.fragments.push(fragment),
        }
    }
}

/// Strip markup and collapse whitespace the way text extraction on a rendered document would
pub fn visible_text(html: &str) -> String {
    let stripped = ANY_TAG_RE.replace_all(html, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn check_markup(chapter_index: usize, html: &str) -> Result<(), SurfaceError> {
    let malformed = |reason: String| SurfaceError::MalformedContent {
        chapter_index,
        reason,
    };

    let mut open: Vec<String> = Vec::new();
    for caps in TAG_RE.captures_iter(html) {
        let name = caps[2].to_ascii_lowercase();
        let closing = !caps[1].is_empty();
        let self_closing = !caps[3].is_empty();
        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }
        if closing {
            match open.pop() {
                Some(expected) if expected == name => {}
                Some(expected) => {
                    return Err(malformed(format!("</{name}> closes <{expected}>")));
                }
                None => return Err(malformed(format!("stray </{name}>"))),
            }
        } else {
            open.push(name);
        }
    }
    if let Some(unclosed) = open.pop() {
        return Err(malformed(format!("unclosed <{unclosed}>")));
    }
    if ANY_TAG_RE.replace_all(html, "").contains('<') {
        return Err(malformed("dangling '<'".to_string()));
    }
    Ok(())
}

impl DocumentSurface for HeadlessSurface {
    fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    fn apply_column_style(&mut self, style: ColumnStyle) {
        self.style = style;
        // Explicit width is dropped until the engine pins it again
        self.content_width = None;
    }

    fn flush_layout(&mut self) -> Result<f32, SurfaceError> {
        self.flush_count += 1;
        if self.fail_next_flush {
            self.fail_next_flush = false;
            return Err(SurfaceError::LayoutFailed("injected failure".to_string()));
        }
        let columns = self.total_lines().div_ceil(self.lines_per_column()).max(1);
        let extent = columns as f32 * self.style.column_width
            + (columns - 1) as f32 * self.style.column_gap;
        debug!(
            "headless layout: {} fragments, {} columns, extent {extent}",
            self.fragments.len(),
            columns
        );
        Ok(extent)
    }

    fn set_content_width(&mut self, width: f32) {
        self.content_width = Some(width);
        self.scroll_offset = self.clamp_scroll(self.scroll_offset);
    }

    fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    fn scroll_to(&mut self, offset: f32, smooth: bool) {
        let target = self.clamp_scroll(offset);
        if smooth && self.animate {
            self.pending_scroll = Some(target);
        } else {
            self.pending_scroll = None;
            self.scroll_offset = target;
        }
    }

    fn insert_fragment(
        &mut self,
        position: FragmentPosition,
        chapter_index: usize,
        html: &str,
    ) -> Result<(), SurfaceError> {
        check_markup(chapter_index, html)?;
        let chars = visible_text(html).chars().count();
        self.push_fragment(position, chapter_index, chars);
        Ok(())
    }

    fn insert_text(&mut self, position: FragmentPosition, chapter_index: usize, raw: &str) {
        let chars = raw.chars().count();
        self.push_fragment(position, chapter_index, chars);
    }

    fn remove_fragment(&mut self, chapter_index: usize) -> bool {
        let before = self.fragments.len();
        self.fragments.retain(|f| f.chapter_index != chapter_index);
        self.fragments.len() != before
    }

    fn fragment_offset(&self, chapter_index: usize) -> Option<f32> {
        let mut line = 0;
        for fragment in &self.fragments {
            if fragment.chapter_index == chapter_index {
                let column = line / self.lines_per_column();
                return Some(column as f32 * self.column_stride());
            }
            line += self.fragment_lines(fragment);
        }
        None
    }

    fn text_length(&self) -> usize {
        self.fragments.iter().map(|f| f.chars).sum()
    }

    fn text_offset_at(&self, scroll_x: f32) -> usize {
        let stride = self.column_stride().max(1.0);
        let column = (scroll_x.max(0.0) / stride + 1e-3).floor() as usize;
        let target_line = column * self.lines_per_column();
        let per_line = self.chars_per_line();

        let mut line = 0;
        let mut chars = 0;
        for fragment in &self.fragments {
            let lines = self.fragment_lines(fragment);
            if target_line < line + lines {
                let within = (target_line - line) * per_line;
                return chars + within.min(fragment.chars);
            }
            line += lines;
            chars += fragment.chars;
        }
        chars
    }
}
