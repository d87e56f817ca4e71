//! Boundary between the pagination core and the host document surface

use crate::error::SurfaceError;

/// Layout-affecting style applied to the content container
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnStyle {
    pub column_width: f32,
    pub column_gap: f32,
    /// Font-size override in px; `None` keeps the surface default
    pub font_size: Option<f32>,
}

/// Where a chapter fragment goes relative to the fragments already present
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentPosition {
    Start,
    End,
}

/// One window's rendered document.
///
/// All calls happen on the thread that owns the pagination session. Scroll
/// offsets and widths are in the surface's px-equivalent units.
pub trait DocumentSurface {
    /// Width of the visible viewport (clientWidth)
    fn viewport_width(&self) -> f32;

    fn apply_column_style(&mut self, style: ColumnStyle);

    /// Force a synchronous layout and return the horizontal scroll extent
    fn flush_layout(&mut self) -> Result<f32, SurfaceError>;

    /// Pin the scrollable extent of the content container
    fn set_content_width(&mut self, width: f32);

    /// Current horizontal scroll position
    fn scroll_offset(&self) -> f32;

    /// Request a scroll. A smooth scroll may complete later, or never signal completion.
    fn scroll_to(&mut self, offset: f32, smooth: bool);

    /// Parse and insert a chapter's markup
    fn insert_fragment(
        &mut self,
        position: FragmentPosition,
        chapter_index: usize,
        html: &str,
    ) -> Result<(), SurfaceError>;

    /// Insert a chapter's content verbatim as text; never fails
    fn insert_text(&mut self, position: FragmentPosition, chapter_index: usize, raw: &str);

    fn remove_fragment(&mut self, chapter_index: usize) -> bool;

    /// Horizontal offset of the first column holding the chapter, if it is present
    fn fragment_offset(&self, chapter_index: usize) -> Option<f32>;

    /// Number of text characters in the document
    fn text_length(&self) -> usize;

    /// Character offset of the first glyph visible at a horizontal scroll position
    fn text_offset_at(&self, scroll_x: f32) -> usize;
}
