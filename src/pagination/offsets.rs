//! Page index <-> character offset map for font-size independent positions

use crate::surface::DocumentSurface;

#[derive(Debug, Clone, Default)]
pub struct CharacterOffsetIndex {
    offsets: Vec<usize>,
    text_length: usize,
}

impl CharacterOffsetIndex {
    /// Sample the surface at each page's left edge. Offsets are forced non-decreasing.
    pub fn build<S: DocumentSurface + ?Sized>(
        surface: &S,
        page_count: usize,
        page_width: f32,
    ) -> Self {
        let mut offsets = Vec::with_capacity(page_count);
        let mut floor = 0;
        for page in 0..page_count {
            let offset = surface.text_offset_at(page as f32 * page_width).max(floor);
            offsets.push(offset);
            floor = offset;
        }
        Self {
            offsets,
            text_length: surface.text_length(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn text_length(&self) -> usize {
        self.text_length
    }

    /// Offset of the first character on `page`; pages past the end clamp to the last page
    pub fn offset_for_page(&self, page: usize) -> Option<usize> {
        let last = self.offsets.len().checked_sub(1)?;
        self.offsets.get(page.min(last)).copied()
    }

    /// Last page whose first character is at or before `offset`
    pub fn page_for_offset(&self, offset: usize) -> Option<usize> {
        if self.offsets.is_empty() {
            return None;
        }
        let after = self.offsets.partition_point(|&start| start <= offset);
        Some(after.saturating_sub(1))
    }
}
