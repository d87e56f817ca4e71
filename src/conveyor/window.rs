use std::sync::Arc;

use log::debug;

use super::supply::WindowDescription;
use crate::clock::Clock;
use crate::error::PaginationError;
use crate::events::EventBus;
use crate::headless_surface::HeadlessSurface;
use crate::pagination::{
    ConstructionState, LayoutStatus, PaginationSession, SEGMENT_CAPACITY, SessionConfig,
};
use crate::surface::DocumentSurface;

/// Creates the document surface for a newly constructed window
pub trait SurfaceFactory {
    type Surface: DocumentSurface;

    fn create(&mut self, window_index: usize) -> Self::Surface;
}

/// Headless surfaces of a fixed viewport size
#[derive(Debug, Clone, Copy)]
pub struct HeadlessSurfaceFactory {
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    type Surface = HeadlessSurface;

    fn create(&mut self, _window_index: usize) -> HeadlessSurface {
        HeadlessSurface::new(self.viewport_width, self.viewport_height)
    }
}

/// Settings every window session starts from
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowDefaults {
    pub diagnostics: bool,
    pub font_size: Option<f32>,
    pub smooth_paging: bool,
}

/// A contiguous run of chapters rendered as one paginated document
pub struct Window<S: DocumentSurface> {
    pub index: usize,
    pub first_chapter_index: usize,
    pub last_chapter_index: usize,
    session: PaginationSession<S>,
}

impl<S: DocumentSurface> Window<S> {
    /// Load every chapter, lay out eagerly and freeze the segment set
    pub fn build(
        description: WindowDescription,
        surface: S,
        clock: Arc<dyn Clock>,
        events: EventBus,
        defaults: WindowDefaults,
    ) -> Result<Self, PaginationError> {
        // Appending past capacity would evict the window's own first chapters
        if description.chapters.len() > SEGMENT_CAPACITY {
            return Err(PaginationError::OverCapacity {
                window_index: description.window_index,
                chapters: description.chapters.len(),
                capacity: SEGMENT_CAPACITY,
            });
        }
        let config = SessionConfig::window(description.window_index)
            .with_diagnostics(defaults.diagnostics);
        let mut session = PaginationSession::new(config, surface, clock, events)?;
        session.set_smooth_paging(defaults.smooth_paging);
        if let Some(px) = defaults.font_size {
            session.set_font_size(px)?;
        }

        for chapter in &description.chapters {
            session.append_chapter(chapter.chapter_index, &chapter.html)?;
        }

        let status = session.initialize();
        session.finalize();
        let segments = session.segments();
        let first_chapter_index = segments
            .first_chapter()
            .unwrap_or(description.first_chapter_index);
        let last_chapter_index = segments
            .last_chapter()
            .unwrap_or(description.last_chapter_index);
        debug!(
            "window {} built: chapters {first_chapter_index}..={last_chapter_index}, {status:?}",
            description.window_index
        );

        Ok(Self {
            index: description.window_index,
            first_chapter_index,
            last_chapter_index,
            session,
        })
    }

    pub fn session(&self) -> &PaginationSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PaginationSession<S> {
        &mut self.session
    }

    pub fn construction_state(&self) -> ConstructionState {
        self.session.construction_state()
    }

    pub fn holds_chapter(&self, chapter_index: usize) -> bool {
        (self.first_chapter_index..=self.last_chapter_index).contains(&chapter_index)
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn relayout(&mut self) -> LayoutStatus {
        self.session.reflow(true)
    }
}

impl<S: DocumentSurface> std::fmt::Debug for Window<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("index", &self.index)
            .field("chapters", &(self.first_chapter_index..=self.last_chapter_index))
            .field("state", &self.construction_state())
            .field("pages", &self.session.page_count())
            .finish()
    }
}
