//! Pagination session: the single owner of one window's page state

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use super::boundary::BoundaryDetector;
use super::config::SessionConfig;
use super::diagnostics::DiagnosticsSnapshot;
use super::layout::ColumnLayout;
use super::offsets::CharacterOffsetIndex;
use super::retry::RetryPolicy;
use super::segments::{ConstructionState, SegmentStore};
use super::{Direction, NAVIGATION_GUARD_TIMEOUT, SCROLL_FALLBACK_TIMEOUT};
use crate::clock::Clock;
use crate::error::PaginationError;
use crate::events::{EventBus, ReaderEventKind};
use crate::surface::DocumentSurface;

/// Lifecycle of a session's layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Laid out with a fallback width, or the last layout failed
    Provisional,
    Ready,
    /// Relayout in progress; navigation is queued until position is restored
    Reflowing,
}

/// Result of a layout attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutStatus {
    Ready { page_count: usize },
    /// Waiting on a scheduled remeasurement
    Provisional,
    Failed,
    /// Session not initialized yet; the change applies on the first layout
    Deferred,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageTurn {
    Moved(usize),
    /// Already on the edge page; a boundary event was raised instead
    AtBoundary(Direction),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChapterJump {
    Landed(usize),
    NotLoaded,
}

/// Where to put the reader once a relayout completes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RestoreTarget {
    Page(usize),
    CharOffset(usize),
    /// Same page within the same chapter, for mutations that shift chapter positions
    Anchor {
        chapter_index: usize,
        page_in_chapter: usize,
        fallback_page: usize,
    },
}

pub struct PaginationSession<S: DocumentSurface> {
    config: SessionConfig,
    surface: S,
    clock: Arc<dyn Clock>,
    events: EventBus,
    layout: ColumnLayout,
    segments: SegmentStore,
    offsets: CharacterOffsetIndex,
    boundary: BoundaryDetector,
    state: SessionState,
    ready: bool,
    current_page: usize,
    page_count: usize,
    applied_width: f32,
    font_size: Option<f32>,
    smooth_paging: bool,
    guard_until: Option<Instant>,
    scroll_deadline: Option<Instant>,
    pending_restore: Option<RestoreTarget>,
    queued_navigation: Option<(isize, bool)>,
}

impl<S: DocumentSurface> PaginationSession<S> {
    pub fn new(
        config: SessionConfig,
        surface: S,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Result<Self, PaginationError> {
        Self::with_retry_policy(config, surface, clock, events, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        config: SessionConfig,
        surface: S,
        clock: Arc<dyn Clock>,
        events: EventBus,
        policy: RetryPolicy,
    ) -> Result<Self, PaginationError> {
        config.validate()?;
        let window_index = config.window_index;
        Ok(Self {
            config,
            surface,
            clock,
            events,
            layout: ColumnLayout::new(policy),
            segments: SegmentStore::new(window_index),
            offsets: CharacterOffsetIndex::default(),
            boundary: BoundaryDetector::default(),
            state: SessionState::Uninitialized,
            ready: false,
            current_page: 0,
            page_count: 1,
            applied_width: 0.0,
            font_size: None,
            smooth_paging: false,
            guard_until: None,
            scroll_deadline: None,
            pending_restore: None,
            queued_navigation: None,
        })
    }

    pub fn window_index(&self) -> usize {
        self.config.window_index
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True only once a layout with a real width and page count has completed
    pub fn is_ready(&self) -> bool {
        self.ready && self.applied_width > 0.0 && self.page_count > 0
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn applied_width(&self) -> f32 {
        self.applied_width
    }

    pub fn font_size(&self) -> Option<f32> {
        self.font_size
    }

    /// Tracked page without resynchronizing from the scroll position
    pub fn tracked_page(&self) -> usize {
        self.current_page
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub fn construction_state(&self) -> ConstructionState {
        self.segments.state()
    }

    pub fn set_smooth_paging(&mut self, smooth: bool) {
        self.smooth_paging = smooth;
    }

    pub fn navigation_in_flight(&self) -> bool {
        self.guard_until
            .is_some_and(|until| self.clock.now() < until)
    }

    /// Replace the configuration. Moving to a chapter re-positions when ready.
    pub fn configure(&mut self, config: SessionConfig) -> Result<(), PaginationError> {
        config.validate()?;
        let chapter = config.chapter_index;
        self.config = config;
        if let Some(chapter_index) = chapter {
            if self.is_ready() {
                self.jump_to_chapter(chapter_index, false);
            }
        }
        Ok(())
    }

    /// First layout of the document (also used to preload a window ahead of display)
    pub fn initialize(&mut self) -> LayoutStatus {
        self.layout.begin_cycle();
        let restore = match self.config.chapter_index {
            Some(chapter_index) => RestoreTarget::Anchor {
                chapter_index,
                page_in_chapter: 0,
                fallback_page: self.current_page,
            },
            None => RestoreTarget::Page(self.current_page),
        };
        self.run_layout(restore)
    }

    /// Relayout after a content or viewport change
    pub fn reflow(&mut self, preserve_position: bool) -> LayoutStatus {
        let restore = if preserve_position {
            RestoreTarget::Page(self.current_page)
        } else {
            RestoreTarget::Page(0)
        };
        self.begin_reflow(restore)
    }

    /// Change the font size, keeping the reader on the same text
    pub fn set_font_size(&mut self, px: f32) -> Result<LayoutStatus, PaginationError> {
        if !px.is_finite() || px <= 0.0 {
            return Err(PaginationError::InvalidFontSize(px));
        }
        let restore = self
            .is_ready()
            .then(|| self.offsets.offset_for_page(self.current_page))
            .flatten()
            .map_or(RestoreTarget::Page(self.current_page), RestoreTarget::CharOffset);
        self.font_size = Some(px);
        info!("window {}: font size -> {px}px", self.window_index());
        if self.state == SessionState::Uninitialized {
            return Ok(LayoutStatus::Deferred);
        }
        Ok(self.begin_reflow(restore))
    }

    fn begin_reflow(&mut self, restore: RestoreTarget) -> LayoutStatus {
        self.layout.begin_cycle();
        if self.state == SessionState::Ready {
            self.state = SessionState::Reflowing;
        }
        self.run_layout(restore)
    }

    fn run_layout(&mut self, restore: RestoreTarget) -> LayoutStatus {
        self.ready = false;
        let now = self.clock.now();
        // Provisional until the first committed layout, however many retries it takes
        let initial = matches!(
            self.state,
            SessionState::Uninitialized | SessionState::Provisional
        );

        let pass = match self.layout.apply(&mut self.surface, self.font_size, now) {
            Ok(pass) => pass,
            Err(e) => {
                error!("window {}: layout failed: {e}", self.window_index());
                self.state = SessionState::Provisional;
                self.pending_restore = None;
                self.emit(ReaderEventKind::Diagnostic {
                    message: format!("layout failed: {e}"),
                });
                return LayoutStatus::Failed;
            }
        };

        self.applied_width = pass.applied_width;
        self.page_count = pass.page_count;
        self.current_page = self.current_page.min(self.last_page());

        if pass.provisional {
            self.state = if initial {
                SessionState::Provisional
            } else {
                SessionState::Reflowing
            };
            self.pending_restore = Some(restore);
            self.emit(ReaderEventKind::Diagnostic {
                message: format!(
                    "viewport unmeasurable, provisional width {}",
                    pass.applied_width
                ),
            });
            return LayoutStatus::Provisional;
        }

        self.complete_layout(restore);
        LayoutStatus::Ready {
            page_count: self.page_count,
        }
    }

    fn complete_layout(&mut self, restore: RestoreTarget) {
        self.pending_restore = None;
        self.offsets =
            CharacterOffsetIndex::build(&self.surface, self.page_count, self.applied_width);
        self.ready = self.applied_width > 0.0 && self.page_count > 0;
        self.state = SessionState::Ready;
        debug!(
            "window {}: ready, {} pages at width {}",
            self.window_index(),
            self.page_count,
            self.applied_width
        );
        self.emit(ReaderEventKind::PaginationReady {
            page_count: self.page_count,
        });

        let target = self.resolve_restore(restore);
        self.navigate(target, false);

        if let Some((index, smooth)) = self.queued_navigation.take() {
            debug!("window {}: applying queued navigation to {index}", self.window_index());
            self.go_to_page(index, smooth);
        }
    }

    fn resolve_restore(&self, restore: RestoreTarget) -> usize {
        let page = match restore {
            RestoreTarget::Page(page) => page,
            RestoreTarget::CharOffset(offset) => {
                self.offsets.page_for_offset(offset).unwrap_or(0)
            }
            RestoreTarget::Anchor {
                chapter_index,
                page_in_chapter,
                fallback_page,
            } => self
                .chapter_start_page(chapter_index)
                .map_or(fallback_page, |start| start + page_in_chapter),
        };
        page.min(self.last_page())
    }

    /// Drive deferred work: layout retries, scroll fallbacks, guard expiry, deferred eviction
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if self.layout.retry_due(now) {
            let restore = self
                .pending_restore
                .take()
                .unwrap_or(RestoreTarget::Page(self.current_page));
            debug!("window {}: layout retry {}", self.window_index(), self.layout.attempts());
            self.run_layout(restore);
        }

        if self.scroll_deadline.is_some_and(|deadline| now >= deadline) {
            debug!(
                "window {}: no scroll completion signal, treating as complete",
                self.window_index()
            );
            self.finish_navigation();
        }

        if self.guard_until.is_some_and(|until| now >= until) {
            self.guard_until = None;
        }

        if !self.segments.is_active()
            && self.segments.deferred_until().is_some_and(|at| now >= at)
        {
            if let Err(e) = self.evict_and_relayout() {
                warn!("window {}: deferred eviction failed: {e}", self.window_index());
            }
        }
    }

    /// Scroll-completion signal from the host
    pub fn on_scroll_end(&mut self) {
        self.finish_navigation();
    }

    fn finish_navigation(&mut self) {
        self.scroll_deadline = None;
        self.guard_until = None;
    }

    /// Passive scroll listener; ignored while a programmatic navigation is in flight
    pub fn on_scroll(&mut self, offset: f32) {
        if self.navigation_in_flight() {
            debug!(
                "window {}: scroll to {offset} suppressed during navigation",
                self.window_index()
            );
            return;
        }
        if !self.is_ready() {
            return;
        }
        let page = self.page_at_offset(offset);
        self.set_current_page(page);
    }

    /// Current page, resynchronized from the scroll position when no navigation is in flight
    pub fn current_page(&mut self) -> usize {
        if self.is_ready() && !self.navigation_in_flight() {
            let page = self.page_at_offset(self.surface.scroll_offset());
            self.set_current_page(page);
        }
        self.current_page
    }

    fn page_at_offset(&self, offset: f32) -> usize {
        if self.applied_width <= 0.0 {
            return 0;
        }
        let page = (offset / self.applied_width).round().max(0.0) as usize;
        page.min(self.last_page())
    }

    fn set_current_page(&mut self, page: usize) {
        if page != self.current_page {
            self.current_page = page;
            self.emit(ReaderEventKind::PageChanged { page });
            self.check_boundary();
        }
    }

    /// Navigate to a page, clamped to the document.
    ///
    /// The tracked page is updated before the scroll is issued, so it reads
    /// back immediately even while an animated scroll is still running.
    /// During a reflow the request is queued and applied after position restore.
    pub fn go_to_page(&mut self, index: isize, smooth: bool) -> usize {
        if matches!(
            self.state,
            SessionState::Uninitialized | SessionState::Reflowing
        ) {
            debug!(
                "window {}: navigation to {index} queued until layout completes",
                self.window_index()
            );
            self.queued_navigation = Some((index, smooth));
            return self.current_page;
        }
        let page = index.clamp(0, self.last_page() as isize) as usize;
        self.navigate(page, smooth);
        page
    }

    fn navigate(&mut self, page: usize, smooth: bool) {
        let now = self.clock.now();
        let previous = self.current_page;
        self.current_page = page;
        self.guard_until = Some(now + NAVIGATION_GUARD_TIMEOUT);
        self.scroll_deadline = smooth.then(|| now + SCROLL_FALLBACK_TIMEOUT);
        self.surface
            .scroll_to(page as f32 * self.applied_width, smooth);

        if previous != page {
            self.emit(ReaderEventKind::PageChanged { page });
        }
        self.check_boundary();
    }

    pub fn next_page(&mut self) -> PageTurn {
        self.turn(Direction::Next)
    }

    pub fn prev_page(&mut self) -> PageTurn {
        self.turn(Direction::Previous)
    }

    fn turn(&mut self, direction: Direction) -> PageTurn {
        let current = self.current_page();
        let target = match direction {
            Direction::Next => (current < self.last_page()).then(|| current + 1),
            Direction::Previous => current.checked_sub(1),
        };
        match target {
            Some(page) => PageTurn::Moved(self.go_to_page(page as isize, self.smooth_paging)),
            None => {
                self.boundary.edge_exhausted(direction);
                self.emit_boundary(direction);
                PageTurn::AtBoundary(direction)
            }
        }
    }

    fn check_boundary(&mut self) {
        if let Some(direction) = self.boundary.observe(self.current_page, self.page_count) {
            self.emit_boundary(direction);
        }
    }

    fn emit_boundary(&self, direction: Direction) {
        debug!(
            "window {}: boundary {} at page {}/{}",
            self.window_index(),
            direction.as_str(),
            self.current_page,
            self.page_count
        );
        self.emit(ReaderEventKind::BoundaryReached {
            direction,
            current_page: self.current_page,
            page_count: self.page_count,
        });
    }

    /// Navigate to the first page of a loaded chapter
    pub fn jump_to_chapter(&mut self, chapter_index: usize, smooth: bool) -> ChapterJump {
        match self.chapter_start_page(chapter_index) {
            Some(page) => ChapterJump::Landed(self.go_to_page(page as isize, smooth)),
            None => {
                debug!(
                    "window {}: chapter {chapter_index} not loaded",
                    self.window_index()
                );
                self.emit(ReaderEventKind::ChapterNotLoaded { chapter_index });
                ChapterJump::NotLoaded
            }
        }
    }

    fn chapter_start_page(&self, chapter_index: usize) -> Option<usize> {
        if !self.segments.contains(chapter_index) || self.applied_width <= 0.0 {
            return None;
        }
        let offset = self.surface.fragment_offset(chapter_index)?;
        let page = (offset / self.applied_width + 1e-3).floor() as usize;
        Some(page.min(self.last_page()))
    }

    /// Chapter holding the tracked page: the last segment starting at or before it
    pub fn current_chapter(&self) -> Option<usize> {
        self.chapter_anchor().map(|(chapter, _)| chapter)
    }

    fn chapter_anchor(&self) -> Option<(usize, usize)> {
        self.segments
            .segments()
            .filter_map(|s| {
                self.chapter_start_page(s.chapter_index)
                    .map(|start| (s.chapter_index, start))
            })
            .filter(|&(_, start)| start <= self.current_page)
            .max_by_key(|&(_, start)| start)
            .map(|(chapter, start)| (chapter, self.current_page - start))
    }

    pub fn character_offset_for_page(&self, page: usize) -> Option<usize> {
        if !self.is_ready() {
            return None;
        }
        self.offsets.offset_for_page(page)
    }

    /// Navigate to the page holding a character offset, returning that page
    pub fn go_to_page_with_character_offset(&mut self, offset: usize) -> Option<usize> {
        if !self.is_ready() {
            return None;
        }
        let page = self.offsets.page_for_offset(offset)?;
        Some(self.go_to_page(page as isize, false))
    }

    pub fn append_chapter(&mut self, chapter_index: usize, html: &str) -> Result<(), PaginationError> {
        let restore = self.anchor_restore();
        let now = self.clock.now();
        self.segments
            .append(&mut self.surface, chapter_index, html, now)?;
        self.after_mutation(restore)
    }

    pub fn prepend_chapter(&mut self, chapter_index: usize, html: &str) -> Result<(), PaginationError> {
        let restore = self.anchor_restore();
        let now = self.clock.now();
        self.segments
            .prepend(&mut self.surface, chapter_index, html, now)?;
        self.after_mutation(restore)
    }

    /// `Ok(false)` when the chapter is not loaded here
    pub fn remove_chapter(&mut self, chapter_index: usize) -> Result<bool, PaginationError> {
        let restore = self.anchor_restore();
        let removed = self.segments.remove(&mut self.surface, chapter_index)?;
        if removed {
            self.emit(ReaderEventKind::SegmentEvicted { chapter_index });
            self.relayout_if_initialized(restore);
        }
        Ok(removed)
    }

    fn anchor_restore(&self) -> RestoreTarget {
        match self.chapter_anchor() {
            Some((chapter_index, page_in_chapter)) => RestoreTarget::Anchor {
                chapter_index,
                page_in_chapter,
                fallback_page: self.current_page,
            },
            None => RestoreTarget::Page(self.current_page),
        }
    }

    fn after_mutation(&mut self, restore: RestoreTarget) -> Result<(), PaginationError> {
        self.evict()?;
        self.relayout_if_initialized(restore);
        Ok(())
    }

    fn evict_and_relayout(&mut self) -> Result<(), PaginationError> {
        let restore = self.anchor_restore();
        if self.evict()? {
            self.relayout_if_initialized(restore);
        }
        Ok(())
    }

    fn evict(&mut self) -> Result<bool, PaginationError> {
        let report = self
            .segments
            .evict_excess(&mut self.surface, self.clock.now())?;
        for &chapter_index in &report.evicted {
            self.emit(ReaderEventKind::SegmentEvicted { chapter_index });
        }
        Ok(!report.evicted.is_empty())
    }

    fn relayout_if_initialized(&mut self, restore: RestoreTarget) {
        if self.state != SessionState::Uninitialized {
            self.begin_reflow(restore);
        }
    }

    /// Freeze the segment set; a second call only warns
    pub fn finalize(&mut self) -> bool {
        let finalized = self.segments.finalize();
        if finalized {
            self.emit(ReaderEventKind::WindowFinalized {
                page_count: self.page_count,
            });
        }
        finalized
    }

    /// State dump, only when diagnostics are enabled in the config
    pub fn snapshot(&self) -> Option<DiagnosticsSnapshot> {
        if !self.config.diagnostics {
            return None;
        }
        Some(DiagnosticsSnapshot {
            client_width: self.surface.viewport_width(),
            applied_column_width: self.applied_width,
            page_count: self.page_count,
            current_page: self.current_page,
            current_chapter: self.current_chapter(),
            loaded_segments: self.segments.chapter_indices(),
            phase: None,
        })
    }

    fn last_page(&self) -> usize {
        self.page_count.saturating_sub(1)
    }

    fn emit(&self, kind: ReaderEventKind) {
        self.events.emit(self.config.window_index, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::headless_surface::HeadlessSurface;

    // 320x480 at 16px: 40 chars per line, 20 lines per page, 800 chars per page
    const PAGE_CHARS: usize = 800;

    fn session_with(
        surface: HeadlessSurface,
        clock: &ManualClock,
    ) -> PaginationSession<HeadlessSurface> {
        PaginationSession::new(
            SessionConfig::window(0).with_diagnostics(true),
            surface,
            Arc::new(clock.clone()),
            EventBus::new(),
        )
        .unwrap()
    }

    fn loaded(pages_per_chapter: &[usize], clock: &ManualClock) -> PaginationSession<HeadlessSurface> {
        let mut session = session_with(HeadlessSurface::new(320.0, 480.0), clock);
        for (i, pages) in pages_per_chapter.iter().enumerate() {
            let text = "a".repeat(pages * PAGE_CHARS);
            session.append_chapter(i, &format!("<p>{text}</p>")).unwrap();
        }
        session
    }

    #[test]
    fn not_ready_until_first_layout() {
        let clock = ManualClock::new();
        let mut session = loaded(&[3], &clock);
        assert!(!session.is_ready());
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert_eq!(session.initialize(), LayoutStatus::Ready { page_count: 3 });
        assert!(session.is_ready());
        assert_eq!(session.applied_width(), 320.0);
    }

    #[test]
    fn go_to_page_clamps() {
        let clock = ManualClock::new();
        let mut session = loaded(&[4], &clock);
        session.initialize();

        assert_eq!(session.go_to_page(-5, false), 0);
        assert_eq!(session.go_to_page(9, false), 3);
        assert_eq!(session.tracked_page(), 3);
    }

    #[test]
    fn rounding_resolves_fractional_scroll() {
        let clock = ManualClock::new();
        let mut session = loaded(&[10], &clock);
        session.initialize();
        clock.advance(NAVIGATION_GUARD_TIMEOUT);
        session.tick();

        session.surface_mut().drag_to(7.999 * 320.0);
        assert_eq!(session.current_page(), 8);
    }

    #[test]
    fn passive_scroll_is_ignored_during_navigation() {
        let clock = ManualClock::new();
        let mut session = loaded(&[10], &clock);
        session.initialize();

        session.go_to_page(6, false);
        session.on_scroll(320.0);
        assert_eq!(session.tracked_page(), 6);

        clock.advance(NAVIGATION_GUARD_TIMEOUT);
        session.tick();
        session.on_scroll(320.0);
        assert_eq!(session.tracked_page(), 1);
    }

    #[test]
    fn navigation_during_provisional_reflow_is_queued() {
        let clock = ManualClock::new();
        let mut session = loaded(&[6], &clock);
        session.initialize();

        session.surface_mut().set_viewport_width(0.0);
        assert_eq!(session.reflow(true), LayoutStatus::Provisional);
        assert_eq!(session.state(), SessionState::Reflowing);
        assert!(!session.is_ready());

        session.go_to_page(2, false);
        session.surface_mut().set_viewport_width(320.0);
        clock.advance(super::super::LAYOUT_RETRY_DELAY);
        session.tick();

        assert!(session.is_ready());
        assert_eq!(session.tracked_page(), 2);
    }

    #[test]
    fn layout_failure_clears_readiness() {
        let clock = ManualClock::new();
        let mut session = loaded(&[2], &clock);
        let events = session.events.subscribe();
        session.initialize();

        session.surface_mut().fail_next_flush();
        assert_eq!(session.reflow(true), LayoutStatus::Failed);
        assert!(!session.is_ready());
        assert_eq!(session.state(), SessionState::Provisional);
        assert!(events.try_iter().any(|e| matches!(
            e.kind,
            ReaderEventKind::Diagnostic { .. }
        )));

        assert_eq!(session.reflow(true), LayoutStatus::Ready { page_count: 2 });
    }

    #[test]
    fn chapter_jump_and_missing_chapter() {
        let clock = ManualClock::new();
        let mut session = loaded(&[2, 3, 1], &clock);
        session.initialize();

        assert_eq!(session.jump_to_chapter(1, false), ChapterJump::Landed(2));
        assert_eq!(session.current_chapter(), Some(1));
        assert_eq!(session.jump_to_chapter(2, false), ChapterJump::Landed(5));
        assert_eq!(session.jump_to_chapter(42, false), ChapterJump::NotLoaded);
    }

    #[test]
    fn prepend_keeps_reader_on_same_text() {
        let clock = ManualClock::new();
        let mut session = loaded(&[2, 2], &clock);
        session.initialize();
        session.go_to_page(3, false);

        let text = "b".repeat(3 * PAGE_CHARS);
        session.prepend_chapter(9, &format!("<p>{text}</p>")).unwrap();

        assert_eq!(session.page_count(), 7);
        assert_eq!(session.tracked_page(), 6);
        assert_eq!(session.current_chapter(), Some(1));
    }

    #[test]
    fn snapshot_reports_state() {
        let clock = ManualClock::new();
        let mut session = loaded(&[1, 1], &clock);
        session.initialize();
        session.go_to_page(1, false);

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.client_width, 320.0);
        assert_eq!(snapshot.page_count, 2);
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.current_chapter, Some(1));
        assert_eq!(snapshot.loaded_segments, vec![0, 1]);
        assert_eq!(snapshot.phase, None);
    }
}
