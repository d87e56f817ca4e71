//! Window conveyor: a bounded ring of materialized windows around the reader.
//!
//! Startup fills the ring in one go. Once the reader first enters the center
//! slot the conveyor turns steady and from then on shifts one window at a time
//! in response to boundary events from the active window. New windows are
//! fetched on a worker thread and attached on the caller's thread in `poll`.

mod ring;
mod supply;
mod window;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use log::{debug, error, info, warn};
use serde::Serialize;

pub use ring::WindowRing;
pub use supply::{
    ChapterContent, ContentSupply, DirectorySupply, EntryPoint, InMemorySupply,
    WindowDescription, text_to_html,
};
pub use window::{HeadlessSurfaceFactory, SurfaceFactory, Window, WindowDefaults};
pub use worker::{ConstructionRequest, ConstructionResponse, RequestId};

use crate::clock::Clock;
use crate::error::{ConveyorError, PaginationError, SupplyError};
use crate::events::{EventBus, ReaderEvent, ReaderEventKind};
use crate::pagination::{ChapterJump, DiagnosticsSnapshot, Direction, PageTurn};
use crate::position::ReadingPosition;
use worker::construction_worker;

pub const RING_SIZE: usize = 5;
/// Slot whose first entry ends the startup phase
pub const RING_CENTER: usize = 2;
/// Windows kept materialized past the active one in the direction of travel
pub const LOOKAHEAD: usize = RING_SIZE - 1 - RING_CENTER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Startup,
    Steady,
}

/// What a boundary event did to the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutcome {
    Requested { window_index: usize },
    /// A construction for this direction is already in flight
    Coalesced,
    /// The ring already holds enough windows ahead of the source
    NotNeeded,
    AtBookBoundary,
    /// Still in startup; the ring does not shift
    Ignored,
}

/// Result of a page turn routed through the conveyor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConveyorTurn {
    Page { window_index: usize, page: usize },
    EnteredWindow { window_index: usize, page: usize },
    /// The adjacent window is still being constructed
    WindowPending { direction: Direction },
    EndOfBook,
    StartOfBook,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConveyorOptions {
    pub initial_window: usize,
    pub entry: Option<EntryPoint>,
    pub defaults: WindowDefaults,
}

pub struct Conveyor<F: SurfaceFactory> {
    supply: Arc<dyn ContentSupply>,
    factory: F,
    clock: Arc<dyn Clock>,
    events: EventBus,
    boundary_rx: Receiver<ReaderEvent>,
    defaults: WindowDefaults,
    phase: Phase,
    ring: WindowRing<F::Surface>,
    active: usize,
    window_count: usize,
    request_tx: Sender<ConstructionRequest>,
    response_rx: Receiver<ConstructionResponse>,
    in_flight: HashMap<Direction, (RequestId, usize)>,
    generation: u64,
    next_request_id: u64,
    worker: Option<JoinHandle<()>>,
}

impl<F: SurfaceFactory> Conveyor<F> {
    /// Materialize the startup ring synchronously and spawn the construction worker
    pub fn start(
        supply: Arc<dyn ContentSupply>,
        factory: F,
        clock: Arc<dyn Clock>,
        events: EventBus,
        options: ConveyorOptions,
    ) -> Result<Self, ConveyorError> {
        let window_count = supply.window_count();
        if window_count == 0 {
            return Err(SupplyError::EmptyBook.into());
        }
        if options.initial_window >= window_count {
            return Err(SupplyError::WindowOutOfRange {
                window_index: options.initial_window,
                window_count,
            }
            .into());
        }

        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let worker_supply = supply.clone();
        let worker = std::thread::Builder::new()
            .name("window-construction".to_string())
            .spawn(move || construction_worker(worker_supply, request_rx, response_tx))
            .map_err(|e| SupplyError::worker(format!("failed to spawn worker: {e}")))?;

        let boundary_rx = events.subscribe();
        let mut conveyor = Self {
            supply,
            factory,
            clock,
            events,
            boundary_rx,
            defaults: options.defaults,
            phase: Phase::Startup,
            ring: WindowRing::new(),
            active: options.initial_window,
            window_count,
            request_tx,
            response_rx,
            in_flight: HashMap::new(),
            generation: 0,
            next_request_id: 1,
            worker: Some(worker),
        };

        let start = options
            .initial_window
            .min(window_count.saturating_sub(RING_SIZE));
        conveyor.fill_ring(start)?;
        info!(
            "conveyor: startup ring {:?}, active window {}",
            conveyor.ring.indices(),
            conveyor.active
        );

        if let Some(entry) = options.entry {
            conveyor.position_at_entry(entry);
        }
        Ok(conveyor)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ring_indices(&self) -> Vec<usize> {
        self.ring.indices()
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_window(&self) -> Option<&Window<F::Surface>> {
        self.ring.get(self.active)
    }

    pub fn active_window_mut(&mut self) -> Option<&mut Window<F::Surface>> {
        self.ring.get_mut(self.active)
    }

    pub fn window(&self, window_index: usize) -> Option<&Window<F::Surface>> {
        self.ring.get(window_index)
    }

    pub fn window_mut(&mut self, window_index: usize) -> Option<&mut Window<F::Surface>> {
        self.ring.get_mut(window_index)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Reader is now looking at `window_index`. Returns true when this entry ended startup.
    pub fn enter_window(&mut self, window_index: usize) -> Result<bool, ConveyorError> {
        if !self.ring.contains(window_index) {
            warn!("conveyor: entered window {window_index} outside ring {:?}", self.ring.indices());
            self.jump_to_window(window_index)?;
            return Ok(false);
        }
        Ok(self.set_active(window_index))
    }

    fn set_active(&mut self, window_index: usize) -> bool {
        self.active = window_index;
        if self.phase == Phase::Startup && self.ring.center_index() == Some(window_index) {
            self.phase = Phase::Steady;
            info!("conveyor: reached center window {window_index}, switching to steady shifting");
            return true;
        }
        false
    }

    /// React to a boundary event raised by `source_window`
    pub fn handle_boundary(&mut self, direction: Direction, source_window: usize) -> ShiftOutcome {
        if self.phase == Phase::Startup {
            debug!(
                "conveyor: {} boundary from window {source_window} ignored during startup",
                direction.as_str()
            );
            return ShiftOutcome::Ignored;
        }
        self.plan_shift(direction, source_window)
    }

    fn plan_shift(&mut self, direction: Direction, source_window: usize) -> ShiftOutcome {
        let (Some(first), Some(last)) = (self.ring.first_index(), self.ring.last_index()) else {
            return ShiftOutcome::NotNeeded;
        };

        let target = match direction {
            Direction::Next => {
                let target = last + 1;
                if source_window + LOOKAHEAD < target {
                    return ShiftOutcome::NotNeeded;
                }
                (target < self.window_count).then_some(target)
            }
            Direction::Previous => {
                if source_window
                    .checked_sub(LOOKAHEAD)
                    .is_some_and(|behind| behind >= first)
                {
                    return ShiftOutcome::NotNeeded;
                }
                first.checked_sub(1)
            }
        };

        let Some(target) = target else {
            info!(
                "conveyor: {} shift from window {source_window} stops at book boundary",
                direction.as_str()
            );
            return ShiftOutcome::AtBookBoundary;
        };

        if self.in_flight.contains_key(&direction) {
            debug!("conveyor: {} shift already in flight", direction.as_str());
            return ShiftOutcome::Coalesced;
        }
        self.request_window(direction, target);
        ShiftOutcome::Requested {
            window_index: target,
        }
    }

    fn request_window(&mut self, direction: Direction, window_index: usize) {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        let request = ConstructionRequest::Build {
            id,
            generation: self.generation,
            window_index,
            direction,
        };

        if self.request_tx.send(request).is_err() {
            warn!("conveyor: construction worker gone, building window {window_index} inline");
            match self.supply.describe_window(window_index) {
                Ok(description) => {
                    self.attach(direction, description);
                }
                Err(e) => error!("conveyor: window {window_index}: {e}"),
            }
            return;
        }
        debug!("conveyor: requested window {window_index} ({})", direction.as_str());
        self.in_flight.insert(direction, (id, window_index));
    }

    /// Attach finished constructions. Returns the indices of windows added to the ring.
    pub fn poll(&mut self) -> Vec<usize> {
        let responses: Vec<_> = self.response_rx.try_iter().collect();
        responses
            .into_iter()
            .filter_map(|response| self.process_response(response))
            .collect()
    }

    /// Block until in-flight constructions land or `timeout` passes
    pub fn wait_for_construction(&mut self, timeout: Duration) -> Vec<usize> {
        let deadline = Instant::now() + timeout;
        let mut attached = Vec::new();
        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => attached.extend(self.process_response(response)),
                Err(_) => break,
            }
        }
        attached
    }

    fn process_response(&mut self, response: ConstructionResponse) -> Option<usize> {
        if response.generation() != self.generation {
            debug!("conveyor: dropping construction from abandoned generation");
            return None;
        }
        let direction = response.direction();
        if self
            .in_flight
            .get(&direction)
            .is_some_and(|(id, _)| *id == response.id())
        {
            self.in_flight.remove(&direction);
        }

        match response {
            ConstructionResponse::Built {
                direction,
                description,
                ..
            } => self.attach(direction, description),
            ConstructionResponse::Failed {
                window_index,
                error,
                ..
            } => {
                warn!("conveyor: construction of window {window_index} failed: {error}");
                self.events.emit(
                    window_index,
                    ReaderEventKind::Diagnostic {
                        message: format!("window construction failed: {error}"),
                    },
                );
                None
            }
        }
    }

    fn attach(&mut self, direction: Direction, description: WindowDescription) -> Option<usize> {
        let window_index = description.window_index;
        let expected = match direction {
            Direction::Next => self.ring.last_index().map(|last| last + 1),
            Direction::Previous => self.ring.first_index().and_then(|first| first.checked_sub(1)),
        };
        if expected != Some(window_index) {
            warn!(
                "conveyor: window {window_index} no longer adjacent to ring {:?}, dropping",
                self.ring.indices()
            );
            return None;
        }

        let window = match self.build_window(description) {
            Ok(window) => window,
            Err(e) => {
                error!("conveyor: {e}");
                return None;
            }
        };
        let evicted = match direction {
            Direction::Next => self.ring.push_back(window),
            Direction::Previous => self.ring.push_front(window),
        };
        info!(
            "conveyor: shifted {} to {:?}, evicted {:?}",
            direction.as_str(),
            self.ring.indices(),
            evicted.map(|w| w.index)
        );

        if let Err(e) = self.heal() {
            error!("conveyor: ring repair failed: {e}");
        }
        // One window per shift; keep going if the reader outran the ring
        self.plan_shift(direction, self.active);
        Some(window_index)
    }

    fn build_window(
        &mut self,
        description: WindowDescription,
    ) -> Result<Window<F::Surface>, ConveyorError> {
        let window_index = description.window_index;
        let surface = self.factory.create(window_index);
        Window::build(
            description,
            surface,
            self.clock.clone(),
            self.events.clone(),
            self.defaults,
        )
        .map_err(|source| ConveyorError::Window {
            window_index,
            source,
        })
    }

    /// Rebuild the ring as `start..start + RING_SIZE`, reusing windows already built
    fn fill_ring(&mut self, start: usize) -> Result<(), ConveyorError> {
        let end = (start + RING_SIZE).min(self.window_count);
        let mut existing = self.ring.drain();
        for window_index in start..end {
            let window = match existing.iter().position(|w| w.index == window_index) {
                Some(pos) => existing.swap_remove(pos),
                None => {
                    let description = self.supply.describe_window(window_index)?;
                    self.build_window(description)?
                }
            };
            self.ring.push_back(window);
        }
        for dropped in existing {
            debug!("conveyor: released window {}", dropped.index);
        }
        Ok(())
    }

    /// Drop in-flight constructions; their results will be discarded on arrival
    pub fn abandon_in_flight(&mut self) {
        if !self.in_flight.is_empty() {
            info!("conveyor: abandoning {} in-flight constructions", self.in_flight.len());
        }
        self.in_flight.clear();
        self.generation += 1;
    }

    /// Far jump (e.g. table of contents): rebuild the ring centered on `window_index`.
    /// The rebuilt ring no longer is the startup fill, so the phase turns steady.
    pub fn jump_to_window(&mut self, window_index: usize) -> Result<(), ConveyorError> {
        if window_index >= self.window_count {
            return Err(SupplyError::WindowOutOfRange {
                window_index,
                window_count: self.window_count,
            }
            .into());
        }
        self.abandon_in_flight();
        let start = window_index
            .saturating_sub(RING_CENTER)
            .min(self.window_count.saturating_sub(RING_SIZE));
        self.fill_ring(start)?;
        self.set_active(window_index);
        if self.phase == Phase::Startup {
            info!("conveyor: jump left the startup ring, switching to steady shifting");
            self.phase = Phase::Steady;
        }
        info!("conveyor: jumped to window {window_index}, ring {:?}", self.ring.indices());
        Ok(())
    }

    pub fn jump_to_chapter(
        &mut self,
        chapter_index: usize,
        smooth: bool,
    ) -> Result<ChapterJump, ConveyorError> {
        let Some(window_index) = self.supply.window_for_chapter(chapter_index) else {
            self.events
                .emit(self.active, ReaderEventKind::ChapterNotLoaded { chapter_index });
            return Ok(ChapterJump::NotLoaded);
        };
        self.enter_window(window_index)?;
        Ok(self
            .ring
            .get_mut(window_index)
            .map_or(ChapterJump::NotLoaded, |w| {
                w.session_mut().jump_to_chapter(chapter_index, smooth)
            }))
    }

    /// Ring holds contiguous windows and the active one
    pub fn validate_ring(&self) -> bool {
        self.ring.is_empty() || (self.ring.is_contiguous() && self.ring.contains(self.active))
    }

    /// Rebuild outward from the active window when the ring is broken
    pub fn heal(&mut self) -> Result<bool, ConveyorError> {
        if self.validate_ring() {
            return Ok(false);
        }
        warn!(
            "conveyor: ring {:?} inconsistent with active window {}, rebuilding",
            self.ring.indices(),
            self.active
        );
        let start = self
            .active
            .saturating_sub(RING_CENTER)
            .min(self.window_count.saturating_sub(RING_SIZE));
        self.fill_ring(start)?;
        Ok(true)
    }

    /// Route boundary events from the active window into shifts
    pub fn pump_events(&mut self) -> Vec<ShiftOutcome> {
        let events: Vec<_> = self.boundary_rx.try_iter().collect();
        let mut outcomes = Vec::new();
        for event in events {
            match event.kind {
                ReaderEventKind::BoundaryReached { direction, .. }
                    if event.window_index == self.active =>
                {
                    outcomes.push(self.handle_boundary(direction, event.window_index));
                }
                _ => {}
            }
        }
        outcomes
    }

    /// One UI-thread turn: session timers, boundary routing, finished constructions
    pub fn tick(&mut self) -> Vec<usize> {
        for window in self.ring.iter_mut() {
            window.session_mut().tick();
        }
        self.pump_events();
        self.poll()
    }

    pub fn next_page(&mut self) -> ConveyorTurn {
        self.turn(Direction::Next)
    }

    pub fn prev_page(&mut self) -> ConveyorTurn {
        self.turn(Direction::Previous)
    }

    fn turn(&mut self, direction: Direction) -> ConveyorTurn {
        let active = self.active;
        let Some(window) = self.ring.get_mut(active) else {
            return ConveyorTurn::WindowPending { direction };
        };
        let session = window.session_mut();
        let turn = match direction {
            Direction::Next => session.next_page(),
            Direction::Previous => session.prev_page(),
        };
        if let PageTurn::Moved(page) = turn {
            return ConveyorTurn::Page {
                window_index: active,
                page,
            };
        }

        let neighbor = match direction {
            Direction::Next => Some(active + 1).filter(|&w| w < self.window_count),
            Direction::Previous => active.checked_sub(1),
        };
        let Some(neighbor) = neighbor else {
            return match direction {
                Direction::Next => ConveyorTurn::EndOfBook,
                Direction::Previous => ConveyorTurn::StartOfBook,
            };
        };
        if !self.ring.contains(neighbor) {
            if self.phase == Phase::Steady {
                self.plan_shift(direction, active);
                return ConveyorTurn::WindowPending { direction };
            }
            // Startup never shifts, so leaving the startup ring rebuilds it
            if let Err(e) = self.jump_to_window(neighbor) {
                error!("conveyor: cannot enter window {neighbor}: {e}");
                return ConveyorTurn::WindowPending { direction };
            }
        }

        self.set_active(neighbor);
        let page = self.ring.get_mut(neighbor).map_or(0, |w| {
            let session = w.session_mut();
            match direction {
                Direction::Next => session.go_to_page(0, false),
                Direction::Previous => session.go_to_page(isize::MAX, false),
            }
        });
        ConveyorTurn::EnteredWindow {
            window_index: neighbor,
            page,
        }
    }

    /// Apply a font size to every window, current and future
    pub fn set_font_size(&mut self, px: f32) -> Result<(), PaginationError> {
        if !px.is_finite() || px <= 0.0 {
            return Err(PaginationError::InvalidFontSize(px));
        }
        self.defaults.font_size = Some(px);
        for window in self.ring.iter_mut() {
            window.session_mut().set_font_size(px)?;
        }
        Ok(())
    }

    /// Active window's diagnostics with the conveyor phase filled in
    pub fn snapshot(&self) -> Option<DiagnosticsSnapshot> {
        self.active_window()
            .and_then(|w| w.session().snapshot())
            .map(|snapshot| DiagnosticsSnapshot {
                phase: Some(self.phase),
                ..snapshot
            })
    }

    pub fn current_position(&mut self) -> Option<ReadingPosition> {
        let window_index = self.active;
        let session = self.ring.get_mut(window_index)?.session_mut();
        let page = session.current_page();
        Some(ReadingPosition::new(
            window_index,
            session.current_chapter(),
            page,
            session.character_offset_for_page(page),
        ))
    }

    /// Go back to a saved position; the character offset wins over the page index
    pub fn restore_position(&mut self, position: &ReadingPosition) -> Result<usize, ConveyorError> {
        self.enter_window(position.window_index)?;
        let Some(window) = self.ring.get_mut(position.window_index) else {
            return Err(SupplyError::WindowOutOfRange {
                window_index: position.window_index,
                window_count: self.window_count,
            }
            .into());
        };
        let session = window.session_mut();
        let page = position
            .char_offset
            .and_then(|offset| session.go_to_page_with_character_offset(offset))
            .unwrap_or_else(|| session.go_to_page(position.page_index as isize, false));
        Ok(page)
    }

    fn position_at_entry(&mut self, entry: EntryPoint) {
        let Some(window) = self.ring.get_mut(self.active) else {
            return;
        };
        let session = window.session_mut();
        match session.jump_to_chapter(entry.entry_chapter_index, false) {
            ChapterJump::Landed(page) => {
                session.go_to_page((page + entry.entry_page_index) as isize, false);
            }
            ChapterJump::NotLoaded => warn!(
                "conveyor: entry chapter {} not in window {}",
                entry.entry_chapter_index, self.active
            ),
        }
    }
}

impl<F: SurfaceFactory> Drop for Conveyor<F> {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ConstructionRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("conveyor: construction worker panicked");
            }
        }
    }
}
