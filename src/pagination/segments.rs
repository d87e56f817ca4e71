//! Chapter fragments materialized inside one window's document

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{EVICTION_HYSTERESIS, SEGMENT_CAPACITY};
use crate::error::PaginationError;
use crate::surface::{DocumentSurface, FragmentPosition};

/// Whether a window still accepts segment mutations
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionState {
    Construction,
    Active,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterSegment {
    pub chapter_index: usize,
    pub inserted_at: Instant,
    /// Markup could not be parsed; the chapter was inserted as plain text
    pub raw_fallback: bool,
}

/// Outcome of an eviction pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: Vec<usize>,
    /// Set when a just-appended segment blocked eviction; retry after this instant
    pub deferred_until: Option<Instant>,
}

#[derive(Debug)]
pub struct SegmentStore {
    window_index: usize,
    segments: VecDeque<ChapterSegment>,
    state: ConstructionState,
    capacity: usize,
    hysteresis: Duration,
    last_direction: Option<FragmentPosition>,
    last_append: Option<(usize, Instant)>,
    deferred_until: Option<Instant>,
}

impl SegmentStore {
    pub fn new(window_index: usize) -> Self {
        Self::with_limits(window_index, SEGMENT_CAPACITY, EVICTION_HYSTERESIS)
    }

    pub fn with_limits(window_index: usize, capacity: usize, hysteresis: Duration) -> Self {
        Self {
            window_index,
            segments: VecDeque::with_capacity(capacity + 1),
            state: ConstructionState::Construction,
            capacity: capacity.max(1),
            hysteresis,
            last_direction: None,
            last_append: None,
            deferred_until: None,
        }
    }

    pub fn state(&self) -> ConstructionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConstructionState::Active
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, chapter_index: usize) -> bool {
        self.segments.iter().any(|s| s.chapter_index == chapter_index)
    }

    pub fn chapter_indices(&self) -> Vec<usize> {
        self.segments.iter().map(|s| s.chapter_index).collect()
    }

    pub fn segments(&self) -> impl Iterator<Item = &ChapterSegment> {
        self.segments.iter()
    }

    pub fn first_chapter(&self) -> Option<usize> {
        self.segments.front().map(|s| s.chapter_index)
    }

    pub fn last_chapter(&self) -> Option<usize> {
        self.segments.back().map(|s| s.chapter_index)
    }

    /// When a deferred eviction becomes possible again
    pub fn deferred_until(&self) -> Option<Instant> {
        self.deferred_until
    }

    pub fn append<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        chapter_index: usize,
        html: &str,
        now: Instant,
    ) -> Result<(), PaginationError> {
        self.insert(surface, FragmentPosition::End, chapter_index, html, now)?;
        self.last_append = Some((chapter_index, now));
        Ok(())
    }

    pub fn prepend<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        chapter_index: usize,
        html: &str,
        now: Instant,
    ) -> Result<(), PaginationError> {
        self.insert(surface, FragmentPosition::Start, chapter_index, html, now)
    }

    fn insert<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        position: FragmentPosition,
        chapter_index: usize,
        html: &str,
        now: Instant,
    ) -> Result<(), PaginationError> {
        let operation = match position {
            FragmentPosition::Start => "prepend",
            FragmentPosition::End => "append",
        };
        self.ensure_construction(operation)?;
        if self.contains(chapter_index) {
            return Err(PaginationError::DuplicateChapter(chapter_index));
        }

        let raw_fallback = match surface.insert_fragment(position, chapter_index, html) {
            Ok(()) => false,
            Err(e) => {
                warn!(
                    "window {}: {e}; inserting chapter {chapter_index} as raw content",
                    self.window_index
                );
                surface.insert_text(position, chapter_index, html);
                true
            }
        };

        let segment = ChapterSegment {
            chapter_index,
            inserted_at: now,
            raw_fallback,
        };
        match position {
            FragmentPosition::Start => self.segments.push_front(segment),
            FragmentPosition::End => self.segments.push_back(segment),
        }
        self.last_direction = Some(position);
        debug!(
            "window {}: {operation} chapter {chapter_index} ({} segments)",
            self.window_index,
            self.segments.len()
        );
        Ok(())
    }

    /// Remove one chapter; `Ok(false)` when it is not loaded
    pub fn remove<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        chapter_index: usize,
    ) -> Result<bool, PaginationError> {
        self.ensure_construction("remove")?;
        let Some(pos) = self
            .segments
            .iter()
            .position(|s| s.chapter_index == chapter_index)
        else {
            return Ok(false);
        };
        self.segments.remove(pos);
        surface.remove_fragment(chapter_index);
        if self.last_append.is_some_and(|(c, _)| c == chapter_index) {
            self.last_append = None;
        }
        Ok(true)
    }

    /// Trim down to capacity from the end opposite the latest insertion.
    ///
    /// A segment appended less than the hysteresis ago is put back and the
    /// pass stops; [`EvictionReport::deferred_until`] says when to try again.
    pub fn evict_excess<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        now: Instant,
    ) -> Result<EvictionReport, PaginationError> {
        self.ensure_construction("evict")?;
        let mut report = EvictionReport::default();
        self.deferred_until = None;

        while self.segments.len() > self.capacity {
            let from_back = self.last_direction == Some(FragmentPosition::Start);
            let candidate = if from_back {
                self.segments.pop_back()
            } else {
                self.segments.pop_front()
            };
            let Some(candidate) = candidate else {
                break;
            };

            if let Some(until) = self.protected_until(&candidate, now) {
                if from_back {
                    self.segments.push_back(candidate);
                } else {
                    self.segments.push_front(candidate);
                }
                debug!(
                    "window {}: eviction deferred, chapter {} was just appended",
                    self.window_index,
                    self.last_append.map_or(0, |(c, _)| c)
                );
                self.deferred_until = Some(until);
                report.deferred_until = Some(until);
                break;
            }

            surface.remove_fragment(candidate.chapter_index);
            debug!(
                "window {}: evicted chapter {}",
                self.window_index, candidate.chapter_index
            );
            report.evicted.push(candidate.chapter_index);
        }
        Ok(report)
    }

    fn protected_until(&self, segment: &ChapterSegment, now: Instant) -> Option<Instant> {
        let (chapter, appended_at) = self.last_append?;
        let until = appended_at + self.hysteresis;
        (segment.chapter_index == chapter && now < until).then_some(until)
    }

    /// Freeze the segment set. Returns `false` (and warns) when already active.
    pub fn finalize(&mut self) -> bool {
        if self.is_active() {
            warn!("window {} finalized twice, ignoring", self.window_index);
            return false;
        }
        if self.segments.len() > self.capacity {
            warn!(
                "window {} finalized holding {} segments (capacity {})",
                self.window_index,
                self.segments.len(),
                self.capacity
            );
        }
        self.state = ConstructionState::Active;
        self.deferred_until = None;
        true
    }

    fn ensure_construction(&self, operation: &'static str) -> Result<(), PaginationError> {
        if self.is_active() {
            return Err(PaginationError::InvalidState {
                operation,
                window_index: self.window_index,
            });
        }
        Ok(())
    }
}
