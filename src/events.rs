//! Readiness, position and boundary notifications

use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use serde::Serialize;

use crate::pagination::Direction;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReaderEventKind {
    PaginationReady {
        page_count: usize,
    },
    PageChanged {
        page: usize,
    },
    BoundaryReached {
        direction: Direction,
        current_page: usize,
        page_count: usize,
    },
    SegmentEvicted {
        chapter_index: usize,
    },
    WindowFinalized {
        page_count: usize,
    },
    /// Jump or lookup for a chapter this window does not hold
    ChapterNotLoaded {
        chapter_index: usize,
    },
    Diagnostic {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderEvent {
    pub window_index: usize,
    #[serde(flatten)]
    pub kind: ReaderEventKind,
}

/// Fan-out of reader events to any number of subscribers.
///
/// Clones share one subscriber list, so every window's session can publish on
/// the same bus. Subscribers whose receiver was dropped are pruned on send.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<ReaderEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ReaderEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn emit(&self, window_index: usize, kind: ReaderEventKind) {
        let event = ReaderEvent { window_index, kind };
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
