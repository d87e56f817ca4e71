use std::collections::VecDeque;

use super::window::Window;
use super::{RING_CENTER, RING_SIZE};
use crate::surface::DocumentSurface;

/// Ordered, bounded run of materialized windows
pub struct WindowRing<S: DocumentSurface> {
    windows: VecDeque<Window<S>>,
}

impl<S: DocumentSurface> WindowRing<S> {
    pub fn new() -> Self {
        Self {
            windows: VecDeque::with_capacity(RING_SIZE + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.windows.iter().map(|w| w.index).collect()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.windows.front().map(|w| w.index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.windows.back().map(|w| w.index)
    }

    /// Window index held by the center slot
    pub fn center_index(&self) -> Option<usize> {
        self.windows.get(RING_CENTER).map(|w| w.index)
    }

    pub fn contains(&self, window_index: usize) -> bool {
        self.windows.iter().any(|w| w.index == window_index)
    }

    pub fn get(&self, window_index: usize) -> Option<&Window<S>> {
        self.windows.iter().find(|w| w.index == window_index)
    }

    pub fn get_mut(&mut self, window_index: usize) -> Option<&mut Window<S>> {
        self.windows.iter_mut().find(|w| w.index == window_index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Window<S>> {
        self.windows.iter_mut()
    }

    /// Append at the tail, dropping the head when over capacity. Returns the evicted window.
    pub fn push_back(&mut self, window: Window<S>) -> Option<Window<S>> {
        self.windows.push_back(window);
        (self.windows.len() > RING_SIZE)
            .then(|| self.windows.pop_front())
            .flatten()
    }

    /// Prepend at the head, dropping the tail when over capacity
    pub fn push_front(&mut self, window: Window<S>) -> Option<Window<S>> {
        self.windows.push_front(window);
        (self.windows.len() > RING_SIZE)
            .then(|| self.windows.pop_back())
            .flatten()
    }

    pub fn drain(&mut self) -> Vec<Window<S>> {
        self.windows.drain(..).collect()
    }

    /// Indices ascend by exactly one with no gaps
    pub fn is_contiguous(&self) -> bool {
        self.windows
            .iter()
            .zip(self.windows.iter().skip(1))
            .all(|(a, b)| b.index == a.index + 1)
    }
}

impl<S: DocumentSurface> Default for WindowRing<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::conveyor::supply::{ChapterContent, WindowDescription};
    use crate::conveyor::window::WindowDefaults;
    use crate::events::EventBus;
    use crate::headless_surface::HeadlessSurface;

    fn window(index: usize) -> Window<HeadlessSurface> {
        Window::build(
            WindowDescription {
                window_index: index,
                first_chapter_index: index,
                last_chapter_index: index,
                chapters: vec![ChapterContent {
                    chapter_index: index,
                    html: "<p>text</p>".to_string(),
                }],
            },
            HeadlessSurface::new(320.0, 480.0),
            Arc::new(ManualClock::new()),
            EventBus::new(),
            WindowDefaults::default(),
        )
        .unwrap()
    }

    #[test]
    fn push_back_evicts_head_past_capacity() {
        let mut ring = WindowRing::new();
        for i in 0..5 {
            assert!(ring.push_back(window(i)).is_none());
        }
        assert_eq!(ring.center_index(), Some(2));

        let evicted = ring.push_back(window(5)).unwrap();
        assert_eq!(evicted.index, 0);
        assert_eq!(ring.indices(), vec![1, 2, 3, 4, 5]);
        assert!(ring.is_contiguous());
    }

    #[test]
    fn push_front_evicts_tail_past_capacity() {
        let mut ring = WindowRing::new();
        for i in 1..6 {
            ring.push_back(window(i));
        }
        let evicted = ring.push_front(window(0)).unwrap();
        assert_eq!(evicted.index, 5);
        assert_eq!(ring.indices(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn gaps_break_contiguity() {
        let mut ring = WindowRing::new();
        ring.push_back(window(0));
        ring.push_back(window(2));
        assert!(!ring.is_contiguous());
    }
}
