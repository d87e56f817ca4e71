//! Edge proximity detection with per-direction latching

use super::{BOUNDARY_THRESHOLD, Direction};

#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    threshold: f32,
    next_latched: bool,
    previous_latched: bool,
}

impl BoundaryDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            next_latched: false,
            previous_latched: false,
        }
    }

    /// `current / max(1, count - 1)`
    #[must_use]
    pub fn progress(current_page: usize, page_count: usize) -> f32 {
        current_page as f32 / page_count.saturating_sub(1).max(1) as f32
    }

    /// Feed the latest position; returns a direction the first time an edge zone is entered.
    ///
    /// A latch clears once progress is back in the middle band.
    pub fn observe(&mut self, current_page: usize, page_count: usize) -> Option<Direction> {
        self.observe_progress(Self::progress(current_page, page_count))
    }

    pub fn observe_progress(&mut self, progress: f32) -> Option<Direction> {
        let near_next = progress >= self.threshold;
        let near_previous = progress <= 1.0 - self.threshold;

        if !near_next {
            self.next_latched = false;
        }
        if !near_previous {
            self.previous_latched = false;
        }

        if near_next && !self.next_latched {
            self.next_latched = true;
            return Some(Direction::Next);
        }
        if near_previous && !self.previous_latched {
            self.previous_latched = true;
            return Some(Direction::Previous);
        }
        None
    }

    /// Page turn attempted past the last (or before the first) page.
    ///
    /// Always reported: the reader explicitly asked to leave the window.
    pub fn edge_exhausted(&mut self, direction: Direction) -> Direction {
        match direction {
            Direction::Next => self.next_latched = true,
            Direction::Previous => self.previous_latched = true,
        }
        direction
    }
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new(BOUNDARY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_uses_last_page_as_denominator() {
        assert_eq!(BoundaryDetector::progress(0, 1), 0.0);
        assert_eq!(BoundaryDetector::progress(9, 10), 1.0);
        assert_eq!(BoundaryDetector::progress(5, 11), 0.5);
    }

    #[test]
    fn next_fires_once_while_lingering() {
        let mut detector = BoundaryDetector::default();
        assert_eq!(detector.observe_progress(0.5), None);
        assert_eq!(detector.observe_progress(0.95), Some(Direction::Next));
        assert_eq!(detector.observe_progress(0.97), None);
        assert_eq!(detector.observe_progress(1.0), None);
    }

    #[test]
    fn latch_resets_after_returning_to_middle() {
        let mut detector = BoundaryDetector::default();
        assert_eq!(detector.observe_progress(0.5), None);
        assert_eq!(detector.observe_progress(0.95), Some(Direction::Next));
        assert_eq!(detector.observe_progress(0.5), None);
        assert_eq!(detector.observe_progress(0.95), Some(Direction::Next));
    }

    #[test]
    fn previous_mirrors_next() {
        let mut detector = BoundaryDetector::default();
        assert_eq!(detector.observe(50, 101), None);
        assert_eq!(detector.observe(5, 101), Some(Direction::Previous));
        assert_eq!(detector.observe(2, 101), None);
        assert_eq!(detector.observe(50, 101), None);
        assert_eq!(detector.observe(0, 101), Some(Direction::Previous));
    }

    #[test]
    fn exhaustion_latches_direction() {
        let mut detector = BoundaryDetector::default();
        assert_eq!(detector.edge_exhausted(Direction::Next), Direction::Next);
        assert_eq!(detector.observe_progress(0.95), None);
        assert_eq!(detector.observe_progress(1.0), None);
    }
}
