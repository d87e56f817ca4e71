//! Column layout engine: one viewport-wide column per page, zero gap

use std::time::{Duration, Instant};

use log::{debug, warn};

use super::MIN_MEASURABLE_WIDTH;
use super::retry::RetryPolicy;
use crate::error::SurfaceError;
use crate::surface::{ColumnStyle, DocumentSurface};

/// Result of one layout measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutPass {
    pub applied_width: f32,
    pub page_count: usize,
    /// Fallback width in use while a remeasurement is still scheduled
    pub provisional: bool,
}

#[derive(Debug)]
pub struct ColumnLayout {
    policy: RetryPolicy,
    attempts: u32,
    retry_at: Option<Instant>,
}

impl ColumnLayout {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            retry_at: None,
        }
    }

    /// Start a fresh measurement cycle, cancelling any pending retry
    pub fn begin_cycle(&mut self) {
        if self.retry_at.take().is_some() {
            debug!("cancelled pending layout retry");
        }
        self.attempts = 0;
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_at.is_some()
    }

    pub fn retry_due(&self, now: Instant) -> bool {
        self.retry_at.is_some_and(|at| now >= at)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Measure the viewport, apply the column layout and pin the content width.
    ///
    /// Font size is reapplied on every pass so relayout never drops an override.
    pub fn apply<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        font_size: Option<f32>,
        now: Instant,
    ) -> Result<LayoutPass, SurfaceError> {
        self.retry_at = None;
        let measured = surface.viewport_width();

        let (applied_width, provisional) = if measured >= MIN_MEASURABLE_WIDTH {
            self.attempts = 0;
            (measured, false)
        } else {
            match self.policy.next_delay(self.attempts) {
                Some(delay) => {
                    self.schedule_retry(now, delay);
                    warn!(
                        "viewport width {measured} unmeasurable, using {} provisionally (retry {}/{})",
                        self.policy.fallback_width, self.attempts, self.policy.max_attempts
                    );
                    (self.policy.fallback_width, true)
                }
                None => {
                    warn!(
                        "viewport width {measured} still unmeasurable after {} retries, committing to {}",
                        self.policy.max_attempts, self.policy.fallback_width
                    );
                    (self.policy.fallback_width, false)
                }
            }
        };

        surface.apply_column_style(ColumnStyle {
            column_width: applied_width,
            column_gap: 0.0,
            font_size,
        });
        let extent = surface.flush_layout()?;
        let page_count = page_count_for(extent, applied_width);
        surface.set_content_width(page_count as f32 * applied_width);

        debug!("layout: extent {extent} / width {applied_width} -> {page_count} pages");
        Ok(LayoutPass {
            applied_width,
            page_count,
            provisional,
        })
    }

    fn schedule_retry(&mut self, now: Instant, delay: Duration) {
        self.attempts += 1;
        self.retry_at = Some(now + delay);
    }
}

/// `max(1, ceil(extent / width))`, tolerant of sub-pixel float error
#[must_use]
pub fn page_count_for(extent: f32, width: f32) -> usize {
    if width <= 0.0 || !extent.is_finite() || extent <= 0.0 {
        return 1;
    }
    let pages = extent / width;
    let snapped = pages.round();
    let pages = if (pages - snapped).abs() < 1e-3 {
        snapped
    } else {
        pages.ceil()
    };
    (pages as usize).max(1)
}
