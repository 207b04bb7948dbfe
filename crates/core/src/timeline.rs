use crate::{LayoutRule, OpeningResult, RevealSequence, TimingRule};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RevealPhase {
    Scrolling,
    Settling,
    Revealed,
}

/// Cubic ease-out of `elapsed / duration`, clamped to `[0, 1]`.
pub fn eased_progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let linear = (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0);
    1.0 - (1.0 - linear).powi(3)
}

/// Distance the strip travels to bring the last of `length` cards under the
/// center marker.
pub fn scroll_distance(length: usize, layout: &LayoutRule) -> f64 {
    length.saturating_sub(1) as f64 * layout.card_width
}

/// Horizontal scroll offset for a sample taken `elapsed` after start.
pub fn scroll_offset(
    elapsed: Duration,
    timing: &TimingRule,
    layout: &LayoutRule,
    length: usize,
) -> f64 {
    eased_progress(elapsed, timing.scroll()) * scroll_distance(length, layout)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevealFrame {
    pub phase: RevealPhase,
    pub progress: f64,
    pub offset: f64,
    /// Strip index under the center marker at this offset.
    pub centered: usize,
    /// Set once the winning card is revealed.
    pub highlighted: Option<usize>,
    /// True on the one sample where the completion callback fired.
    pub completed: bool,
}

/// Drives the reveal of one pack opening.
///
/// Every `sample` recomputes the frame from the wall-clock time elapsed
/// since `started_at`, so skipped samples never desync the animation. The
/// completion callback runs at most once, on the first sample at or after
/// scroll + settle + hold, and never after `cancel` or drop.
pub struct RevealController<F>
where
    F: FnOnce(OpeningResult),
{
    sequence: RevealSequence,
    result: OpeningResult,
    timing: TimingRule,
    layout: LayoutRule,
    started_at: Instant,
    phase: RevealPhase,
    on_complete: Option<F>,
    finished: bool,
    cancelled: bool,
}

impl<F> RevealController<F>
where
    F: FnOnce(OpeningResult),
{
    pub fn start(
        sequence: RevealSequence,
        result: OpeningResult,
        timing: TimingRule,
        layout: LayoutRule,
        started_at: Instant,
        on_complete: F,
    ) -> Self {
        Self {
            sequence,
            result,
            timing,
            layout,
            started_at,
            phase: RevealPhase::Scrolling,
            on_complete: Some(on_complete),
            finished: false,
            cancelled: false,
        }
    }

    pub fn sequence(&self) -> &RevealSequence {
        &self.sequence
    }

    pub fn result(&self) -> &OpeningResult {
        &self.result
    }

    /// Tears the controller down. Idempotent; the callback is dropped unrun.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.on_complete = None;
    }

    pub fn sample(&mut self, now: Instant) -> RevealFrame {
        let elapsed = now.saturating_duration_since(self.started_at);
        let scroll_end = self.timing.scroll();
        let reveal_at = scroll_end + self.timing.settle();
        let complete_at = reveal_at + self.timing.hold();

        if !self.cancelled {
            let next = if elapsed >= reveal_at {
                RevealPhase::Revealed
            } else if elapsed >= scroll_end {
                RevealPhase::Settling
            } else {
                RevealPhase::Scrolling
            };
            if next != self.phase {
                tracing::debug!(from = ?self.phase, to = ?next, "reveal phase");
                self.phase = next;
            }
        }

        let progress = eased_progress(elapsed, scroll_end);
        let offset = scroll_offset(elapsed, &self.timing, &self.layout, self.sequence.len());
        let centered = self.centered_index(offset);
        let highlighted = match self.phase {
            RevealPhase::Revealed => Some(self.sequence.winning_position),
            _ => None,
        };

        let mut completed = false;
        if !self.cancelled && !self.finished && elapsed >= complete_at {
            self.finished = true;
            if let Some(callback) = self.on_complete.take() {
                callback(self.result.clone());
                completed = true;
            }
        }

        RevealFrame {
            phase: self.phase,
            progress,
            offset,
            centered,
            highlighted,
            completed,
        }
    }

    fn centered_index(&self, offset: f64) -> usize {
        if self.layout.card_width <= 0.0 || self.sequence.is_empty() {
            return 0;
        }
        let idx = (offset / self.layout.card_width).round() as usize;
        idx.min(self.sequence.len() - 1)
    }
}

impl<F> std::fmt::Debug for RevealController<F>
where
    F: FnOnce(OpeningResult),
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealController")
            .field("pack_id", &self.result.pack_id)
            .field("phase", &self.phase)
            .field("finished", &self.finished)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
