//! Flap damping for the quick status label
//!
//! Consecutive cycles can bounce between OK and PARTIAL when a single probe
//! sits right at its timeout. The damper only reports such a change after the
//! new label has been observed for `confirm_cycles` cycles in a row.
//! Escalation to CRITICAL is never delayed.

use crate::models::StatusLabel;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
struct DamperState {
    history: VecDeque<StatusLabel>,
    reported: Option<StatusLabel>,
}

/// Hysteresis over raw status labels
#[derive(Debug)]
pub struct FlapDamper {
    window: usize,
    confirm_cycles: usize,
    state: Mutex<DamperState>,
}

impl FlapDamper {
    /// `window` is raised to `confirm_cycles` when smaller; both are at least 1
    pub fn new(window: usize, confirm_cycles: usize) -> Self {
        let confirm_cycles = confirm_cycles.max(1);
        let window = window.max(confirm_cycles);
        Self {
            window,
            confirm_cycles,
            state: Mutex::new(DamperState {
                history: VecDeque::with_capacity(window),
                reported: None,
            }),
        }
    }

    /// Record a raw label and return the label to report
    ///
    /// Call once per scheduled cycle; every call counts towards confirmation.
    pub fn observe(&self, raw: StatusLabel) -> StatusLabel {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.history.len() == self.window {
            state.history.pop_front();
        }
        state.history.push_back(raw);

        let reported = self.resolve(state.reported, trailing(&state.history, raw), raw);
        if state.reported != Some(reported) {
            tracing::debug!(
                from = ?state.reported,
                to = %reported,
                "Reported status label changed"
            );
        }
        state.reported = Some(reported);
        reported
    }

    /// The label `observe` would report for `raw`, without recording it
    pub fn peek(&self, raw: StatusLabel) -> StatusLabel {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.resolve(state.reported, trailing(&state.history, raw) + 1, raw)
    }

    /// Last label returned by `observe`
    pub fn reported(&self) -> Option<StatusLabel> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reported
    }

    /// `streak` counts the trailing raw labels equal to `raw`, including it
    fn resolve(&self, reported: Option<StatusLabel>, streak: usize, raw: StatusLabel) -> StatusLabel {
        match reported {
            None => raw,
            Some(current) if current == raw => current,
            Some(_) if raw == StatusLabel::Critical => raw,
            Some(_) if streak >= self.confirm_cycles => raw,
            Some(current) => current,
        }
    }

    /// Forget all history
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.history.clear();
        state.reported = None;
    }

    pub fn history_len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .history
            .len()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

fn trailing(history: &VecDeque<StatusLabel>, raw: StatusLabel) -> usize {
    history.iter().rev().take_while(|label| **label == raw).count()
}
