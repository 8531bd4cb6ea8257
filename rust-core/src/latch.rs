//! Debounce latch that turns a continuous detection condition into
//! discrete rep counts.
//!
//! The latch has two states. A rising edge (Idle to Latched) counts one rep;
//! while the condition keeps holding, nothing more is counted. How the latch
//! falls back to Idle is governed by [`DebouncePolicy`].

use serde::{Deserialize, Serialize};

/// Default debounce tolerance in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// When a held latch is allowed to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebouncePolicy {
    /// Release once the condition is false and more than `debounce_ms` has
    /// passed since the last trigger.
    #[default]
    HoldUntilTimeout,
    /// Release as soon as the condition evaluates false.
    ReleaseImmediately,
}

/// Latch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    /// Not holding a rep.
    Idle,
    /// A rep was counted and the pose is still held.
    Latched,
}

/// Outcome of feeding one detection cycle into the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchTransition {
    /// Idle to Latched. Carries the new count.
    Triggered { count: u64 },
    /// Latched and still holding.
    Held,
    /// Latched to Idle.
    Released,
    /// Idle and nothing detected.
    Quiet,
}

impl LatchTransition {
    pub fn is_rising_edge(&self) -> bool {
        matches!(self, LatchTransition::Triggered { .. })
    }
}

/// Rep latch and counter.
///
/// This is the only state carried between detection cycles besides the
/// sample buffers.
#[derive(Debug, Clone)]
pub struct RepLatch {
    policy: DebouncePolicy,
    debounce_ms: u64,
    state: LatchState,
    last_trigger_ms: Option<u64>,
    count: u64,
}

impl RepLatch {
    pub fn new(policy: DebouncePolicy, debounce_ms: u64) -> Self {
        Self {
            policy,
            debounce_ms,
            state: LatchState::Idle,
            last_trigger_ms: None,
            count: 0,
        }
    }

    /// Feed the combined detection condition for the cycle at `now_ms`.
    pub fn update(&mut self, detected: bool, now_ms: u64) -> LatchTransition {
        match (self.state, detected) {
            (LatchState::Idle, true) => {
                self.state = LatchState::Latched;
                self.last_trigger_ms = Some(now_ms);
                self.count += 1;
                LatchTransition::Triggered { count: self.count }
            }
            (LatchState::Idle, false) => LatchTransition::Quiet,
            (LatchState::Latched, true) => LatchTransition::Held,
            (LatchState::Latched, false) => {
                if self.may_release(now_ms) {
                    self.state = LatchState::Idle;
                    LatchTransition::Released
                } else {
                    LatchTransition::Held
                }
            }
        }
    }

    fn may_release(&self, now_ms: u64) -> bool {
        match self.policy {
            DebouncePolicy::ReleaseImmediately => true,
            DebouncePolicy::HoldUntilTimeout => match self.last_trigger_ms {
                Some(t) => now_ms.saturating_sub(t) > self.debounce_ms,
                None => true,
            },
        }
    }

    /// Force Idle and zero the count.
    pub fn reset(&mut self) {
        self.state = LatchState::Idle;
        self.last_trigger_ms = None;
        self.count = 0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state == LatchState::Latched
    }

    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }
}

impl Default for RepLatch {
    fn default() -> Self {
        Self::new(DebouncePolicy::default(), DEFAULT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge_counts_once() {
        let mut latch = RepLatch::default();
        assert_eq!(latch.update(true, 0), LatchTransition::Triggered { count: 1 });
        for t in 1..100 {
            assert_eq!(latch.update(true, t * 16), LatchTransition::Held);
        }
        assert_eq!(latch.count(), 1);
        assert!(latch.is_latched());
    }

    #[test]
    fn test_idle_stays_quiet() {
        let mut latch = RepLatch::default();
        assert_eq!(latch.update(false, 0), LatchTransition::Quiet);
        assert_eq!(latch.state(), LatchState::Idle);
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn test_hold_until_timeout_waits_for_debounce() {
        let mut latch = RepLatch::new(DebouncePolicy::HoldUntilTimeout, 500);
        latch.update(true, 1000);

        // Condition drops but tolerance has not elapsed
        assert_eq!(latch.update(false, 1200), LatchTransition::Held);
        assert_eq!(latch.update(false, 1500), LatchTransition::Held);
        // A new qualifying cycle inside the window is not a second rep
        assert_eq!(latch.update(true, 1400), LatchTransition::Held);

        assert_eq!(latch.update(false, 1501), LatchTransition::Released);
        assert_eq!(latch.update(true, 1520), LatchTransition::Triggered { count: 2 });
    }

    #[test]
    fn test_release_immediately_policy() {
        let mut latch = RepLatch::new(DebouncePolicy::ReleaseImmediately, 500);
        latch.update(true, 1000);
        assert_eq!(latch.update(false, 1016), LatchTransition::Released);
        assert_eq!(latch.update(true, 1032), LatchTransition::Triggered { count: 2 });
    }

    #[test]
    fn test_held_condition_never_releases() {
        let mut latch = RepLatch::new(DebouncePolicy::HoldUntilTimeout, 500);
        latch.update(true, 0);
        assert_eq!(latch.update(true, 10_000), LatchTransition::Held);
        assert_eq!(latch.count(), 1);
    }

    #[test]
    fn test_reset_clears_latch_and_count() {
        let mut latch = RepLatch::default();
        latch.update(true, 0);
        latch.reset();

        assert_eq!(latch.count(), 0);
        assert_eq!(latch.state(), LatchState::Idle);
        assert_eq!(latch.last_trigger_ms(), None);
        // Still-held pose counts again right after reset
        assert!(latch.update(true, 16).is_rising_edge());
        assert_eq!(latch.count(), 1);
    }
}
