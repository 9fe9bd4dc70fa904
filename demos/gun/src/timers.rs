//! One-shot timers. Nothing runs in the background: due timers are collected once per tick and
//! handled on the same thread as everything else.

use std::time::{Duration, Instant};

use grabkit::contexts::host::EntityId;

/// Something to do later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Throw a target in front of the camera
    LaunchTarget,
    /// Play the load sound and raise the arm
    PlayLoadSound,
    /// Clean up after a hit
    DeleteHit { bullet: EntityId, target: EntityId },
}

#[derive(Debug, Clone, Default)]
pub struct Timers {
    pending: Vec<(Instant, TimerAction)>,
}

impl Timers {
    /// Run `action` once `delay` has passed since `now`
    pub fn schedule(&mut self, now: Instant, delay: Duration, action: TimerAction) {
        self.pending.push((now + delay, action));
    }

    /// Remove and return every action due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerAction> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = pending;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, action)| action).collect()
    }

    /// When the next timer fires, if any are pending
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_once_in_order() {
        let start = Instant::now();
        let mut timers = Timers::default();
        timers.schedule(start, Duration::from_millis(2000), TimerAction::PlayLoadSound);
        timers.schedule(start, Duration::from_millis(500), TimerAction::LaunchTarget);
        assert_eq!(timers.next_due(), Some(start + Duration::from_millis(500)));

        assert!(timers.take_due(start + Duration::from_millis(499)).is_empty());
        assert_eq!(
            timers.take_due(start + Duration::from_secs(3)),
            vec![TimerAction::LaunchTarget, TimerAction::PlayLoadSound]
        );
        assert!(timers.is_empty());
        assert!(timers.take_due(start + Duration::from_secs(4)).is_empty());
    }
}
