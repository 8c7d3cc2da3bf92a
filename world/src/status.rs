//! Timed, non-stacking status effects carried by entities.

use std::time::Duration;

use prophecy_core::{CountdownTimer, StatusKind};

#[derive(Clone, Debug)]
struct Status {
    kind: StatusKind,
    timer: CountdownTimer,
}

/// Active timed modifiers of one entity. Kinds never stack.
#[derive(Clone, Debug, Default)]
pub(crate) struct StatusSet {
    statuses: Vec<Status>,
}

impl StatusSet {
    pub(crate) fn add(&mut self, kind: StatusKind, duration: Duration) -> bool {
        if self.has(kind) {
            return false;
        }
        self.statuses.push(Status {
            kind,
            timer: CountdownTimer::new(duration),
        });
        true
    }

    pub(crate) fn has(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|status| status.kind == kind)
    }

    pub(crate) fn time_left(&self, kind: StatusKind) -> Option<Duration> {
        self.statuses
            .iter()
            .find(|status| status.kind == kind)
            .map(|status| status.timer.time_left())
    }

    /// Advances every timer and drops the ones that ran out.
    pub(crate) fn tick(&mut self, dt: Duration) -> Vec<StatusKind> {
        let mut expired = Vec::new();
        self.statuses.retain_mut(|status| {
            if status.timer.update(dt) {
                expired.push(status.kind);
                false
            } else {
                true
            }
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_status_of_same_kind_is_rejected() {
        let mut set = StatusSet::default();
        assert!(set.add(StatusKind::Invincible, Duration::from_millis(150)));
        let _ = set.tick(Duration::from_millis(100));
        assert!(!set.add(StatusKind::Invincible, Duration::from_secs(10)));
        assert_eq!(
            set.time_left(StatusKind::Invincible),
            Some(Duration::from_millis(50)),
            "original expiry kept"
        );
    }

    #[test]
    fn expired_statuses_leave_the_set() {
        let mut set = StatusSet::default();
        let _ = set.add(StatusKind::Invincible, Duration::from_millis(32));
        assert!(set.tick(Duration::from_millis(16)).is_empty());
        assert!(set.tick(Duration::from_millis(16)).is_empty());
        assert_eq!(set.tick(Duration::from_millis(16)), vec![StatusKind::Invincible]);
        assert!(!set.has(StatusKind::Invincible));
    }
}
