use crate::solver::RestartPolicy;

/// The `index`-th element (0-based) of the Luby sequence 1, 1, 2, 1, 1, 2, 4, ...
pub fn luby(mut index: u64) -> u64 {
    let mut size = 1;
    let mut seq = 0;
    while size < index + 1 {
        seq += 1;
        size = 2 * size + 1;
    }
    while size - 1 != index {
        size = (size - 1) >> 1;
        seq -= 1;
        index %= size;
    }
    1 << seq
}

/// Counts conflicts and tells the search when to restart.
pub struct RestartSchedule {
    policy: RestartPolicy,
    restarts: u64,
    conflicts: u64,
    /// Conflicts allowed before the next restart, `None` if restarts are disabled.
    interval: Option<u64>,
}

impl RestartSchedule {
    pub fn new(policy: RestartPolicy) -> Self {
        let interval = match policy {
            RestartPolicy::Never => None,
            RestartPolicy::Fixed(n) => Some(n),
            RestartPolicy::Geometric { first } => Some(first),
            RestartPolicy::Luby { unit } => Some(unit * luby(0)),
        };

        RestartSchedule {
            policy,
            restarts: 0,
            conflicts: 0,
            interval,
        }
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    /// Records a conflict. Returns true when a restart is due.
    pub fn on_conflict(&mut self) -> bool {
        let interval = match self.interval {
            Some(interval) => interval,
            None => return false,
        };

        self.conflicts += 1;
        if self.conflicts < interval {
            return false;
        }

        self.conflicts = 0;
        self.restarts += 1;
        self.interval = Some(match self.policy {
            RestartPolicy::Geometric { .. } => interval.saturating_mul(3) / 2 + 10,
            RestartPolicy::Luby { unit } => unit.saturating_mul(luby(self.restarts)),
            _ => interval,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_sequence() {
        let prefix = (0..15).map(luby).collect::<Vec<_>>();
        assert_eq!(prefix, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
    }

    fn restart_points(policy: RestartPolicy, conflicts: u64) -> Vec<u64> {
        let mut schedule = RestartSchedule::new(policy);
        (1..=conflicts).filter(|_| schedule.on_conflict()).collect()
    }

    #[test]
    fn never_restarts() {
        assert!(restart_points(RestartPolicy::Never, 1000).is_empty());
    }

    #[test]
    fn fixed_interval() {
        assert_eq!(restart_points(RestartPolicy::Fixed(1), 3), vec![1, 2, 3]);
        assert_eq!(restart_points(RestartPolicy::Fixed(4), 12), vec![4, 8, 12]);
    }

    #[test]
    fn geometric_interval_grows() {
        // 50, then 85, then 137
        assert_eq!(
            restart_points(RestartPolicy::Geometric { first: 50 }, 300),
            vec![50, 135, 272]
        );
    }

    #[test]
    fn luby_interval() {
        assert_eq!(
            restart_points(RestartPolicy::Luby { unit: 10 }, 70),
            vec![10, 20, 40, 50, 60]
        );
    }
}
