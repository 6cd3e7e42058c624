//! Periodic jobs with explicit deadlines. The runtime asks for the earliest
//! deadline and runs whatever is due, so jobs never overlap message handling.

use std::time::{Duration, Instant};

use crate::config::BotCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Cleanup,
    Backup,
    Monitoring,
}

impl Job {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cleanup => "cleanup",
            Self::Backup => "backup",
            Self::Monitoring => "monitoring",
        }
    }
}

#[derive(Debug)]
struct Slot {
    job: Job,
    every: Duration,
    next: Instant,
    enabled: bool,
}

#[derive(Debug)]
pub struct Scheduler {
    slots: Vec<Slot>,
}

impl Scheduler {
    /// First runs are one interval after `now`. A zero interval disables the job.
    pub fn new(cfg: &BotCfg, now: Instant) -> Self {
        let slot = |job, secs: u64| Slot {
            job,
            every: Duration::from_secs(secs),
            next: now + Duration::from_secs(secs),
            enabled: secs > 0,
        };
        Self {
            slots: vec![
                slot(Job::Cleanup, cfg.cleanup_interval_secs),
                slot(Job::Backup, cfg.backup_interval_secs),
                slot(Job::Monitoring, cfg.monitoring_interval_secs),
            ],
        }
    }

    pub fn set_enabled(&mut self, job: Job, enabled: bool) {
        for slot in self.slots.iter_mut().filter(|s| s.job == job) {
            slot.enabled = enabled && !slot.every.is_zero();
        }
    }

    pub fn is_enabled(&self, job: Job) -> bool {
        self.slots.iter().any(|s| s.job == job && s.enabled)
    }

    /// Earliest deadline among enabled jobs.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter(|s| s.enabled).map(|s| s.next).min()
    }

    /// Jobs whose deadline has passed, in declaration order. Each one is
    /// rescheduled a full interval after `now`; missed runs are not replayed.
    pub fn due(&mut self, now: Instant) -> Vec<Job> {
        let mut due = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.enabled && s.next <= now) {
            slot.next = now + slot.every;
            due.push(slot.job);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BotCfg {
        BotCfg {
            cleanup_interval_secs: 10,
            backup_interval_secs: 0,
            monitoring_interval_secs: 30,
            ..BotCfg::default()
        }
    }

    #[test]
    fn zero_interval_disables() {
        let s = Scheduler::new(&cfg(), Instant::now());
        assert!(!s.is_enabled(Job::Backup));
        assert!(s.is_enabled(Job::Cleanup));
    }

    #[test]
    fn due_jobs_are_rescheduled() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(&cfg(), t0);
        assert_eq!(s.next_deadline(), Some(t0 + Duration::from_secs(10)));
        assert!(s.due(t0 + Duration::from_secs(5)).is_empty());

        let t1 = t0 + Duration::from_secs(31);
        assert_eq!(s.due(t1), vec![Job::Cleanup, Job::Monitoring]);
        assert_eq!(s.next_deadline(), Some(t1 + Duration::from_secs(10)));
        assert!(s.due(t1).is_empty());
    }

    #[test]
    fn disabled_job_never_due() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(&cfg(), t0);
        s.set_enabled(Job::Cleanup, false);
        s.set_enabled(Job::Monitoring, false);
        assert_eq!(s.next_deadline(), None);
        assert!(s.due(t0 + Duration::from_secs(3600)).is_empty());
    }
}
