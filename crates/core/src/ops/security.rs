//! Pre-routing gate: blacklist, per-sender rate limit, spam window.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::config::BotCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Blacklisted sender, ignored silently.
    Blacklisted,
    /// Too soon after the previous message, dropped.
    RateLimited,
    /// Crossed the spam threshold; send one warning.
    SpamWarning,
    /// Still spamming after the warning, dropped.
    Silenced,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecurityStats {
    pub allowed: u64,
    pub blacklisted: u64,
    pub rate_limited: u64,
    pub spam_warnings: u64,
    pub silenced: u64,
}

#[derive(Debug)]
pub struct SecurityGate {
    rate_limit: Duration,
    window: Duration,
    max_in_window: usize,
    last_seen: HashMap<String, Instant>,
    windows: HashMap<String, VecDeque<Instant>>,
    warned: HashSet<String>,
    stats: SecurityStats,
}

impl SecurityGate {
    pub fn new(cfg: &BotCfg) -> Self {
        Self {
            rate_limit: Duration::from_millis(cfg.rate_limit_ms),
            window: Duration::from_secs(cfg.spam_window_secs),
            max_in_window: cfg.spam_max_messages.max(1),
            last_seen: HashMap::new(),
            windows: HashMap::new(),
            warned: HashSet::new(),
            stats: SecurityStats::default(),
        }
    }

    /// Decide whether a message from `sender` proceeds to routing.
    pub fn check(&mut self, sender: &str, blacklisted: bool, now: Instant) -> GateDecision {
        let decision = self.decide(sender, blacklisted, now);
        let counter = match decision {
            GateDecision::Allow => &mut self.stats.allowed,
            GateDecision::Blacklisted => &mut self.stats.blacklisted,
            GateDecision::RateLimited => &mut self.stats.rate_limited,
            GateDecision::SpamWarning => &mut self.stats.spam_warnings,
            GateDecision::Silenced => &mut self.stats.silenced,
        };
        *counter += 1;
        if decision != GateDecision::Allow {
            tracing::debug!(sender, ?decision, "security gate");
        }
        decision
    }

    fn decide(&mut self, sender: &str, blacklisted: bool, now: Instant) -> GateDecision {
        if blacklisted {
            return GateDecision::Blacklisted;
        }

        // Dropped messages leave the timestamp alone, so a steady sender is not starved.
        let previous = self.last_seen.get(sender);
        if previous.is_some_and(|prev| now.saturating_duration_since(*prev) < self.rate_limit) {
            return GateDecision::RateLimited;
        }
        self.last_seen.insert(sender.to_owned(), now);

        let window = self.windows.entry(sender.to_owned()).or_default();
        while window.front().is_some_and(|t| now.saturating_duration_since(*t) >= self.window) {
            window.pop_front();
        }
        window.push_back(now);

        if window.len() > self.max_in_window {
            if self.warned.insert(sender.to_owned()) {
                return GateDecision::SpamWarning;
            }
            return GateDecision::Silenced;
        }
        self.warned.remove(sender);
        GateDecision::Allow
    }

    /// Drop per-sender state older than the spam window. Returns senders purged.
    pub fn purge_stale(&mut self, now: Instant) -> usize {
        let horizon = self.window.max(self.rate_limit);
        let before = self.last_seen.len();
        self.last_seen.retain(|_, t| now.saturating_duration_since(*t) < horizon);
        let last_seen = &self.last_seen;
        self.windows.retain(|sender, _| last_seen.contains_key(sender));
        self.warned.retain(|sender| last_seen.contains_key(sender));
        before - self.last_seen.len()
    }

    pub fn stats(&self) -> &SecurityStats {
        &self.stats
    }

    pub fn tracked_senders(&self) -> usize {
        self.last_seen.len()
    }
}
