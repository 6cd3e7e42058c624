//! Per-sender conversation history with an idle TTL.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::types::{Speaker, Turn};

#[derive(Debug)]
struct Session {
    turns: VecDeque<Turn>,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct SessionTracker {
    sessions: HashMap<String, Session>,
    ttl: Duration,
    /// Turns kept per session, both speakers counted.
    capacity: usize,
}

impl SessionTracker {
    pub fn new(ttl: Duration, history_cap: usize) -> Self {
        Self { sessions: HashMap::new(), ttl, capacity: history_cap.max(2) }
    }

    /// Whether the sender has talked to the bot within the TTL.
    pub fn is_active(&self, sender: &str, now: Instant) -> bool {
        self.sessions
            .get(sender)
            .is_some_and(|s| now.saturating_duration_since(s.last_seen) < self.ttl)
    }

    /// Append one exchange. An expired session starts over.
    pub fn record(&mut self, sender: &str, customer: &str, bot: &str, now: Instant) {
        let active = self.is_active(sender, now);
        let session = self
            .sessions
            .entry(sender.to_owned())
            .or_insert_with(|| Session { turns: VecDeque::new(), last_seen: now });
        if !active {
            session.turns.clear();
        }
        session.turns.push_back(Turn { speaker: Speaker::Customer, text: customer.to_owned() });
        session.turns.push_back(Turn { speaker: Speaker::Bot, text: bot.to_owned() });
        while session.turns.len() > self.capacity {
            session.turns.pop_front();
        }
        session.last_seen = now;
    }

    /// History for an active session, oldest first.
    pub fn history(&self, sender: &str, now: Instant) -> Vec<Turn> {
        if !self.is_active(sender, now) {
            return Vec::new();
        }
        self.sessions.get(sender).map(|s| s.turns.iter().cloned().collect()).unwrap_or_default()
    }

    /// Forget one sender. Returns false if there was nothing to forget.
    pub fn reset(&mut self, sender: &str) -> bool {
        self.sessions.remove(sender).is_some()
    }

    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, s| now.saturating_duration_since(s.last_seen) < ttl);
        before - self.sessions.len()
    }

    pub fn active_count(&self, now: Instant) -> usize {
        self.sessions.values().filter(|s| now.saturating_duration_since(s.last_seen) < self.ttl).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_capped_and_expires() {
        let mut s = SessionTracker::new(Duration::from_secs(1800), 4);
        let t0 = Instant::now();
        assert!(!s.is_active("a", t0));
        for i in 0..3 {
            s.record("a", &format!("q{i}"), &format!("r{i}"), t0);
        }
        let h = s.history("a", t0);
        assert_eq!(h.len(), 4);
        assert_eq!(h[0].text, "q1");
        assert!(s.history("a", t0 + Duration::from_secs(1801)).is_empty());
    }

    #[test]
    fn expired_session_restarts() {
        let mut s = SessionTracker::new(Duration::from_secs(10), 10);
        let t0 = Instant::now();
        s.record("a", "q", "r", t0);
        let later = t0 + Duration::from_secs(11);
        s.record("a", "q2", "r2", later);
        assert_eq!(s.history("a", later).len(), 2);
        assert_eq!(s.purge_expired(later + Duration::from_secs(11)), 1);
        assert!(!s.reset("a"));
    }
}
