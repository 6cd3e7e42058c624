//! Response cache: TTL entries, evicted in insertion order when full.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::RouteKind;

/// Normalized text plus the sender's last four digits.
pub fn cache_key(normalized: &str, sender_number: &str) -> String {
    let digits: Vec<char> = sender_number.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("{normalized}|{tail}")
}

#[derive(Debug, Clone)]
pub struct CachedReply {
    pub text: String,
    pub route: RouteKind,
    /// Knowledge entry the reply came from, reinforced on every hit.
    pub learned: Option<Uuid>,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CachedReply>,
    order: VecDeque<String>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { entries: HashMap::new(), order: VecDeque::new(), ttl, capacity: capacity.max(1) }
    }

    pub fn get(&self, key: &str, now: Instant) -> Option<&CachedReply> {
        self.entries.get(key).filter(|e| now.saturating_duration_since(e.stored_at) < self.ttl)
    }

    pub fn insert(&mut self, key: String, text: String, route: RouteKind, learned: Option<Uuid>, now: Instant) {
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        while self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, CachedReply { text, route, learned, stored_at: now });
    }

    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < ttl);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
