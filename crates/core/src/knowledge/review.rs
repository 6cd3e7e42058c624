use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// A generated answer waiting for the owner's approve/reject.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub number: u32,
    pub input: String,
    pub response: String,
    pub confidence: f32,
    pub queued_at: DateTime<Utc>,
}

/// Manual review queue with short numeric ids. Oldest items fall off when full.
#[derive(Debug)]
pub struct ReviewQueue {
    items: VecDeque<ReviewItem>,
    next: u32,
    capacity: usize,
}

impl ReviewQueue {
    pub fn new(capacity: usize) -> Self {
        Self { items: VecDeque::new(), next: 1, capacity: capacity.max(1) }
    }

    /// Queue a candidate and return its number.
    pub fn push(&mut self, input: impl Into<String>, response: impl Into<String>, confidence: f32) -> u32 {
        if self.items.len() >= self.capacity {
            if let Some(dropped) = self.items.pop_front() {
                tracing::debug!(number = dropped.number, "review queue full, dropping oldest");
            }
        }
        let number = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        self.items.push_back(ReviewItem {
            number,
            input: input.into(),
            response: response.into(),
            confidence,
            queued_at: Utc::now(),
        });
        number
    }

    /// Remove and return an item by number.
    pub fn take(&mut self, number: u32) -> Option<ReviewItem> {
        let idx = self.items.iter().position(|i| i.number == number)?;
        self.items.remove(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
