use std::collections::HashMap;

use chrono::NaiveDate;

/// Per-sender daily allowance of language-model answers.
#[derive(Debug)]
pub struct DailyQuota {
    limit: u32,
    used: HashMap<String, (NaiveDate, u32)>,
}

impl DailyQuota {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: HashMap::new() }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Consume one unit. Returns false when today's allowance is spent.
    pub fn try_take(&mut self, sender: &str, today: NaiveDate) -> bool {
        let slot = self.used.entry(sender.to_owned()).or_insert((today, 0));
        if slot.0 != today {
            *slot = (today, 0);
        }
        if slot.1 >= self.limit {
            return false;
        }
        slot.1 += 1;
        true
    }

    /// Give back a unit, e.g. when the model call failed.
    pub fn refund(&mut self, sender: &str, today: NaiveDate) {
        if let Some(slot) = self.used.get_mut(sender) {
            if slot.0 == today {
                slot.1 = slot.1.saturating_sub(1);
            }
        }
    }

    pub fn remaining(&self, sender: &str, today: NaiveDate) -> u32 {
        match self.used.get(sender) {
            Some((day, used)) if *day == today => self.limit.saturating_sub(*used),
            _ => self.limit,
        }
    }

    /// Forget senders whose counters are from earlier days.
    pub fn purge_before(&mut self, today: NaiveDate) -> usize {
        let before = self.used.len();
        self.used.retain(|_, (day, _)| *day >= today);
        before - self.used.len()
    }
}
