use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::classify::mood::Mood;
use crate::router::RouteKind;

/// Distinct queries tracked before new ones are ignored.
const MAX_TRACKED_QUERIES: usize = 500;

/// Distinct senders remembered per day. Beyond this the count saturates.
const MAX_TRACKED_SENDERS: usize = 10_000;

/// One routed message, as seen by analytics.
#[derive(Debug, Clone)]
pub struct TrackedMessage<'a> {
    pub sender: &'a str,
    pub normalized: &'a str,
    pub route: RouteKind,
    pub mood: Mood,
    pub product: Option<&'a str>,
}

/// In-memory usage counters since startup.
#[derive(Debug)]
pub struct Analytics {
    started: DateTime<Utc>,
    total: u64,
    by_route: HashMap<RouteKind, u64>,
    senders_day: NaiveDate,
    senders: HashSet<String>,
    moods: HashMap<Mood, u64>,
    products: HashMap<String, u64>,
    queries: HashMap<String, u64>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            total: 0,
            by_route: HashMap::new(),
            senders_day: Local::now().date_naive(),
            senders: HashSet::new(),
            moods: HashMap::new(),
            products: HashMap::new(),
            queries: HashMap::new(),
        }
    }

    pub fn track(&mut self, msg: &TrackedMessage<'_>) {
        self.track_on(msg, Local::now().date_naive());
    }

    fn track_on(&mut self, msg: &TrackedMessage<'_>, day: NaiveDate) {
        self.total += 1;
        *self.by_route.entry(msg.route).or_default() += 1;
        *self.moods.entry(msg.mood).or_default() += 1;
        if day != self.senders_day {
            self.senders_day = day;
            self.senders.clear();
        }
        if self.senders.len() < MAX_TRACKED_SENDERS && !self.senders.contains(msg.sender) {
            self.senders.insert(msg.sender.to_owned());
        }
        if let Some(product) = msg.product {
            *self.products.entry(product.to_owned()).or_default() += 1;
        }
        if msg.normalized.is_empty() {
            return;
        }
        if let Some(n) = self.queries.get_mut(msg.normalized) {
            *n += 1;
        } else if self.queries.len() < MAX_TRACKED_QUERIES {
            self.queries.insert(msg.normalized.to_owned(), 1);
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Distinct senders seen today.
    pub fn unique_senders(&self) -> usize {
        self.senders.len()
    }

    pub fn route_count(&self, route: RouteKind) -> u64 {
        self.by_route.get(&route).copied().unwrap_or(0)
    }

    pub fn mood_count(&self, mood: Mood) -> u64 {
        self.moods.get(&mood).copied().unwrap_or(0)
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    /// Highest counts first; equal counts by text.
    pub fn top_queries(&self, n: usize) -> Vec<(&str, u64)> {
        top(&self.queries, n)
    }

    pub fn top_products(&self, n: usize) -> Vec<(&str, u64)> {
        top(&self.products, n)
    }

    /// Routes ordered by count, for reports.
    pub fn routes(&self) -> Vec<(RouteKind, u64)> {
        let mut routes: Vec<(RouteKind, u64)> = self.by_route.iter().map(|(k, v)| (*k, *v)).collect();
        routes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.as_str().cmp(b.0.as_str())));
        routes
    }
}

fn top(map: &HashMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut items: Vec<(&str, u64)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    items.truncate(n);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg<'a>(sender: &'a str, text: &'a str, route: RouteKind) -> TrackedMessage<'a> {
        TrackedMessage { sender, normalized: text, route, mood: Mood::Neutral, product: None }
    }

    #[test]
    fn counts_routes_senders_and_queries() {
        let mut a = Analytics::new();
        a.track(&msg("1", "halo", RouteKind::System));
        a.track(&msg("2", "halo", RouteKind::System));
        a.track(&TrackedMessage { product: Some("netflix"), ..msg("1", "netflix berapa", RouteKind::Hybrid) });
        assert_eq!(a.total(), 3);
        assert_eq!(a.unique_senders(), 2);
        assert_eq!(a.route_count(RouteKind::System), 2);
        assert_eq!(a.top_queries(1), vec![("halo", 2)]);
        assert_eq!(a.top_products(5), vec![("netflix", 1)]);
        assert_eq!(a.routes()[0], (RouteKind::System, 2));
    }

    #[test]
    fn sender_set_is_bounded() {
        let mut a = Analytics::new();
        let day = a.senders_day;
        for i in 0..MAX_TRACKED_SENDERS + 50 {
            let sender = i.to_string();
            a.track_on(&msg(&sender, "", RouteKind::LlmFallback), day);
        }
        assert_eq!(a.unique_senders(), MAX_TRACKED_SENDERS);
        assert_eq!(a.total(), (MAX_TRACKED_SENDERS + 50) as u64);

        let tomorrow = day.succ_opt().unwrap();
        a.track_on(&msg("1", "", RouteKind::LlmFallback), tomorrow);
        assert_eq!(a.unique_senders(), 1);
    }
}
