//! KnowledgeStore: learned (input, response) pairs with nearest-match lookup.
//!
//! Seeded from FAQ/SOP at startup, grown by owner teaching and auto-learning.
//! Entries are never deleted individually; overflow trims the oldest
//! unverified entry first. Confidence only ever rises through reinforcement.

mod review;

use std::collections::HashMap;

use uuid::Uuid;

pub use review::{ReviewItem, ReviewQueue};

use crate::classify::similarity::{normalize, similarity};
use crate::config::BotCfg;
use crate::types::{FaqEntry, KnowledgeEntry, KnowledgeSource, SopEntry, clamp_unit};

/// Nearest stored entry for a message.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedMatch {
    pub id: Uuid,
    pub response: String,
    /// Similarity between the message and the stored input.
    pub confidence: f32,
    pub source: KnowledgeSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeStats {
    pub total: usize,
    pub verified: usize,
    pub by_source: HashMap<KnowledgeSource, usize>,
    pub average_confidence: f32,
    pub total_usage: u64,
}

#[derive(Debug)]
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
    capacity: usize,
    match_threshold: f32,
    teaching_threshold: f32,
    step: f32,
}

impl KnowledgeStore {
    pub fn new(cfg: &BotCfg) -> Self {
        Self {
            entries: Vec::new(),
            capacity: cfg.knowledge_cap.max(1),
            match_threshold: cfg.learned_threshold,
            teaching_threshold: cfg.teaching_threshold,
            step: cfg.reinforce_step,
        }
    }

    /// Add FAQ and SOP pairs that are not present yet. Returns entries added.
    pub fn seed_from(&mut self, faqs: &[FaqEntry], sops: &[SopEntry]) -> usize {
        let pairs = faqs
            .iter()
            .map(|f| (f.question.as_str(), f.answer.as_str(), KnowledgeSource::FaqSeed))
            .chain(sops.iter().map(|s| (s.title.as_str(), s.content.as_str(), KnowledgeSource::SopSeed)));

        let mut added = 0;
        for (input, response, source) in pairs {
            let key = normalize(input);
            if key.is_empty() || self.entries.iter().any(|e| normalize(&e.input) == key) {
                continue;
            }
            self.entries.push(KnowledgeEntry::new(input, response, 1.0, source));
            added += 1;
        }
        self.trim();
        added
    }

    /// Restore persisted entries (taught, auto-learned, reinforced). A stored
    /// entry replaces a seeded one with the same input.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = KnowledgeEntry>) {
        for mut entry in entries {
            entry.confidence = clamp_unit(entry.confidence);
            let key = normalize(&entry.input);
            match self.entries.iter_mut().find(|e| e.id == entry.id || normalize(&e.input) == key) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self.trim();
    }

    /// Highest-scoring entry strictly above the match threshold. Earlier
    /// entries win ties.
    pub fn find_best(&self, text: &str) -> Option<LearnedMatch> {
        let mut best: Option<(&KnowledgeEntry, f32)> = None;
        for entry in &self.entries {
            let score = similarity(text, &entry.input);
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((entry, score));
            }
        }
        best.filter(|(_, score)| *score > self.match_threshold).map(|(e, score)| LearnedMatch {
            id: e.id,
            response: e.response.clone(),
            confidence: score,
            source: e.source,
        })
    }

    /// Nudge confidence up after a successful reuse, capped at 1.0.
    pub fn reinforce(&mut self, id: Uuid) -> Option<&KnowledgeEntry> {
        let step = self.step;
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.confidence = clamp_unit(entry.confidence + step);
        entry.usage_count = entry.usage_count.saturating_add(1);
        if entry.source == KnowledgeSource::AiAutoLearned {
            entry.source = KnowledgeSource::Reinforced;
        }
        Some(entry)
    }

    /// Store a pair. An existing entry whose input is the same, or similar in
    /// both directions at or above the teaching threshold, is replaced instead.
    pub fn learn(
        &mut self,
        input: &str,
        response: &str,
        confidence: f32,
        source: KnowledgeSource,
    ) -> KnowledgeEntry {
        let key = normalize(input);
        let existing = self
            .entries
            .iter()
            .position(|e| {
                normalize(&e.input) == key
                    || similarity(input, &e.input).min(similarity(&e.input, input)) >= self.teaching_threshold
            });

        let fresh = KnowledgeEntry::new(input, response, confidence, source);
        match existing {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                *entry = KnowledgeEntry { id: entry.id, usage_count: entry.usage_count, ..fresh };
                entry.clone()
            }
            None => {
                self.entries.push(fresh.clone());
                self.trim();
                fresh
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn stats(&self) -> KnowledgeStats {
        let mut stats = KnowledgeStats { total: self.entries.len(), ..KnowledgeStats::default() };
        let mut confidence_sum = 0.0;
        for e in &self.entries {
            *stats.by_source.entry(e.source).or_default() += 1;
            if e.verified {
                stats.verified += 1;
            }
            confidence_sum += e.confidence;
            stats.total_usage += u64::from(e.usage_count);
        }
        if !self.entries.is_empty() {
            stats.average_confidence = confidence_sum / self.entries.len() as f32;
        }
        stats
    }

    /// How well a candidate response fits the style of verified answers:
    /// 0.5 base, +0.3 for a typical length, +0.2 scaled by closest wording.
    pub fn style_score(&self, response: &str) -> f32 {
        let verified: Vec<&KnowledgeEntry> = self.entries.iter().filter(|e| e.verified).collect();
        if verified.is_empty() {
            return 0.5;
        }
        let avg_len =
            verified.iter().map(|e| e.response.chars().count()).sum::<usize>() as f32 / verified.len() as f32;
        let len = response.chars().count() as f32;
        let mut score = 0.5;
        if len >= avg_len * 0.3 && len <= avg_len * 3.0 {
            score += 0.3;
        }
        let closest = verified.iter().map(|e| similarity(response, &e.response)).fold(0.0_f32, f32::max);
        clamp_unit(score + 0.2 * closest)
    }

    /// Drop oldest entries over capacity, unverified ones first.
    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            let victim = self.entries.iter().position(|e| !e.verified).unwrap_or(0);
            self.entries.remove(victim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KnowledgeStore {
        KnowledgeStore::new(&BotCfg::default())
    }

    fn faq(q: &str, a: &str) -> FaqEntry {
        FaqEntry { id: Uuid::new_v4(), question: q.into(), answer: a.into(), keywords: vec![] }
    }

    #[test]
    fn seeding_is_idempotent() {
        let mut ks = store();
        let faqs = vec![faq("cara order", "chat admin"), faq("jam buka", "08.00-22.00")];
        assert_eq!(ks.seed_from(&faqs, &[]), 2);
        assert_eq!(ks.seed_from(&faqs, &[]), 0);
        assert_eq!(ks.len(), 2);
        assert!(ks.entries().iter().all(|e| e.verified && e.source == KnowledgeSource::FaqSeed));
    }

    #[test]
    fn find_best_needs_threshold() {
        let mut ks = store();
        ks.learn("cara bayar", "transfer ke BCA", 1.0, KnowledgeSource::OwnerTeaching);
        let m = ks.find_best("cara bayar gimana").unwrap();
        assert_eq!(m.response, "transfer ke BCA");
        assert!(m.confidence > 0.6);
        assert!(ks.find_best("netflix ready").is_none());
    }

    #[test]
    fn reinforce_never_exceeds_one() {
        let mut ks = store();
        let id = ks.learn("a b", "c", 0.9, KnowledgeSource::AiAutoLearned).id;
        for _ in 0..50 {
            ks.reinforce(id);
        }
        let e = ks.get(id).unwrap();
        assert_eq!(e.confidence, 1.0);
        assert_eq!(e.usage_count, 50);
        assert_eq!(e.source, KnowledgeSource::Reinforced);
        assert!(ks.reinforce(Uuid::new_v4()).is_none());
    }

    #[test]
    fn learning_same_input_replaces() {
        let mut ks = store();
        let first = ks.learn("cara bayar", "transfer", 1.0, KnowledgeSource::OwnerTeaching).id;
        let second = ks.learn("Cara bayar?", "transfer ke BCA", 1.0, KnowledgeSource::OwnerTeaching).id;
        assert_eq!(first, second);
        assert_eq!(ks.len(), 1);
        assert_eq!(ks.get(first).unwrap().response, "transfer ke BCA");
    }

    #[test]
    fn overflow_trims_unverified_first() {
        let cfg = BotCfg { knowledge_cap: 2, ..BotCfg::default() };
        let mut ks = KnowledgeStore::new(&cfg);
        ks.learn("satu dua", "x", 1.0, KnowledgeSource::OwnerTeaching);
        ks.learn("tiga empat", "y", 0.8, KnowledgeSource::AiAutoLearned);
        ks.learn("lima enam", "z", 1.0, KnowledgeSource::OwnerTeaching);
        assert_eq!(ks.len(), 2);
        assert!(ks.entries().iter().all(|e| e.source == KnowledgeSource::OwnerTeaching));
    }

    #[test]
    fn style_prefers_familiar_answers() {
        let mut ks = store();
        assert_eq!(ks.style_score("apa saja"), 0.5);
        ks.seed_from(&[faq("cara order", "Silakan chat admin untuk order ya kak")], &[]);
        let close = ks.style_score("Silakan chat admin ya kak");
        let far = ks.style_score(&"x".repeat(500));
        assert!(close > far);
    }
}
