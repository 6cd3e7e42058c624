//! Aggregate keyword confidence over the static catalog (products, FAQ, SOP).

use uuid::Uuid;

use super::product::{self, ProductMatch};
use super::similarity::{normalize, similarity};
use crate::catalog::Catalog;
use crate::config::BotCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridSource {
    Product,
    Faq,
    Sop,
}

impl HybridSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Faq => "faq",
            Self::Sop => "sop",
        }
    }
}

/// Best static-catalog hit for a message.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridMatch {
    pub source: HybridSource,
    pub id: Uuid,
    pub confidence: f32,
    pub price_intent: bool,
}

impl From<ProductMatch> for HybridMatch {
    fn from(m: ProductMatch) -> Self {
        Self { source: HybridSource::Product, id: m.id, confidence: m.confidence, price_intent: m.price_intent }
    }
}

/// Score product, FAQ and SOP candidates and keep the highest. Product wins
/// ties, then FAQ, then SOP.
pub fn classify(text: &str, catalog: &Catalog, cfg: &BotCfg) -> Option<HybridMatch> {
    let norm = normalize(text);
    if norm.is_empty() {
        return None;
    }
    let mut best: Option<HybridMatch> = product::detect(&norm, &catalog.products, cfg).map(Into::into);

    let faqs = catalog.faqs.iter().map(|f| {
        (f.id, keyword_score(&norm, &f.keywords).max(phrase_score(&norm, &f.question, cfg)))
    });
    let sops = catalog.sops.iter().map(|s| {
        (s.id, keyword_score(&norm, &s.keywords).max(phrase_score(&norm, &s.title, cfg)))
    });

    for (source, candidates) in [
        (HybridSource::Faq, faqs.collect::<Vec<_>>()),
        (HybridSource::Sop, sops.collect::<Vec<_>>()),
    ] {
        for (id, score) in candidates {
            if best.as_ref().is_none_or(|b| score > b.confidence) {
                best = Some(HybridMatch { source, id, confidence: score, price_intent: false });
            }
        }
    }
    best.filter(|m| m.confidence > 0.0)
}

/// Whole-phrase match against a FAQ question or SOP title. Partial word
/// overlap only counts at or above the fuzzy threshold.
fn phrase_score(norm: &str, phrase: &str, cfg: &BotCfg) -> f32 {
    let phrase = normalize(phrase);
    if phrase.is_empty() {
        return 0.0;
    }
    if format!(" {norm} ").contains(&format!(" {phrase} ")) {
        return 1.0;
    }
    let score = similarity(norm, &phrase);
    if score >= cfg.fuzzy_threshold { score } else { 0.0 }
}

/// Keyword hits scaled so that one hit already clears the routing threshold.
fn keyword_score(norm: &str, keywords: &[String]) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }
    let padded = format!(" {norm} ");
    let hits = keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty() && padded.contains(&format!(" {k} ")))
        .count();
    if hits == 0 {
        return 0.0;
    }
    0.4 + 0.6 * hits as f32 / keywords.len() as f32
}
