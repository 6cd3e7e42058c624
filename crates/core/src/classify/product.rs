//! Product mention detection: substring hit, then price-intent pattern,
//! then fuzzy token match.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use super::similarity::{normalize, ratio};
use crate::config::BotCfg;
use crate::types::ProductSheet;

static PRICE_INTENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(berapa|harga(nya)?|price|pricelist|brp|biaya)\b").ok()
});

/// Extra confidence when the product mention comes with a price question.
const PRICE_INTENT_BONUS: f32 = 0.1;
/// Fuzzy hits are discounted against exact ones.
const FUZZY_WEIGHT: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductMatch {
    pub id: Uuid,
    pub name: String,
    pub confidence: f32,
    pub price_intent: bool,
}

pub fn has_price_intent(text: &str) -> bool {
    PRICE_INTENT.as_ref().is_some_and(|re| re.is_match(text))
}

/// First product (declaration order) whose name or alias appears in the text;
/// otherwise the best fuzzy token match at or above `fuzzy_threshold`.
pub fn detect(text: &str, products: &[ProductSheet], cfg: &BotCfg) -> Option<ProductMatch> {
    let norm = normalize(text);
    if norm.is_empty() {
        return None;
    }
    let price_intent = has_price_intent(&norm);
    let padded = format!(" {norm} ");

    let exact = products.iter().find(|p| {
        names(p).any(|name| !name.is_empty() && padded.contains(&format!(" {name} ")))
    });
    if let Some(p) = exact {
        let bonus = if price_intent { PRICE_INTENT_BONUS } else { 0.0 };
        return Some(ProductMatch {
            id: p.id,
            name: p.name.clone(),
            confidence: (cfg.product_match_confidence + bonus).min(1.0),
            price_intent,
        });
    }

    let mut best: Option<(&ProductSheet, f32)> = None;
    for p in products {
        for name in names(p) {
            for token in norm.split(' ') {
                // Short tokens match too many product names by accident.
                if token.chars().count() < 4 {
                    continue;
                }
                let r = ratio(token, &name);
                if r >= cfg.fuzzy_threshold && best.is_none_or(|(_, b)| r > b) {
                    best = Some((p, r));
                }
            }
        }
    }
    best.map(|(p, r)| ProductMatch {
        id: p.id,
        name: p.name.clone(),
        confidence: r * FUZZY_WEIGHT,
        price_intent,
    })
}

fn names(p: &ProductSheet) -> impl Iterator<Item = String> + '_ {
    std::iter::once(normalize(&p.name)).chain(p.aliases.iter().map(|a| normalize(a)))
}
