//! Heuristic suitability score for a generated answer.

use crate::classify::similarity::{normalize, tokens};
use crate::types::clamp_unit;

const BASE_SCORE: f32 = 0.6;

const TEMPLATE_PHRASES: &[&str] = &[
    "sebagai ai",
    "sebagai model bahasa",
    "saya adalah model",
    "as an ai",
    "language model",
    "i cannot",
    "i'm sorry",
    "[nama",
    "lorem ipsum",
];

const INDONESIAN_MARKERS: &[&str] = &[
    "yang", "dan", "di", "ke", "untuk", "bisa", "kak", "ya", "kami", "ini", "itu", "ada", "tidak",
    "dengan", "silakan", "sudah", "akan", "jika", "kalau", "saja",
];

const BUSINESS_TERMS: &[&str] = &[
    "produk", "harga", "order", "pesan", "pesanan", "bayar", "transfer", "garansi", "akun", "stok",
    "admin", "premium", "paket", "bulan", "promo", "kirim",
];

const NEGATIVE_PHRASES: &[&str] = &["tidak tahu", "bukan urusan", "tidak peduli", "terserah", "malas"];

const MIN_CHARS: usize = 15;
const MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    TemplatePhrase,
    NotIndonesian,
    Irrelevant,
    NegativeTone,
    TooShort,
    TooLong,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub confidence: f32,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    /// Eligible for learning: confidence above the floor with few issues.
    pub fn eligible(&self, min_confidence: f32, max_issues: usize) -> bool {
        self.confidence > min_confidence && self.issues.len() < max_issues
    }
}

pub fn assess(question: &str, answer: &str) -> QualityReport {
    let lower = answer.to_lowercase();
    let norm = normalize(answer);
    let answer_tokens = tokens(answer);
    let mut score = BASE_SCORE;
    let mut issues = Vec::new();

    if TEMPLATE_PHRASES.iter().any(|p| lower.contains(p)) {
        score -= 0.3;
        issues.push(QualityIssue::TemplatePhrase);
    }

    let markers = INDONESIAN_MARKERS.iter().filter(|m| answer_tokens.contains(**m)).count();
    if markers < 2 {
        score -= 0.2;
        issues.push(QualityIssue::NotIndonesian);
    }

    let question_tokens = tokens(question);
    let business_hits = BUSINESS_TERMS.iter().filter(|t| answer_tokens.contains(**t)).count();
    let shared = question_tokens
        .iter()
        .filter(|t| t.chars().count() > 2 && !INDONESIAN_MARKERS.contains(&t.as_str()))
        .filter(|t| answer_tokens.contains(*t))
        .count();
    let relevance = business_hits + shared;
    if relevance == 0 {
        score -= 0.2;
        issues.push(QualityIssue::Irrelevant);
    } else {
        score += (relevance as f32 * 0.05).min(0.2);
    }

    if NEGATIVE_PHRASES.iter().any(|p| norm.contains(p)) {
        score -= 0.1;
        issues.push(QualityIssue::NegativeTone);
    }

    let len = answer.trim().chars().count();
    if len < MIN_CHARS {
        score -= 0.2;
        issues.push(QualityIssue::TooShort);
    } else if len > MAX_CHARS {
        score -= 0.1;
        issues.push(QualityIssue::TooLong);
    }

    QualityReport { confidence: clamp_unit(score), issues }
}
