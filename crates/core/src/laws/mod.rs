//! Bot Laws: priority-ordered content filter applied to every outbound text
//! and every knowledge candidate.
//!
//! Law #1 (business integrity) always runs first and short-circuits. Law #2
//! (user safety and respect) follows. Law #3 (learning compliance) re-runs
//! both against a candidate pair and adds its own checks. Independently of
//! all three, [`BotLaws::absolute_check`] re-tests a critical subset and
//! cannot be switched off.

mod rules;

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::types::{Law, LawViolation, Severity};
use rules::{MAX_LEARNED_CHARS, RULEBOOK, Rule, Rulebook};

/// What the checked content is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SendMessage,
    AiResponse,
    Learn,
    AdminReply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub allowed: bool,
    pub violation: Option<LawViolation>,
}

impl Validation {
    fn allow() -> Self {
        Self { allowed: true, violation: None }
    }

    fn block(violation: LawViolation) -> Self {
        Self { allowed: false, violation: Some(violation) }
    }

    pub fn law(&self) -> Option<Law> {
        self.violation.as_ref().map(|v| v.law)
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyStop {
    pub by: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LawStats {
    pub checks: u64,
    pub blocked: u64,
    pub absolute_blocks: u64,
    pub by_law: HashMap<Law, u64>,
}

#[derive(Debug)]
pub struct BotLaws {
    enabled: bool,
    emergency: Option<EmergencyStop>,
    log: VecDeque<LawViolation>,
    log_cap: usize,
    stats: LawStats,
}

impl BotLaws {
    pub fn new(log_cap: usize) -> Self {
        Self {
            enabled: true,
            emergency: None,
            log: VecDeque::new(),
            log_cap: log_cap.max(1),
            stats: LawStats::default(),
        }
    }

    /// Check content against the laws for the given action. Fails closed when
    /// the rule tables are unavailable.
    pub fn validate_action(&mut self, action: ActionKind, content: &str) -> Validation {
        self.stats.checks += 1;
        if let Some(v) = self.emergency_violation() {
            return Validation::block(v);
        }
        let lower = content.to_lowercase();
        let verdict = if self.enabled {
            match RULEBOOK.as_ref() {
                Ok(book) => evaluate(book, action, &lower),
                Err(e) => Some(unavailable(e)),
            }
        } else {
            critical(&lower)
        };
        self.finish(verdict)
    }

    /// Law #3: whether (input, response) may enter the knowledge store.
    pub fn validate_learning(&mut self, input: &str, response: &str) -> Validation {
        self.stats.checks += 1;
        if let Some(v) = self.emergency_violation() {
            return Validation::block(v);
        }
        let input = input.to_lowercase();
        let response = response.to_lowercase();
        let verdict = if self.enabled {
            match RULEBOOK.as_ref() {
                Ok(book) => evaluate_learning(book, &input, &response),
                Err(e) => Some(unavailable(e)),
            }
        } else {
            critical(&input).or_else(|| critical(&response))
        };
        self.finish(verdict)
    }

    /// Final outbound check on a hardcoded critical subset. Runs whether or
    /// not the laws are enabled.
    pub fn absolute_check(&mut self, content: &str) -> Option<LawViolation> {
        let violation = critical(&content.to_lowercase())?;
        self.stats.absolute_blocks += 1;
        tracing::error!(target: "emergency", rule = %violation.rule, "absolute law check blocked outbound text");
        self.record(violation.clone());
        Some(violation)
    }

    pub fn emergency_stop(&mut self, by: &str) {
        tracing::warn!(by, "emergency stop activated");
        self.emergency = Some(EmergencyStop { by: by.to_owned(), at: Utc::now() });
    }

    /// Returns false if no stop was active.
    pub fn emergency_resume(&mut self) -> bool {
        let was = self.emergency.take();
        if was.is_some() {
            tracing::info!("emergency stop lifted");
        }
        was.is_some()
    }

    pub fn emergency(&self) -> Option<&EmergencyStop> {
        self.emergency.as_ref()
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency.is_some()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        tracing::info!(enabled, "bot laws toggled");
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> &LawStats {
        &self.stats
    }

    /// Most recent violations, newest first.
    pub fn recent_violations(&self, n: usize) -> impl Iterator<Item = &LawViolation> {
        self.log.iter().rev().take(n)
    }

    pub fn violation_count(&self) -> usize {
        self.log.len()
    }

    fn emergency_violation(&mut self) -> Option<LawViolation> {
        self.emergency.as_ref()?;
        self.stats.blocked += 1;
        *self.stats.by_law.entry(Law::EmergencyStopActive).or_default() += 1;
        Some(LawViolation::new(
            Law::EmergencyStopActive,
            "emergency_stop",
            "Bot dihentikan sementara oleh owner",
            Severity::Critical,
        ))
    }

    fn finish(&mut self, verdict: Option<LawViolation>) -> Validation {
        match verdict {
            None => Validation::allow(),
            Some(v) => {
                tracing::info!(law = %v.law, rule = %v.rule, severity = v.severity.as_str(), "law violation");
                self.stats.blocked += 1;
                *self.stats.by_law.entry(v.law).or_default() += 1;
                self.record(v.clone());
                Validation::block(v)
            }
        }
    }

    fn record(&mut self, v: LawViolation) {
        if self.log.len() >= self.log_cap {
            self.log.pop_front();
        }
        self.log.push_back(v);
    }
}

fn first_match(law: Law, rules: &[Rule], lower: &str) -> Option<LawViolation> {
    rules
        .iter()
        .find(|r| r.matches(lower))
        .map(|r| LawViolation::new(law, r.id, r.reason, r.severity))
}

fn business(book: &Rulebook, action: ActionKind, lower: &str) -> Option<LawViolation> {
    if let Some(v) = first_match(Law::BusinessIntegrity, &book.business, lower) {
        return Some(v);
    }
    // Generated troubleshooting advice must ask for the order number.
    let generated = matches!(action, ActionKind::AiResponse | ActionKind::Learn);
    if generated && book.troubleshooting.is_match(lower) && !book.order_request.is_match(lower) {
        return Some(LawViolation::new(
            Law::BusinessIntegrity,
            "business_missing_order_number",
            "Penanganan kendala wajib meminta nomor order",
            Severity::Medium,
        ));
    }
    None
}

fn evaluate(book: &Rulebook, action: ActionKind, lower: &str) -> Option<LawViolation> {
    business(book, action, lower)
        .or_else(|| first_match(Law::UserSafetyRespect, &book.safety, lower))
        .or_else(|| match action {
            ActionKind::Learn => compliance(book, lower),
            _ => None,
        })
}

fn evaluate_learning(book: &Rulebook, input: &str, response: &str) -> Option<LawViolation> {
    business(book, ActionKind::SendMessage, input)
        .or_else(|| business(book, ActionKind::Learn, response))
        .or_else(|| first_match(Law::UserSafetyRespect, &book.safety, input))
        .or_else(|| first_match(Law::UserSafetyRespect, &book.safety, response))
        .or_else(|| {
            if input.trim().is_empty() {
                return Some(LawViolation::new(
                    Law::LearningCompliance,
                    "learning_empty_input",
                    "Pertanyaan kosong",
                    Severity::Low,
                ));
            }
            compliance(book, response)
        })
}

fn compliance(book: &Rulebook, response: &str) -> Option<LawViolation> {
    let len = response.trim().chars().count();
    if len < 2 {
        return Some(LawViolation::new(
            Law::LearningCompliance,
            "learning_too_short",
            "Jawaban terlalu pendek",
            Severity::Low,
        ));
    }
    if len > MAX_LEARNED_CHARS {
        return Some(LawViolation::new(
            Law::LearningCompliance,
            "learning_too_long",
            "Jawaban terlalu panjang",
            Severity::Low,
        ));
    }
    first_match(Law::LearningCompliance, &book.compliance, response)
}

fn critical(lower: &str) -> Option<LawViolation> {
    // The absolute check must work even if the full rulebook failed.
    match RULEBOOK.as_ref() {
        Ok(book) => first_match(Law::BusinessIntegrity, &book.critical[..1], lower)
            .or_else(|| first_match(Law::UserSafetyRespect, &book.critical[1..], lower)),
        Err(_) => ["netflix ori", "bajakan", "carding", "akun curian"]
            .iter()
            .any(|p| lower.contains(p))
            .then(|| {
                LawViolation::new(Law::BusinessIntegrity, "absolute_business", "Pelanggaran bisnis kritis", Severity::Critical)
            }),
    }
}

fn unavailable(e: &regex::Error) -> LawViolation {
    tracing::error!(error = %e, "law rulebook unavailable, blocking");
    LawViolation::new(
        Law::BusinessIntegrity,
        "validator_unavailable",
        "Validator tidak tersedia",
        Severity::Critical,
    )
}
