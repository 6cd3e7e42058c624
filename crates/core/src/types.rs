use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Inbound message ────────────────────────────────────────────

/// Kind of WhatsApp message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Sticker,
    Other,
}

/// One inbound WhatsApp message. Transient, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender_id: String,
    pub chat_id: String,
    pub message_type: MessageType,
    pub quoted: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A plain text message in a private chat (chat id = sender id).
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        let sender_id = sender_id.into();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            chat_id: sender_id.clone(),
            sender_id,
            message_type: MessageType::Text,
            quoted: false,
            timestamp: Utc::now(),
        }
    }

    pub fn image(sender_id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self { message_type: MessageType::Image, ..Self::text(sender_id, caption) }
    }

    /// Sender number without the WhatsApp JID suffix.
    pub fn sender_number(&self) -> &str {
        normalize_number(&self.sender_id)
    }
}

/// Strip the `@s.whatsapp.net` style suffix and a leading `+`.
pub fn normalize_number(id: &str) -> &str {
    let bare = id.split('@').next().unwrap_or(id);
    bare.trim_start_matches('+')
}

/// Privilege of the sender, resolved once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Owner,
    Moderator,
    Customer,
}

impl SenderRole {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Moderator)
    }
}

/// One side of a conversation turn kept in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Customer,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

// ── Knowledge ──────────────────────────────────────────────────

/// Where a knowledge entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    FaqSeed,
    SopSeed,
    OwnerTeaching,
    AiAutoLearned,
    Reinforced,
}

impl KnowledgeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FaqSeed => "faq_seed",
            Self::SopSeed => "sop_seed",
            Self::OwnerTeaching => "owner_teaching",
            Self::AiAutoLearned => "ai_auto_learned",
            Self::Reinforced => "reinforced",
        }
    }
}

/// A learned (input, response) pair. Confidence is always within [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub input: String,
    pub response: String,
    pub confidence: f32,
    pub source: KnowledgeSource,
    pub timestamp: DateTime<Utc>,
    pub verified: bool,
    #[serde(default)]
    pub usage_count: u32,
}

impl KnowledgeEntry {
    pub fn new(
        input: impl Into<String>,
        response: impl Into<String>,
        confidence: f32,
        source: KnowledgeSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: input.into(),
            response: response.into(),
            confidence: clamp_unit(confidence),
            verified: matches!(
                source,
                KnowledgeSource::FaqSeed | KnowledgeSource::SopSeed | KnowledgeSource::OwnerTeaching
            ),
            source,
            timestamp: Utc::now(),
            usage_count: 0,
        }
    }
}

/// Clamp a heuristic score into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ── Laws ───────────────────────────────────────────────────────

/// Bot law identifiers, in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Law {
    BusinessIntegrity,
    UserSafetyRespect,
    LearningCompliance,
    EmergencyStopActive,
}

impl Law {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusinessIntegrity => "BUSINESS_INTEGRITY",
            Self::UserSafetyRespect => "USER_SAFETY_RESPECT",
            Self::LearningCompliance => "LEARNING_COMPLIANCE",
            Self::EmergencyStopActive => "EMERGENCY_STOP_ACTIVE",
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            Self::EmergencyStopActive => 0,
            Self::BusinessIntegrity => 1,
            Self::UserSafetyRespect => 2,
            Self::LearningCompliance => 3,
        }
    }
}

impl std::fmt::Display for Law {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A structured rule violation produced by the law checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawViolation {
    pub law: Law,
    pub priority: u8,
    pub rule: String,
    pub reason: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl LawViolation {
    pub fn new(law: Law, rule: impl Into<String>, reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            law,
            priority: law.priority(),
            rule: rule.into(),
            reason: reason.into(),
            severity,
            timestamp: Utc::now(),
        }
    }
}

// ── Catalog records ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: Uuid,
    #[serde(alias = "pertanyaan")]
    pub question: String,
    #[serde(alias = "jawaban")]
    pub answer: String,
    #[serde(default, alias = "keyword")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopEntry {
    pub id: Uuid,
    #[serde(alias = "judul")]
    pub title: String,
    #[serde(alias = "isi")]
    pub content: String,
    #[serde(default, alias = "keyword")]
    pub keywords: Vec<String>,
}

/// Plain-text product sheet (`produk/<name>.txt` in the legacy layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSheet {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: Uuid,
    #[serde(alias = "produk")]
    pub product: String,
    #[serde(alias = "stok")]
    pub quantity: u32,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: Uuid,
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product: String,
    #[serde(default = "Utc::now")]
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderator {
    pub id: Uuid,
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub added_by: String,
}

/// Warranty claim (`log_claim.json` in the legacy layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimLog {
    pub id: Uuid,
    pub order_id: String,
    pub number: String,
    #[serde(default)]
    pub complaint: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoEntry {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: Uuid,
    pub number: String,
    #[serde(default)]
    pub reason: String,
}

/// Kind of learning event written to the learning log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningEventKind {
    Taught,
    AutoLearned,
    Queued,
    Approved,
    Rejected,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvent {
    pub id: Uuid,
    pub kind: LearningEventKind,
    pub input: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl LearningEvent {
    pub fn new(kind: LearningEventKind, input: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            input: input.into(),
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One moderator shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub number: String,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}
