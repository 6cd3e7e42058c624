use crate::catalog::Catalog;
use crate::classify::command::{AdminCommand, LawCommand, LearningCommand, OpsCommand, SystemCommand};
use crate::classify::hybrid::HybridMatch;
use crate::config::BotCfg;
use crate::knowledge::{KnowledgeStore, LearnedMatch};
use crate::types::{Message, SenderRole};

/// Confidence at or above which a learned answer may be cached.
pub const CACHEABLE_LEARNED_CONFIDENCE: f32 = 0.8;

/// The handler chosen for a message, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Image,
    Law(LawCommand),
    Ops(OpsCommand),
    Learning(LearningCommand),
    Admin(AdminCommand),
    System(SystemCommand),
    Hybrid(HybridMatch),
    Learned(LearnedMatch),
    LlmFallback,
}

/// Payload-free route label for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Image,
    Law,
    Ops,
    Learning,
    Admin,
    System,
    Hybrid,
    Learned,
    LlmFallback,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Law => "law",
            Self::Ops => "ops",
            Self::Learning => "learning",
            Self::Admin => "admin",
            Self::System => "system",
            Self::Hybrid => "hybrid",
            Self::Learned => "learned",
            Self::LlmFallback => "llm_fallback",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Image => RouteKind::Image,
            Self::Law(_) => RouteKind::Law,
            Self::Ops(_) => RouteKind::Ops,
            Self::Learning(_) => RouteKind::Learning,
            Self::Admin(_) => RouteKind::Admin,
            Self::System(_) => RouteKind::System,
            Self::Hybrid(_) => RouteKind::Hybrid,
            Self::Learned(_) => RouteKind::Learned,
            Self::LlmFallback => RouteKind::LlmFallback,
        }
    }

    /// Static system replies, catalog hits and strong learned answers.
    pub fn is_cacheable(&self) -> bool {
        match self {
            Self::System(cmd) => matches!(cmd, SystemCommand::Menu | SystemCommand::ProductList | SystemCommand::Promo),
            Self::Hybrid(_) => true,
            Self::Learned(m) => m.confidence >= CACHEABLE_LEARNED_CONFIDENCE,
            _ => false,
        }
    }

    /// Owner command replies skip the outbound content filter.
    pub fn skips_outbound_filter(&self) -> bool {
        matches!(self, Self::Law(_) | Self::Ops(_))
    }
}

/// Computed once per message; decides which handler runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub route: Route,
    /// Position in the cascade, 1 is highest.
    pub priority: u8,
    pub confidence: f32,
}

/// Everything a cascade predicate may look at.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub message: &'a Message,
    pub text: &'a str,
    pub role: SenderRole,
    pub catalog: &'a Catalog,
    pub knowledge: &'a KnowledgeStore,
    pub cfg: &'a BotCfg,
}
