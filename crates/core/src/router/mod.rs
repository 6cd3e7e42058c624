//! ResponseRouter: resolves every inbound message to at most one reply.
//!
//! Pipeline per message: security gate, length check, response cache, the
//! priority cascade, the chosen handler, then the outbound law filter. The
//! peripheral managers observe the result afterwards and never change it.

mod cache;
mod cascade;
mod handlers;
pub mod replies;
mod route;
mod session;

use std::sync::Arc;
use std::time::{Duration, Instant};

use resbot_llm::provider::LlmProvider;
use uuid::Uuid;

pub use cascade::{CASCADE, Selector};
pub use route::{CACHEABLE_LEARNED_CONFIDENCE, Route, RouteContext, RouteDecision, RouteKind};

use crate::catalog::Catalog;
use crate::classify::hybrid::HybridSource;
use crate::classify::mood::{self, Mood};
use crate::classify::similarity::normalize;
use crate::config::BotCfg;
use crate::fallback::{DailyQuota, FallbackGenerator};
use crate::knowledge::{KnowledgeStore, ReviewQueue};
use crate::laws::{ActionKind, BotLaws};
use crate::ops::analytics::{Analytics, TrackedMessage};
use crate::ops::backup::{self, BackupInfo};
use crate::ops::cleanup::CleanupReport;
use crate::ops::monitoring::{Alert, HealthInputs, HealthMonitor};
use crate::ops::performance::PerformanceTracker;
use crate::ops::security::{GateDecision, SecurityGate};
use crate::store::{ContentStore, StoreError};
use crate::types::{
    KnowledgeEntry, KnowledgeSource, LawViolation, LearningEvent, Message, MessageType, SenderRole, normalize_number,
};
use cache::{ResponseCache, cache_key};
use session::SessionTracker;

/// A handler could not produce its reply. The customer gets the apology text.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid state: {0}")]
    Invalid(String),
}

/// The single reply produced for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    pub chat_id: String,
    pub text: String,
    /// Quote the inbound message when sending.
    pub quoted: bool,
    /// `None` when the reply came from a pre-routing gate.
    pub route: Option<RouteKind>,
    pub cached: bool,
    /// Set when the outbound filter replaced the handler's text.
    pub blocked: Option<LawViolation>,
}

pub struct ResponseRouter {
    cfg: BotCfg,
    store: ContentStore,
    /// In-memory view of the catalog collections, reloaded after admin edits.
    catalog: Catalog,
    laws: BotLaws,
    knowledge: KnowledgeStore,
    review: ReviewQueue,
    fallback: FallbackGenerator,
    quota: DailyQuota,
    cache: ResponseCache,
    sessions: SessionTracker,
    security: SecurityGate,
    analytics: Analytics,
    performance: PerformanceTracker,
    monitor: HealthMonitor,
}

impl std::fmt::Debug for ResponseRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRouter")
            .field("owner", &self.cfg.owner_number)
            .field("knowledge", &self.knowledge.len())
            .field("cache", &self.cache.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl ResponseRouter {
    /// Load the catalog, seed knowledge from FAQ/SOP and restore persisted
    /// learned entries.
    pub async fn new(
        cfg: BotCfg,
        store: ContentStore,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self, StoreError> {
        let catalog = Catalog::load(&store).await?;
        let mut knowledge = KnowledgeStore::new(&cfg);
        let seeded = knowledge.seed_from(&catalog.faqs, &catalog.sops);
        let persisted: Vec<KnowledgeEntry> = store.list().await?;
        let restored = persisted.len();
        knowledge.extend(persisted);
        tracing::info!(
            seeded,
            restored,
            products = catalog.products.len(),
            provider = provider.name(),
            "response router ready"
        );

        Ok(Self {
            laws: BotLaws::new(cfg.violation_log_cap),
            review: ReviewQueue::new(cfg.review_queue_cap),
            fallback: FallbackGenerator::new(provider, &cfg),
            quota: DailyQuota::new(cfg.llm_daily_limit),
            cache: ResponseCache::new(Duration::from_secs(cfg.response_cache_ttl_secs), cfg.response_cache_cap),
            sessions: SessionTracker::new(Duration::from_secs(cfg.session_ttl_secs), cfg.session_history_cap),
            security: SecurityGate::new(&cfg),
            analytics: Analytics::new(),
            performance: PerformanceTracker::new(),
            monitor: HealthMonitor::new(),
            catalog,
            knowledge,
            store,
            cfg,
        })
    }

    pub fn cfg(&self) -> &BotCfg {
        &self.cfg
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn laws(&self) -> &BotLaws {
        &self.laws
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn review(&self) -> &ReviewQueue {
        &self.review
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.performance
    }

    /// WhatsApp chat id of the owner, if one is configured.
    pub fn owner_chat(&self) -> Option<String> {
        let owner = normalize_number(&self.cfg.owner_number);
        (!owner.is_empty()).then(|| format!("{owner}@s.whatsapp.net"))
    }

    pub fn role_of(&self, number: &str) -> SenderRole {
        let owner = normalize_number(&self.cfg.owner_number);
        if !owner.is_empty() && owner == number {
            SenderRole::Owner
        } else if self.catalog.is_active_moderator(number) {
            SenderRole::Moderator
        } else {
            SenderRole::Customer
        }
    }

    /// Route one message. `None` means the message is dropped silently.
    pub async fn route_message(&mut self, msg: &Message) -> Option<BotReply> {
        let started = Instant::now();
        let sender = msg.sender_number().to_owned();
        let role = self.role_of(&sender);

        // Admins are never rate limited, but the blacklist applies to everyone.
        let blacklisted = role != SenderRole::Owner && self.catalog.is_blacklisted(&sender);
        let gate = if role.is_admin() && !blacklisted {
            GateDecision::Allow
        } else {
            self.security.check(&sender, blacklisted, started)
        };
        match gate {
            GateDecision::Allow => {}
            GateDecision::SpamWarning => return Some(self.gate_reply(msg, replies::SPAM_WARNING)),
            GateDecision::Blacklisted | GateDecision::RateLimited | GateDecision::Silenced => {
                tracing::debug!(sender = %sender, decision = ?gate, "message dropped");
                return None;
            }
        }

        let text = msg.text.trim();
        if msg.message_type != MessageType::Image && text.chars().count() < self.cfg.min_message_chars {
            return Some(self.gate_reply(msg, replies::CLARIFY));
        }

        let normalized = normalize(text);
        let (mood, _) = mood::detect(text);

        if let Some(reply) = self.cached_reply(msg, &sender, &normalized, mood, started).await {
            return Some(reply);
        }

        let decision = {
            let ctx = RouteContext {
                message: msg,
                text,
                role,
                catalog: &self.catalog,
                knowledge: &self.knowledge,
                cfg: &self.cfg,
            };
            cascade::select(&ctx)
        };
        let kind = decision.route.kind();
        tracing::info!(
            sender = %sender,
            route = %kind,
            priority = decision.priority,
            confidence = decision.confidence,
            mood = mood.as_str(),
            "message routed"
        );

        let (handled, ok) = match self.dispatch(msg, &sender, role, mood, &decision.route).await {
            Ok(text) => (text, true),
            Err(e) => {
                tracing::warn!(route = %kind, error = %e, "handler failed");
                self.performance.record_error();
                (replies::APOLOGY.to_owned(), false)
            }
        };

        if let Route::Admin(cmd) = &decision.route {
            if cmd.mutates_catalog() {
                self.cache.clear();
            }
        }

        let (reply_text, blocked) = if decision.route.skips_outbound_filter() {
            (handled, None)
        } else {
            self.filter_outbound(kind, handled)
        };

        if ok && blocked.is_none() && decision.route.is_cacheable() && msg.message_type == MessageType::Text {
            let learned = match &decision.route {
                Route::Learned(m) => Some(m.id),
                _ => None,
            };
            self.cache.insert(cache_key(&normalized, &sender), reply_text.clone(), kind, learned, started);
        }

        let product = match &decision.route {
            Route::Hybrid(m) if m.source == HybridSource::Product => {
                self.catalog.product(m.id).map(|p| p.name.clone())
            }
            _ => None,
        };
        self.observe(&sender, &normalized, kind, mood, product.as_deref(), text, &reply_text, started);

        Some(BotReply {
            chat_id: msg.chat_id.clone(),
            text: reply_text,
            quoted: msg.quoted || kind == RouteKind::Image,
            route: Some(kind),
            cached: false,
            blocked,
        })
    }

    /// Serve from the response cache. Skipped while the emergency stop is
    /// active; a hit is re-validated because laws may have changed since.
    /// A hit on a learned answer still counts as a reuse of that entry.
    async fn cached_reply(
        &mut self,
        msg: &Message,
        sender: &str,
        normalized: &str,
        mood: Mood,
        started: Instant,
    ) -> Option<BotReply> {
        if msg.message_type != MessageType::Text || self.laws.is_emergency_stopped() {
            return None;
        }
        let Some(hit) = self.cache.get(&cache_key(normalized, sender), started).cloned() else {
            self.performance.record_cache(false);
            return None;
        };
        self.performance.record_cache(true);
        if !self.laws.validate_action(ActionKind::SendMessage, &hit.text).allowed
            || self.laws.absolute_check(&hit.text).is_some()
        {
            tracing::warn!(route = %hit.route, "cached reply no longer passes, recomputing");
            return None;
        }
        if let Some(id) = hit.learned {
            if let Err(e) = self.reinforce_learned(id).await {
                tracing::warn!(%id, error = %e, "persisting reinforced entry failed");
            }
        }
        self.observe(sender, normalized, hit.route, mood, None, msg.text.trim(), &hit.text, started);
        Some(BotReply {
            chat_id: msg.chat_id.clone(),
            text: hit.text,
            quoted: msg.quoted,
            route: Some(hit.route),
            cached: true,
            blocked: None,
        })
    }

    /// Outbound law filter. A blocked reply becomes the maintenance text
    /// during an emergency stop and the contact-admin text otherwise.
    fn filter_outbound(&mut self, kind: RouteKind, text: String) -> (String, Option<LawViolation>) {
        let action = match kind {
            RouteKind::LlmFallback => ActionKind::AiResponse,
            RouteKind::Admin | RouteKind::Learning => ActionKind::AdminReply,
            _ => ActionKind::SendMessage,
        };
        let validation = self.laws.validate_action(action, &text);
        if let Some(violation) = validation.violation {
            let replacement = if violation.law == crate::types::Law::EmergencyStopActive {
                replies::MAINTENANCE
            } else {
                replies::CONTACT_ADMIN
            };
            tracing::warn!(route = %kind, law = %violation.law, rule = %violation.rule, "outbound reply blocked");
            return (replacement.to_owned(), Some(violation));
        }
        if let Some(violation) = self.laws.absolute_check(&text) {
            return (replies::CONTACT_ADMIN.to_owned(), Some(violation));
        }
        (text, None)
    }

    #[allow(clippy::too_many_arguments)]
    fn observe(
        &mut self,
        sender: &str,
        normalized: &str,
        route: RouteKind,
        mood: Mood,
        product: Option<&str>,
        customer_text: &str,
        reply: &str,
        started: Instant,
    ) {
        self.analytics.track(&TrackedMessage { sender, normalized, route, mood, product });
        self.performance.record(route, started.elapsed());
        self.sessions.record(sender, customer_text, reply, started);
    }

    fn gate_reply(&self, msg: &Message, text: &str) -> BotReply {
        BotReply {
            chat_id: msg.chat_id.clone(),
            text: text.to_owned(),
            quoted: msg.quoted,
            route: None,
            cached: false,
            blocked: None,
        }
    }

    /// Drop expired cache entries, sessions, security state and stale quotas.
    pub fn cleanup(&mut self, now: Instant) -> CleanupReport {
        let report = CleanupReport {
            cache_entries: self.cache.purge_expired(now),
            sessions: self.sessions.purge_expired(now),
            security_senders: self.security.purge_stale(now),
            quota_senders: self.quota.purge_before(today()),
        };
        tracing::info!(removed = report.total(), "cleanup pass finished");
        report
    }

    pub async fn backup(&self) -> Result<BackupInfo, StoreError> {
        let info = backup::create(&self.store, self.cfg.backup_keep).await?;
        tracing::info!(name = %info.name, files = info.files, pruned = info.pruned, "backup created");
        Ok(info)
    }

    /// Evaluate health and return alerts that just became active.
    pub fn health_check(&mut self) -> Vec<Alert> {
        let inputs = self.health_inputs();
        self.monitor.evaluate(inputs, &self.cfg)
    }

    fn health_inputs(&self) -> HealthInputs {
        HealthInputs {
            handled: self.performance.handled(),
            error_rate: self.performance.error_rate(),
            average_ms: self.performance.average_ms(),
            consecutive_llm_failures: self.fallback.consecutive_failures(),
            emergency_stop: self.laws.is_emergency_stopped(),
        }
    }

    /// Re-read the catalog and reseed knowledge from FAQ/SOP.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        self.catalog = Catalog::load(&self.store).await?;
        let seeded = self.knowledge.seed_from(&self.catalog.faqs, &self.catalog.sops);
        self.cache.clear();
        tracing::info!(seeded, "catalog reloaded");
        Ok(())
    }

    /// Nudge a learned entry after a successful reuse and persist it. Seeded
    /// FAQ/SOP entries are rebuilt on every start and are not stored.
    async fn reinforce_learned(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(entry) = self.knowledge.reinforce(id).cloned() else {
            return Ok(());
        };
        tracing::debug!(id = %entry.id, confidence = entry.confidence, uses = entry.usage_count, "learned answer reinforced");
        if matches!(entry.source, KnowledgeSource::FaqSeed | KnowledgeSource::SopSeed) {
            return Ok(());
        }
        self.store.upsert(&entry).await
    }

    /// Write a learning log entry. Failures are logged, never surfaced.
    async fn log_learning(&self, event: LearningEvent) {
        if let Err(e) = self.store.upsert(&event).await {
            tracing::warn!(kind = ?event.kind, error = %e, "learning log write failed");
        }
    }
}

/// Calendar day used for the daily fallback quota.
fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
