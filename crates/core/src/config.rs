use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;

/// All bot parameters. Loaded from the `bot_config` table at startup.
/// First boot writes defaults; subsequent boots read existing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotCfg {
    /// Owner number without JID suffix. Empty means nobody is owner.
    pub owner_number: String,

    // routing thresholds
    pub hybrid_threshold: f32,
    pub learned_threshold: f32,
    pub fuzzy_threshold: f32,
    pub teaching_threshold: f32,
    pub auto_learn_threshold: f32,
    pub product_match_confidence: f32,
    pub fallback_confidence: f32,
    pub reinforce_step: f32,

    // fallback quality gate
    pub quality_min_confidence: f32,
    pub quality_max_issues: usize,

    // caches and logs
    pub response_cache_ttl_secs: u64,
    pub response_cache_cap: usize,
    pub session_ttl_secs: u64,
    pub session_history_cap: usize,
    pub violation_log_cap: usize,
    pub knowledge_cap: usize,
    pub review_queue_cap: usize,

    // inbound gates
    pub min_message_chars: usize,
    pub rate_limit_ms: u64,
    pub spam_window_secs: u64,
    pub spam_max_messages: usize,
    pub llm_daily_limit: u32,

    // language model
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,

    // scheduled jobs
    pub cleanup_interval_secs: u64,
    pub backup_interval_secs: u64,
    pub monitoring_interval_secs: u64,
    pub backup_keep: usize,
    pub slow_response_ms: u64,
}

impl Default for BotCfg {
    fn default() -> Self {
        Self {
            owner_number: String::new(),
            hybrid_threshold: 0.3,
            learned_threshold: 0.6,
            fuzzy_threshold: 0.6,
            teaching_threshold: 0.6,
            auto_learn_threshold: 0.7,
            product_match_confidence: 0.8,
            fallback_confidence: 0.3,
            reinforce_step: 0.05,
            quality_min_confidence: 0.4,
            quality_max_issues: 3,
            response_cache_ttl_secs: 300,
            response_cache_cap: 1000,
            session_ttl_secs: 1800,
            session_history_cap: 10,
            violation_log_cap: 1000,
            knowledge_cap: 5000,
            review_queue_cap: 200,
            min_message_chars: 2,
            rate_limit_ms: 1500,
            spam_window_secs: 60,
            spam_max_messages: 12,
            llm_daily_limit: 25,
            llm_timeout_secs: 30,
            llm_max_tokens: 512,
            llm_temperature: 0.7,
            cleanup_interval_secs: 600,
            backup_interval_secs: 86400,
            monitoring_interval_secs: 300,
            backup_keep: 7,
            slow_response_ms: 8000,
        }
    }
}

impl BotCfg {
    /// Defaults with an owner set. Mostly for tests and the console transport.
    pub fn with_owner(owner: impl Into<String>) -> Self {
        Self { owner_number: owner.into(), ..Self::default() }
    }

    /// Load config from `bot_config` table. If table is empty, seed with defaults.
    pub async fn load(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM bot_config")
            .fetch_all(pool)
            .await?;

        if rows.is_empty() {
            let cfg = Self::default();
            cfg.seed(pool).await?;
            return Ok(cfg);
        }

        let map: HashMap<String, String> = rows.into_iter().collect();
        Ok(Self::from_map(&map))
    }

    /// Write all values into `bot_config`, leaving existing keys untouched.
    async fn seed(&self, pool: &SqlitePool) -> Result<(), sqlx::Error> {
        for (key, value, desc) in &self.to_entries() {
            sqlx::query(
                "INSERT INTO bot_config (key, value, description) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .bind(desc)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            owner_number: get_or(m, "owner_number", d.owner_number),
            hybrid_threshold: get_or(m, "hybrid_threshold", d.hybrid_threshold),
            learned_threshold: get_or(m, "learned_threshold", d.learned_threshold),
            fuzzy_threshold: get_or(m, "fuzzy_threshold", d.fuzzy_threshold),
            teaching_threshold: get_or(m, "teaching_threshold", d.teaching_threshold),
            auto_learn_threshold: get_or(m, "auto_learn_threshold", d.auto_learn_threshold),
            product_match_confidence: get_or(m, "product_match_confidence", d.product_match_confidence),
            fallback_confidence: get_or(m, "fallback_confidence", d.fallback_confidence),
            reinforce_step: get_or(m, "reinforce_step", d.reinforce_step),
            quality_min_confidence: get_or(m, "quality_min_confidence", d.quality_min_confidence),
            quality_max_issues: get_or(m, "quality_max_issues", d.quality_max_issues),
            response_cache_ttl_secs: get_or(m, "response_cache_ttl_secs", d.response_cache_ttl_secs),
            response_cache_cap: get_or(m, "response_cache_cap", d.response_cache_cap),
            session_ttl_secs: get_or(m, "session_ttl_secs", d.session_ttl_secs),
            session_history_cap: get_or(m, "session_history_cap", d.session_history_cap),
            violation_log_cap: get_or(m, "violation_log_cap", d.violation_log_cap),
            knowledge_cap: get_or(m, "knowledge_cap", d.knowledge_cap),
            review_queue_cap: get_or(m, "review_queue_cap", d.review_queue_cap),
            min_message_chars: get_or(m, "min_message_chars", d.min_message_chars),
            rate_limit_ms: get_or(m, "rate_limit_ms", d.rate_limit_ms),
            spam_window_secs: get_or(m, "spam_window_secs", d.spam_window_secs),
            spam_max_messages: get_or(m, "spam_max_messages", d.spam_max_messages),
            llm_daily_limit: get_or(m, "llm_daily_limit", d.llm_daily_limit),
            llm_timeout_secs: get_or(m, "llm_timeout_secs", d.llm_timeout_secs),
            llm_max_tokens: get_or(m, "llm_max_tokens", d.llm_max_tokens),
            llm_temperature: get_or(m, "llm_temperature", d.llm_temperature),
            cleanup_interval_secs: get_or(m, "cleanup_interval_secs", d.cleanup_interval_secs),
            backup_interval_secs: get_or(m, "backup_interval_secs", d.backup_interval_secs),
            monitoring_interval_secs: get_or(m, "monitoring_interval_secs", d.monitoring_interval_secs),
            backup_keep: get_or(m, "backup_keep", d.backup_keep),
            slow_response_ms: get_or(m, "slow_response_ms", d.slow_response_ms),
        }
    }

    fn to_entries(&self) -> Vec<(&str, String, &str)> {
        vec![
            ("owner_number", self.owner_number.clone(), "Owner WhatsApp number (no suffix)"),
            ("hybrid_threshold", self.hybrid_threshold.to_string(), "Min keyword confidence for FAQ/SOP/product route"),
            ("learned_threshold", self.learned_threshold.to_string(), "Min similarity for learned-knowledge route"),
            ("fuzzy_threshold", self.fuzzy_threshold.to_string(), "Min fuzzy ratio for product name match"),
            ("teaching_threshold", self.teaching_threshold.to_string(), "Min confidence for accepting taught pairs"),
            ("auto_learn_threshold", self.auto_learn_threshold.to_string(), "Combined confidence to learn LLM output immediately"),
            ("product_match_confidence", self.product_match_confidence.to_string(), "Confidence of an exact product name hit"),
            ("fallback_confidence", self.fallback_confidence.to_string(), "Fixed confidence of the LLM fallback route"),
            ("reinforce_step", self.reinforce_step.to_string(), "Confidence gain per successful reuse"),
            ("quality_min_confidence", self.quality_min_confidence.to_string(), "Min quality score for auto-learn eligibility"),
            ("quality_max_issues", self.quality_max_issues.to_string(), "Issue count at which LLM output is ineligible"),
            ("response_cache_ttl_secs", self.response_cache_ttl_secs.to_string(), "Response cache TTL seconds"),
            ("response_cache_cap", self.response_cache_cap.to_string(), "Response cache max entries"),
            ("session_ttl_secs", self.session_ttl_secs.to_string(), "Conversation session TTL seconds"),
            ("session_history_cap", self.session_history_cap.to_string(), "Turns kept per conversation"),
            ("violation_log_cap", self.violation_log_cap.to_string(), "Law violation log max entries"),
            ("knowledge_cap", self.knowledge_cap.to_string(), "Knowledge store max entries"),
            ("review_queue_cap", self.review_queue_cap.to_string(), "Manual review queue max entries"),
            ("min_message_chars", self.min_message_chars.to_string(), "Shorter messages get a clarification prompt"),
            ("rate_limit_ms", self.rate_limit_ms.to_string(), "Min gap between messages from one sender"),
            ("spam_window_secs", self.spam_window_secs.to_string(), "Spam detection window seconds"),
            ("spam_max_messages", self.spam_max_messages.to_string(), "Messages per window before spam warning"),
            ("llm_daily_limit", self.llm_daily_limit.to_string(), "LLM answers per customer per day"),
            ("llm_timeout_secs", self.llm_timeout_secs.to_string(), "LLM request timeout seconds"),
            ("llm_max_tokens", self.llm_max_tokens.to_string(), "LLM max output tokens"),
            ("llm_temperature", self.llm_temperature.to_string(), "LLM sampling temperature"),
            ("cleanup_interval_secs", self.cleanup_interval_secs.to_string(), "Cleanup job interval seconds"),
            ("backup_interval_secs", self.backup_interval_secs.to_string(), "Backup job interval seconds"),
            ("monitoring_interval_secs", self.monitoring_interval_secs.to_string(), "Health check interval seconds"),
            ("backup_keep", self.backup_keep.to_string(), "Backups retained"),
            ("slow_response_ms", self.slow_response_ms.to_string(), "Average response time that raises an alert"),
        ]
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_map_overrides_and_falls_back() {
        let mut m = HashMap::new();
        m.insert("hybrid_threshold".to_string(), "0.45".to_string());
        m.insert("rate_limit_ms".to_string(), "not-a-number".to_string());
        m.insert("owner_number".to_string(), "62811".to_string());
        let cfg = BotCfg::from_map(&m);
        assert_eq!(cfg.hybrid_threshold, 0.45);
        assert_eq!(cfg.rate_limit_ms, BotCfg::default().rate_limit_ms);
        assert_eq!(cfg.owner_number, "62811");
    }

    #[test]
    fn entries_cover_every_key() {
        let cfg = BotCfg::default();
        let entries = cfg.to_entries();
        let map: HashMap<String, String> =
            entries.iter().map(|(k, v, _)| ((*k).to_string(), v.clone())).collect();
        let round = BotCfg::from_map(&map);
        assert_eq!(round.knowledge_cap, cfg.knowledge_cap);
        assert_eq!(round.auto_learn_threshold, cfg.auto_learn_threshold);
        assert_eq!(entries.len(), 31);
    }

    #[tokio::test]
    async fn load_seeds_then_reads_back() {
        let pool = crate::store::memory_pool().await.unwrap();
        let first = BotCfg::load(&pool).await.unwrap();
        assert_eq!(first.hybrid_threshold, 0.3);
        sqlx::query("UPDATE bot_config SET value = '0.5' WHERE key = 'learned_threshold'")
            .execute(&pool)
            .await
            .unwrap();
        let second = BotCfg::load(&pool).await.unwrap();
        assert_eq!(second.learned_threshold, 0.5);
    }
}
