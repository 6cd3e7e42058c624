//! FallbackGenerator: the language-model route of last resort, plus the
//! quality gate deciding whether its output may be learned.

pub mod prompt;
pub mod quality;
mod quota;

use std::sync::Arc;
use std::time::Duration;

use resbot_llm::provider::{CompletionRequest, LlmError, LlmProvider};

pub use prompt::PromptContext;
pub use quality::{QualityIssue, QualityReport};
pub use quota::DailyQuota;

use crate::config::BotCfg;
use crate::knowledge::KnowledgeStore;

/// What to do with a generated answer after scoring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnDecision {
    /// Learn immediately.
    Learn,
    /// Hold for owner review.
    Queue,
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAssessment {
    pub quality: QualityReport,
    pub style: f32,
    pub combined: f32,
    pub decision: LearnDecision,
}

pub struct FallbackGenerator {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
    consecutive_failures: u32,
}

impl std::fmt::Debug for FallbackGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackGenerator")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("consecutive_failures", &self.consecutive_failures)
            .finish()
    }
}

impl FallbackGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: &BotCfg) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(cfg.llm_timeout_secs),
            max_tokens: cfg.llm_max_tokens,
            temperature: cfg.llm_temperature,
            consecutive_failures: 0,
        }
    }

    /// Ask the model for an answer. A single attempt bounded by the timeout.
    pub async fn generate(&mut self, ctx: &PromptContext<'_>, text: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            messages: prompt::build(ctx, text),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let result = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(resp)) if resp.content.trim().is_empty() => Err(LlmError::EmptyResponse),
            Ok(Ok(resp)) => Ok(resp.content.trim().to_owned()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LlmError::Timeout),
        };
        match &result {
            Ok(_) => self.consecutive_failures = 0,
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(provider = self.provider.name(), error = %e, failures = self.consecutive_failures, "fallback generation failed");
            }
        }
        result
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Score an answer and decide between learn, queue and discard. Law checks
/// happen separately before anything is stored.
pub fn assess_candidate(
    question: &str,
    answer: &str,
    knowledge: &KnowledgeStore,
    cfg: &BotCfg,
) -> CandidateAssessment {
    let quality = quality::assess(question, answer);
    let style = knowledge.style_score(answer);
    let combined = quality.confidence * 0.7 + style * 0.3;
    let decision = if !quality.eligible(cfg.quality_min_confidence, cfg.quality_max_issues) {
        LearnDecision::Discard
    } else if combined > cfg.auto_learn_threshold {
        LearnDecision::Learn
    } else {
        LearnDecision::Queue
    };
    CandidateAssessment { quality, style, combined, decision }
}

/// Friendly Indonesian text for a failed generation. Never exposes detail.
pub fn user_message(err: &LlmError) -> &'static str {
    match err {
        LlmError::BadRequest => "Maaf kak, pertanyaannya belum bisa kami proses. Boleh ditulis ulang dengan kalimat lain? 🙏",
        LlmError::Unauthorized => "Maaf kak, layanan jawaban otomatis sedang dalam pemeliharaan. Admin akan segera membalas ya 🙏",
        LlmError::Forbidden => "Maaf kak, layanan jawaban otomatis sedang dibatasi. Mohon tunggu balasan admin ya 🙏",
        LlmError::RateLimited => "Maaf kak, sistem sedang ramai. Coba kirim ulang beberapa menit lagi ya 🙏",
        LlmError::ServerError(_) => "Maaf kak, server sedang gangguan. Admin akan segera membantu ya 🙏",
        LlmError::Timeout => "Maaf kak, respon sedang lambat. Silakan coba lagi sebentar lagi ya 🙏",
        LlmError::RequestFailed(_) | LlmError::EmptyResponse | LlmError::Unavailable(_) => {
            "Maaf kak, pertanyaan ini belum bisa dijawab otomatis. Silakan hubungi admin ya 🙏"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resbot_llm::provider::MockProvider;

    fn ctx() -> PromptContext<'static> {
        PromptContext { products: &[], promos: &[], history: &[] }
    }

    #[tokio::test]
    async fn generate_trims_and_resets_failures() {
        let cfg = BotCfg::default();
        let mock = Arc::new(MockProvider::new("  Ada kak  "));
        let mut generator = FallbackGenerator::new(mock.clone(), &cfg);
        assert_eq!(generator.generate(&ctx(), "spotify ada?").await.unwrap(), "Ada kak");
        let req = mock.last_request().unwrap();
        assert_eq!(req.max_tokens, cfg.llm_max_tokens);
        assert_eq!(req.messages.last().unwrap().content, "spotify ada?");
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let cfg = BotCfg::default();
        let mut generator = FallbackGenerator::new(Arc::new(MockProvider::failing(LlmError::RateLimited)), &cfg);
        for _ in 0..2 {
            assert_eq!(generator.generate(&ctx(), "x").await, Err(LlmError::RateLimited));
        }
        assert_eq!(generator.consecutive_failures(), 2);
    }

    #[tokio::test]
    async fn blank_output_is_empty_response() {
        let cfg = BotCfg::default();
        let mut generator = FallbackGenerator::new(Arc::new(MockProvider::new("   ")), &cfg);
        assert_eq!(generator.generate(&ctx(), "x").await, Err(LlmError::EmptyResponse));
    }

    #[test]
    fn each_status_class_has_its_own_message() {
        let errors = [
            LlmError::BadRequest,
            LlmError::Unauthorized,
            LlmError::Forbidden,
            LlmError::RateLimited,
            LlmError::ServerError(503),
            LlmError::Timeout,
        ];
        let texts: std::collections::HashSet<&str> = errors.iter().map(user_message).collect();
        assert_eq!(texts.len(), errors.len());
    }

    #[test]
    fn assessment_decisions() {
        let cfg = BotCfg::default();
        let ks = KnowledgeStore::new(&cfg);
        let good = assess_candidate(
            "spotify ada kak?",
            "Ada kak, Spotify premium 1 bulan bisa langsung order ke admin ya.",
            &ks,
            &cfg,
        );
        // quality 0.8 * 0.7 + style 0.5 * 0.3 = 0.71
        assert_eq!(good.decision, LearnDecision::Learn);
        let bad = assess_candidate("spotify?", "As an AI language model, I cannot help.", &ks, &cfg);
        assert_eq!(bad.decision, LearnDecision::Discard);
    }
}
