//! Content routes: catalog hits, learned answers and the language-model
//! fallback with its learning gate.

use std::time::Instant;

use super::super::{HandlerError, ResponseRouter, replies, today};
use super::with_mood;
use crate::classify::hybrid::{HybridMatch, HybridSource};
use crate::classify::mood::Mood;
use crate::fallback::{self, LearnDecision, PromptContext};
use crate::knowledge::LearnedMatch;
use crate::types::{KnowledgeSource, LearningEvent, LearningEventKind, SenderRole};

impl ResponseRouter {
    pub(super) fn handle_hybrid(&self, m: &HybridMatch, mood: Mood) -> Result<String, HandlerError> {
        let missing = || HandlerError::Invalid(format!("{} {} vanished from catalog", m.source.as_str(), m.id));
        let text = match m.source {
            HybridSource::Product => {
                let product = self.catalog.product(m.id).ok_or_else(missing)?;
                let mut text = product.body.trim().to_owned();
                match self.catalog.stock_of(&product.name) {
                    Some(s) if s.quantity == 0 => text.push_str("\n\n📦 Stok sedang habis kak, silakan tanya admin untuk restock."),
                    Some(s) => text.push_str(&format!("\n\n📦 Stok tersedia: {}", s.quantity)),
                    None => {}
                }
                text
            }
            HybridSource::Faq => self.catalog.faq(m.id).ok_or_else(missing)?.answer.clone(),
            HybridSource::Sop => self.catalog.sop(m.id).ok_or_else(missing)?.content.clone(),
        };
        Ok(with_mood(mood, text))
    }

    /// Serve a learned answer and reinforce the entry it came from.
    pub(super) async fn handle_learned(&mut self, m: &LearnedMatch, mood: Mood) -> Result<String, HandlerError> {
        self.reinforce_learned(m.id).await?;
        Ok(with_mood(mood, m.response.clone()))
    }

    /// Language-model route. Never fails: errors become a friendly text.
    pub(super) async fn handle_fallback(&mut self, text: &str, sender: &str, role: SenderRole, mood: Mood) -> String {
        if mood == Mood::OutOfTopic {
            return replies::OUT_OF_TOPIC.to_owned();
        }
        let day = today();
        if role != SenderRole::Owner && !self.quota.try_take(sender, day) {
            tracing::info!(sender, "daily fallback quota exhausted");
            return replies::QUOTA_EXHAUSTED.to_owned();
        }

        let history = self.sessions.history(sender, Instant::now());
        let promos: Vec<_> = self.catalog.active_promos().cloned().collect();
        let ctx = PromptContext { products: &self.catalog.products, promos: &promos, history: &history };
        match self.fallback.generate(&ctx, text).await {
            Ok(answer) => {
                self.consider_learning(text, &answer).await;
                answer
            }
            Err(e) => {
                if role != SenderRole::Owner {
                    self.quota.refund(sender, day);
                }
                fallback::user_message(&e).to_owned()
            }
        }
    }

    /// Score a generated answer, then learn it, queue it for review or drop
    /// it. Nothing is stored unless the learning laws allow the pair.
    async fn consider_learning(&mut self, question: &str, answer: &str) {
        let assessment = fallback::assess_candidate(question, answer, &self.knowledge, &self.cfg);
        tracing::debug!(
            quality = assessment.quality.confidence,
            style = assessment.style,
            combined = assessment.combined,
            issues = assessment.quality.issues.len(),
            decision = ?assessment.decision,
            "fallback answer assessed"
        );
        if assessment.decision == LearnDecision::Discard {
            return;
        }
        let validation = self.laws.validate_learning(question, answer);
        if let Some(violation) = validation.violation {
            self.log_learning(LearningEvent::new(LearningEventKind::Blocked, question, &violation.rule)).await;
            return;
        }
        match assessment.decision {
            LearnDecision::Learn => {
                let entry = self.knowledge.learn(question, answer, assessment.combined, KnowledgeSource::AiAutoLearned);
                if let Err(e) = self.store.upsert(&entry).await {
                    tracing::warn!(id = %entry.id, error = %e, "persisting learned answer failed");
                }
                self.log_learning(LearningEvent::new(LearningEventKind::AutoLearned, question, answer)).await;
            }
            LearnDecision::Queue => {
                let number = self.review.push(question, answer, assessment.combined);
                self.log_learning(LearningEvent::new(LearningEventKind::Queued, question, format!("review #{number}")))
                    .await;
            }
            LearnDecision::Discard => {}
        }
    }
}
