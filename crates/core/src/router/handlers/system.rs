use std::fmt::Write as _;
use std::time::Instant;

use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;

use super::super::{HandlerError, ResponseRouter, replies, today};
use crate::classify::command::{LearningCommand, SystemCommand};
use crate::types::{ClaimLog, KnowledgeSource, SenderRole};

impl ResponseRouter {
    pub(super) async fn handle_system(
        &mut self,
        cmd: &SystemCommand,
        sender: &str,
        role: SenderRole,
    ) -> Result<String, HandlerError> {
        Ok(match cmd {
            SystemCommand::Menu => replies::menu(),
            SystemCommand::ProductList => self.product_list(),
            SystemCommand::Promo => {
                let mut out = String::from("🎉 *Promo*");
                let mut any = false;
                for promo in self.catalog.active_promos() {
                    any = true;
                    let _ = write!(out, "\n\n*{}*", promo.title);
                    if !promo.description.is_empty() {
                        let _ = write!(out, "\n{}", promo.description);
                    }
                }
                if any { out } else { replies::NO_PROMO.to_owned() }
            }
            SystemCommand::Limit => {
                if role == SenderRole::Owner {
                    "Kuota tanya jawab otomatis: tanpa batas.".into()
                } else {
                    format!(
                        "Sisa kuota tanya jawab otomatis hari ini: {} dari {}.",
                        self.quota.remaining(sender, today()),
                        self.quota.limit()
                    )
                }
            }
            SystemCommand::Greeting => {
                if self.sessions.is_active(sender, Instant::now()) {
                    replies::GREETING_RETURNING.to_owned()
                } else {
                    pick_greeting().to_owned()
                }
            }
            SystemCommand::Thanks => replies::THANKS.to_owned(),
            SystemCommand::Claim { order_id, complaint } => {
                if order_id.is_empty() {
                    return Ok(replies::CLAIM_USAGE.to_owned());
                }
                let claim = ClaimLog {
                    id: Uuid::new_v4(),
                    order_id: order_id.to_uppercase(),
                    number: sender.to_owned(),
                    complaint: complaint.clone(),
                    timestamp: Utc::now(),
                };
                self.store.upsert(&claim).await?;
                tracing::info!(order = %claim.order_id, sender, "warranty claim recorded");
                format!(
                    "✅ Klaim untuk order *{}* sudah kami catat. Admin akan segera memproses ya kak 🙏",
                    claim.order_id
                )
            }
        })
    }

    fn product_list(&self) -> String {
        if self.catalog.products.is_empty() {
            return replies::NO_PRODUCTS.to_owned();
        }
        let mut out = String::from("🛒 *Daftar Produk*\n");
        for product in &self.catalog.products {
            let headline = product.body.lines().next().unwrap_or_default().trim();
            let _ = write!(out, "\n• *{}*", product.name);
            if !headline.is_empty() {
                let _ = write!(out, " : {headline}");
            }
            if let Some(stock) = self.catalog.stock_of(&product.name) {
                let _ = write!(out, " (stok {})", stock.quantity);
            }
        }
        out.push_str("\n\nKetik nama produk untuk detail dan harga.");
        out
    }

    pub(super) fn handle_learning(&mut self, cmd: LearningCommand, sender: &str) -> String {
        match cmd {
            LearningCommand::Stats => {
                let stats = self.knowledge.stats();
                let mut out = format!(
                    "📚 *Statistik Learning*\n• Total pengetahuan: {}\n• Terverifikasi: {}\n• Rata-rata confidence: {:.0}%\n• Total dipakai: {}\n• Antrian review: {}",
                    stats.total,
                    stats.verified,
                    stats.average_confidence * 100.0,
                    stats.total_usage,
                    self.review.len()
                );
                for source in [
                    KnowledgeSource::FaqSeed,
                    KnowledgeSource::SopSeed,
                    KnowledgeSource::OwnerTeaching,
                    KnowledgeSource::AiAutoLearned,
                    KnowledgeSource::Reinforced,
                ] {
                    let n = stats.by_source.get(&source).copied().unwrap_or(0);
                    let _ = write!(out, "\n  - {}: {n}", source.as_str());
                }
                out
            }
            LearningCommand::Reset => {
                self.sessions.reset(sender);
                "🔄 Riwayat percakapan kakak sudah direset.".into()
            }
            LearningCommand::Help => replies::LEARNING_HELP.to_owned(),
        }
    }
}

fn pick_greeting() -> &'static str {
    replies::GREETINGS.choose(&mut rand::thread_rng()).copied().unwrap_or(replies::GREETINGS[0])
}
