//! Owner and moderator commands: teaching, review, moderators, stock,
//! blacklist, reload and attendance.

use std::fmt::Write as _;

use chrono::Utc;
use uuid::Uuid;

use super::super::{HandlerError, ResponseRouter, replies};
use crate::classify::command::AdminCommand;
use crate::classify::teaching::TeachingCommand;
use crate::ops::attendance::{self, AttendanceOutcome};
use crate::types::{
    BlacklistEntry, KnowledgeSource, LawViolation, LearningEvent, LearningEventKind, Moderator, SenderRole,
    StockRecord, normalize_number,
};

impl ResponseRouter {
    pub(super) async fn handle_admin(
        &mut self,
        cmd: &AdminCommand,
        sender: &str,
        role: SenderRole,
    ) -> Result<String, HandlerError> {
        if cmd.owner_only() && role != SenderRole::Owner {
            return Ok(replies::OWNER_ONLY.to_owned());
        }
        match cmd {
            AdminCommand::Teach(taught) => self.teach(taught).await,
            AdminCommand::Approve(n) => self.approve(*n).await,
            AdminCommand::Reject(n) => Ok(match self.review.take(*n) {
                Some(item) => {
                    self.log_learning(LearningEvent::new(LearningEventKind::Rejected, &item.input, &item.response))
                        .await;
                    format!("🗑️ Review #{n} ditolak.")
                }
                None => format!("Review #{n} tidak ditemukan."),
            }),
            AdminCommand::ReviewList => Ok(self.review_list()),
            AdminCommand::AddModerator { number, name } => self.add_moderator(number, name, sender).await,
            AdminCommand::RemoveModerator(number) => {
                let existing = self.catalog.moderators.iter().find(|m| &m.number == number).map(|m| m.id);
                match existing {
                    Some(id) => {
                        self.store.remove::<Moderator>(id).await?;
                        self.reload().await?;
                        Ok(format!("✅ Moderator {number} dihapus."))
                    }
                    None => Ok(format!("Moderator {number} tidak ditemukan.")),
                }
            }
            AdminCommand::ListModerators => Ok(self.moderator_list()),
            AdminCommand::Stock { product, quantity } => self.stock(product, *quantity).await,
            AdminCommand::Blacklist(number) => self.blacklist(normalize_number(number), sender).await,
            AdminCommand::Unblacklist(number) => {
                let number = normalize_number(number);
                let existing = self.catalog.blacklist.iter().find(|b| b.number == number).map(|b| b.id);
                match existing {
                    Some(id) => {
                        self.store.remove::<BlacklistEntry>(id).await?;
                        self.reload().await?;
                        Ok(format!("✅ {number} dihapus dari blacklist."))
                    }
                    None => Ok(format!("{number} tidak ada di blacklist.")),
                }
            }
            AdminCommand::Reload => {
                self.reload().await?;
                Ok(format!(
                    "🔄 Data dimuat ulang: {} produk, {} FAQ, {} SOP, {} pengetahuan.",
                    self.catalog.products.len(),
                    self.catalog.faqs.len(),
                    self.catalog.sops.len(),
                    self.knowledge.len()
                ))
            }
            AdminCommand::CheckIn => Ok(match attendance::check_in(&self.store, sender).await? {
                AttendanceOutcome::CheckedIn(at) | AttendanceOutcome::AlreadyIn(at) => {
                    format!("🟢 Absen masuk tercatat ({}).", at.with_timezone(&chrono::Local).format("%H:%M"))
                }
                other => return Err(HandlerError::Invalid(format!("unexpected check-in outcome {other:?}"))),
            }),
            AdminCommand::CheckOut => Ok(match attendance::check_out(&self.store, sender).await? {
                AttendanceOutcome::CheckedOut { minutes } => {
                    format!("🔴 Absen keluar tercatat. Durasi tugas {} jam {} menit.", minutes / 60, minutes % 60)
                }
                AttendanceOutcome::NotCheckedIn => "Belum absen masuk hari ini.".into(),
                other => return Err(HandlerError::Invalid(format!("unexpected check-out outcome {other:?}"))),
            }),
        }
    }

    /// Owner teaching. A blocked pair leaves knowledge untouched and the reply
    /// names the rule that fired.
    async fn teach(&mut self, taught: &TeachingCommand) -> Result<String, HandlerError> {
        let validation = self.laws.validate_learning(&taught.input, &taught.response);
        if let Some(violation) = validation.violation {
            self.log_learning(LearningEvent::new(LearningEventKind::Blocked, &taught.input, &violation.rule))
                .await;
            return Ok(rejection(&violation));
        }
        let entry = self.knowledge.learn(&taught.input, &taught.response, 1.0, KnowledgeSource::OwnerTeaching);
        self.store.upsert(&entry).await?;
        self.log_learning(LearningEvent::new(LearningEventKind::Taught, &entry.input, &entry.response)).await;
        tracing::info!(id = %entry.id, input = %entry.input, "owner taught new answer");
        Ok(format!("✅ Bot berhasil belajar!\n\nPertanyaan: {}\nJawaban: {}", entry.input, entry.response))
    }

    async fn approve(&mut self, number: u32) -> Result<String, HandlerError> {
        let Some(item) = self.review.take(number) else {
            return Ok(format!("Review #{number} tidak ditemukan."));
        };
        // Laws may have changed since the item was queued.
        let validation = self.laws.validate_learning(&item.input, &item.response);
        if let Some(violation) = validation.violation {
            self.log_learning(LearningEvent::new(LearningEventKind::Blocked, &item.input, &violation.rule)).await;
            return Ok(rejection(&violation));
        }
        let mut entry = self.knowledge.learn(&item.input, &item.response, item.confidence, KnowledgeSource::AiAutoLearned);
        entry.verified = true;
        self.knowledge.extend([entry.clone()]);
        self.store.upsert(&entry).await?;
        self.log_learning(LearningEvent::new(LearningEventKind::Approved, &entry.input, &entry.response)).await;
        Ok(format!("✅ Review #{number} disetujui dan dipelajari."))
    }

    fn review_list(&self) -> String {
        if self.review.is_empty() {
            return "Antrian review kosong.".into();
        }
        let mut out = format!("📝 *Antrian review* ({})", self.review.len());
        for item in self.review.iter() {
            let _ = write!(
                out,
                "\n\n#{} ({:.0}%)\nT: {}\nJ: {}",
                item.number,
                item.confidence * 100.0,
                item.input,
                item.response
            );
        }
        out.push_str("\n\nBalas *approve <n>* atau *reject <n>*.");
        out
    }

    async fn add_moderator(&mut self, number: &str, name: &str, sender: &str) -> Result<String, HandlerError> {
        let moderator = match self.catalog.moderators.iter().find(|m| m.number == number) {
            Some(existing) => Moderator { name: name.to_owned(), active: true, ..existing.clone() },
            None => Moderator {
                id: Uuid::new_v4(),
                number: number.to_owned(),
                name: name.to_owned(),
                active: true,
                added_by: sender.to_owned(),
            },
        };
        self.store.upsert(&moderator).await?;
        self.reload().await?;
        Ok(format!("✅ {} ({number}) sekarang moderator.", moderator.name))
    }

    fn moderator_list(&self) -> String {
        if self.catalog.moderators.is_empty() {
            return "Belum ada moderator.".into();
        }
        let mut out = format!("👥 *Moderator* ({})", self.catalog.moderators.len());
        for m in &self.catalog.moderators {
            let state = if m.active { "aktif" } else { "nonaktif" };
            let _ = write!(out, "\n• {} ({}) {state}", m.name, m.number);
        }
        out
    }

    async fn stock(&mut self, product: &str, quantity: Option<u32>) -> Result<String, HandlerError> {
        let Some(quantity) = quantity else {
            return Ok(match self.catalog.stock_of(product) {
                Some(s) => format!("📦 Stok {}: {}", s.product, s.quantity),
                None => format!("Stok {product} belum tercatat."),
            });
        };
        let record = match self.catalog.stock_of(product) {
            Some(existing) => StockRecord { quantity, updated_at: Utc::now(), ..existing.clone() },
            None => StockRecord { id: Uuid::new_v4(), product: product.to_owned(), quantity, updated_at: Utc::now() },
        };
        self.store.upsert(&record).await?;
        self.reload().await?;
        Ok(format!("✅ Stok {} diperbarui menjadi {quantity}.", record.product))
    }

    async fn blacklist(&mut self, number: &str, sender: &str) -> Result<String, HandlerError> {
        if number.is_empty() || number == normalize_number(&self.cfg.owner_number) {
            return Ok("Nomor ini tidak bisa di-blacklist.".into());
        }
        if self.catalog.is_blacklisted(number) {
            return Ok(format!("{number} sudah ada di blacklist."));
        }
        let entry = BlacklistEntry { id: Uuid::new_v4(), number: number.to_owned(), reason: format!("oleh {sender}") };
        self.store.upsert(&entry).await?;
        self.reload().await?;
        Ok(format!("⛔ {number} masuk blacklist."))
    }
}

fn rejection(violation: &LawViolation) -> String {
    format!(
        "❌ Pembelajaran ditolak.\n\nAturan: {} / {}\nAlasan: {}",
        violation.law, violation.rule, violation.reason
    )
}
