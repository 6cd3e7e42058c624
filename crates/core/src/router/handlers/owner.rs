//! Owner-only law controls and operations reports.

use std::fmt::Write as _;
use std::time::Instant;

use chrono::{Local, TimeZone, Utc};

use super::super::{HandlerError, ResponseRouter};
use crate::classify::command::{LawCommand, OpsCommand};
use crate::classify::mood::Mood;
use crate::ops::attendance;
use crate::ops::backup;

const VIOLATIONS_SHOWN: usize = 10;
const TOP_SHOWN: usize = 5;

impl ResponseRouter {
    pub(super) fn handle_law(&mut self, cmd: LawCommand, sender: &str) -> String {
        match cmd {
            LawCommand::Status => self.law_status(),
            LawCommand::EmergencyStop => {
                self.laws.emergency_stop(sender);
                self.cache.clear();
                "🛑 Emergency stop aktif. Semua balasan bot ke pelanggan ditahan sampai *emergency resume*.".into()
            }
            LawCommand::EmergencyResume => {
                if self.laws.emergency_resume() {
                    "✅ Emergency stop dicabut. Bot kembali melayani pelanggan.".into()
                } else {
                    "Emergency stop tidak sedang aktif.".into()
                }
            }
            LawCommand::Enable => {
                self.laws.set_enabled(true);
                "✅ Bot Laws diaktifkan.".into()
            }
            LawCommand::Disable => {
                self.laws.set_enabled(false);
                "⚠️ Bot Laws dinonaktifkan. Aturan kritis tetap berlaku.".into()
            }
            LawCommand::Violations => {
                let mut out = format!("📜 *Pelanggaran terakhir* ({} tercatat)\n", self.laws.violation_count());
                let mut any = false;
                for v in self.laws.recent_violations(VIOLATIONS_SHOWN) {
                    any = true;
                    let at = v.timestamp.with_timezone(&Local).format("%d/%m %H:%M");
                    let _ = write!(out, "\n• [{at}] {} / {} ({})\n  {}", v.law, v.rule, v.severity.as_str(), v.reason);
                }
                if !any {
                    out.push_str("\nBelum ada pelanggaran.");
                }
                out
            }
        }
    }

    fn law_status(&self) -> String {
        let stats = self.laws.stats();
        let emergency = match self.laws.emergency() {
            Some(stop) => format!("AKTIF (oleh {} sejak {})", stop.by, stop.at.with_timezone(&Local).format("%d/%m %H:%M")),
            None => "tidak aktif".into(),
        };
        let mut out = format!(
            "⚖️ *Status Bot Laws*\n\
             • Laws: {}\n\
             • Emergency stop: {emergency}\n\
             • Pemeriksaan: {}\n\
             • Diblokir: {}\n\
             • Blokir kritis: {}",
            if self.laws.is_enabled() { "aktif" } else { "nonaktif" },
            stats.checks,
            stats.blocked,
            stats.absolute_blocks,
        );
        let mut by_law: Vec<_> = stats.by_law.iter().collect();
        by_law.sort_by_key(|(law, _)| law.priority());
        for (law, n) in by_law {
            let _ = write!(out, "\n  - {law}: {n}");
        }
        out
    }

    pub(super) async fn handle_ops(&mut self, cmd: OpsCommand) -> Result<String, HandlerError> {
        Ok(match cmd {
            OpsCommand::Dashboard => self.dashboard(),
            OpsCommand::Analytics => self.analytics_report(),
            OpsCommand::Performance => self.performance_report(),
            OpsCommand::Security => {
                let s = self.security.stats();
                format!(
                    "🛡️ *Keamanan*\n• Diizinkan: {}\n• Blacklist: {}\n• Rate limit: {}\n• Peringatan spam: {}\n• Dibungkam: {}\n• Pengirim dipantau: {}\n• Nomor blacklist: {}",
                    s.allowed,
                    s.blacklisted,
                    s.rate_limited,
                    s.spam_warnings,
                    s.silenced,
                    self.security.tracked_senders(),
                    self.catalog.blacklist.len(),
                )
            }
            OpsCommand::Monitoring => self.monitoring_report(),
            OpsCommand::Cleanup => self.cleanup(Instant::now()).to_string(),
            OpsCommand::BackupCreate => {
                let info = self.backup().await?;
                format!("💾 Backup *{}* dibuat ({} file, {} backup lama dihapus).", info.name, info.files, info.pruned)
            }
            OpsCommand::BackupList => {
                let names = backup::list(self.store.data_dir()).await?;
                if names.is_empty() {
                    "Belum ada backup.".into()
                } else {
                    let mut out = format!("💾 *Backup* ({})", names.len());
                    for name in names {
                        let _ = write!(out, "\n• {name}");
                    }
                    out
                }
            }
            OpsCommand::Attendance => self.attendance_report().await?,
        })
    }

    fn dashboard(&self) -> String {
        let knowledge = self.knowledge.stats();
        format!(
            "📊 *Dashboard*\n\
             • Pesan: {} ({} pengirim hari ini)\n\
             • Rata-rata respon: {:.0} ms\n\
             • Cache hit: {:.0}%\n\
             • Pengetahuan: {} entri ({} terverifikasi)\n\
             • Antrian review: {}\n\
             • Produk: {}, FAQ: {}, SOP: {}\n\
             • Layanan AI: {} (gagal beruntun: {})\n\
             • Emergency stop: {}",
            self.analytics.total(),
            self.analytics.unique_senders(),
            self.performance.average_ms(),
            self.performance.cache_hit_ratio() * 100.0,
            knowledge.total,
            knowledge.verified,
            self.review.len(),
            self.catalog.products.len(),
            self.catalog.faqs.len(),
            self.catalog.sops.len(),
            self.fallback.provider_name(),
            self.fallback.consecutive_failures(),
            if self.laws.is_emergency_stopped() { "aktif" } else { "tidak aktif" },
        )
    }

    fn analytics_report(&self) -> String {
        let since = self.analytics.started().with_timezone(&Local).format("%d/%m %H:%M");
        let mut out = format!(
            "📈 *Analytics* sejak {since}\n• Total pesan: {}\n• Pengirim unik hari ini: {}\n\n*Rute*",
            self.analytics.total(),
            self.analytics.unique_senders()
        );
        for (route, n) in self.analytics.routes() {
            let _ = write!(out, "\n• {route}: {n}");
        }
        out.push_str("\n\n*Mood*");
        for mood in [Mood::Positive, Mood::Neutral, Mood::Angry, Mood::OutOfTopic] {
            let _ = write!(out, "\n• {}: {}", mood.as_str(), self.analytics.mood_count(mood));
        }
        let products = self.analytics.top_products(TOP_SHOWN);
        if !products.is_empty() {
            out.push_str("\n\n*Produk populer*");
            for (name, n) in products {
                let _ = write!(out, "\n• {name}: {n}");
            }
        }
        let queries = self.analytics.top_queries(TOP_SHOWN);
        if !queries.is_empty() {
            out.push_str("\n\n*Pertanyaan teratas*");
            for (q, n) in queries {
                let _ = write!(out, "\n• {q} ({n})");
            }
        }
        out
    }

    fn performance_report(&self) -> String {
        let p = &self.performance;
        let mut out = format!(
            "⚡ *Performa*\n• Pesan diproses: {}\n• Rata-rata: {:.0} ms\n• Terlama: {} ms\n• Cache hit: {:.0}%\n• Error handler: {} ({:.1}%)",
            p.handled(),
            p.average_ms(),
            p.max_ms(),
            p.cache_hit_ratio() * 100.0,
            p.handler_errors(),
            p.error_rate() * 100.0,
        );
        for (route, _) in self.analytics.routes() {
            if let Some(ms) = p.route_average_ms(route) {
                let _ = write!(out, "\n  - {route}: {ms:.0} ms");
            }
        }
        out
    }

    fn monitoring_report(&mut self) -> String {
        if self.monitor.last().is_none() {
            self.health_check();
        }
        let Some(report) = self.monitor.last() else {
            return "Belum ada data monitoring.".into();
        };
        let at = report.at.with_timezone(&Local).format("%d/%m %H:%M:%S");
        if report.healthy() {
            return format!("✅ Sistem sehat (cek terakhir {at})");
        }
        let mut out = format!("🩺 *Monitoring* (cek terakhir {at})");
        for alert in &report.alerts {
            let _ = write!(out, "\n{alert}");
        }
        out
    }

    async fn attendance_report(&self) -> Result<String, HandlerError> {
        let midnight = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| Local.from_local_datetime(&t).earliest())
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| HandlerError::Invalid("local midnight does not exist".into()))?;
        let shifts = attendance::since(&self.store, midnight).await?;
        if shifts.is_empty() {
            return Ok("🗓️ Belum ada moderator yang absen hari ini.".into());
        }
        let mut out = format!("🗓️ *Absensi hari ini* ({})", shifts.len());
        for shift in shifts {
            let name = self
                .catalog
                .moderators
                .iter()
                .find(|m| m.number == shift.number)
                .map_or(shift.number.as_str(), |m| m.name.as_str());
            let start = shift.check_in.with_timezone(&Local).format("%H:%M");
            match shift.check_out {
                Some(end) => {
                    let _ = write!(out, "\n• {name}: {start} - {}", end.with_timezone(&Local).format("%H:%M"));
                }
                None => {
                    let _ = write!(out, "\n• {name}: {start} - (masih bertugas)");
                }
            }
        }
        Ok(out)
    }
}

