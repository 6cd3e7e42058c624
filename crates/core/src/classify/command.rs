//! Text command parsers. Each returns `None` for anything it does not own so
//! the cascade can fall through to the next route.

use super::similarity::normalize;
use super::teaching::{self, TeachingCommand};
use crate::types::normalize_number;

/// Owner-only law controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LawCommand {
    Status,
    EmergencyStop,
    EmergencyResume,
    Enable,
    Disable,
    Violations,
}

/// Owner-only operations reports and maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsCommand {
    Dashboard,
    Analytics,
    Performance,
    Security,
    Monitoring,
    Cleanup,
    BackupCreate,
    BackupList,
    Attendance,
}

/// Learning introspection, open to every sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningCommand {
    Stats,
    Reset,
    Help,
}

/// Commands for the owner or an active moderator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Teach(TeachingCommand),
    Approve(u32),
    Reject(u32),
    ReviewList,
    AddModerator { number: String, name: String },
    RemoveModerator(String),
    ListModerators,
    Stock { product: String, quantity: Option<u32> },
    Blacklist(String),
    Unblacklist(String),
    Reload,
    CheckIn,
    CheckOut,
}

impl AdminCommand {
    /// Commands a moderator may not run.
    pub fn owner_only(&self) -> bool {
        matches!(
            self,
            Self::Teach(_)
                | Self::Approve(_)
                | Self::Reject(_)
                | Self::ReviewList
                | Self::AddModerator { .. }
                | Self::RemoveModerator(_)
                | Self::ListModerators
        )
    }

    /// Commands that change catalog data and invalidate cached replies.
    pub fn mutates_catalog(&self) -> bool {
        matches!(
            self,
            Self::Teach(_)
                | Self::Approve(_)
                | Self::AddModerator { .. }
                | Self::RemoveModerator(_)
                | Self::Stock { quantity: Some(_), .. }
                | Self::Blacklist(_)
                | Self::Unblacklist(_)
                | Self::Reload
        )
    }
}

/// Exact-match customer commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemCommand {
    Menu,
    ProductList,
    Promo,
    Limit,
    Greeting,
    Thanks,
    Claim { order_id: String, complaint: String },
}

const GREETINGS: &[&str] = &[
    "halo", "hallo", "hai", "hi", "hello", "hey", "assalamualaikum", "permisi", "pagi",
    "selamat pagi", "siang", "selamat siang", "sore", "selamat sore", "malam", "selamat malam",
    "halo kak", "hai kak", "min", "halo min",
];

const THANKS: &[&str] = &["makasih", "makasih kak", "terima kasih", "terimakasih", "thanks", "thank you", "tq"];

pub fn parse_law(text: &str) -> Option<LawCommand> {
    Some(match normalize(text).as_str() {
        "law status" | "status law" => LawCommand::Status,
        "emergency stop" => LawCommand::EmergencyStop,
        "emergency resume" => LawCommand::EmergencyResume,
        "law enable" => LawCommand::Enable,
        "law disable" => LawCommand::Disable,
        "law violations" | "law log" => LawCommand::Violations,
        _ => return None,
    })
}

pub fn parse_ops(text: &str) -> Option<OpsCommand> {
    Some(match normalize(text).as_str() {
        "dashboard" => OpsCommand::Dashboard,
        "analytics" | "analitik" => OpsCommand::Analytics,
        "performance" | "performa" => OpsCommand::Performance,
        "security" | "security status" => OpsCommand::Security,
        "monitoring" | "health" => OpsCommand::Monitoring,
        "cleanup" => OpsCommand::Cleanup,
        "backup create" | "backup" => OpsCommand::BackupCreate,
        "backup list" => OpsCommand::BackupList,
        "attendance" | "absensi" => OpsCommand::Attendance,
        _ => return None,
    })
}

pub fn parse_learning(text: &str) -> Option<LearningCommand> {
    Some(match normalize(text).as_str() {
        "learning stats" | "learning status" => LearningCommand::Stats,
        "learning reset" => LearningCommand::Reset,
        "learning help" => LearningCommand::Help,
        _ => return None,
    })
}

pub fn parse_admin(text: &str) -> Option<AdminCommand> {
    if let Some(taught) = teaching::parse(text) {
        return Some(AdminCommand::Teach(taught));
    }
    if let Some(add) = parse_add_moderator(text) {
        return Some(add);
    }
    let norm = normalize(text);
    let words: Vec<&str> = norm.split(' ').collect();
    match words.as_slice() {
        ["approve", n] => n.parse().ok().map(AdminCommand::Approve),
        ["reject", n] => n.parse().ok().map(AdminCommand::Reject),
        ["review", "list"] | ["review"] => Some(AdminCommand::ReviewList),
        ["hapus", "mod", number] => Some(AdminCommand::RemoveModerator(normalize_number(number).to_owned())),
        ["list", "mod"] => Some(AdminCommand::ListModerators),
        ["stok", rest @ ..] if !rest.is_empty() => {
            let (product, quantity) = match rest.split_last() {
                Some((last, head)) if !head.is_empty() && last.parse::<u32>().is_ok() => {
                    (head.join(" "), last.parse().ok())
                }
                _ => (rest.join(" "), None),
            };
            Some(AdminCommand::Stock { product, quantity })
        }
        ["blacklist", number] => Some(AdminCommand::Blacklist((*number).to_owned())),
        ["unblacklist", number] => Some(AdminCommand::Unblacklist((*number).to_owned())),
        ["reload"] => Some(AdminCommand::Reload),
        ["absen", "masuk"] => Some(AdminCommand::CheckIn),
        ["absen", "keluar"] => Some(AdminCommand::CheckOut),
        _ => None,
    }
}

/// `tambah mod <nomor> <nama>`. The name keeps the owner's spelling.
fn parse_add_moderator(text: &str) -> Option<AdminCommand> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let [verb, noun, number, name @ ..] = words.as_slice() else { return None };
    if normalize(verb) != "tambah" || normalize(noun) != "mod" || name.is_empty() {
        return None;
    }
    let number: String = normalize_number(number).chars().filter(char::is_ascii_digit).collect();
    if number.is_empty() {
        return None;
    }
    Some(AdminCommand::AddModerator { number, name: name.join(" ") })
}

/// `klaim <order-id> <keluhan>`. Order id and complaint are stored as typed.
fn parse_claim(text: &str) -> Option<SystemCommand> {
    let mut words = text.trim().splitn(2, char::is_whitespace);
    if normalize(words.next()?) != "klaim" {
        return None;
    }
    let mut rest = words.next().unwrap_or_default().trim().splitn(2, char::is_whitespace);
    let order_id = rest.next().unwrap_or_default().trim_end_matches([',', ';', ':', '.']).to_owned();
    let complaint = rest.next().unwrap_or_default().trim().to_owned();
    Some(SystemCommand::Claim { order_id, complaint })
}

pub fn parse_system(text: &str) -> Option<SystemCommand> {
    if let Some(claim) = parse_claim(text) {
        return Some(claim);
    }
    let norm = normalize(text);
    Some(match norm.as_str() {
        "menu" | "help" | "bantuan" | "start" => SystemCommand::Menu,
        "produk" | "list produk" | "pricelist" | "katalog" => SystemCommand::ProductList,
        "promo" => SystemCommand::Promo,
        "limit" | "cek limit" => SystemCommand::Limit,
        g if GREETINGS.contains(&g) => SystemCommand::Greeting,
        t if THANKS.contains(&t) => SystemCommand::Thanks,
        _ => return None,
    })
}
