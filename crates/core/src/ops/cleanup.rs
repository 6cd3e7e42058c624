use std::fmt;

/// Entries removed by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub cache_entries: usize,
    pub sessions: usize,
    pub security_senders: usize,
    pub quota_senders: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.cache_entries + self.sessions + self.security_senders + self.quota_senders
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🧹 Cleanup selesai\n• Cache: {}\n• Sesi: {}\n• Data keamanan: {}\n• Kuota harian: {}",
            self.cache_entries, self.sessions, self.security_senders, self.quota_senders
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_renders() {
        let r = CleanupReport { cache_entries: 2, sessions: 1, security_senders: 0, quota_senders: 3 };
        assert_eq!(r.total(), 6);
        assert!(r.to_string().contains("Cache: 2"));
    }
}
