use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::BotCfg;

/// Handler errors per message above which the bot is degraded.
const MAX_ERROR_RATE: f64 = 0.2;
/// Consecutive model failures before alerting.
const MAX_LLM_FAILURES: u32 = 3;

/// Inputs sampled from the router for one health evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthInputs {
    pub handled: u64,
    pub error_rate: f64,
    pub average_ms: f64,
    pub consecutive_llm_failures: u32,
    pub emergency_stop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    HighErrorRate,
    LlmFailing,
    SlowResponses,
    EmergencyStop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub at: DateTime<Utc>,
    pub inputs: HealthInputs,
    pub alerts: Vec<Alert>,
}

impl HealthReport {
    pub fn healthy(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Periodic health evaluation. Only alerts that were not already active in
/// the previous evaluation are returned for delivery.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    last: Option<HealthReport>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, inputs: HealthInputs, cfg: &BotCfg) -> Vec<Alert> {
        let mut alerts = Vec::new();
        // A handful of messages says nothing about the rate.
        if inputs.handled >= 10 && inputs.error_rate > MAX_ERROR_RATE {
            alerts.push(Alert {
                kind: AlertKind::HighErrorRate,
                message: format!("⚠️ Error handler tinggi: {:.0}% pesan gagal diproses", inputs.error_rate * 100.0),
            });
        }
        if inputs.consecutive_llm_failures >= MAX_LLM_FAILURES {
            alerts.push(Alert {
                kind: AlertKind::LlmFailing,
                message: format!("⚠️ Layanan AI gagal {} kali berturut-turut", inputs.consecutive_llm_failures),
            });
        }
        if inputs.handled > 0 && inputs.average_ms > cfg.slow_response_ms as f64 {
            alerts.push(Alert {
                kind: AlertKind::SlowResponses,
                message: format!("⚠️ Rata-rata respon lambat: {:.0} ms", inputs.average_ms),
            });
        }
        if inputs.emergency_stop {
            alerts.push(Alert {
                kind: AlertKind::EmergencyStop,
                message: "⚠️ Emergency stop masih aktif".into(),
            });
        }

        let fresh: Vec<Alert> = alerts
            .iter()
            .filter(|a| !self.last.as_ref().is_some_and(|r| r.alerts.iter().any(|p| p.kind == a.kind)))
            .cloned()
            .collect();
        if !alerts.is_empty() {
            tracing::warn!(alerts = alerts.len(), new = fresh.len(), "health check degraded");
        }
        self.last = Some(HealthReport { at: Utc::now(), inputs, alerts });
        fresh
    }

    pub fn last(&self) -> Option<&HealthReport> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_inputs_raise_nothing() {
        let mut m = HealthMonitor::new();
        let alerts = m.evaluate(HealthInputs { handled: 50, average_ms: 120.0, ..Default::default() }, &BotCfg::default());
        assert!(alerts.is_empty());
        assert!(m.last().unwrap().healthy());
    }

    #[test]
    fn alerts_fire_once_while_condition_persists() {
        let mut m = HealthMonitor::new();
        let cfg = BotCfg::default();
        let bad = HealthInputs { consecutive_llm_failures: 4, emergency_stop: true, ..Default::default() };
        let first = m.evaluate(bad, &cfg);
        assert_eq!(first.len(), 2);
        assert!(m.evaluate(bad, &cfg).is_empty());
        assert!(!m.last().unwrap().healthy());

        m.evaluate(HealthInputs::default(), &cfg);
        assert_eq!(m.evaluate(bad, &cfg).len(), 2);
    }

    #[test]
    fn error_rate_needs_volume() {
        let mut m = HealthMonitor::new();
        let cfg = BotCfg::default();
        let few = HealthInputs { handled: 3, error_rate: 1.0, ..Default::default() };
        assert!(m.evaluate(few, &cfg).is_empty());
        let many = HealthInputs { handled: 20, error_rate: 0.5, ..Default::default() };
        assert_eq!(m.evaluate(many, &cfg)[0].kind, AlertKind::HighErrorRate);
    }
}
