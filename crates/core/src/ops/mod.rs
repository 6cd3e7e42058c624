//! Peripheral managers. They observe, log and alert; none of them takes part
//! in the routing decision.

pub mod analytics;
pub mod attendance;
pub mod backup;
pub mod cleanup;
pub mod monitoring;
pub mod performance;
pub mod security;
