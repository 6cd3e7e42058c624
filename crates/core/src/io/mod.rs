//! Transport seam. A WhatsApp client (or the console) feeds inbound events in
//! and drains outbound messages.

pub mod input;
pub mod output;
