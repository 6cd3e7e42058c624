use tokio::sync::mpsc;

use crate::router::BotReply;

/// One `sendMessage(chatId, {text}, {quoted})` call for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub text: String,
    pub quoted: bool,
}

impl OutboundMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { chat_id: chat_id.into(), text: text.into(), quoted: false }
    }
}

impl From<BotReply> for OutboundMessage {
    fn from(reply: BotReply) -> Self {
        Self { chat_id: reply.chat_id, text: reply.text, quoted: reply.quoted }
    }
}

/// Output channel sender; the runtime pushes replies here.
pub type OutputSender = mpsc::Sender<OutboundMessage>;
/// Output channel receiver; the transport consumes from here.
pub type OutputReceiver = mpsc::Receiver<OutboundMessage>;

/// Create an output channel with the given buffer size.
pub fn channel(buffer: usize) -> (OutputSender, OutputReceiver) {
    mpsc::channel(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteKind;

    #[test]
    fn reply_converts_without_metadata() {
        let reply = BotReply {
            chat_id: "62811@s.whatsapp.net".into(),
            text: "halo".into(),
            quoted: true,
            route: Some(RouteKind::System),
            cached: false,
            blocked: None,
        };
        let out = OutboundMessage::from(reply);
        assert_eq!(out, OutboundMessage { chat_id: "62811@s.whatsapp.net".into(), text: "halo".into(), quoted: true });
    }

    #[tokio::test]
    async fn channel_send_recv() {
        let (tx, mut rx) = channel(4);
        tx.send(OutboundMessage::new("1", "test")).await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.text, "test");
        assert!(!msg.quoted);
    }
}
