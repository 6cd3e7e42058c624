use tokio::sync::mpsc;

use crate::types::Message;

/// One transport event. WhatsApp delivers messages in batches.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub messages: Vec<Message>,
}

impl InboundEvent {
    pub fn single(message: Message) -> Self {
        Self { messages: vec![message] }
    }
}

/// Input channel sender; the transport pushes events here.
pub type InputSender = mpsc::Sender<InboundEvent>;
/// Input channel receiver; the runtime consumes from here.
pub type InputReceiver = mpsc::Receiver<InboundEvent>;

/// Create an input channel with the given buffer size.
pub fn channel(buffer: usize) -> (InputSender, InputReceiver) {
    mpsc::channel(buffer)
}

/// Submit one text message from `sender`.
pub async fn submit_text(
    tx: &InputSender,
    sender: impl Into<String>,
    text: impl Into<String>,
) -> Result<(), mpsc::error::SendError<InboundEvent>> {
    tx.send(InboundEvent::single(Message::text(sender, text))).await
}

/// Submit one image message; the caption may be empty.
pub async fn submit_image(
    tx: &InputSender,
    sender: impl Into<String>,
    caption: impl Into<String>,
) -> Result<(), mpsc::error::SendError<InboundEvent>> {
    tx.send(InboundEvent::single(Message::image(sender, caption))).await
}
