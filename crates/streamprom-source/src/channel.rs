//! In-process source fed through an unbounded channel.
//!
//! Lets a broker client running elsewhere in the process hand messages to
//! the consumer loop. The channel is unbounded: inflow is not throttled here.

use tokio::sync::mpsc;

use crate::message::{Message, MessageSource};

pub type MessageSender = mpsc::UnboundedSender<Message>;

pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Message>,
}

/// Create a connected sender/source pair. The stream ends once every
/// sender has been dropped.
pub fn channel() -> (MessageSender, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx })
}

impl MessageSource for ChannelSource {
    async fn next_message(&mut self) -> anyhow::Result<Option<Message>> {
        Ok(self.rx.recv().await)
    }
}
