//! Stream messages and the source interface.

use std::future::Future;

/// One message as delivered by the stream: where it came from and its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A stream of `(topic, payload)` messages.
///
/// Implementations must be cancel-safe: the consumer loop races
/// `next_message` against its shutdown signal.
pub trait MessageSource: Send {
    /// Next message, or `None` once the stream has ended.
    fn next_message(&mut self) -> impl Future<Output = anyhow::Result<Option<Message>>> + Send;
}
