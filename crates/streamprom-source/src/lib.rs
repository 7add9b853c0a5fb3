//! streamprom-source — where records come from.
//!
//! A [`MessageSource`] yields `(topic, payload)` messages; [`run_consumer`]
//! drives one source into a [`MetricsEngine`](streamprom_metrics::MetricsEngine),
//! applying the topic subscription filter.

pub mod channel;
pub mod consumer;
pub mod filter;
pub mod line;
pub mod message;

pub use channel::{ChannelSource, MessageSender, channel};
pub use consumer::{ConsumerReport, StopReason, run_consumer};
pub use filter::TopicFilter;
pub use line::LineSource;
pub use message::{Message, MessageSource};
