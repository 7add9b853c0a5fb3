//! Line-oriented source: one message per line.
//!
//! Each line is either `topic<TAB>payload` or a bare payload, which is
//! attributed to the configured default topic. Blank lines are skipped.
//! Lines are handled as bytes; payloads reach the engine untouched, so a
//! line that is not valid UTF-8 is a bad record rather than a read error.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split, Stdin};

use crate::message::{Message, MessageSource};

pub struct LineSource<R> {
    lines: Split<R>,
    default_topic: String,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, default_topic: impl Into<String>) -> Self {
        Self {
            lines: reader.split(b'\n'),
            default_topic: default_topic.into(),
        }
    }
}

impl LineSource<BufReader<Stdin>> {
    pub fn stdin(default_topic: impl Into<String>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), default_topic)
    }
}

impl LineSource<BufReader<File>> {
    pub async fn open(path: &Path, default_topic: impl Into<String>) -> anyhow::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file), default_topic))
    }
}

impl<R: AsyncBufRead + Unpin + Send> MessageSource for LineSource<R> {
    async fn next_message(&mut self) -> anyhow::Result<Option<Message>> {
        while let Some(line) = self.lines.next_segment().await? {
            if let Some(message) = parse_line(&line, &self.default_topic) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

fn parse_line(line: &[u8], default_topic: &str) -> Option<Message> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.trim_ascii().is_empty() {
        return None;
    }

    match line.iter().position(|&b| b == b'\t') {
        // JSON payloads never start with a topic; a tab inside one is just whitespace.
        Some(tab) if !line[..tab].trim_ascii_start().starts_with(b"{") => {
            let topic = String::from_utf8_lossy(&line[..tab]);
            Some(Message::new(topic, &line[tab + 1..]))
        }
        _ => Some(Message::new(default_topic, line)),
    }
}
