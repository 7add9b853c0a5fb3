//! Topic subscription filter.

use regex::Regex;
use streamprom_core::{ConfigError, SourceSettings};

/// Decides which topics are ingested. Without a pattern, every topic is.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    pattern: Option<Regex>,
}

impl TopicFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern: Some(pattern),
        }
    }

    pub fn from_settings(settings: &SourceSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: settings.topic_regex()?,
        })
    }

    pub fn matches(&self, topic: &str) -> bool {
        self.pattern.as_ref().is_none_or(|re| re.is_match(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pattern_matches_everything() {
        let filter = TopicFilter::all();
        assert!(filter.matches("anything"));
        assert!(filter.matches(""));
    }

    #[test]
    fn pattern_restricts_topics() {
        let filter = TopicFilter::new(Regex::new(r"^metrics\.").unwrap());
        assert!(filter.matches("metrics.web"));
        assert!(!filter.matches("logs.web"));
    }

    #[test]
    fn from_settings_reads_pattern() {
        let settings = SourceSettings {
            topic_pattern: Some("^a$".into()),
            ..SourceSettings::default()
        };
        let filter = TopicFilter::from_settings(&settings).unwrap();
        assert!(filter.matches("a"));
        assert!(!filter.matches("ab"));
    }
}
