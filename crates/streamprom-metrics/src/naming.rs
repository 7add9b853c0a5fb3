//! Metric family name derivation.

/// Derive the family name for a record from its source topic and record name.
///
/// Dots become underscores in both parts, which are then joined with `_`.
/// An empty record name yields just the topic, and leading underscores are
/// dropped so the name never starts with `_`. Nothing else is sanitized.
pub fn derive_family_name(topic: &str, record_name: &str) -> String {
    let topic = topic.replace('.', "_");
    let name = record_name.replace('.', "_");

    let joined = if name.is_empty() {
        topic
    } else {
        format!("{topic}_{name}")
    };

    if joined.starts_with('_') {
        joined.trim_start_matches('_').to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_and_name_are_joined() {
        assert_eq!(derive_family_name("test.hoge", "foo"), "test_hoge_foo");
    }

    #[test]
    fn dots_in_record_name_are_replaced() {
        assert_eq!(derive_family_name("test.hoge", "test.foo"), "test_hoge_test_foo");
    }

    #[test]
    fn empty_record_name_yields_topic() {
        assert_eq!(derive_family_name("test.hoge", ""), "test_hoge");
    }

    #[test]
    fn empty_topic_has_no_leading_underscore() {
        assert_eq!(derive_family_name("", "foo.bar"), "foo_bar");
    }

    #[test]
    fn leading_dot_in_topic_is_stripped() {
        assert_eq!(derive_family_name(".internal", "foo"), "internal_foo");
    }

    #[test]
    fn all_leading_underscores_of_topic_are_stripped() {
        assert_eq!(derive_family_name("__consumer_offsets", "x"), "consumer_offsets_x");
        assert_eq!(derive_family_name("._.topic", "x"), "topic_x");
    }

    #[test]
    fn other_characters_pass_through() {
        assert_eq!(derive_family_name("app-1", "req:total"), "app-1_req:total");
    }

    #[test]
    fn both_empty_yields_empty() {
        assert_eq!(derive_family_name("", ""), "");
    }
}
