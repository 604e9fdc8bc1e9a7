//! Hierarchical topic pattern matching
//!
//! Patterns are `/`-separated topic strings that may contain `+` (matches
//! exactly one segment), `#` (matches everything from its position onward),
//! and the placeholders `%u` (username) and `%c` (client identifier) which
//! are substituted before matching.

/// Tells whether `topic` matches `pattern`.
///
/// An exact string match always succeeds. Otherwise both sides are split on
/// `/` and walked segment by segment:
/// - `#` matches all remaining topic segments, including none. A `#` in a
///   non-final position also matches everything from there on; callers that
///   want strict trailing-wildcard semantics must validate their patterns
///   upstream.
/// - `+` matches any single segment.
/// - any other pattern segment must equal the topic segment literally.
///
/// A topic that is longer than the pattern does not match unless the next
/// pattern segment is `#`; a pattern that is longer than the topic never
/// matches.
pub fn matches(pattern: &str, topic: &str) -> bool {
    pattern == topic
        || matches_segments(
            &pattern.split('/').collect::<Vec<_>>(),
            &topic.split('/').collect::<Vec<_>>(),
        )
}

fn matches_segments(pattern: &[&str], topic: &[&str]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return topic.is_empty();
    };
    if topic.is_empty() {
        return *head == "#";
    }
    match *head {
        "#" => true,
        "+" => matches_segments(rest, &topic[1..]),
        literal if literal == topic[0] => matches_segments(rest, &topic[1..]),
        _ => false,
    }
}

/// Substitutes `%u` and `%c` placeholders in a pattern.
///
/// Substitution is a single left-to-right pass: placeholder values are
/// spliced in verbatim and never re-scanned, so a username containing `%c`
/// cannot smuggle a second substitution into the pattern. A `%` followed by
/// anything else passes through unchanged.
pub fn substitute(pattern: &str, username: &str, client_id: &str) -> String {
    if !pattern.contains('%') {
        return pattern.to_string();
    }

    let mut out = String::with_capacity(pattern.len() + username.len());
    let mut rest = pattern;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        match rest.as_bytes().get(idx + 1) {
            Some(b'u') => {
                out.push_str(username);
                rest = &rest[idx + 2..];
            }
            Some(b'c') => {
                out.push_str(client_id);
                rest = &rest[idx + 2..];
            }
            _ => {
                out.push('%');
                rest = &rest[idx + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Substitutes placeholders in `pattern`, then matches it against `topic`.
pub fn matches_substituted(pattern: &str, topic: &str, username: &str, client_id: &str) -> bool {
    matches(&substitute(pattern, username, client_id), topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_match() {
        assert!(matches("foo/bar", "foo/bar"));
        assert!(!matches("foo/bar", "foo/baz"));
        assert!(!matches("foo", "foo/bar"));
    }

    #[test]
    fn trailing_hash_matches_deeper_topics() {
        assert!(matches("foo/#", "foo/bar"));
        assert!(matches("foo/#", "foo/bar/baz"));
        assert!(matches("foo/#", "foo"));
        assert!(!matches("foo/#", "bar/baz"));
    }

    #[test]
    fn pattern_longer_than_topic_does_not_match() {
        assert!(!matches("foo/bar/baz", "foo/bar"));
    }

    #[test]
    fn plus_matches_exactly_one_segment() {
        assert!(matches("foo/+", "foo/bar"));
        assert!(matches("foo/+/baz", "foo/bar/baz"));
        assert!(!matches("foo/+/baz", "foo/bar/bar"));
        assert!(!matches("foo/+", "foo/bar/baz"));
        assert!(!matches("foo/+", "foo"));
    }

    #[test]
    fn hash_in_non_final_position_matches_everything_after() {
        // Intentional divergence from strict MQTT wildcard rules: any `#`
        // short-circuits to match all remaining segments.
        assert!(matches("foo/#/baz", "foo/bar/qux"));
        assert!(matches("foo/#/baz", "foo/anything"));
        assert!(!matches("foo/#/baz", "bar/anything"));
    }

    #[test]
    fn bare_hash_matches_all() {
        assert!(matches("#", "foo"));
        assert!(matches("#", "foo/bar/baz"));
    }

    #[test]
    fn username_placeholder() {
        assert!(matches_substituted("topic/%u", "topic/alice", "alice", "c1"));
        assert!(!matches_substituted("topic/%u", "topic/bob", "alice", "c1"));
    }

    #[test]
    fn client_id_placeholder() {
        assert!(matches_substituted("devices/%c/state", "devices/c1/state", "alice", "c1"));
        assert!(!matches_substituted("devices/%c/state", "devices/c2/state", "alice", "c1"));
    }

    #[test]
    fn unknown_escape_passes_through() {
        assert_eq!(substitute("foo/%x/bar", "alice", "c1"), "foo/%x/bar");
        assert_eq!(substitute("trailing/%", "alice", "c1"), "trailing/%");
    }

    #[test]
    fn substituted_value_is_not_rescanned() {
        // A username containing "%c" must not pick up the client id.
        assert_eq!(substitute("topic/%u", "%c", "c1"), "topic/%c");
    }

    proptest! {
        // Wildcard-free patterns match themselves and nothing else.
        #[test]
        fn literal_patterns_match_only_themselves(
            a in "[a-z]{1,8}(/[a-z]{1,8}){0,4}",
            b in "[a-z]{1,8}(/[a-z]{1,8}){0,4}",
        ) {
            prop_assert!(matches(&a, &a));
            prop_assert_eq!(matches(&a, &b), a == b);
        }

        // A trailing `#` matches any extension of its prefix.
        #[test]
        fn trailing_hash_matches_any_extension(
            prefix in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
            suffix in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        ) {
            let pattern = format!("{prefix}/#");
            let topic = format!("{prefix}/{suffix}");
            prop_assert!(matches(&pattern, &topic));
        }
    }
}
