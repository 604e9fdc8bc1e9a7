//! Access-level evaluation against cached permission sets
//!
//! Maps the broker's numeric access codes onto the read/write pattern sets
//! carried by a cache entry. Unknown codes always deny.

use tracing::debug;

use crate::topics;

/// Access level requested by the broker for a topic operation.
///
/// The numeric values are the broker's wire codes and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AccessLevel {
    /// Read a message from a topic
    Read = 1,
    /// Publish a message to a topic
    Write = 2,
    /// Read and write the same topic
    ReadWrite = 3,
    /// Subscribe to a topic filter (evaluated like a read)
    Subscribe = 4,
}

impl AccessLevel {
    /// Decodes a broker access code, `None` for anything unrecognized.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::ReadWrite),
            4 => Some(Self::Subscribe),
            _ => None,
        }
    }
}

/// Tells whether `topic` matches any pattern in `patterns` after placeholder
/// substitution.
pub fn topic_in_list(patterns: &[String], topic: &str, username: &str, client_id: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| topics::matches_substituted(pattern, topic, username, client_id))
}

/// Evaluates a requested access level against the read/write pattern sets.
///
/// Read and Subscribe are satisfied by the read set, Write by the write set,
/// and ReadWrite needs a hit in both sets (not necessarily from the same
/// pattern).
pub fn evaluate(
    level: AccessLevel,
    read_patterns: &[String],
    write_patterns: &[String],
    topic: &str,
    username: &str,
    client_id: &str,
) -> bool {
    let allowed = match level {
        AccessLevel::Read | AccessLevel::Subscribe => {
            topic_in_list(read_patterns, topic, username, client_id)
        }
        AccessLevel::Write => topic_in_list(write_patterns, topic, username, client_id),
        AccessLevel::ReadWrite => {
            topic_in_list(read_patterns, topic, username, client_id)
                && topic_in_list(write_patterns, topic, username, client_id)
        }
    };

    debug!("ACL check for {:?} on {} was {}", level, topic, allowed);
    allowed
}
