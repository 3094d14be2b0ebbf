//! Tag normalization.
//!
//! Tags are trimmed, lowercased, runs of inner whitespace become a single `-`,
//! and only `[a-z0-9_-]` is allowed. Normalized tags are 1 to 32 characters.

use crate::error::ProtoError;

/// Maximum length of a normalized tag.
pub const MAX_TAG_LEN: usize = 32;

/// Normalizes a single tag.
///
/// # Errors
///
/// Returns an error if the tag is empty after normalization, contains a
/// forbidden character, or is longer than [`MAX_TAG_LEN`].
pub fn normalize_tag(raw: &str) -> Result<String, ProtoError> {
    let mut tag = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if pending_dash {
            tag.push('-');
            pending_dash = false;
        }
        for lower in c.to_lowercase() {
            if !(lower.is_ascii_alphanumeric() || lower == '-' || lower == '_') {
                return Err(ProtoError::InvalidTag(
                    raw.to_string(),
                    "only letters, digits, '-' and '_' are allowed",
                ));
            }
            tag.push(lower);
        }
    }

    if tag.is_empty() {
        return Err(ProtoError::InvalidTag(raw.to_string(), "tag is empty"));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(ProtoError::InvalidTag(raw.to_string(), "tag is longer than 32 characters"));
    }
    Ok(tag)
}

/// Normalizes a list of tags, dropping duplicates while keeping first occurrence order.
///
/// # Errors
///
/// Returns the first tag that fails [`normalize_tag`].
pub fn normalize_tags<I, S>(raw: I) -> Result<Vec<String>, ProtoError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        let tag = normalize_tag(tag.as_ref())?;
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("prod", "prod")]
    #[test_case("  Prod ", "prod")]
    #[test_case("Slack  Alerts", "slack-alerts")]
    #[test_case("team_A-1", "team_a-1")]
    fn normalizes(raw: &str, expected: &str) {
        assert_eq!(normalize_tag(raw).expect("valid"), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("a.b" ; "dot")]
    #[test_case("émoji🙂" ; "non ascii")]
    fn rejects(raw: &str) {
        assert!(normalize_tag(raw).is_err());
    }

    #[test]
    fn rejects_too_long() {
        let raw = "a".repeat(MAX_TAG_LEN + 1);
        assert!(normalize_tag(&raw).is_err());
        assert!(normalize_tag(&raw[..MAX_TAG_LEN]).is_ok());
    }

    #[test]
    fn dedupes_preserving_order() {
        let tags = normalize_tags(["B", "a", "b", " A "]).expect("valid");
        assert_eq!(tags, vec!["b", "a"]);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[A-Za-z0-9_ -]{1,24}") {
            if let Ok(once) = normalize_tag(&raw) {
                let twice = normalize_tag(&once).expect("normalized tag stays valid");
                prop_assert_eq!(once, twice);
            }
        }
    }
}
