//! Decklist normalization: three raw submission shapes → one ordered
//! [`Decklist`].
//!
//! The three shapes are wildly heterogeneous — a newline-delimited `.ydk`
//! file, a base64 `ydke://` deck token, and a JSON card list with
//! quantities — but everything downstream only understands one thing: an
//! ordered sequence of canonical decimal identifiers. Normalizing at the
//! boundary keeps the resolver and layout engine free of format knowledge.
//!
//! Order is preserved and duplicates are kept: each duplicate entry is a
//! distinct slot on the printed sheet.

use crate::error::ProxyError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

/// URL scheme carried by deck tokens. Auto-prepended when the caller pasted
/// a bare payload.
const TOKEN_SCHEME: &str = "ydke://";

/// One deck slot: the canonical identifier plus the form the user submitted.
///
/// `original` is kept so resolution failures can be reported in the user's
/// own terms (`"0012345"` rather than `"12345"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    /// Canonical identifier: decimal digits, leading zeros stripped.
    pub id: String,
    /// The pre-normalization form.
    pub original: String,
}

impl DeckEntry {
    fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let id = strip_leading_zeros(&original).to_string();
        Self { id, original }
    }
}

/// An ordered, duplicate-preserving sequence of card identifiers for one
/// job.
///
/// Immutable once produced, and a per-job value — never shared across jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decklist {
    entries: Vec<DeckEntry>,
}

impl Decklist {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DeckEntry] {
        &self.entries
    }

    /// Canonical identifiers in deck order, duplicates included.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }
}

/// Strip leading `'0'` characters from an identifier.
///
/// Iterative by construction — an all-zero identifier trims to the empty
/// string without recursing, however long the input.
pub fn strip_leading_zeros(s: &str) -> &str {
    s.trim_start_matches('0')
}

/// Normalize the raw text of a `.ydk` decklist file.
///
/// A line is dropped (not an error) when it contains `#` or `!` — comment
/// and section markers in the deck format — or is shorter than 4 characters
/// after trimming. Surviving lines are trimmed and zero-stripped.
pub fn from_list_file(contents: &str) -> Decklist {
    let entries: Vec<DeckEntry> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.contains('#') && !line.contains('!') && line.len() >= 4)
        .map(DeckEntry::new)
        .collect();

    debug!("Normalized list file → {} entries", entries.len());
    Decklist { entries }
}

/// Normalize an encoded deck token.
///
/// Token layout: `ydke://<main>!<extra>!<side>!` — three base64 groups, each
/// a little-endian `u32` passcode array. Groups are concatenated in order.
/// The scheme prefix is optional on input; a trailing partial chunk inside
/// a group is ignored.
pub fn from_token(token: &str) -> Result<Decklist, ProxyError> {
    let token = token.trim();
    let payload = token.strip_prefix(TOKEN_SCHEME).unwrap_or(token);

    let groups: Vec<&str> = payload.split('!').collect();
    if groups.len() < 3 {
        return Err(ProxyError::InvalidFormat(format!(
            "deck token must contain main, extra, and side groups, found {}",
            groups.len()
        )));
    }

    let mut entries = Vec::new();
    for group in &groups[..3] {
        let bytes = STANDARD.decode(group).map_err(|e| {
            ProxyError::InvalidFormat(format!("undecodable deck token group: {e}"))
        })?;
        for chunk in bytes.chunks_exact(4) {
            let passcode = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            entries.push(DeckEntry::new(passcode.to_string()));
        }
    }

    debug!("Normalized deck token → {} entries", entries.len());
    Ok(Decklist { entries })
}

/// Normalize a JSON card list: an array of `{id, quantity}` objects, or a
/// JSON string wrapping such an array (form fields often double-encode).
///
/// `id` may be a JSON number or string; an entry without a usable id rejects
/// the whole payload. `quantity` must be a positive integer and defaults to
/// 1 when missing or invalid — never silently to zero.
pub fn from_card_list(payload: &str) -> Result<Decklist, ProxyError> {
    let value: Value = serde_json::from_str(payload.trim())
        .map_err(|e| ProxyError::InvalidFormat(format!("invalid JSON: {e}")))?;

    // Unwrap one level of string encoding if present.
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| ProxyError::InvalidFormat(format!("invalid JSON: {e}")))?,
        v => v,
    };

    let Value::Array(items) = value else {
        return Err(ProxyError::InvalidFormat(
            "card list must be a JSON array".to_string(),
        ));
    };

    let mut entries = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            ProxyError::InvalidFormat(format!("card list entry {i} is not an object"))
        })?;

        let original = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ProxyError::InvalidFormat(format!(
                    "card list entry {i} has no usable id"
                )))
            }
        };

        let quantity = obj
            .get("quantity")
            .and_then(Value::as_u64)
            .filter(|&q| q >= 1)
            .unwrap_or(1);

        for _ in 0..quantity {
            entries.push(DeckEntry::new(original.clone()));
        }
    }

    debug!("Normalized card list → {} entries", entries.len());
    Ok(Decklist { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(main: &[u32], extra: &[u32], side: &[u32]) -> String {
        let enc = |ids: &[u32]| {
            let bytes: Vec<u8> = ids.iter().flat_map(|id| id.to_le_bytes()).collect();
            STANDARD.encode(bytes)
        };
        format!("ydke://{}!{}!{}!", enc(main), enc(extra), enc(side))
    }

    #[test]
    fn strip_is_iterative_and_idempotent() {
        assert_eq!(strip_leading_zeros("00123"), "123");
        assert_eq!(strip_leading_zeros(strip_leading_zeros("00123")), "123");
        assert_eq!(strip_leading_zeros("123"), "123");
        assert_eq!(strip_leading_zeros("0000"), "");
        // Pathological input must not blow the stack.
        let zeros = "0".repeat(100_000);
        assert_eq!(strip_leading_zeros(&zeros), "");
    }

    #[test]
    fn list_file_drops_comments_and_short_lines() {
        // Scenario: comment line dropped, leading zeros stripped.
        let deck = from_list_file("12345678\n#comment\n0098765432\n");
        let ids: Vec<&str> = deck.ids().collect();
        assert_eq!(ids, vec!["12345678", "98765432"]);
        assert_eq!(deck.entries()[1].original, "0098765432");
    }

    #[test]
    fn list_file_drops_section_markers_and_trims() {
        let deck = from_list_file("#main\n!side\n  46986414  \nab\n\n");
        let ids: Vec<&str> = deck.ids().collect();
        assert_eq!(ids, vec!["46986414"]);
    }

    #[test]
    fn list_file_preserves_order_and_duplicates() {
        let deck = from_list_file("1111\n2222\n1111\n");
        let ids: Vec<&str> = deck.ids().collect();
        assert_eq!(ids, vec!["1111", "2222", "1111"]);
    }

    #[test]
    fn token_concatenates_groups_in_order() {
        let token = make_token(&[46986414, 89631139], &[44508094], &[32807846]);
        let deck = from_token(&token).unwrap();
        let ids: Vec<&str> = deck.ids().collect();
        assert_eq!(ids, vec!["46986414", "89631139", "44508094", "32807846"]);
    }

    #[test]
    fn token_scheme_is_optional() {
        let token = make_token(&[46986414], &[], &[]);
        let bare = token.strip_prefix("ydke://").unwrap();
        assert_eq!(from_token(bare).unwrap(), from_token(&token).unwrap());
    }

    #[test]
    fn token_ignores_trailing_partial_chunk() {
        let mut bytes: Vec<u8> = 46986414u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0x01, 0x02]); // dangling half-passcode
        let token = format!("ydke://{}!!!", STANDARD.encode(bytes));
        let deck = from_token(&token).unwrap();
        assert_eq!(deck.ids().collect::<Vec<_>>(), vec!["46986414"]);
    }

    #[test]
    fn token_with_missing_groups_is_rejected() {
        let err = from_token("ydke://AAAA").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidFormat(_)));
    }

    #[test]
    fn token_with_bad_base64_is_rejected() {
        let err = from_token("ydke://%%%!!!").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidFormat(_)));
    }

    #[test]
    fn card_list_expands_quantities_in_order() {
        // Scenario: [{id:111,quantity:2},{id:222,quantity:1}] → 111,111,222
        let deck = from_card_list(r#"[{"id":111,"quantity":2},{"id":222,"quantity":1}]"#).unwrap();
        assert_eq!(deck.ids().collect::<Vec<_>>(), vec!["111", "111", "222"]);
    }

    #[test]
    fn card_list_accepts_string_ids_and_strips_zeros() {
        let deck = from_card_list(r#"[{"id":"00123"}]"#).unwrap();
        assert_eq!(deck.ids().collect::<Vec<_>>(), vec!["123"]);
        assert_eq!(deck.entries()[0].original, "00123");
    }

    #[test]
    fn card_list_defaults_invalid_quantity_to_one() {
        for payload in [
            r#"[{"id":111}]"#,
            r#"[{"id":111,"quantity":0}]"#,
            r#"[{"id":111,"quantity":-2}]"#,
            r#"[{"id":111,"quantity":1.5}]"#,
            r#"[{"id":111,"quantity":"3"}]"#,
        ] {
            let deck = from_card_list(payload).unwrap();
            assert_eq!(deck.len(), 1, "payload: {payload}");
        }
    }

    #[test]
    fn card_list_unwraps_double_encoded_strings() {
        let deck = from_card_list(r#""[{\"id\":111}]""#).unwrap();
        assert_eq!(deck.ids().collect::<Vec<_>>(), vec!["111"]);
    }

    #[test]
    fn card_list_rejects_bad_shapes() {
        assert!(matches!(
            from_card_list("not json"),
            Err(ProxyError::InvalidFormat(_))
        ));
        assert!(matches!(
            from_card_list(r#"{"id":111}"#),
            Err(ProxyError::InvalidFormat(_))
        ));
        assert!(matches!(
            from_card_list(r#"[{"quantity":2}]"#),
            Err(ProxyError::InvalidFormat(_))
        ));
        assert!(matches!(
            from_card_list("[42]"),
            Err(ProxyError::InvalidFormat(_))
        ));
    }
}
