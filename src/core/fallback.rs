//! Address fallback cascade.
//!
//! Referral addresses come out of document extraction and are often noisy:
//! unit numbers the geocoder does not know, misspelled streets, missing
//! commas. When the full address fails we retry with progressively coarser
//! queries, ending with just the zip code.

use regex::Regex;
use std::sync::LazyLock;

/// Apartment / unit / suite designators followed by a unit identifier.
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(apt|apartment|unit|suite|ste|#)\s*[a-z0-9]+\b").expect("valid regex")
});

/// `", City, ST 12345"` with optional zip and optional comma before the state.
static CITY_STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r",\s*([^,]+),?\s*([A-Z]{2})\s*(\d{5}(?:-\d{4})?)?").expect("valid regex")
});

/// Two-letter state code directly followed by a zip.
static STATE_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2})\s*(\d{5}(?:-\d{4})?)").expect("valid regex"));

/// Standalone 5 or 9 digit zip.
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5}(?:-\d{4})?)\b").expect("valid regex"));

/// A trimmed address and the ordered queries to try for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub address: String,
    pub candidates: Vec<String>,
}

impl AddressQuery {
    /// Returns `None` for empty or whitespace-only input
    pub fn parse(raw: &str) -> Option<Self> {
        let address = raw.trim();
        if address.is_empty() {
            return None;
        }

        Some(Self {
            address: address.to_string(),
            candidates: fallback_candidates(address),
        })
    }
}

/// Build the fallback cascade for an address
///
/// Order: original, unit-stripped, "City, ST zip", "City, ST", "ST zip",
/// bare zip. Blank and repeated entries are dropped, first occurrence wins.
pub fn fallback_candidates(address: &str) -> Vec<String> {
    let mut candidates = vec![address.to_string()];

    let without_unit = strip_unit(address);
    if without_unit != address {
        candidates.push(without_unit);
    }

    if let Some(caps) = CITY_STATE_ZIP_RE.captures(address) {
        let city = caps[1].trim();
        let state = caps[2].trim();

        if let Some(zip) = caps.get(3) {
            candidates.push(format!("{}, {} {}", city, state, zip.as_str()));
        }
        candidates.push(format!("{}, {}", city, state));
    }

    if let Some(caps) = STATE_ZIP_RE.captures(address) {
        candidates.push(format!("{} {}", &caps[1], &caps[2]));
    }

    if let Some(caps) = ZIP_RE.captures(address) {
        candidates.push(caps[1].to_string());
    }

    dedup_candidates(candidates)
}

/// Remove apartment/unit designators from an address
pub fn strip_unit(address: &str) -> String {
    UNIT_RE.replace_all(address, "").trim().to_string()
}

fn dedup_candidates(candidates: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() || unique.iter().any(|seen| seen == candidate) {
            continue;
        }
        unique.push(candidate.to_string());
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cascade_order() {
        let candidates = fallback_candidates("123 Apt 4B Main St, Springfield, IL 62704");

        assert_eq!(
            candidates,
            vec![
                "123 Apt 4B Main St, Springfield, IL 62704",
                "123 Main St, Springfield, IL 62704",
                "Springfield, IL 62704",
                "Springfield, IL",
                "IL 62704",
                "62704",
            ]
        );
    }

    #[test]
    fn test_unit_tokens_stripped() {
        assert_eq!(strip_unit("500 Oak Ave Suite 210, Peoria, IL"), "500 Oak Ave, Peoria, IL");
        assert_eq!(strip_unit("500 Oak Ave # 7, Peoria, IL"), "500 Oak Ave, Peoria, IL");
        assert_eq!(strip_unit("500 Oak Ave UNIT 3c, Peoria, IL"), "500 Oak Ave, Peoria, IL");
        assert_eq!(strip_unit("500 Oak Ave, Peoria, IL"), "500 Oak Ave, Peoria, IL");
    }

    #[test]
    fn test_no_unit_no_duplicate() {
        let candidates = fallback_candidates("77 Elm St, Austin, TX 78701-1234");

        assert_eq!(
            candidates,
            vec![
                "77 Elm St, Austin, TX 78701-1234",
                "Austin, TX 78701-1234",
                "Austin, TX",
                "TX 78701-1234",
                "78701-1234",
            ]
        );
    }

    #[test]
    fn test_city_state_without_zip() {
        let candidates = fallback_candidates("9 Pine Rd, Boise, ID");

        assert_eq!(candidates, vec!["9 Pine Rd, Boise, ID", "Boise, ID"]);
    }

    #[test]
    fn test_unstructured_address_only_original() {
        assert_eq!(fallback_candidates("somewhere rural"), vec!["somewhere rural"]);
    }

    #[test]
    fn test_bare_zip_collapses() {
        assert_eq!(fallback_candidates("62704"), vec!["62704"]);
    }

    #[test]
    fn test_address_query_rejects_blank() {
        assert!(AddressQuery::parse("").is_none());
        assert!(AddressQuery::parse("   \t").is_none());

        let query = AddressQuery::parse("  9 Pine Rd, Boise, ID  ").unwrap();
        assert_eq!(query.address, "9 Pine Rd, Boise, ID");
        assert_eq!(query.candidates[0], "9 Pine Rd, Boise, ID");
    }
}
