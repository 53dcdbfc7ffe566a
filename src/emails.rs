//! Packing of the multi-valued email field into its single storage slot.

use crate::fields::{Field, MAX_EMAILS};
use crate::record::Record;

pub const DELIMITER: char = ',';
pub const PLACEHOLDER: char = '_';

pub type EmailBundle = [String; MAX_EMAILS];

/// Split the record's email slot into `MAX_EMAILS` addresses.
///
/// Unused slots are empty strings. Addresses past the last slot are dropped.
pub fn decode_emails(record: &Record) -> EmailBundle {
    decode_str(record.get(Field::Email).unwrap_or_default())
}

pub fn decode_str(stored: &str) -> EmailBundle {
    let mut bundle = EmailBundle::default();
    let parts = stored
        .split(DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty());
    for (slot, part) in bundle.iter_mut().zip(parts) {
        *slot = part.to_string();
    }
    bundle
}

/// Join the non-blank addresses in order, trimmed. Gaps collapse.
pub fn encode_emails<S: AsRef<str>>(addresses: &[S]) -> String {
    let mut out = String::new();
    let addresses = addresses
        .iter()
        .map(|a| a.as_ref().trim())
        .filter(|a| !a.is_empty());
    for address in addresses {
        if !out.is_empty() {
            out.push(DELIMITER);
        }
        out.push_str(address);
    }
    out
}

/// Replace delimiters inside a single address so it stays one address.
pub fn sanitize_address(text: &str) -> String {
    text.replace(DELIMITER, &PLACEHOLDER.to_string())
}

/// Number of non-blank addresses in storage, including any past `MAX_EMAILS`.
pub fn address_count(record: &Record) -> usize {
    record.get(Field::Email).map_or(0, |stored| {
        stored
            .split(DELIMITER)
            .filter(|part| !part.trim().is_empty())
            .count()
    })
}

pub fn first_email(record: &Record) -> Option<&str> {
    record
        .get(Field::Email)?
        .split(DELIMITER)
        .map(str::trim)
        .find(|part| !part.is_empty())
}

/// Rotate the stored list left by one: the first address moves to the end.
///
/// Returns false when there is nothing to rotate (zero or one address).
pub fn roll_emails(record: &mut Record) -> bool {
    if address_count(record) < 2 {
        return false;
    }
    let Some(stored) = record.get(Field::Email) else {
        return false;
    };
    let Some((head, tail)) = stored.split_once(DELIMITER) else {
        return false;
    };
    let rolled = format!("{tail}{DELIMITER}{head}");
    record.set(Field::Email, Some(rolled));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_emails(stored: &str) -> Record {
        let mut record = Record::with_name("Test");
        record.set(Field::Email, Some(stored.to_string()));
        record
    }

    #[test]
    fn test_decode_fills_missing_slots_with_empty() {
        let record = record_with_emails("a@x,b@y");
        let bundle = decode_emails(&record);
        assert_eq!(bundle, ["a@x", "b@y", "", ""].map(String::from));
    }

    #[test]
    fn test_decode_absent_slot() {
        let bundle = decode_emails(&Record::with_name("Nobody"));
        assert!(bundle.iter().all(String::is_empty));
    }

    #[test]
    fn test_encode_collapses_gaps() {
        assert_eq!(encode_emails(&["a@x", "", "c@z", "", ""]), "a@x,c@z");
        assert_eq!(encode_emails(&["", "", ""]), "");
        assert_eq!(encode_emails::<&str>(&[]), "");
    }

    #[test]
    fn test_edit_into_gap_keeps_relative_order() {
        let mut bundle = ["a@x", "", "c@z", "", ""].map(String::from);
        bundle[3] = "d@w".to_string();
        assert_eq!(encode_emails(&bundle), "a@x,c@z,d@w");
    }

    #[test]
    fn test_round_trip_keeps_non_empty_addresses() {
        let bundle = ["", "one@example.com", "", "two@example.com"];
        let decoded = decode_str(&encode_emails(&bundle));
        assert_eq!(
            decoded,
            ["one@example.com", "two@example.com", "", ""].map(String::from)
        );
    }

    #[test]
    fn test_sanitized_address_decodes_as_one() {
        let sanitized = sanitize_address("weird,name@example.com");
        assert_eq!(sanitized, "weird_name@example.com");
        let stored = encode_emails(&["a@x".to_string(), sanitized.clone()]);
        let decoded = decode_str(&stored);
        assert_eq!(decoded[1], sanitized);
        assert!(decoded[2].is_empty());
    }

    #[test]
    fn test_blank_addresses_are_not_stored() {
        assert_eq!(encode_emails(&["a@x", "   ", " b@y "]), "a@x,b@y");
        assert_eq!(encode_emails(&["  ", "\t"]), "");

        let bundle = ["a@x", "   ", "", ""];
        assert_eq!(decode_str(&encode_emails(&bundle)), ["a@x", "", "", ""].map(String::from));
    }

    #[test]
    fn test_roll_ignores_blank_parts() {
        let mut record = record_with_emails("a@x,   ");
        assert_eq!(address_count(&record), 1);
        assert!(!roll_emails(&mut record));
        assert_eq!(record.get(Field::Email), Some("a@x,   "));
    }

    #[test]
    fn test_address_count_sees_overflow() {
        let record = record_with_emails("a@x,b@y,c@z,d@w,e@v");
        assert_eq!(address_count(&record), 5);
        assert_eq!(address_count(&Record::with_name("Nobody")), 0);
    }

    #[test]
    fn test_roll_rotates_left() {
        let mut record = record_with_emails("a@x,b@y,c@z");
        assert!(roll_emails(&mut record));
        assert_eq!(record.get(Field::Email), Some("b@y,c@z,a@x"));
    }

    #[test]
    fn test_roll_single_or_absent_is_noop() {
        let mut single = record_with_emails("a@x");
        assert!(!roll_emails(&mut single));
        assert_eq!(single.get(Field::Email), Some("a@x"));

        let mut none = Record::with_name("Nobody");
        assert!(!roll_emails(&mut none));
        assert_eq!(none.get(Field::Email), None);
    }

    #[test]
    fn test_first_email() {
        assert_eq!(first_email(&record_with_emails("a@x,b@y")), Some("a@x"));
        assert_eq!(first_email(&Record::with_name("Nobody")), None);
    }
}
