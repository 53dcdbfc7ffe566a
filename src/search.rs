use deunicode::deunicode;

/// Normalize a string for matching.
/// Applies transliteration and lowercase (e.g., "Renée" -> "renee").
pub fn normalize(s: &str) -> String {
    deunicode(s).to_lowercase()
}

pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Renée DURAND"), "renee durand");
        assert_eq!(normalize_query("  Ada "), Some("ada".to_string()));
        assert_eq!(normalize_query("   "), None);
    }
}
