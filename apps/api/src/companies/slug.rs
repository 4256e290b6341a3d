use std::collections::HashSet;

const FALLBACK_SLUG: &str = "company";

/// Lowercase ASCII alphanumerics; every other run of characters becomes one `-`.
/// Names with no ASCII alphanumerics at all fall back to `company`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// First free slug among `base`, `base-2`, `base-3`, …
pub fn next_available(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp."), "acme-corp");
        assert_eq!(
            slugify("  Globex -- International  "),
            "globex-international"
        );
        assert_eq!(slugify("R&D Labs 2024"), "r-d-labs-2024");
    }

    #[test]
    fn test_slugify_non_ascii_fallback() {
        assert_eq!(slugify("株式会社"), "company");
        assert_eq!(slugify("株式会社 Bond"), "bond");
        assert_eq!(slugify(""), "company");
    }

    #[test]
    fn test_next_available_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(next_available("acme", &taken), "acme");
        taken.insert("acme".to_string());
        assert_eq!(next_available("acme", &taken), "acme-2");
        taken.insert("acme-2".to_string());
        taken.insert("acme-3".to_string());
        assert_eq!(next_available("acme", &taken), "acme-4");
    }
}
