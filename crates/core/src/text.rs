//! Normalization applied to categorical fields and to filter selections.

/// Title-case a value the way the export's categorical columns are
/// normalized: a letter following a non-letter is uppercased, every other
/// letter is lowercased. The result is trimmed.
///
/// `"paid search - generic"` becomes `"Paid Search - Generic"`, and `"UK"`
/// becomes `"Uk"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out.trim().to_string()
}

/// Clean a categorical cell. Blank cells are missing.
pub fn clean_category(value: &str) -> Option<String> {
    let cleaned = title_case(value);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_channel_names() {
        assert_eq!(title_case("paid search - generic"), "Paid Search - Generic");
        assert_eq!(title_case("PAID SOCIAL"), "Paid Social");
        assert_eq!(title_case("  performance max "), "Performance Max");
    }

    #[test]
    fn test_title_case_after_digits_and_apostrophes() {
        assert_eq!(title_case("UK"), "Uk");
        assert_eq!(title_case("3rd party"), "3Rd Party");
        assert_eq!(title_case("o'neill"), "O'Neill");
    }

    #[test]
    fn test_clean_category_blank_is_missing() {
        assert_eq!(clean_category("   "), None);
        assert_eq!(clean_category(""), None);
        assert_eq!(clean_category(" email"), Some("Email".to_string()));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("UK, US,,"), vec!["UK", "US"]);
        assert!(split_list("").is_empty());
    }
}
