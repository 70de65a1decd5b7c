use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

fn nfkc_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_string()
}

/// Clean a skill list for storage.
///
/// Entries are NFKC-normalized and trimmed, blanks are dropped, and later
/// entries that differ only by case are removed. First-seen order and
/// spelling are kept.
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .map(|skill| nfkc_trim(skill))
        .filter(|skill| !skill.is_empty())
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .collect()
}

/// Trim an optional text field, mapping blank values to `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| nfkc_trim(&v))
        .filter(|v| !v.is_empty())
}
