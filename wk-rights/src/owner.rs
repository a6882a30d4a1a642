//! Matching parcel owners against water right holders by name.

use std::collections::BTreeSet;

fn terms(name: &str) -> BTreeSet<String> {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Cosine similarity of the word sets of two names, in `[0, 1]`.
///
/// 1 means the same words in any order, 0 no word in common. Returns 0
/// when either name has no words.
pub fn owner_holder_similarity(owner: &str, holder: &str) -> f64 {
    let owner = terms(owner);
    let holder = terms(holder);
    if owner.is_empty() || holder.is_empty() {
        return 0.0;
    }
    let shared = owner.intersection(&holder).count() as f64;
    shared / ((owner.len() as f64).sqrt() * (holder.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names_ignore_case_and_punctuation() {
        let s = owner_holder_similarity("SMITH, JOHN", "john smith.");
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_names() {
        assert_eq!(owner_holder_similarity("Acme Vineyards", "Jones Family Trust"), 0.0);
    }

    #[test]
    fn test_partial_match() {
        // one shared term out of 2 and 4 words: 1 / (sqrt(2) * 2)
        let s = owner_holder_similarity("Jones Ranch", "Jones Family Trust LLC");
        assert!((s - 1.0 / (2.0f64.sqrt() * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_words_count_once() {
        let s = owner_holder_similarity("Smith Smith", "Smith");
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(owner_holder_similarity("", "Smith"), 0.0);
        assert_eq!(owner_holder_similarity("...", "Smith"), 0.0);
    }
}
