//! Heading identifier generation
//!
//! Every heading of a rendered document gets an identifier derived from its
//! text. Identifiers are unique within one document: a collision gets a
//! numeric suffix (`-1`, `-2`, ...) appended to the normalized base.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex_lite::Regex;

/// Separator used for whitespace runs and suffixes
const SEPARATOR: char = '-';

fn repeated_separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-{2,}").expect("valid separator pattern"))
}

/// Normalize heading text into a base identifier.
///
/// Alphanumerics of any script are kept, so `"Überblick 概要"` becomes
/// `"überblick-概要"`.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let joined = lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string());

    let kept: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == SEPARATOR || *c == '_')
        .collect();

    repeated_separators()
        .replace_all(&kept, SEPARATOR.to_string().as_str())
        .into_owned()
}

/// Hands out unique identifiers for the headings of one document
#[derive(Debug, Default)]
pub struct IdAssigner {
    used: HashSet<String>,
}

impl IdAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for the next heading in document order
    pub fn assign(&mut self, text: &str) -> String {
        let base = normalize(text);
        let mut candidate = base.clone();
        let mut counter = 1usize;

        while self.used.contains(&candidate) {
            candidate = format!("{base}{SEPARATOR}{counter}");
            counter += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }
}

/// Assign identifiers to an ordered sequence of heading texts
pub fn assign_ids<'a, I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut assigner = IdAssigner::new();
    titles.into_iter().map(|t| assigner.assign(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Getting Started  "), "getting-started");
        assert_eq!(normalize("What's new in 2.0?"), "whats-new-in-20");
        assert_eq!(normalize("a   -  b"), "a-b");
        assert_eq!(normalize("snake_case name"), "snake_case-name");
    }

    #[test]
    fn test_normalize_keeps_non_latin() {
        assert_eq!(normalize("Überblick 概要"), "überblick-概要");
        assert_eq!(normalize("Привет, мир"), "привет-мир");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_duplicate_headings_get_suffix() {
        assert_eq!(assign_ids(["Intro", "Intro"]), vec!["intro", "intro-1"]);
        assert_eq!(
            assign_ids(["Setup", "Setup", "Setup"]),
            vec!["setup", "setup-1", "setup-2"]
        );
    }

    #[test]
    fn test_suffix_skips_taken_ids() {
        // "Intro 1" claims "intro-1" before the duplicate "Intro" needs it
        assert_eq!(
            assign_ids(["Intro", "Intro 1", "Intro"]),
            vec!["intro", "intro-1", "intro-2"]
        );
    }

    #[test]
    fn test_empty_headings_still_unique() {
        assert_eq!(assign_ids(["", "", "?"]), vec!["", "-1", "-2"]);
    }

    #[test]
    fn test_ids_pairwise_distinct_and_deterministic() {
        let titles = [
            "A", "a", "A ", "a-1", "A", "", "", "b c", "b  c", "b-c", "a-1",
        ];
        let first = assign_ids(titles);
        let second = assign_ids(titles);
        assert_eq!(first, second);

        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }
}
