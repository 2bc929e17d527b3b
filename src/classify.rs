//! Keyword-based episode tagging.
//!
//! Two independent, pure functions run over an episode's sanitized title and
//! description:
//!
//! - [`categorize`] assigns a [`Category`] by first-match keyword rules
//! - [`detect_language`] assigns a [`Language`] by counting short marker tokens
//!
//! Both are coarse content tags for browsing, not classifiers with any
//! accuracy guarantee. Multi-topic text is resolved strictly by rule order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Category
// ============================================================================

/// Topic tag assigned to an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Animals,
    Folktales,
    Learning,
    Nature,
    Culture,
    Bedtime,
    #[default]
    Stories,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Animals,
        Category::Folktales,
        Category::Learning,
        Category::Nature,
        Category::Culture,
        Category::Bedtime,
        Category::Stories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Animals => "Animals",
            Category::Folktales => "Folktales",
            Category::Learning => "Learning",
            Category::Nature => "Nature",
            Category::Culture => "Culture",
            Category::Bedtime => "Bedtime",
            Category::Stories => "Stories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Category rules in priority order. The first rule with any keyword
/// present wins; [`Category::Stories`] applies when none match.
const CATEGORY_RULES: [(Category, &[&str]); 6] = [
    (
        Category::Animals,
        &["animal", "lion", "elephant", "zebra", "giraffe", "safari", "jungle", "forest"],
    ),
    (
        Category::Folktales,
        &["folktale", "traditional", "wisdom", "ancestor", "village", "elder"],
    ),
    (
        Category::Learning,
        &["learn", "school", "education", "math", "science", "lesson"],
    ),
    (
        Category::Nature,
        &["nature", "tree", "river", "mountain", "sun", "moon", "star"],
    ),
    (
        Category::Culture,
        &["culture", "tradition", "ceremony", "festival", "dance", "music"],
    ),
    (
        Category::Bedtime,
        &["night", "sleep", "bedtime", "dream", "quiet", "peaceful"],
    ),
];

/// Assigns a category from keyword substrings in the title and description.
///
/// Matching is case-insensitive and substring-based, so "sunday" matches the
/// Nature keyword "sun". Rules are tried in a fixed order (Animals,
/// Folktales, Learning, Nature, Culture, Bedtime) and the first hit wins.
///
/// # Examples
///
/// ```
/// use ubuntu_tales::classify::{categorize, Category};
///
/// assert_eq!(categorize("The Lion Goes to School", ""), Category::Animals);
/// assert_eq!(categorize("Grandma's Kitchen", "A warm tale"), Category::Stories);
/// ```
pub fn categorize(title: &str, description: &str) -> Category {
    let text = combined_lowercase(title, description);

    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

// ============================================================================
// Language
// ============================================================================

/// Language tag assigned to an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Swahili,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Swahili];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Swahili => "Swahili",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Short tokens common in Swahili text.
const SWAHILI_MARKERS: [&str; 13] = [
    "na", "wa", "ya", "za", "la", "pa", "ku", "mu", "ni", "si", "bi", "mama", "baba",
];

/// More than this many distinct markers present tags the text as Swahili.
const SWAHILI_THRESHOLD: usize = 2;

/// Guesses the episode language from marker tokens.
///
/// Counts how many distinct entries of the marker list appear anywhere in
/// the lowercased text (substring match, not whole words, each marker
/// counted at most once). More than two hits means [`Language::Swahili`];
/// anything else is [`Language::English`].
///
/// Because the markers are two-letter syllables, ordinary English text can
/// trip the threshold ("banana" alone contains "na"; "singing" contains
/// "si" and "ni").
pub fn detect_language(title: &str, description: &str) -> Language {
    let text = combined_lowercase(title, description);
    let hits = SWAHILI_MARKERS
        .iter()
        .filter(|marker| text.contains(*marker))
        .count();

    if hits > SWAHILI_THRESHOLD {
        Language::Swahili
    } else {
        Language::English
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Error for a tag string that names no known category or language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tag: {0}")]
pub struct UnknownTag(pub String);

/// Joins title and description with a space so no keyword can match across
/// the boundary.
fn combined_lowercase(title: &str, description: &str) -> String {
    let mut text = String::with_capacity(title.len() + description.len() + 1);
    text.push_str(title);
    text.push(' ');
    text.push_str(description);
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_earlier_rule_wins() {
        assert_eq!(categorize("The lion at school", ""), Category::Animals);
        assert_eq!(categorize("Village lesson", ""), Category::Folktales);
        assert_eq!(categorize("A lesson under the moon", ""), Category::Learning);
        assert_eq!(categorize("River festival", ""), Category::Nature);
        assert_eq!(categorize("Dance until night", ""), Category::Culture);
    }

    #[test]
    fn test_each_rule_reachable() {
        assert_eq!(categorize("Safari day", ""), Category::Animals);
        assert_eq!(categorize("", "an old folktale"), Category::Folktales);
        assert_eq!(categorize("Math is fun", ""), Category::Learning);
        assert_eq!(categorize("Climbing the mountain", ""), Category::Nature);
        assert_eq!(categorize("A wedding ceremony", ""), Category::Culture);
        assert_eq!(categorize("Time to sleep", ""), Category::Bedtime);
    }

    #[test]
    fn test_default_category() {
        assert_eq!(categorize("Grandma's kitchen", "A warm tale"), Category::Stories);
        assert_eq!(categorize("", ""), Category::Stories);
    }

    #[test]
    fn test_category_case_insensitive() {
        assert_eq!(categorize("ELEPHANT PARADE", ""), Category::Animals);
        assert_eq!(categorize("", "BedTime Tale"), Category::Bedtime);
    }

    #[test]
    fn test_category_substring_match() {
        // "sun" inside "sunday" counts
        assert_eq!(categorize("Sunday picnic", ""), Category::Nature);
        // "star" inside "start"
        assert_eq!(categorize("A new start", ""), Category::Nature);
    }

    #[test]
    fn test_no_match_across_title_description_boundary() {
        // "su" + "n" only touch if concatenated without separator
        assert_eq!(categorize("Ansu", "nothing here"), Category::Stories);
    }

    #[test]
    fn test_language_default_english() {
        assert_eq!(detect_language("The Brave Hare", "A story"), Language::English);
        assert_eq!(detect_language("", ""), Language::English);
    }

    #[test]
    fn test_language_threshold() {
        // Exactly two markers: "mama" and "baba"
        assert_eq!(detect_language("Mama", "Baba"), Language::English);
        // Three markers: mama, baba, na
        assert_eq!(detect_language("Mama na Baba", ""), Language::Swahili);
    }

    #[test]
    fn test_language_swahili_sentence() {
        assert_eq!(
            detect_language("Hadithi ya Simba", "Simba na rafiki zake wanacheza"),
            Language::Swahili
        );
    }

    #[test]
    fn test_language_marker_counted_once() {
        // "na" appears many times but is a single marker
        assert_eq!(detect_language("na na na na", ""), Language::English);
    }

    #[test]
    fn test_tag_round_trip_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        for language in Language::ALL {
            assert_eq!(language.as_str().parse::<Language>(), Ok(language));
        }
        assert_eq!(
            "Poetry".parse::<Category>(),
            Err(UnknownTag("Poetry".to_string()))
        );
    }

    proptest! {
        #[test]
        fn prop_animal_keyword_always_wins(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
            let title = format!("{}lion{}", prefix, suffix);
            prop_assert_eq!(categorize(&title, &suffix), Category::Animals);
        }

        #[test]
        fn prop_classifiers_are_deterministic(title in "\\PC{0,40}", desc in "\\PC{0,40}") {
            prop_assert_eq!(categorize(&title, &desc), categorize(&title, &desc));
            prop_assert_eq!(detect_language(&title, &desc), detect_language(&title, &desc));
        }

        #[test]
        fn prop_digits_only_is_english_story(title in "[0-9 ]{0,40}", desc in "[0-9 ]{0,40}") {
            prop_assert_eq!(categorize(&title, &desc), Category::Stories);
            prop_assert_eq!(detect_language(&title, &desc), Language::English);
        }
    }
}
