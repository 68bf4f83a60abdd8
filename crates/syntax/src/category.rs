// Chunk: docs/chunks/theme_store - Semantic categories and theme colors

//! Semantic categories shared by grammars, the classifier and themes.

use serde::{Deserialize, Serialize};

/// A semantic category a theme assigns a color to.
///
/// The first seven are editor chrome colors; the rest are produced by the
/// classifier for spans of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Background,
    Foreground,
    HighlightBackground,
    HighlightForeground,
    CurrentLineBackground,
    #[serde(alias = "line_numbers_background")]
    LineNumberBackground,
    #[serde(alias = "line_numbers_foreground")]
    LineNumberForeground,
    #[serde(alias = "others")]
    Other,
    #[serde(alias = "numbers")]
    Number,
    #[serde(alias = "strings")]
    String,
    #[serde(alias = "keywords")]
    Keyword,
    #[serde(alias = "comments")]
    Comment,
    #[serde(alias = "functions")]
    Function,
    #[serde(alias = "data_types")]
    DataType,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 14] = [
        Category::Background,
        Category::Foreground,
        Category::HighlightBackground,
        Category::HighlightForeground,
        Category::CurrentLineBackground,
        Category::LineNumberBackground,
        Category::LineNumberForeground,
        Category::Other,
        Category::Number,
        Category::String,
        Category::Keyword,
        Category::Comment,
        Category::Function,
        Category::DataType,
    ];

    /// The key used for this category in theme definition files.
    pub fn key(self) -> &'static str {
        match self {
            Category::Background => "background",
            Category::Foreground => "foreground",
            Category::HighlightBackground => "highlight_background",
            Category::HighlightForeground => "highlight_foreground",
            Category::CurrentLineBackground => "current_line_background",
            Category::LineNumberBackground => "line_numbers_background",
            Category::LineNumberForeground => "line_numbers_foreground",
            Category::Other => "others",
            Category::Number => "numbers",
            Category::String => "strings",
            Category::Keyword => "keywords",
            Category::Comment => "comments",
            Category::Function => "functions",
            Category::DataType => "data_types",
        }
    }

    /// Parses a theme key.
    ///
    /// Accepts the definition-file keys (`"keywords"`), their singular
    /// snake_case forms (`"keyword"`) and the variant names (`"DataType"`),
    /// ignoring case and surrounding whitespace.
    pub fn from_key(key: &str) -> Option<Category> {
        let normalized: String = key
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        Category::ALL.into_iter().find(|category| {
            let canonical: String = category.key().chars().filter(|c| *c != '_').collect();
            let variant = format!("{:?}", category).to_lowercase();
            normalized == canonical || normalized == variant
        })
    }

    /// Returns true for categories the classifier assigns to text.
    pub fn is_syntax(self) -> bool {
        matches!(
            self,
            Category::Other
                | Category::Number
                | Category::String
                | Category::Keyword
                | Category::Comment
                | Category::Function
                | Category::DataType
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_has_every_category_once() {
        let mut seen = Category::ALL.to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 14);
    }

    #[test]
    fn test_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(
                Category::from_key(category.key()),
                Some(category),
                "key {:?} should parse back",
                category.key()
            );
        }
    }

    #[test]
    fn test_from_key_accepts_variant_and_singular_forms() {
        assert_eq!(Category::from_key("DataType"), Some(Category::DataType));
        assert_eq!(Category::from_key("keyword"), Some(Category::Keyword));
        assert_eq!(Category::from_key(" Keywords "), Some(Category::Keyword));
        assert_eq!(Category::from_key("line_number_background"), Some(Category::LineNumberBackground));
        assert_eq!(Category::from_key("current-line-background"), Some(Category::CurrentLineBackground));
        assert_eq!(Category::from_key("other"), Some(Category::Other));
    }

    #[test]
    fn test_from_key_unknown() {
        assert_eq!(Category::from_key("selection"), None);
        assert_eq!(Category::from_key(""), None);
    }

    #[test]
    fn test_is_syntax() {
        assert!(Category::Keyword.is_syntax());
        assert!(Category::Other.is_syntax());
        assert!(!Category::Background.is_syntax());
        assert_eq!(Category::ALL.iter().filter(|c| c.is_syntax()).count(), 7);
    }

    #[test]
    fn test_deserialize_aliases() {
        let c: Category = serde_json::from_str("\"data_type\"").unwrap();
        assert_eq!(c, Category::DataType);
        let c: Category = serde_json::from_str("\"comments\"").unwrap();
        assert_eq!(c, Category::Comment);
    }
}
