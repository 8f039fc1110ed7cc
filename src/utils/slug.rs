// src/utils/slug.rs

use std::sync::LazyLock;

use regex::Regex;

const MAX_SLUG_LEN: usize = 50;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Lower-case ASCII words of `text` joined by '-', at most 50 chars.
///
/// Text with no ASCII letters or digits slugifies to "untitled".
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let dashed = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let mut slug: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        return "untitled".to_string();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_joined_by_dashes() {
        assert_eq!(slugify("Week 3: Linked Lists!"), "week-3-linked-lists");
    }

    #[test]
    fn long_titles_are_cut_without_trailing_dash() {
        let slug = slugify(&"ab ".repeat(40));
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn symbol_only_text_gets_placeholder() {
        assert_eq!(slugify("???"), "untitled");
    }
}
