//! Slug generation and normalization.

use unicode_segmentation::UnicodeSegmentation;

/// Longest slug we produce, in bytes. Leaves room for the `.md` extension
/// under common 255-byte filename limits.
pub const MAX_SLUG_LEN: usize = 200;

/// Identity used when a title contains nothing we can keep.
pub const FALLBACK_SLUG: &str = "untitled";

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Transliterate each grapheme to ASCII where possible
/// - Lowercase
/// - Replace runs of whitespace and punctuation with a single hyphen
/// - Drop apostrophes so contractions stay in one word
/// - Trim leading/trailing hyphens
///
/// The result only ever contains `[a-z0-9-]` and may be empty.
///
/// # Examples
///
/// ```
/// use flatwiki_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for grapheme in input.graphemes(true) {
        let ascii = deunicode::deunicode_with_tofu(grapheme, "-");
        for c in ascii.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else if c == '\'' {
                // "What's" -> "whats"
            } else {
                pending_separator = true;
            }
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        // ASCII only, so any byte index is a char boundary
        slug.truncate(MAX_SLUG_LEN);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }

    slug
}

/// Canonical page identity for a user-entered title.
///
/// Same as [`slugify`] but never empty, so the result is always usable as
/// exactly one path segment and one URL segment.
pub fn normalize(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Whether `slug` is already in canonical form.
pub fn is_canonical(slug: &str) -> bool {
    normalize(slug) == slug
}

/// The slug a caller should redirect to, if `slug` is not canonical.
pub fn canonical_redirect(slug: &str) -> Option<String> {
    let canonical = normalize(slug);
    (canonical != slug).then_some(canonical)
}
