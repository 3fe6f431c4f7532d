//! URL slugs derived from vitamin titles.
//!
//! Slugs are decoration only: routes resolve posts by id, so a stale or
//! hand-edited slug segment never changes which post is shown.

/// Derive a URL-safe slug from a title.
///
/// Lowercases, trims, turns whitespace runs into a single hyphen, spells out
/// `&` as `-and-`, drops everything outside ASCII `[a-z0-9_-]`, collapses
/// repeated hyphens and strips hyphens from both ends. Never fails; the
/// result may be empty when the title has no representable characters.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let trimmed = lowered.trim_matches(is_title_whitespace);

    let mut slug = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            c if is_title_whitespace(c) => push_separator(&mut slug),
            '&' => {
                push_separator(&mut slug);
                slug.push_str("and");
                push_separator(&mut slug);
            }
            '-' => push_separator(&mut slug),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' => slug.push(c),
            _ => {}
        }
    }

    slug.trim_matches('-').to_string()
}

// Browser whitespace: the byte-order mark counts, NEXT LINE (U+0085) does not.
fn is_title_whitespace(ch: char) -> bool {
    (ch.is_whitespace() && ch != '\u{85}') || ch == '\u{feff}'
}

fn push_separator(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}
