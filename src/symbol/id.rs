//! Symbol identifiers.
//!
//! An ID has the form `{fileSlug}::{qualifiedName}`. The slug is a reversible
//! encoding of the file path: `%`, `-` and `:` are percent-escaped first, then
//! every `/` becomes `-`.

/// Encode a relative file path into its slug.
pub fn encode_path(path: &str) -> String {
    let mut slug = String::with_capacity(path.len() + 8);
    for ch in path.chars() {
        match ch {
            '%' => slug.push_str("%25"),
            '-' => slug.push_str("%2D"),
            ':' => slug.push_str("%3A"),
            '/' => slug.push('-'),
            other => slug.push(other),
        }
    }
    slug
}

/// Decode a slug produced by [`encode_path`]. Returns `None` for input that
/// no path encodes to.
pub fn decode_path(slug: &str) -> Option<String> {
    let mut path = String::with_capacity(slug.len());
    let mut chars = slug.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '-' => path.push('/'),
            '%' => {
                let escape: String = chars.by_ref().take(2).collect();
                match escape.as_str() {
                    "25" => path.push('%'),
                    "2D" => path.push('-'),
                    "3A" => path.push(':'),
                    _ => return None,
                }
            }
            other => path.push(other),
        }
    }
    Some(path)
}

/// Build the symbol ID for a qualified name within a file.
pub fn make_symbol_id(file_path: &str, qualified_name: &str) -> String {
    format!("{}::{}", encode_path(file_path), qualified_name)
}

/// Split an ID into its decoded file path and qualified name.
pub fn split_symbol_id(id: &str) -> Option<(String, &str)> {
    let (slug, qualified) = id.split_once("::")?;
    Some((decode_path(slug)?, qualified))
}
