//! Converts user-typed item names to the dataset's key convention.

/// Normalize free text to a dataset key: whitespace runs become `_`, every
/// `_`-separated segment is capitalized with the rest lowercased.
///
/// `"candy canes"` -> `Candy_Canes`, `"Blue_Steel"` -> `Blue_Steel`.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_craft_name(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .map(capitalize_segment)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}
