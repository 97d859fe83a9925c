//! Facility name normalization
//!
//! Rewrites a raw stop/route display name into the form used by the
//! announcement recording filenames. The substitution table encodes the
//! abbreviations seen in upstream stop names; its order is significant and
//! the existing reviewed links were produced with exactly this table, so
//! entries are literal and must not be generalized.

/// Ordered word substitutions, applied with a space on both sides of the
/// pattern and of the replacement.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("Stn", "Station"),
    ("St /", "Street"),
    ("/", ""),
    ("Coll", "College"),
    ("Hosp", "Hospital"),
    ("Rd", "Road"),
    ("Grn", "Green"),
    ("Pk", "Park"),
    ("Cmn", "Common"),
    ("Ln", "Lane"),
    ("Underground", ""),
    ("DLR", ""),
    ("R A F", "RAF"),
    ("PH", "Public House"),
    ("Rail Station", "Station"),
    ("UR Church", "United Reformed Church"),
    ("St.", "St"),
    ("Y M C A", "YMCA"),
];

/// Trailing abbreviations glued onto the preceding word
const SUFFIXES: &[(&str, &str)] = &[(" St", "Street"), (" Lan", "Lane")];

/// Normalize a raw facility name into its canonical comparison form
///
/// Pure and deterministic: equal inputs always give equal outputs.
///
/// Not idempotent for a trailing `St`/`Lan` followed by a bracketed group:
/// the suffix rule runs before brackets are removed, so `"Foo St (x)"` gives
/// `"Foo St"`, which normalizes again to `"FooStreet"`. Reordering the rules
/// would change the scores of already reviewed links.
///
/// # Example
/// ```
/// use announce_linker::services::name_normalizer::normalize;
///
/// assert_eq!(
///     normalize(" Highbury & Islington Stn (Main Entrance) "),
///     "Highbury & Islington Station"
/// );
/// ```
pub fn normalize(raw: &str) -> String {
    let mut name = format!(" {} ", raw);

    for (pattern, replacement) in SUBSTITUTIONS {
        let spaced_pattern = format!(" {} ", pattern);
        if !name.contains(&spaced_pattern) {
            continue;
        }
        let spaced_replacement = if replacement.is_empty() {
            " ".to_string()
        } else {
            format!(" {} ", replacement)
        };
        name = name.replace(&spaced_pattern, &spaced_replacement);
    }

    name.retain(|c| c != '\'');

    let mut name = name.trim().to_string();

    for (suffix, replacement) in SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            name = format!("{}{}", stem, replacement);
        }
    }

    let name = remove_parenthesized(&name);

    collapse_whitespace(&name)
}

/// Remove every `(...)` group, shortest match, not nested
///
/// An opening bracket with no closing bracket on the same line is kept.
fn remove_parenthesized(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(open) = rest.find('(') {
        let after_open = &rest[open + 1..];
        match after_open.find([')', '\n']) {
            Some(close) if after_open[close..].starts_with(')') => {
                result.push_str(&rest[..open]);
                rest = &after_open[close + 1..];
            }
            _ => {
                result.push_str(&rest[..=open]);
                rest = after_open;
            }
        }
    }

    result.push_str(rest);
    result
}

fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
