//! Title matching for search results
//!
//! Titles are compared in a normalized form: lowercase, with everything
//! except ASCII alphanumerics and CJK ideographs removed.

use regex::Regex;

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Lowercases and strips punctuation, whitespace and non-CJK scripts
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_cjk(*c))
        .collect()
}

/// Normalizes and drops season markers ("第二季", "第3部", "season", "cour", "part")
pub fn strip_season_markers(title: &str) -> String {
    let normalized = normalize_title(title);
    let Ok(re) = Regex::new(r"第.*?[季部]|season|cour|part") else {
        return normalized;
    };
    re.replace_all(&normalized, "").into_owned()
}

/// Levenshtein edit distance over Unicode scalar values
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

fn contains_either_way(candidate: &str, target: &str) -> bool {
    !candidate.is_empty() && !target.is_empty() && (candidate.contains(target) || target.contains(candidate))
}

/// Picks the candidate whose title best matches the wanted titles
///
/// In order: substring containment (either direction) against `primary`,
/// then against `secondary`, then containment after stripping season
/// markers, and finally the smallest edit distance to `primary`. Ties keep
/// the earliest candidate. Returns `None` only when `candidates` is empty.
pub fn best_match<'a, T, F>(
    candidates: &'a [T],
    title_of: F,
    primary: &str,
    secondary: Option<&str>,
) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let target = normalize_title(primary);
    let target_secondary = secondary.map(normalize_title).filter(|s| *s != target);

    if let Some(hit) = candidates
        .iter()
        .find(|c| contains_either_way(&normalize_title(title_of(*c)), &target))
    {
        return Some(hit);
    }

    if let Some(target_secondary) = &target_secondary
        && let Some(hit) = candidates
            .iter()
            .find(|c| contains_either_way(&normalize_title(title_of(*c)), target_secondary))
    {
        return Some(hit);
    }

    let stripped_targets: Vec<String> = std::iter::once(primary)
        .chain(secondary)
        .map(strip_season_markers)
        .collect();
    if let Some(hit) = candidates.iter().find(|c| {
        let stripped = strip_season_markers(title_of(*c));
        stripped_targets
            .iter()
            .any(|t| contains_either_way(&stripped, t))
    }) {
        return Some(hit);
    }

    candidates
        .iter()
        .min_by_key(|c| edit_distance(&normalize_title(title_of(*c)), &target))
}
