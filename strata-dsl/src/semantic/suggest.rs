//! "Did you mean" hints for unresolved identifiers

/// Levenshtein distance over characters
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// How hints are chosen
#[derive(Debug, Clone, Copy)]
pub struct SuggestOptions {
    pub enabled: bool,
    pub max_suggestions: usize,
    pub max_distance: usize,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_suggestions: 3,
            max_distance: 2,
        }
    }
}

const AVAILABLE_LISTED: usize = 5;

/// Build a hint for `target` from the ids that would have been valid.
///
/// Close matches are offered first; failing that, a few available ids are
/// listed. `noun` is the plural used in the listing ("rocks", "events").
pub fn suggest<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    noun: &str,
    options: &SuggestOptions,
) -> Option<String> {
    if !options.enabled {
        return None;
    }

    let mut candidates: Vec<&str> = candidates.into_iter().collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_unstable();
    candidates.dedup();

    let mut close: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| (edit_distance(target, c), *c))
        .filter(|(d, _)| *d <= options.max_distance)
        .collect();
    close.sort();
    close.truncate(options.max_suggestions);

    if !close.is_empty() {
        let names: Vec<&str> = close.into_iter().map(|(_, c)| c).collect();
        return Some(format!("did you mean: {}?", names.join(", ")));
    }

    let listed = candidates.len().min(AVAILABLE_LISTED);
    let mut hint = format!("available {}: {}", noun, candidates[..listed].join(", "));
    if candidates.len() > listed {
        hint.push_str(&format!(", ... ({} total)", candidates.len()));
    }
    Some(hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("R1", "R1"), 0);
        assert_eq!(edit_distance("R9", "R1"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_close_matches_first() {
        let hint = suggest("R9", ["R1", "R2", "Granite"], "rocks", &SuggestOptions::default());
        assert_eq!(hint.as_deref(), Some("did you mean: R1, R2?"));
    }

    #[test]
    fn test_lists_available_when_nothing_is_close() {
        let hint = suggest("X99", ["Sandstone", "Shale"], "rocks", &SuggestOptions::default());
        assert_eq!(hint.as_deref(), Some("available rocks: Sandstone, Shale"));
    }

    #[test]
    fn test_listing_is_capped() {
        let names = ["AAAA1", "AAAA2", "AAAA3", "AAAA4", "AAAA5", "AAAA6"];
        let hint = suggest("Z", names, "events", &SuggestOptions::default()).unwrap();
        assert!(hint.ends_with("AAAA5, ... (6 total)"));
    }

    #[test]
    fn test_disabled_or_empty() {
        let options = SuggestOptions { enabled: false, ..Default::default() };
        assert_eq!(suggest("R9", ["R1"], "rocks", &options), None);
        assert_eq!(suggest("R9", [], "rocks", &SuggestOptions::default()), None);
    }
}
