use std::collections::HashSet;

/// Include/exclude check shared by event flattening: a value passes when the
/// include set is empty or names it, and the exclude set does not name it.
/// Excludes win over includes.
#[must_use]
pub fn included(value: &str, includes: &HashSet<String>, excludes: &HashSet<String>) -> bool {
    (includes.is_empty() || includes.contains(value)) && !excludes.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_sets_include_everything() {
        assert!(included("anything", &HashSet::new(), &HashSet::new()));
    }

    #[test]
    fn includes_restrict_to_named_values() {
        let includes = set(&["admins"]);
        assert!(included("admins", &includes, &HashSet::new()));
        assert!(!included("staff", &includes, &HashSet::new()));
    }

    #[test]
    fn excludes_win_over_includes() {
        let includes = set(&["admins"]);
        let excludes = set(&["admins"]);
        assert!(!included("admins", &includes, &excludes));
    }
}
