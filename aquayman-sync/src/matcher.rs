//! Repository name → repository rule resolution.

use glob::{MatchOptions, Pattern};

use aquayman_core::RepositoryConfig;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Picks the single rule that governs `repository`.
///
/// An exact name match always wins. Otherwise the matching wildcard rule with
/// the longest pattern text wins; on equal length the one declared first.
/// Patterns that fail to compile never match.
pub fn match_repository<'a>(
    repository: &str,
    rules: &'a [RepositoryConfig],
) -> Option<&'a RepositoryConfig> {
    if let Some(exact) = rules.iter().find(|r| r.name == repository) {
        return Some(exact);
    }

    let mut best: Option<&RepositoryConfig> = None;
    for rule in rules.iter().filter(|r| r.is_wildcard()) {
        if best.is_some_and(|b| rule.name.len() <= b.name.len()) {
            continue;
        }
        let matches = Pattern::new(&rule.name)
            .map(|p| p.matches_with(repository, GLOB_OPTIONS))
            .unwrap_or(false);
        if matches {
            best = Some(rule);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use aquayman_core::Visibility;
    use rstest::rstest;

    use super::*;

    fn rule(name: &str) -> RepositoryConfig {
        RepositoryConfig {
            name: name.to_string(),
            visibility: Visibility::Private,
            description: String::new(),
            teams: BTreeMap::new(),
            users: BTreeMap::new(),
        }
    }

    fn rules(names: &[&str]) -> Vec<RepositoryConfig> {
        names.iter().map(|n| rule(n)).collect()
    }

    #[rstest]
    #[case(&["a*", "app"])]
    #[case(&["app", "a*"])]
    #[case(&["app*", "app", "a*"])]
    fn exact_match_wins_regardless_of_order(#[case] names: &[&str]) {
        let rules = rules(names);
        let found = match_repository("app", &rules).expect("match");
        assert_eq!(found.name, "app");
    }

    #[rstest]
    #[case(&["team-*", "team-web-*"])]
    #[case(&["team-web-*", "team-*"])]
    fn longest_wildcard_wins(#[case] names: &[&str]) {
        let rules = rules(names);
        let found = match_repository("team-web-service", &rules).expect("match");
        assert_eq!(found.name, "team-web-*");
    }

    #[test]
    fn equal_length_tie_goes_to_first_declared() {
        let rules = rules(&["svc-*a", "svc-a*"]);
        let found = match_repository("svc-aa", &rules).expect("match");
        assert_eq!(found.name, "svc-*a");
    }

    #[test]
    fn no_match_returns_none() {
        let rules = rules(&["svc-*", "app"]);
        assert!(match_repository("other", &rules).is_none());
    }

    #[test]
    fn literal_rule_is_not_a_pattern() {
        let rules = rules(&["app.v1"]);
        assert!(match_repository("appxv1", &rules).is_none());
    }

    #[rstest]
    #[case("svc-?", "svc-a", true)]
    #[case("svc-?", "svc-ab", false)]
    #[case("svc-[ab]", "svc-b", true)]
    #[case("svc-[ab]", "svc-c", false)]
    #[case("svc-*", "svc-x/y", false)]
    #[case("svc-*", "SVC-x", false)]
    fn glob_semantics(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        let rules = rules(&[pattern]);
        assert_eq!(match_repository(name, &rules).is_some(), expected);
    }

    #[test]
    fn broken_pattern_never_matches() {
        let rules = rules(&["svc-["]);
        assert!(match_repository("svc-[", &rules).is_some(), "exact text still matches");
        assert!(match_repository("svc-a", &rules).is_none());
    }
}
