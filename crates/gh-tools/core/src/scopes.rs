//! OAuth scope algebra: parent/child expansion and requirement checks.
//!
//! The scope set is closed: a fixed parent/child relation describes which
//! scopes transitively grant which. Expansion runs upward (toward granting
//! ancestors); a caller's raw scopes are matched against the expanded
//! ("accepted") set of a tool's requirement, so the caller side never needs
//! expanding.

use std::collections::BTreeSet;

/// Direct parent relation: each child maps to the scopes that grant it in
/// one hop.
const PARENTS: &[(&str, &[&str])] = &[
    ("public_repo", &["repo"]),
    ("security_events", &["repo"]),
    ("write:org", &["admin:org"]),
    ("read:org", &["write:org"]),
    ("read:project", &["project"]),
    ("read:packages", &["write:packages"]),
    ("read:user", &["user"]),
    ("user:email", &["user"]),
];

fn direct_parents(scope: &str) -> &'static [&'static str] {
    PARENTS
        .iter()
        .find(|(child, _)| *child == scope)
        .map_or(&[][..], |(_, parents)| parents)
}

/// Expand a scope set with every ancestor that transitively grants a member.
///
/// Output is sorted and deduplicated. Scope strings outside the known
/// relation pass through unchanged.
pub fn expand_scopes<S: AsRef<str>>(scopes: &[S]) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut work: Vec<String> = scopes
        .iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    while let Some(scope) = work.pop() {
        if seen.insert(scope.clone()) {
            for parent in direct_parents(&scope) {
                work.push((*parent).to_string());
            }
        }
    }

    seen.into_iter().collect()
}

/// Whether a token's raw scopes satisfy a requirement.
///
/// An empty requirement always passes. Otherwise the requirement is expanded
/// to its accepted set and the token must hold at least one member.
pub fn has_required_scopes<A: AsRef<str>, B: AsRef<str>>(token_scopes: &[A], required: &[B]) -> bool {
    if required.is_empty() {
        return true;
    }
    let accepted = expand_scopes(required);
    token_scopes
        .iter()
        .map(|s| s.as_ref().trim())
        .any(|held| accepted.iter().any(|a| a == held))
}
