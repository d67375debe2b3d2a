// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Package filter patterns.
//!
//! Patterns are matched against the whole package path. `*` matches any run
//! of characters, module separators included, and `?` matches exactly one
//! character. Java-style `.` separators in patterns are read as `::`.
//!
//! | Pattern | Matches | Does not match |
//! |---------|---------|----------------|
//! | `*` | every package | |
//! | `crate::model::*` | `crate::model::user`, `crate::model::a::b` | `crate::model` |
//! | `crate::model` | `crate::model` | `crate::model::user` |
//! | `crate::v?` | `crate::v1` | `crate::v10` |

/// Compiled set of package patterns.
///
/// A package passes when it matches at least one pattern. An empty set
/// passes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFilter {
    patterns: Vec<Vec<char>>
}

impl PackageFilter {
    #[must_use]
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|pattern| pattern.as_ref().trim().replace('.', "::").chars().collect())
                .collect()
        }
    }

    /// Filter accepting every package.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::new(&["*"])
    }

    #[must_use]
    pub fn matches(&self, package: &str) -> bool {
        let text: Vec<char> = package.chars().collect();
        self.patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, &text))
    }
}

/// Greedy wildcard match with single-star backtracking.
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, star_t + 1));
                }
                None => return false
            }
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
