use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    // `*`: exactly one segment
    Any,
    // `**`: zero or more segments
    AnyDeep,
}

/// Ant-style path pattern (`/api/admin/**`, `/items/*/detail`).
///
/// Paths and patterns are compared segment by segment; empty segments are ignored so
/// `/health/` and `/health` are the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path pattern (must start with '/'): {0}")]
pub struct PatternError(pub String);

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return Err(PatternError(raw.to_string()));
        }

        let segments = split(raw)
            .map(|s| match s {
                "**" => Segment::AnyDeep,
                "*" => Segment::Any,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split(path).collect();
        match_from(&self.segments, &path)
    }

    /// Ordering key used to pick the most specific of several matching patterns.
    ///
    /// More literal segments win, then patterns without wildcards, then longer patterns.
    pub fn specificity(&self) -> (usize, bool, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (literals, literals == self.segments.len(), self.segments.len())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_from(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDeep, rest)) => {
            (0..=path.len()).any(|skip| match_from(rest, &path[skip..]))
        }
        Some((Segment::Any, rest)) => !path.is_empty() && match_from(rest, &path[1..]),
        Some((Segment::Literal(lit), rest)) => {
            path.first().is_some_and(|p| *p == lit.as_str()) && match_from(rest, &path[1..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> PathPattern {
        PathPattern::parse(raw).unwrap()
    }

    #[test]
    fn literal_pattern_matches_exact_path_only() {
        let pat = p("/health");
        assert!(pat.matches("/health"));
        assert!(pat.matches("/health/"));
        assert!(!pat.matches("/health/deep"));
        assert!(!pat.matches("/"));
    }

    #[test]
    fn double_star_matches_zero_or_more_segments() {
        let pat = p("/api/admin/**");
        assert!(pat.matches("/api/admin"));
        assert!(pat.matches("/api/admin/ping"));
        assert!(pat.matches("/api/admin/a/b/c"));
        assert!(!pat.matches("/api/adminx"));
        assert!(!pat.matches("/api/user/ping"));
    }

    #[test]
    fn single_star_matches_exactly_one_segment() {
        let pat = p("/items/*/detail");
        assert!(pat.matches("/items/7/detail"));
        assert!(!pat.matches("/items/detail"));
        assert!(!pat.matches("/items/7/8/detail"));
    }

    #[test]
    fn catch_all_matches_everything() {
        let pat = p("/**");
        assert!(pat.matches("/"));
        assert!(pat.matches("/anything/at/all"));
    }

    #[test]
    fn relative_pattern_is_rejected() {
        assert!(PathPattern::parse("api/**").is_err());
    }

    #[test]
    fn specificity_prefers_literals() {
        assert!(p("/api/admin/**").specificity() > p("/api/**").specificity());
        assert!(p("/api/admin").specificity() > p("/api/admin/**").specificity());
        assert!(p("/api/*/ping").specificity() > p("/api/**").specificity());
    }
}
