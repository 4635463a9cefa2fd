//! Version ordering and version ranges.
//!
//! Descriptor versions are not semver: they are dot/dash separated token
//! lists where numeric tokens compare numerically and qualifier tokens
//! compare lexically. Parent references and jdk activations may use range
//! notation such as `[1.0,2.0)`, `[1.5,)` or `(,1.0]`.

use std::cmp::Ordering;
use std::fmt;

/// A parsed version, ordered the way a repository orders release directories.
///
/// Tokenization splits on `.` and `-`. A numeric token always outranks a
/// qualifier token at the same position, and a missing trailing token counts
/// as zero against numerics and as a release against qualifiers, so
/// `1.0 > 1.0-rc1` and `1.10 > 1.9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u64),
    Qualifier(String),
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        let tokens = raw
            .split(['.', '-'])
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<u64>() {
                Ok(n) => Token::Number(n),
                Err(_) => Token::Qualifier(s.to_ascii_lowercase()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            tokens,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            let ord = match (self.tokens.get(i), other.tokens.get(i)) {
                (Some(Token::Number(a)), Some(Token::Number(b))) => a.cmp(b),
                (Some(Token::Qualifier(a)), Some(Token::Qualifier(b))) => a.cmp(b),
                // A number at a position outranks any qualifier: 1.1 > 1-rc.
                (Some(Token::Number(_)), Some(Token::Qualifier(_))) => Ordering::Greater,
                (Some(Token::Qualifier(_)), Some(Token::Number(_))) => Ordering::Less,
                // Trailing zeros are insignificant, trailing qualifiers rank
                // below the bare release: 1.0 == 1.0.0, 1.0-rc1 < 1.0.
                (Some(Token::Number(a)), None) => a.cmp(&0),
                (None, Some(Token::Number(b))) => 0.cmp(b),
                (Some(Token::Qualifier(_)), None) => Ordering::Less,
                (None, Some(Token::Qualifier(_))) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One bounded interval of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub lower: Option<Version>,
    pub lower_inclusive: bool,
    pub upper: Option<Version>,
    pub upper_inclusive: bool,
}

impl Restriction {
    fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            let ord = version.cmp(lower);
            if ord == Ordering::Less || (ord == Ordering::Equal && !self.lower_inclusive) {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            let ord = version.cmp(upper);
            if ord == Ordering::Greater || (ord == Ordering::Equal && !self.upper_inclusive) {
                return false;
            }
        }
        true
    }
}

/// A version range: one or more restrictions, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    restrictions: Vec<Restriction>,
}

/// True when the string uses range notation rather than a literal version.
pub fn is_range(spec: &str) -> bool {
    spec.starts_with('[') || spec.starts_with('(')
}

impl VersionRange {
    /// Parse range notation. Returns `None` for malformed input or for a
    /// plain literal version (which is not a range).
    pub fn parse(spec: &str) -> Option<Self> {
        if !is_range(spec) {
            return None;
        }
        let mut restrictions = Vec::new();
        let mut rest = spec.trim();
        while !rest.is_empty() {
            let open = rest.chars().next()?;
            if open != '[' && open != '(' {
                return None;
            }
            let close_idx = rest.find([']', ')'])?;
            let close = rest.as_bytes()[close_idx] as char;
            let body = &rest[1..close_idx];
            restrictions.push(Self::parse_restriction(body, open == '[', close == ']')?);
            rest = rest[close_idx + 1..].trim_start_matches(',').trim();
        }
        if restrictions.is_empty() {
            return None;
        }
        Some(Self {
            raw: spec.to_string(),
            restrictions,
        })
    }

    fn parse_restriction(body: &str, lower_inclusive: bool, upper_inclusive: bool) -> Option<Restriction> {
        match body.split_once(',') {
            None => {
                // Exact pin, e.g. [1.0]
                let v = body.trim();
                if v.is_empty() || !lower_inclusive || !upper_inclusive {
                    return None;
                }
                let version = Version::parse(v);
                Some(Restriction {
                    lower: Some(version.clone()),
                    lower_inclusive: true,
                    upper: Some(version),
                    upper_inclusive: true,
                })
            }
            Some((lo, hi)) => {
                let lo = lo.trim();
                let hi = hi.trim();
                let lower = (!lo.is_empty()).then(|| Version::parse(lo));
                let upper = (!hi.is_empty()).then(|| Version::parse(hi));
                if lower.is_none() && upper.is_none() {
                    return None;
                }
                Some(Restriction {
                    lower,
                    lower_inclusive,
                    upper,
                    upper_inclusive,
                })
            }
        }
    }

    pub fn contains(&self, version: &str) -> bool {
        let version = Version::parse(version);
        self.restrictions.iter().any(|r| r.contains(&version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lt(a: &str, b: &str) {
        assert!(
            Version::parse(a) < Version::parse(b),
            "expected {} < {}",
            a,
            b
        );
    }

    #[test]
    fn test_numeric_ordering() {
        lt("1.0", "2.0");
        lt("1.9", "1.10");
        lt("1.0", "1.0.1");
        assert_eq!(Version::parse("1.0"), Version::parse("1.0"));
    }

    #[test]
    fn test_trailing_zero_insignificant() {
        assert_eq!(
            Version::parse("1.0").cmp(&Version::parse("1.0.0")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_qualifier_below_release() {
        lt("1.0-rc1", "1.0");
        lt("1.0-alpha", "1.0-beta");
        lt("2.0-SNAPSHOT", "2.0");
    }

    #[test]
    fn test_qualifier_case_insensitive() {
        assert_eq!(
            Version::parse("1.0-RC1").cmp(&Version::parse("1.0-rc1")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_is_range() {
        assert!(is_range("[1.0,2.0)"));
        assert!(is_range("(,1.0]"));
        assert!(!is_range("1.0"));
        assert!(!is_range("1.0-SNAPSHOT"));
    }

    #[test]
    fn test_range_half_open() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains("1.0"));
        assert!(range.contains("1.5"));
        assert!(range.contains("1.999"));
        assert!(!range.contains("2.0"));
        assert!(!range.contains("0.9"));
    }

    #[test]
    fn test_range_unbounded_lower() {
        let range = VersionRange::parse("(,1.0]").unwrap();
        assert!(range.contains("0.1"));
        assert!(range.contains("1.0"));
        assert!(!range.contains("1.0.1"));
    }

    #[test]
    fn test_range_unbounded_upper() {
        let range = VersionRange::parse("[1.5,)").unwrap();
        assert!(!range.contains("1.4"));
        assert!(range.contains("1.5"));
        assert!(range.contains("99"));
    }

    #[test]
    fn test_range_exact_pin() {
        let range = VersionRange::parse("[1.0]").unwrap();
        assert!(range.contains("1.0"));
        assert!(!range.contains("1.0.1"));
    }

    #[test]
    fn test_range_multiple_restrictions() {
        let range = VersionRange::parse("[1.0,2.0),[3.0,4.0)").unwrap();
        assert!(range.contains("1.5"));
        assert!(!range.contains("2.5"));
        assert!(range.contains("3.5"));
        assert!(!range.contains("4.0"));
    }

    #[test]
    fn test_range_rejects_literal() {
        assert!(VersionRange::parse("1.0").is_none());
    }

    #[test]
    fn test_range_rejects_exact_with_round_brackets() {
        assert!(VersionRange::parse("(1.0)").is_none());
    }
}
