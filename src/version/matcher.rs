//! npm range satisfaction
//!
//! Supports npm semver range specifications:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1`, `1.2`, `*`, `""` - wildcards
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` (AND) and `^1.0.0 || ^2.0.0` (OR)
//!
//! Every entry point is total: an unparseable version or range is simply
//! "not satisfied".

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::semver::{Precision, parse_partial, parse_version};

/// Whitespace between an operator and its version (`>= 1.2.3`)
static OPERATOR_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(>=|<=|>|<|=|\^|~)\s+").expect("valid operator regex"));

/// Check whether `version` falls inside the npm `range`.
///
/// Returns `false` when either side fails to parse.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };
    VersionSpec::parse(range).is_some_and(|spec| spec.satisfies(&version))
}

/// Check a parsed version against an npm range.
pub fn satisfies_version(version: &Version, range: &str) -> bool {
    VersionSpec::parse(range).is_some_and(|spec| spec.satisfies(version))
}

/// Top-level version specification parser
/// Handles compound ranges (AND, OR) as well as simple ranges
#[derive(Debug)]
enum VersionSpec {
    /// Single range (^1.0.0, >=1.0.0, etc.)
    Single(VersionRange),
    /// AND of ranges (>=1.0.0 <2.0.0) - space-separated, all must satisfy
    And(Vec<VersionRange>),
    /// OR of specs (^1.0.0 || ^2.0.0) - any must satisfy
    Or(Vec<VersionSpec>),
}

impl VersionSpec {
    /// Parse a version specification string
    fn parse(spec: &str) -> Option<Self> {
        let spec = OPERATOR_GAP.replace_all(spec.trim(), "$1");
        let spec = spec.trim();

        // OR (||) has the lowest precedence
        if spec.contains("||") {
            let specs: Option<Vec<VersionSpec>> = spec
                .split("||")
                .map(Self::parse_and_or_single)
                .collect();
            return specs.map(VersionSpec::Or);
        }

        Self::parse_and_or_single(spec)
    }

    /// Parse a spec that may be AND (space-separated) or a single range
    fn parse_and_or_single(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        // An empty range (or an empty side of `||`) means any version
        if spec.is_empty() {
            return Some(VersionSpec::Single(VersionRange::Any));
        }

        if let Some(range) = VersionRange::parse_hyphen(spec) {
            return Some(VersionSpec::Single(range));
        }

        let parts: Vec<&str> = spec.split_whitespace().collect();
        if parts.len() > 1 {
            let ranges: Option<Vec<VersionRange>> =
                parts.into_iter().map(VersionRange::parse).collect();
            ranges.map(VersionSpec::And)
        } else {
            VersionRange::parse(spec).map(VersionSpec::Single)
        }
    }

    /// Check if a version satisfies this spec
    ///
    /// A prerelease version only matches a comparator set in which some
    /// comparator names a prerelease of the same `major.minor.patch`.
    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Single(range) => {
                range.satisfies(version)
                    && (version.pre.is_empty() || range.admits_prerelease(version))
            }
            VersionSpec::And(ranges) => {
                ranges.iter().all(|r| r.satisfies(version))
                    && (version.pre.is_empty() || ranges.iter().any(|r| r.admits_prerelease(version)))
            }
            VersionSpec::Or(specs) => specs.iter().any(|s| s.satisfies(version)),
        }
    }
}

/// Represents a parsed npm version range
#[derive(Debug)]
enum VersionRange {
    /// Exact version match
    Exact(Version),
    /// Caret range: ^1.2.3 means >=1.2.3 <2.0.0 (or special cases for 0.x)
    Caret(Version, Precision),
    /// Tilde range: ~1.2.3 means >=1.2.3 <1.3.0, ~1 means >=1.0.0 <2.0.0
    Tilde(Version, Precision),
    /// Greater than or equal
    Gte(Version),
    /// Greater than
    Gt(Version),
    /// Less than or equal
    Lte(Version),
    /// Less than
    Lt(Version),
    /// Any version: * matches all versions
    Any,
    /// Wildcard major: 1.x means >=1.0.0 <2.0.0
    WildcardMajor(u64),
    /// Wildcard minor: 1.2.x means >=1.2.0 <1.3.0
    WildcardMinor(u64, u64),
    /// Hyphen range: 1.0.0 - 2.0.0 means >=1.0.0 <=2.0.0
    Hyphen { from: Version, to: Box<VersionRange> },
}

impl VersionRange {
    /// Parse a single comparator into a VersionRange
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if let Some(rest) = spec.strip_prefix(">=") {
            parse_version(rest).map(VersionRange::Gte)
        } else if let Some(rest) = spec.strip_prefix('>') {
            // >1.2 means >=1.3.0
            let (v, precision) = parse_partial(rest)?;
            Some(match precision {
                Precision::Patch => VersionRange::Gt(v),
                _ => VersionRange::Gte(bump(&v, precision)),
            })
        } else if let Some(rest) = spec.strip_prefix("<=") {
            // <=1.2 means <1.3.0
            let (v, precision) = parse_partial(rest)?;
            Some(match precision {
                Precision::Patch => VersionRange::Lte(v),
                _ => VersionRange::Lt(bump(&v, precision)),
            })
        } else if let Some(rest) = spec.strip_prefix('<') {
            parse_version(rest).map(VersionRange::Lt)
        } else if let Some(rest) = spec.strip_prefix('^') {
            parse_partial(rest).map(|(v, p)| VersionRange::Caret(v, p))
        } else if let Some(rest) = spec.strip_prefix('~') {
            parse_partial(rest).map(|(v, p)| VersionRange::Tilde(v, p))
        } else if let Some(range) = Self::parse_wildcard(spec) {
            Some(range)
        } else {
            match parse_partial(spec)? {
                (v, Precision::Patch) => Some(VersionRange::Exact(v)),
                (v, Precision::Minor) => Some(VersionRange::WildcardMinor(v.major, v.minor)),
                (v, Precision::Major) => Some(VersionRange::WildcardMajor(v.major)),
            }
        }
    }

    /// Parse hyphen range like "1.0.0 - 2.0.0"
    fn parse_hyphen(spec: &str) -> Option<Self> {
        let (from, to) = spec.split_once(" - ")?;

        let from = parse_version(from.trim())?;
        let to = match parse_partial(to.trim())? {
            (v, Precision::Patch) => VersionRange::Lte(v),
            // 1.0.0 - 2 means <3.0.0
            (v, precision) => VersionRange::Lt(bump(&v, precision)),
        };

        Some(VersionRange::Hyphen {
            from,
            to: Box::new(to),
        })
    }

    /// Parse wildcard patterns like "*", "1.x", "1.2.x" or "1.x.x"
    fn parse_wildcard(spec: &str) -> Option<Self> {
        let spec = spec.strip_prefix('=').unwrap_or(spec);
        let parts: Vec<&str> = spec.split('.').collect();
        if parts.len() > 3 {
            return None;
        }

        // Everything after the first wildcard component must be a wildcard too
        let first_wild = parts.iter().position(|p| is_wildcard(p))?;
        if !parts[first_wild..].iter().all(|p| is_wildcard(p)) {
            return None;
        }

        match first_wild {
            0 => Some(VersionRange::Any),
            1 => parts[0].parse::<u64>().ok().map(VersionRange::WildcardMajor),
            _ => {
                let major = parts[0].parse::<u64>().ok()?;
                let minor = parts[1].parse::<u64>().ok()?;
                Some(VersionRange::WildcardMinor(major, minor))
            }
        }
    }

    /// Check if a version satisfies this range
    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionRange::Exact(v) => version == v,
            VersionRange::Caret(v, precision) => {
                if version < v {
                    return false;
                }
                // ^1.2.3 -> >=1.2.3 <2.0.0
                // ^0.2.3 -> >=0.2.3 <0.3.0
                // ^0.0.3 -> >=0.0.3 <0.0.4
                // ^0 -> <1.0.0, ^0.0 -> <0.1.0
                if v.major > 0 || *precision == Precision::Major {
                    version.major == v.major
                } else if v.minor > 0 || *precision == Precision::Minor {
                    version.major == 0 && version.minor == v.minor
                } else {
                    version.major == 0 && version.minor == 0 && version.patch == v.patch
                }
            }
            VersionRange::Tilde(v, precision) => {
                version >= v
                    && version.major == v.major
                    && (*precision == Precision::Major || version.minor == v.minor)
            }
            VersionRange::Gte(v) => version >= v,
            VersionRange::Gt(v) => version > v,
            VersionRange::Lte(v) => version <= v,
            VersionRange::Lt(v) => version < v,
            VersionRange::Any => true,
            VersionRange::WildcardMajor(major) => version.major == *major,
            VersionRange::WildcardMinor(major, minor) => {
                version.major == *major && version.minor == *minor
            }
            VersionRange::Hyphen { from, to } => version >= from && to.satisfies(version),
        }
    }

    /// Whether this comparator names a prerelease on the same release tuple
    fn admits_prerelease(&self, version: &Version) -> bool {
        let same_tuple = |v: &Version| {
            !v.pre.is_empty()
                && v.major == version.major
                && v.minor == version.minor
                && v.patch == version.patch
        };

        match self {
            VersionRange::Exact(v)
            | VersionRange::Caret(v, _)
            | VersionRange::Tilde(v, _)
            | VersionRange::Gte(v)
            | VersionRange::Gt(v)
            | VersionRange::Lte(v)
            | VersionRange::Lt(v) => same_tuple(v),
            VersionRange::Hyphen { from, to } => same_tuple(from) || to.admits_prerelease(version),
            VersionRange::Any | VersionRange::WildcardMajor(_) | VersionRange::WildcardMinor(..) => {
                false
            }
        }
    }
}

fn is_wildcard(part: &str) -> bool {
    part == "*" || part.eq_ignore_ascii_case("x")
}

/// Smallest version above everything a partial version covers (`1.2` -> `1.3.0`)
fn bump(version: &Version, precision: Precision) -> Version {
    match precision {
        Precision::Major => Version::new(version.major + 1, 0, 0),
        Precision::Minor => Version::new(version.major, version.minor + 1, 0),
        Precision::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0.0", "1.0.0", true)]
    #[case("1.0.1", "1.0.0", false)]
    #[case("1.0.0", "=1.0.0", true)]
    #[case("1.0.0", "v1.0.0", true)]
    fn satisfies_exact_match(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    // ^1.2.3 matches >=1.2.3 <2.0.0
    #[case("1.2.3", "^1.2.3", true)]
    #[case("1.9.9", "^1.2.3", true)]
    #[case("1.2.2", "^1.2.3", false)]
    #[case("2.0.0", "^1.2.3", false)]
    // ^0.2.3 matches >=0.2.3 <0.3.0
    #[case("0.2.9", "^0.2.3", true)]
    #[case("0.3.0", "^0.2.3", false)]
    // ^0.0.3 matches >=0.0.3 <0.0.4
    #[case("0.0.3", "^0.0.3", true)]
    #[case("0.0.4", "^0.0.3", false)]
    // partial carets
    #[case("18.2.0", "^18", true)]
    #[case("0.9.0", "^0", true)]
    #[case("1.0.0", "^0", false)]
    #[case("0.0.7", "^0.0", true)]
    #[case("0.1.0", "^0.0", false)]
    #[case("0.14.5", "^0.14", true)]
    #[case("0.15.0", "^0.14", false)]
    // x-range parts
    #[case("1.5.0", "^1.x", true)]
    #[case("2.0.0", "^1.x", false)]
    #[case("0.0.5", "^0.0.x", true)]
    #[case("0.1.0", "^0.0.x", false)]
    fn satisfies_caret_range(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.2.9", "~1.2.3", true)]
    #[case("1.3.0", "~1.2.3", false)]
    #[case("1.2.2", "~1.2.3", false)]
    #[case("1.2.9", "~1.2", true)]
    #[case("1.3.0", "~1.2", false)]
    #[case("1.9.0", "~1", true)]
    #[case("2.0.0", "~1", false)]
    #[case("1.2.5", "~1.2.x", true)]
    #[case("1.3.0", "~1.2.x", false)]
    fn satisfies_tilde_range(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.0.0", ">=1.0.0", true)]
    #[case("0.9.9", ">=1.0.0", false)]
    #[case("1.0.1", ">1.0.0", true)]
    #[case("1.0.0", ">1.0.0", false)]
    #[case("1.0.0", "<=1.0.0", true)]
    #[case("1.0.1", "<=1.0.0", false)]
    #[case("0.9.9", "<1.0.0", true)]
    #[case("1.0.0", "<1.0.0", false)]
    #[case("16.20.0", ">= 14", true)]
    #[case("1.2.9", ">1.2", false)]
    #[case("1.3.0", ">1.2", true)]
    #[case("1.2.9", "<=1.2", true)]
    #[case("1.3.0", "<=1.2", false)]
    #[case("2.0.0", ">=1.x", true)]
    #[case("0.9.0", ">=1.x", false)]
    #[case("14.0.0", ">= 12.x", true)]
    #[case("1.9.9", ">1.x", false)]
    #[case("2.0.0", ">1.x", true)]
    #[case("0.9.0", "<1.x", true)]
    fn satisfies_comparison_operators(
        #[case] version: &str,
        #[case] range: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.0.0", "*", true)]
    #[case("0.0.1", "", true)]
    #[case("4.2.0", "x", true)]
    #[case("1.9.9", "1.x", true)]
    #[case("2.0.0", "1.x", false)]
    #[case("1.5.0", "1.X", true)]
    #[case("1.5.0", "1.x.x", true)]
    #[case("1.2.9", "1.2.x", true)]
    #[case("1.3.0", "1.2.x", false)]
    #[case("1.7.0", "1", true)]
    #[case("2.0.0", "1", false)]
    #[case("1.2.5", "1.2", true)]
    #[case("1.3.0", "1.2", false)]
    fn satisfies_wildcards(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.5.0", "^1.0.0 || ^2.0.0", true)]
    #[case("2.5.0", "^1.0.0 || ^2.0.0", true)]
    #[case("3.0.0", "^1.0.0 || ^2.0.0", false)]
    #[case("1.2.0", ">=1.0.0 <1.5.0 || >=2.0.0", true)]
    #[case("1.6.0", ">=1.0.0 <1.5.0 || >=2.0.0", false)]
    #[case("17.0.2", "^16.8.0 || ^17.0.0 || ^18.0.0", true)]
    #[case("17.0.2", "^16.x || ^17.x", true)]
    #[case("8.57.0", "^7.x || ^8.x", true)]
    #[case("9.0.0", "^7.x || ^8.x", false)]
    fn satisfies_or_range(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.5.0", ">=1.0.0 <2.0.0", true)]
    #[case("2.0.0", ">=1.0.0 <2.0.0", false)]
    #[case("2.0.0", ">1.0.0 <=2.0.0", true)]
    #[case("1.0.0", ">1.0.0 <=2.0.0", false)]
    #[case("1.5.0", ">= 1.0.0 < 2.0.0", true)]
    fn satisfies_and_range(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("1.0.0", "1.0.0 - 2.0.0", true)]
    #[case("2.0.0", "1.0.0 - 2.0.0", true)]
    #[case("2.0.1", "1.0.0 - 2.0.0", false)]
    #[case("0.9.9", "1.0.0 - 2.0.0", false)]
    #[case("2.9.0", "1.0.0 - 2", true)]
    #[case("3.0.0", "1.0.0 - 2", false)]
    #[case("2.5.0", "1.0.0 - 2.x", true)]
    #[case("3.0.0", "1.0.0 - 2.x", false)]
    #[case("1.0.0", "1.x - 2.0.0", true)]
    fn satisfies_hyphen_range(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("2.0.0-beta.1", "^1.0.0 || ^2.0.0", false)]
    #[case("2.0.0-beta.1", ">=2.0.0-alpha", true)]
    #[case("2.1.0-beta.1", ">=2.0.0-alpha", false)]
    #[case("2.0.0-rc.1", "*", false)]
    fn satisfies_prerelease(#[case] version: &str, #[case] range: &str, #[case] expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }

    #[rstest]
    #[case("not-a-version", "^1.0.0")]
    #[case("1.0.0", "latest")]
    #[case("1.0.0", "workspace:*")]
    #[case("1.0.0", "^^1")]
    #[case("", "*")]
    fn satisfies_is_false_on_unparseable_input(#[case] version: &str, #[case] range: &str) {
        assert!(!satisfies(version, range));
    }
}
