use semver::Version;

/// How many components a version string actually spelled out.
///
/// npm treats `1` and `1.2` as ranges (`1.x`, `1.2.x`) rather than exact
/// versions, so the matcher needs to know which parts were omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Major,
    Minor,
    Patch,
}

/// Strip the decorations npm tolerates in front of a version (`v1.2.3`, `=1.2.3`).
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    let version = version.strip_prefix('=').unwrap_or(version).trim_start();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros and
/// strips a leading `v` or `=`.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    parse_partial(version).map(|(version, _)| version)
}

/// Like [`parse_version`], but also reports which components were present.
pub fn parse_partial(version: &str) -> Option<(Version, Precision)> {
    let version = normalize_version(version);
    if version.is_empty() {
        return None;
    }

    // Pre-release and build suffixes only make sense on a full version
    let core_end = version.find(['-', '+']).unwrap_or(version.len());
    let mut parts: Vec<&str> = version[..core_end].split('.').collect();

    // `1.x` and `1.2.*` spell out the same thing as `1` and `1.2`
    if let Some(first_wild) = parts.iter().position(|p| is_wildcard_part(p)) {
        if first_wild == 0
            || core_end != version.len()
            || !parts[first_wild..].iter().all(|p| is_wildcard_part(p))
        {
            return None;
        }
        parts.truncate(first_wild);
    }

    let (normalized, precision) = match parts.len() {
        1 if core_end == version.len() => (format!("{}.0.0", parts[0]), Precision::Major),
        2 if core_end == version.len() => (
            format!("{}.{}.0", parts[0], parts[1]),
            Precision::Minor,
        ),
        _ => (version.to_string(), Precision::Patch),
    };
    Version::parse(&normalized).ok().map(|v| (v, precision))
}

fn is_wildcard_part(part: &str) -> bool {
    part == "*" || part.eq_ignore_ascii_case("x")
}

/// Major component of a version string, `None` when it does not parse.
pub fn major(version: &str) -> Option<u64> {
    parse_version(version).map(|v| v.major)
}
