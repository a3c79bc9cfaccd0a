//! Report rendering for the terminal and for machines

use std::fmt;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::checker::{CheckReport, Issue, Severity, Summary};
use crate::graph::{GraphStats, ROOT};
use crate::version::types::RegistryEntry;

/// Shape of `--format json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    issues: &'a [Issue],
    summary: Summary,
    stats: GraphStats,
}

pub fn render_json(report: &CheckReport, stats: &GraphStats) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        issues: report.issues(),
        summary: report.summary(),
        stats: *stats,
    })
}

fn severity_marker(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✖".red().bold(),
        Severity::Warning => "⚠".yellow().bold(),
        Severity::Info => "ℹ".blue(),
    }
}

fn heading(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "Errors".red().bold(),
        Severity::Warning => "Warnings".yellow().bold(),
        Severity::Info => "Info".blue().bold(),
    }
}

fn write_issue(f: &mut fmt::Formatter<'_>, issue: &Issue) -> fmt::Result {
    writeln!(
        f,
        "  {} {} {}",
        severity_marker(issue.severity),
        issue.package.bold(),
        format!("[{}]", issue.type_name()).dimmed()
    )?;
    writeln!(f, "    {}", issue.message)?;
    if let Some(fix) = &issue.fix {
        writeln!(f, "    {} {}", "fix:".green(), fix)?;
    }
    Ok(())
}

/// Human-readable report, issues grouped by severity
struct TerminalReport<'a> {
    report: &'a CheckReport,
    stats: &'a GraphStats,
}

impl fmt::Display for TerminalReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.is_empty() {
            writeln!(f, "{} No compatibility issues found", "✔".green().bold())?;
        } else {
            let grouped = self.report.by_severity();
            for (severity, issues) in [
                (Severity::Error, &grouped.error),
                (Severity::Warning, &grouped.warning),
                (Severity::Info, &grouped.info),
            ] {
                if issues.is_empty() {
                    continue;
                }
                writeln!(f, "{} ({})", heading(severity), issues.len())?;
                for issue in issues {
                    write_issue(f, issue)?;
                }
                writeln!(f)?;
            }

            let summary = self.report.summary();
            writeln!(
                f,
                "Found {} issues: {} errors, {} warnings, {} info",
                summary.total.to_string().bold(),
                summary.errors.to_string().red(),
                summary.warnings.to_string().yellow(),
                summary.info.to_string().blue()
            )?;
        }

        writeln!(
            f,
            "Packages: {} total, {} direct, {} transitive",
            self.stats.total_packages,
            self.stats.direct_dependencies,
            self.stats.transitive_dependencies
        )
    }
}

pub fn render_terminal(report: &CheckReport, stats: &GraphStats) -> String {
    TerminalReport { report, stats }.to_string()
}

fn display_name(name: &str) -> &str {
    if name == ROOT { "(project)" } else { name }
}

/// Dependency paths to one package plus its direct dependents
struct PathsView<'a> {
    package: &'a str,
    paths: &'a [Vec<String>],
    dependents: &'a [&'a str],
}

impl fmt::Display for PathsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paths.is_empty() {
            writeln!(f, "No dependency path to {} found", self.package.bold())?;
        } else {
            writeln!(f, "{} path(s) to {}:", self.paths.len(), self.package.bold())?;
            for path in self.paths {
                let hops: Vec<&str> = path.iter().map(|name| display_name(name)).collect();
                writeln!(f, "  {}", hops.join(" → "))?;
            }
        }

        if !self.dependents.is_empty() {
            let names: Vec<&str> = self.dependents.iter().map(|name| display_name(name)).collect();
            writeln!(f, "Required directly by: {}", names.join(", "))?;
        }
        Ok(())
    }
}

pub fn render_paths(package: &str, paths: &[Vec<String>], dependents: &[&str]) -> String {
    PathsView {
        package,
        paths,
        dependents,
    }
    .to_string()
}

/// Registry summary for one package
struct EntryView<'a>(&'a RegistryEntry);

impl fmt::Display for EntryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.0;
        let latest = entry.latest.as_deref().or(entry.versions.last().map(String::as_str));

        writeln!(
            f,
            "{} {}",
            entry.name.bold(),
            latest.unwrap_or("(no versions)").green()
        )?;
        writeln!(f, "  versions: {}", entry.versions.len())?;

        if entry.is_latest_deprecated()
            && let Some(message) = latest.and_then(|latest| entry.deprecation(latest))
        {
            writeln!(f, "  {} {}", "deprecated:".yellow().bold(), message)?;
        } else if !entry.deprecated.is_empty() {
            writeln!(f, "  deprecated versions: {}", entry.deprecated.len())?;
        }

        for (label, map) in [("peers", &entry.peer_dependencies), ("engines", &entry.engines)] {
            if map.is_empty() {
                continue;
            }
            let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}@{v}")).collect();
            writeln!(f, "  {}: {}", label, pairs.join(", "))?;
        }
        Ok(())
    }
}

pub fn render_entry(entry: &RegistryEntry) -> String {
    EntryView(entry).to_string()
}
