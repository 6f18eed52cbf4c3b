use std::fmt::Display;

use crate::collect::{CollectionReport, Outcome, PackageResolution};

/// Progress reporting on stdout, warnings on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    quiet: bool,
    verbose: bool,
    to_stderr: bool,
}

impl Progress {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            to_stderr: false,
        }
    }

    /// Route progress lines to stderr, keeping stdout for machine output.
    pub fn on_stderr(self) -> Self {
        Self {
            to_stderr: true,
            ..self
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// A resolution action.
    pub fn step(&self, message: impl Display) {
        if !self.quiet {
            self.emit(message);
        }
    }

    /// Shown with --verbose only.
    pub fn detail(&self, message: impl Display) {
        if self.verbose && !self.quiet {
            self.emit(message);
        }
    }

    fn emit(&self, message: impl Display) {
        if self.to_stderr {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("Warning: {}", message);
        }
    }
}

pub fn format_table_output(report: &CollectionReport, verbose: bool) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str(&format!("📦 License Collection ({} packages)\n", summary.total_packages));
    output.push_str(&format!(
        "✅ {} local  🌐 {} registry  🔎 {} guessed  ❌ {} missing  ⚖️ {} copyleft\n\n",
        summary.local, summary.registry, summary.guessed, summary.missing, summary.copyleft
    ));

    if verbose {
        output.push_str("📦 All Packages:\n");
        let all: Vec<&PackageResolution> = report.packages.iter().collect();
        output.push_str(&format_package_table(&all));
    } else {
        // Only packages needing attention
        let notable: Vec<&PackageResolution> = report
            .packages
            .iter()
            .filter(|p| p.outcome == Outcome::Missing || p.copyleft)
            .collect();
        if notable.is_empty() {
            output.push_str("✅ Every package has a license file\n");
        } else {
            output.push_str("⚠️  Needs attention:\n");
            output.push_str(&format_package_table(&notable));
        }

        if report.packages.len() > notable.len() {
            output.push_str(&format!(
                "\n💡 Run with --verbose to see all {} packages\n",
                report.packages.len()
            ));
        }
    }

    output.push_str(&format!("\nLicenses written to {}\n", report.output_dir.display()));
    output
}

fn format_package_table(packages: &[&PackageResolution]) -> String {
    if packages.is_empty() {
        return "No packages found.\n".to_string();
    }

    let mut output = String::new();

    output.push_str("┌─────────────────┬─────────┬─────────────┬──────────┬──────────┐\n");
    output.push_str("│ Package         │ Version │ License     │ Source   │ Copyleft │\n");
    output.push_str("├─────────────────┼─────────┼─────────────┼──────────┼──────────┤\n");

    for package in packages {
        let name = truncate(&package.name, 15);
        let version = truncate(package.version.as_deref().unwrap_or("unknown"), 7);
        let license = truncate(package.license.as_deref().unwrap_or("(unknown)"), 11);
        let source = outcome_label(package.outcome);
        let copyleft = if package.copyleft {
            if package.source_dir.is_some() { "archived" } else { "yes" }
        } else {
            ""
        };

        output.push_str(&format!(
            "│ {:<15} │ {:<7} │ {:<11} │ {:<8} │ {:<8} │\n",
            name, version, license, source, copyleft
        ));
    }

    output.push_str("└─────────────────┴─────────┴─────────────┴──────────┴──────────┘\n");
    output
}

/// Missing-package listing printed before a failing exit.
pub fn format_missing(report: &CollectionReport) -> String {
    let mut output = format!("❌ No license found for {} packages:\n", report.missing.len());
    for name in &report.missing {
        output.push_str(&format!("  - {}\n", name));
    }
    output.push_str(&format!(
        "Add 'package_name,license_url,license_type' entries for them to {}\n",
        report.registry
    ));
    output
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Local => "local",
        Outcome::Registry => "registry",
        Outcome::Guessed => "guessed",
        Outcome::Missing => "MISSING",
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{}…", head)
    }
}
