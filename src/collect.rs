use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveSources, SOURCE_DIR};
use crate::environment::InstalledPackage;
use crate::fetch::{guess_license_url, Fetch, DEFAULT_BRANCH, DEFAULT_LICENSE_FILE};
use crate::license::{collect_local_license, is_copyleft, license_file_path, COPYLEFT_MARKER};
use crate::output::Progress;
use crate::registry::Registry;

/// How a package's license was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Copied from files installed with the package
    Local,
    /// Downloaded from the registry URL
    Registry,
    /// Downloaded from a location guessed from the homepage
    Guessed,
    Missing,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub branch: String,
    pub license_file: String,
    pub copyleft_marker: String,
    pub archive_sources: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            license_file: DEFAULT_LICENSE_FILE.to_string(),
            copyleft_marker: COPYLEFT_MARKER.to_string(),
            archive_sources: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResolution {
    pub name: String,
    pub version: Option<String>,
    pub license: Option<String>,
    pub outcome: Outcome,
    pub copyleft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,
    /// Registry or guessed URL the license was downloaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub total_packages: usize,
    pub local: usize,
    pub registry: usize,
    pub guessed: usize,
    pub missing: usize,
    pub copyleft: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub generated_at: DateTime<Utc>,
    pub registry: String,
    pub output_dir: PathBuf,
    pub packages: Vec<PackageResolution>,
    /// Packages left without a license, in enumeration order
    pub missing: Vec<String>,
    pub summary: CollectionSummary,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    #[cfg(test)]
    pub fn package(&self, name: &str) -> Option<&PackageResolution> {
        self.packages.iter().find(|p| p.name == name)
    }
}

/// Accumulators of a single run. Each is filled by one stage and only read
/// by the stages after it.
#[derive(Debug, Default)]
struct Collection {
    installed: IndexMap<String, InstalledPackage>,
    gpl: IndexSet<String>,
    remote: IndexSet<String>,
    not_registered: IndexSet<String>,
    missing: IndexSet<String>,
    resolved: IndexMap<String, (Outcome, PathBuf, Option<String>)>,
    archived: IndexMap<String, PathBuf>,
}

/// Resolve a license for every installed package and archive the sources of
/// copyleft packages.
///
/// A failed registry download aborts the run with an error. Packages that
/// end up without a license are listed in the returned report instead.
pub fn collect(
    packages: &[InstalledPackage],
    registry: &Registry,
    output_dir: &Path,
    fetcher: &dyn Fetch,
    archiver: &dyn ArchiveSources,
    options: &CollectOptions,
    progress: &Progress,
) -> Result<CollectionReport> {
    let source_root = output_dir.join(SOURCE_DIR);
    fs::create_dir_all(&source_root)
        .with_context(|| format!("Failed to create {}", source_root.display()))?;

    let mut collection = Collection::default();
    for package in packages {
        collection.installed.insert(package.name.clone(), package.clone());
    }

    // Local license files, copyleft detection
    for package in collection.installed.values() {
        match collect_local_license(package, output_dir)? {
            Some((dest, files)) => {
                progress.step(format!("Copied local license for {}", package.name));
                for file in &files {
                    progress.detail(format!("  {}", file.display()));
                }
                collection
                    .resolved
                    .insert(package.name.clone(), (Outcome::Local, dest, None));
            }
            None => {
                progress.detail(format!("No local license file for {}", package.name));
                collection.remote.insert(package.name.clone());
            }
        }

        if is_copyleft(package.license.as_deref(), &options.copyleft_marker) {
            collection.gpl.insert(package.name.clone());
        }
    }

    // Registry downloads
    let (registered, not_registered) = registry.partition(&collection.remote);
    collection.not_registered = not_registered;
    for (name, entry) in registered {
        progress.step(format!(
            "Downloading {} license for {} from {}",
            entry.license_type, name, entry.license_url
        ));
        let body = fetcher
            .fetch(&entry.license_url)
            .with_context(|| format!("Failed to download the registered license of {}", name))?;

        let dest = license_file_path(output_dir, &name);
        fs::write(&dest, body).with_context(|| format!("Failed to write {}", dest.display()))?;
        collection
            .resolved
            .insert(name, (Outcome::Registry, dest, Some(entry.license_url.clone())));
    }

    // Guessed downloads for packages the registry does not know
    for name in &collection.not_registered {
        let guessed_url = collection
            .installed
            .get(name)
            .and_then(|package| package.homepage.as_deref())
            .and_then(|homepage| guess_license_url(homepage, &options.branch, &options.license_file));

        let Some(url) = guessed_url else {
            progress.detail(format!("No repository homepage to guess a license for {}", name));
            collection.missing.insert(name.clone());
            continue;
        };

        progress.step(format!("Guessing license for {} from {}", name, url));
        match fetcher.fetch(&url) {
            Ok(body) => {
                let dest = license_file_path(output_dir, name);
                fs::write(&dest, body).with_context(|| format!("Failed to write {}", dest.display()))?;
                collection
                    .resolved
                    .insert(name.clone(), (Outcome::Guessed, dest, Some(url)));
            }
            Err(err) => {
                progress.warn(format!("Could not guess license for {}: {:#}", name, err));
                collection.missing.insert(name.clone());
            }
        }
    }

    // Copyleft source archival
    for name in &collection.gpl {
        let Some(package) = collection.installed.get(name) else {
            continue;
        };
        if !options.archive_sources {
            progress.step(format!("Skipping source archival for {}", package.requirement()));
            continue;
        }

        let dest = source_root.join(&package.name);
        progress.step(format!("Archiving sources of {} into {}", package.requirement(), dest.display()));
        archiver.archive(package, &dest)?;
        collection.archived.insert(name.clone(), dest);
    }

    Ok(build_report(collection, registry, output_dir))
}

fn build_report(collection: Collection, registry: &Registry, output_dir: &Path) -> CollectionReport {
    let mut summary = CollectionSummary {
        total_packages: collection.installed.len(),
        copyleft: collection.gpl.len(),
        ..Default::default()
    };

    let mut packages = Vec::with_capacity(collection.installed.len());
    for (name, package) in &collection.installed {
        let (outcome, license_file, source_url) = match collection.resolved.get(name) {
            Some((outcome, path, url)) => (*outcome, Some(path.clone()), url.clone()),
            None => (Outcome::Missing, None, None),
        };

        match outcome {
            Outcome::Local => summary.local += 1,
            Outcome::Registry => summary.registry += 1,
            Outcome::Guessed => summary.guessed += 1,
            Outcome::Missing => summary.missing += 1,
        }

        packages.push(PackageResolution {
            name: name.clone(),
            version: package.version.clone(),
            license: package.license.clone(),
            outcome,
            copyleft: collection.gpl.contains(name),
            license_file,
            source_url,
            source_dir: collection.archived.get(name).cloned(),
        });
    }

    CollectionReport {
        generated_at: Utc::now(),
        registry: registry.origin().to_string(),
        output_dir: output_dir.to_path_buf(),
        packages,
        missing: collection.missing.into_iter().collect(),
        summary,
    }
}
