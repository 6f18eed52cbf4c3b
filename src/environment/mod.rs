use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub mod metadata;

pub use metadata::{parse_metadata_content, Metadata};

/// A package found in the inspected environment.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Option<String>,
    /// Directory the package is installed into (site-packages)
    pub location: PathBuf,
    /// The `.dist-info` / `.egg-info` entry the package was read from
    pub metadata_dir: PathBuf,
    pub license: Option<String>,
    pub homepage: Option<String>,
    /// Import names from `top_level.txt`, if the metadata ships one
    pub top_level: Vec<String>,
    /// Metadata entries of older installs of the same project
    pub shadowed_metadata_dirs: Vec<PathBuf>,
}

impl InstalledPackage {
    /// `name==version` requirement for the package manager.
    pub fn requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Resolve the site-packages directory to inspect.
///
/// An explicit path may point at site-packages itself, at a directory that
/// contains one, or at a virtualenv root. Without a path, `.venv` in the
/// current directory is tried before asking the interpreter.
pub fn find_site_packages_path(path: Option<&Path>, python: &str) -> Result<PathBuf> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("Site-packages path does not exist: {}", path.display());
        }
        if path.join("site-packages").is_dir() {
            return Ok(path.join("site-packages"));
        }
        if let Some(site_packages) = venv_site_packages(path)? {
            return Ok(site_packages);
        }
        return Ok(path.to_path_buf());
    }

    let venv_path = std::env::current_dir()?.join(".venv");
    if venv_path.exists() {
        if let Some(site_packages) = venv_site_packages(&venv_path)? {
            return Ok(site_packages);
        }
    }

    interpreter_site_packages(python)
}

fn venv_site_packages(venv_path: &Path) -> Result<Option<PathBuf>> {
    // Unix-like systems
    let lib_path = venv_path.join("lib");
    if lib_path.is_dir() {
        for entry in fs::read_dir(&lib_path)
            .with_context(|| format!("Failed to read {}", lib_path.display()))?
        {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with("python") {
                let site_packages = entry.path().join("site-packages");
                if site_packages.is_dir() {
                    return Ok(Some(site_packages));
                }
            }
        }
    }

    // Windows
    let lib_path = venv_path.join("Lib").join("site-packages");
    if lib_path.is_dir() {
        return Ok(Some(lib_path));
    }

    Ok(None)
}

fn interpreter_site_packages(python: &str) -> Result<PathBuf> {
    let output = Command::new(python)
        .args(["-c", "import sysconfig; print(sysconfig.get_paths()['purelib'])"])
        .output()
        .with_context(|| {
            format!(
                "Could not find site-packages directory and failed to run '{}'. Please specify with --site-packages",
                python
            )
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "'{}' could not report its site-packages directory: {}",
            python,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    if !path.is_dir() {
        anyhow::bail!("Site-packages directory reported by '{}' does not exist: {}", python, path.display());
    }
    Ok(path)
}

/// Enumerate every installed package in a site-packages directory, ordered
/// by name.
///
/// A project with several metadata entries (a stale install left next to a
/// newer one) is reported once, as its highest version.
pub fn enumerate_installed(site_packages_path: &Path) -> Result<Vec<InstalledPackage>> {
    let mut packages = Vec::new();

    let entries = fs::read_dir(site_packages_path)
        .with_context(|| format!("Failed to read {}", site_packages_path.display()))?;
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let name_str = file_name.to_string_lossy();

        let package = if name_str.ends_with(".dist-info") {
            read_package(site_packages_path, &entry.path(), ".dist-info", "METADATA")?
        } else if name_str.ends_with(".egg-info") {
            read_package(site_packages_path, &entry.path(), ".egg-info", "PKG-INFO")?
        } else {
            None
        };

        if let Some(package) = package {
            packages.push(package);
        }
    }

    packages.sort_by(|a, b| {
        normalize_name(&a.name)
            .cmp(&normalize_name(&b.name))
            .then_with(|| compare_versions(a.version.as_deref(), b.version.as_deref()))
            .then_with(|| a.metadata_dir.cmp(&b.metadata_dir))
    });

    let mut deduped: Vec<InstalledPackage> = Vec::with_capacity(packages.len());
    for package in packages {
        match deduped.last_mut() {
            Some(kept) if normalize_name(&kept.name) == normalize_name(&package.name) => {
                // Sorted ascending, so the later entry is the newer one
                let older = std::mem::replace(kept, package);
                eprintln!(
                    "Warning: {} is installed more than once; using {} and ignoring {}",
                    kept.name,
                    kept.metadata_dir.display(),
                    older.metadata_dir.display()
                );
                kept.shadowed_metadata_dirs.extend(older.shadowed_metadata_dirs);
                kept.shadowed_metadata_dirs.push(older.metadata_dir);
            }
            _ => deduped.push(package),
        }
    }

    Ok(deduped)
}

/// PEP 503 style name comparison key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '-' | '_' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Compare dotted versions segment by segment, numerically where both
/// segments are numbers.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (a, b) => return a.is_some().cmp(&b.is_some()),
    };

    let mut left = a.split(['.', '-', '+']);
    let mut right = b.split(['.', '-', '+']);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn read_package(
    location: &Path,
    info_path: &Path,
    suffix: &str,
    metadata_file: &str,
) -> Result<Option<InstalledPackage>> {
    // Old setuptools installs write a bare PKG-INFO file named `*.egg-info`
    let metadata_path = if info_path.is_dir() {
        info_path.join(metadata_file)
    } else {
        info_path.to_path_buf()
    };
    if !metadata_path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&metadata_path)
        .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
    let metadata = parse_metadata_content(&content);

    let (dir_name, dir_version) = parse_name_version(info_path, suffix)?;
    let top_level = read_top_level(info_path)?;

    Ok(Some(InstalledPackage {
        name: metadata.name.clone().unwrap_or(dir_name),
        version: metadata.version.clone().or(dir_version),
        location: location.to_path_buf(),
        metadata_dir: info_path.to_path_buf(),
        license: metadata.declared_license(),
        homepage: metadata.declared_homepage(),
        top_level,
        shadowed_metadata_dirs: Vec::new(),
    }))
}

fn parse_name_version(info_path: &Path, suffix: &str) -> Result<(String, Option<String>)> {
    let file_name = info_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid metadata directory name: {}", info_path.display()))?;

    let name_version = file_name
        .strip_suffix(suffix)
        .ok_or_else(|| anyhow::anyhow!("Invalid metadata directory name: {}", file_name))?;

    // egg-info names may carry a python tag: name-1.0-py3.11
    let mut parts = name_version.splitn(3, '-');
    let name = parts.next().unwrap_or(name_version).to_string();
    let version = parts.next().map(str::to_string);
    Ok((name, version))
}

fn read_top_level(info_path: &Path) -> Result<Vec<String>> {
    let top_level_path = info_path.join("top_level.txt");
    if !top_level_path.is_file() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&top_level_path)
        .with_context(|| format!("Failed to read {}", top_level_path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
