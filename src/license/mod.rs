use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};

use crate::environment::InstalledPackage;

/// File names treated as license texts.
pub const LICENSE_PATTERNS: &[&str] = &["LICEN[CS]E*", "COPYING*"];

/// Default marker identifying copyleft licenses.
pub const COPYLEFT_MARKER: &str = "GPL";

/// Where the collected license of `package_name` is written.
pub fn license_file_path(output_dir: &Path, package_name: &str) -> PathBuf {
    output_dir.join(format!("{}.LICENSE", package_name))
}

/// Whether the declared license string contains the copyleft marker.
pub fn is_copyleft(license: Option<&str>, marker: &str) -> bool {
    license.map_or(false, |license| license.contains(marker))
}

/// Extensions a license text may carry inside an import package.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "rst"];

/// Code never taken for a license text, whatever its name.
const CODE_EXTENSIONS: &[&str] = &["py", "pyc", "pyo", "pyi", "pyd", "so", "dll", "dylib"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    /// Top level of a `.dist-info` / `.egg-info` directory
    Metadata,
    /// PEP 639 `licenses/` tree, searched recursively
    LicensesTree,
    /// An import package, where only plain text files count
    ImportPackage,
}

fn metadata_dirs(metadata_dir: &Path) -> Vec<(PathBuf, Scope)> {
    if !metadata_dir.is_dir() {
        return Vec::new();
    }
    vec![
        (metadata_dir.to_path_buf(), Scope::Metadata),
        (metadata_dir.join("licenses"), Scope::LicensesTree),
    ]
}

/// Directories searched for license files of an installed package: the
/// metadata directory, its `licenses/` tree and the import packages.
fn search_dirs(package: &InstalledPackage) -> Vec<(PathBuf, Scope)> {
    let mut dirs = metadata_dirs(&package.metadata_dir);

    let import_names = if package.top_level.is_empty() {
        vec![package.name.replace('-', "_").to_lowercase()]
    } else {
        package.top_level.clone()
    };
    for import_name in import_names {
        dirs.push((package.location.join(import_name), Scope::ImportPackage));
    }

    dirs
}

fn accepts(path: &Path, scope: Scope) -> bool {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some(ext) if CODE_EXTENSIONS.contains(&ext) => false,
        Some(ext) if scope == Scope::ImportPackage => TEXT_EXTENSIONS.contains(&ext),
        _ => true,
    }
}

fn search(dirs: &[(PathBuf, Scope)]) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    for (dir, scope) in dirs {
        if !dir.is_dir() {
            continue;
        }

        let base = Pattern::escape(&dir.to_string_lossy());
        for file_pattern in LICENSE_PATTERNS {
            let pattern = if *scope == Scope::LicensesTree {
                format!("{}/**/{}", base, file_pattern)
            } else {
                format!("{}/{}", base, file_pattern)
            };

            let paths = glob_with(&pattern, options)
                .with_context(|| format!("Invalid license search pattern: {}", pattern))?;
            for path in paths {
                let path = path.with_context(|| format!("Failed to search {}", dir.display()))?;
                if path.is_file() && accepts(&path, *scope) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Find every license file shipped alongside an installed package. When the
/// package itself ships none, the metadata of shadowed older installs is
/// searched instead.
pub fn find_license_files(package: &InstalledPackage) -> Result<Vec<PathBuf>> {
    let files = search(&search_dirs(package))?;
    if !files.is_empty() {
        return Ok(files);
    }

    let shadowed: Vec<(PathBuf, Scope)> = package
        .shadowed_metadata_dirs
        .iter()
        .flat_map(|dir| metadata_dirs(dir))
        .collect();
    search(&shadowed)
}

/// Concatenate `files` into `dest`, keeping each text on its own lines.
pub fn write_concatenated(files: &[PathBuf], dest: &Path) -> Result<()> {
    let mut content = Vec::new();
    for file in files {
        let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(&bytes);
    }

    fs::write(dest, content).with_context(|| format!("Failed to write {}", dest.display()))
}

/// Copy the package's local license files into the output directory.
///
/// Returns the written path together with the source files, or `None` when
/// the package ships no license file.
pub fn collect_local_license(
    package: &InstalledPackage,
    output_dir: &Path,
) -> Result<Option<(PathBuf, Vec<PathBuf>)>> {
    let files = find_license_files(package)?;
    if files.is_empty() {
        return Ok(None);
    }

    let dest = license_file_path(output_dir, &package.name);
    write_concatenated(&files, &dest)?;
    Ok(Some((dest, files)))
}
