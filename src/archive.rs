use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use crate::environment::InstalledPackage;

/// Subdirectory of the output directory holding archived sources.
pub const SOURCE_DIR: &str = "source";

/// Places the full source distribution of a package into a directory.
pub trait ArchiveSources {
    fn archive(&self, package: &InstalledPackage, dest: &Path) -> Result<()>;
}

/// Archives sources with `<python> -m pip install --no-binary :all:`.
pub struct PipArchiver {
    python: String,
}

impl PipArchiver {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn command(&self, package: &InstalledPackage, dest: &Path) -> Command {
        let mut command = Command::new(&self.python);
        command
            .args(["-m", "pip", "install", "--no-deps", "--no-binary", ":all:", "--target"])
            .arg(dest)
            .arg(package.requirement());
        command
    }
}

impl ArchiveSources for PipArchiver {
    fn archive(&self, package: &InstalledPackage, dest: &Path) -> Result<()> {
        let status = self
            .command(package, dest)
            .status()
            .with_context(|| format!("Failed to run '{} -m pip'", self.python))?;

        if !status.success() {
            anyhow::bail!(
                "pip could not archive sources of {} into {} ({})",
                package.requirement(),
                dest.display(),
                status
            );
        }
        Ok(())
    }
}
