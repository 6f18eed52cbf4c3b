use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
    pub binary_path: String,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let binary_path = env!("CARGO_BIN_EXE_py-license-collector").to_string();
        fs::create_dir_all(dir.path().join("site-packages")).expect("Failed to create site-packages");

        Self { dir, binary_path }
    }

    pub fn site_packages(&self) -> PathBuf {
        self.dir.path().join("site-packages")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("licenses")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.path().join("registry.csv")
    }

    pub fn write_registry(&self, content: &str) {
        fs::write(self.registry_path(), content).expect("Failed to write registry");
    }

    /// Install a fake package by writing its `.dist-info` metadata.
    pub fn install_package(&self, name: &str, version: &str, extra_metadata: &str, license_text: Option<&str>) {
        let dist_info = self.site_packages().join(format!("{}-{}.dist-info", name.replace('-', "_"), version));
        fs::create_dir_all(&dist_info).expect("Failed to create dist-info");
        fs::write(
            dist_info.join("METADATA"),
            format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n{}", name, version, extra_metadata),
        )
        .expect("Failed to write METADATA");

        if let Some(text) = license_text {
            fs::write(dist_info.join("LICENSE"), text).expect("Failed to write LICENSE");
        }
    }

    pub fn run_collector(&self, args: &[&str]) -> Output {
        let registry = self.registry_path();
        let output_dir = self.output_dir();
        let site_packages = self.site_packages();

        Command::new(&self.binary_path)
            .arg(&registry)
            .arg(&output_dir)
            .arg("--site-packages")
            .arg(&site_packages)
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run py-license-collector")
    }
}
