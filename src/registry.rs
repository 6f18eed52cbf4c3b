use anyhow::{Context, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One line of the registry CSV: `name,license_url,license_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub license_url: String,
    pub license_type: String,
}

/// User-maintained list of packages whose license has to be downloaded.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    origin: String,
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read registry file: {}", path_ref.display()))?;

        Self::parse(&content, &path_ref.display().to_string())
    }

    /// Parse unheaded CSV. Fields are split on every comma; quoting is not
    /// supported.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 || fields[0].is_empty() || fields[1].is_empty() {
                anyhow::bail!(
                    "{}:{}: expected 'package_name,license_url,license_type', got '{}'",
                    origin,
                    index + 1,
                    line
                );
            }

            entries.push(RegistryEntry {
                name: fields[0].to_string(),
                license_url: fields[1].to_string(),
                license_type: fields[2].to_string(),
            });
        }

        Ok(Self {
            origin: origin.to_string(),
            entries,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Case-insensitive lookup; the first matching line wins.
    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        let wanted = name.to_lowercase();
        self.entries.iter().find(|entry| entry.name.to_lowercase() == wanted)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Split packages needing remote resolution into registered ones (paired
    /// with their entry, in registry order) and the rest (in input order).
    pub fn partition<'a>(
        &'a self,
        remote: &IndexSet<String>,
    ) -> (Vec<(String, &'a RegistryEntry)>, IndexSet<String>) {
        let mut registered = Vec::new();
        let mut seen = IndexSet::new();

        for entry in &self.entries {
            let key = entry.name.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            if let Some(package) = remote.iter().find(|name| name.to_lowercase() == key) {
                seen.insert(key);
                registered.push((package.clone(), entry));
            }
        }

        let not_registered = remote
            .iter()
            .filter(|name| !seen.contains(&name.to_lowercase()))
            .cloned()
            .collect();

        (registered, not_registered)
    }
}
