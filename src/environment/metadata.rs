/// Core metadata fields read from a `METADATA` or `PKG-INFO` header block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub license_expression: Option<String>,
    pub license_classifiers: Vec<String>,
    pub home_page: Option<String>,
    pub project_urls: Vec<(String, String)>,
}

impl Metadata {
    /// License string as a package manager would show it: `License`, then
    /// `License-Expression`, then the name carried by a license classifier.
    pub fn declared_license(&self) -> Option<String> {
        if let Some(license) = &self.license {
            return Some(first_line(license).to_string());
        }
        if let Some(expression) = &self.license_expression {
            return Some(expression.clone());
        }

        let names: Vec<String> = self
            .license_classifiers
            .iter()
            .filter_map(|classifier| extract_license_from_classifier(classifier))
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// `Home-page`, falling back to a `Project-URL` labelled as the homepage
    /// and finally to any project URL hosted on GitHub.
    pub fn declared_homepage(&self) -> Option<String> {
        if let Some(home_page) = &self.home_page {
            return Some(home_page.clone());
        }

        self.project_urls
            .iter()
            .find(|(label, _)| normalize_label(label) == "homepage")
            .or_else(|| {
                self.project_urls
                    .iter()
                    .find(|(_, url)| url.contains("github.com/"))
            })
            .map(|(_, url)| url.clone())
    }
}

/// Parse the RFC 822 style header block. The body (long description) after
/// the first blank line is never inspected.
pub fn parse_metadata_content(content: &str) -> Metadata {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            break;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation of the previous header
            if let Some((_, value)) = fields.last_mut() {
                value.push('\n');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            fields.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let mut metadata = Metadata::default();
    for (key, value) in fields {
        match key.as_str() {
            "name" => metadata.name = non_empty(value),
            "version" => metadata.version = non_empty(value),
            "license" => metadata.license = non_empty(value),
            "license-expression" => metadata.license_expression = non_empty(value),
            "home-page" => metadata.home_page = non_empty(value),
            "classifier" => {
                if value.starts_with("License :: ") {
                    metadata.license_classifiers.push(value);
                }
            }
            "project-url" => {
                if let Some((label, url)) = value.split_once(',') {
                    metadata
                        .project_urls
                        .push((label.trim().to_string(), url.trim().to_string()));
                }
            }
            _ => {}
        }
    }

    metadata
}

fn extract_license_from_classifier(classifier: &str) -> Option<String> {
    // "License :: OSI Approved :: MIT License" -> "MIT License"
    let parts: Vec<&str> = classifier.split(" :: ").collect();
    match parts.as_slice() {
        ["License", _, name, ..] => Some(name.to_string()),
        ["License", name] => Some(name.to_string()),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "UNKNOWN" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_line(value: &str) -> &str {
    value.lines().next().unwrap_or(value).trim()
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .collect::<String>()
        .to_ascii_lowercase()
}
