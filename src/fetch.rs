use anyhow::{Context, Result};
use std::io::Read;

/// Marker a homepage must contain for a license location to be guessed.
pub const GITHUB_MARKER: &str = "github.com/";

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_LICENSE_FILE: &str = "LICENSE";

/// Downloads a URL body. Any non-2xx response is an error.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client with library defaults.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("py-license-collector/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("GET {} failed", url))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes)
    }
}

/// Guess the raw URL of a repository's license file from a GitHub homepage.
///
/// `https://github.com/org/repo` becomes
/// `https://raw.githubusercontent.com/org/repo/<branch>/<file>`.
pub fn guess_license_url(homepage: &str, branch: &str, file: &str) -> Option<String> {
    let (_, rest) = homepage.split_once(GITHUB_MARKER)?;
    let path = rest.split(['?', '#']).next().unwrap_or_default();

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let org = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }

    Some(format!(
        "https://raw.githubusercontent.com/{}/{}/{}/{}",
        org, repo, branch, file
    ))
}
