//! Code-hosting profile scraper backed by the GitHub REST API.
//!
//! Fetches the user document and the full (paginated) repository list, then
//! converts both into a typed code-profile payload. An optional token lifts
//! the unauthenticated rate limit.

use crate::providers::registry::CapabilityProvider;
use crate::types::{AppError, Capability, CodeProfileDoc, ProviderPayload, RepoDoc, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const GITHUB_API_BASE: &str = "https://api.github.com";
const REPOS_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    company: Option<String>,
    location: Option<String>,
    #[serde(default)]
    followers: u64,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    html_url: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// GitHub profile provider for the code-hosting capability.
pub struct GithubProvider {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("dossier-github/0.2")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: GITHUB_API_BASE.to_string(),
            token,
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json");

        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("GitHub request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            if remaining == Some(0) {
                return Err(AppError::Provider(
                    "GitHub API rate limit exceeded".to_string(),
                ));
            }
        }
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "GitHub API error: HTTP {} for {}",
                status, path
            )));
        }

        Ok(response)
    }

    async fn fetch_user(&self, username: &str) -> Result<GithubUser> {
        self.get(&format!("users/{}", username))
            .await?
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("GitHub user decode failed: {}", e)))
    }

    async fn fetch_repositories(&self, username: &str) -> Result<Vec<GithubRepo>> {
        let mut repositories = Vec::new();
        let mut page = 1usize;

        loop {
            let path = format!(
                "users/{}/repos?page={}&per_page={}&sort=updated",
                username, page, REPOS_PER_PAGE
            );
            let batch: Vec<GithubRepo> = self
                .get(&path)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Provider(format!("GitHub repos decode failed: {}", e)))?;

            let last_page = batch.len() < REPOS_PER_PAGE;
            repositories.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }
}

#[async_trait]
impl CapabilityProvider for GithubProvider {
    fn capability(&self) -> Capability {
        Capability::GithubProfile
    }

    fn name(&self) -> &str {
        "github_profile"
    }

    async fn execute(&self, input: &str) -> Result<ProviderPayload> {
        let username = input.trim();
        if username.is_empty() || username.contains(char::is_whitespace) {
            return Err(AppError::InvalidInput(format!(
                "not a usable code-hosting handle: '{}'",
                input
            )));
        }

        let user = self.fetch_user(username).await?;
        let repos = self.fetch_repositories(username).await?;

        let mut repositories: Vec<RepoDoc> = repos
            .into_iter()
            .map(|r| RepoDoc {
                name: r.name,
                description: r.description,
                stars: r.stargazers_count,
                forks: r.forks_count,
                language: r.language,
                url: r.html_url,
                topics: r.topics,
            })
            .collect();

        // Most popular first
        repositories.sort_by(|a, b| (b.stars, b.forks).cmp(&(a.stars, a.forks)));

        tracing::debug!(
            username,
            repositories = repositories.len(),
            "github profile scraped"
        );

        Ok(ProviderPayload::CodeProfile(CodeProfileDoc {
            username: user.login,
            name: user.name,
            bio: user.bio,
            location: user.location,
            company: user.company,
            followers: user.followers,
            repositories,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let provider = GithubProvider::new(None);
        assert_eq!(provider.capability(), Capability::GithubProfile);
        assert_eq!(provider.name(), "github_profile");
    }

    #[tokio::test]
    async fn test_rejects_non_handle_input() {
        let provider = GithubProvider::new(None);
        assert!(provider.execute("").await.is_err());
        assert!(provider.execute("two words").await.is_err());
    }

    #[test]
    fn test_repo_decode() {
        let json = r#"{
            "name": "widget",
            "description": "A widget",
            "stargazers_count": 42,
            "forks_count": 7,
            "language": "Rust",
            "html_url": "https://github.com/octocat/widget",
            "topics": ["cli", "rust"]
        }"#;
        let repo: GithubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.name, "widget");
        assert_eq!(repo.stargazers_count, 42);
        assert_eq!(repo.topics.len(), 2);
    }

    #[test]
    fn test_user_decode_with_nulls() {
        let json = r#"{"login": "octocat", "name": null, "bio": null, "company": null, "location": null, "followers": 3}"#;
        let user: GithubUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.login, "octocat");
        assert!(user.name.is_none());
        assert_eq!(user.followers, 3);
    }
}
