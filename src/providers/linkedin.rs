//! Professional-network profile scraper.
//!
//! Fetches the public profile page over plain HTTP (optionally with a
//! session cookie) and extracts name, headline, and experience entries with
//! CSS selectors. Selector lists cover both the logged-in and public page
//! layouts; robustness against markup changes is out of scope.

use crate::providers::registry::CapabilityProvider;
use crate::types::{AppError, Capability, ExperienceDoc, ProfileDoc, ProviderPayload, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

const NAME_SELECTORS: &[&str] = &[
    "h1.text-heading-xlarge",
    "h1.top-card-layout__title",
    ".pv-top-card-section__name",
    ".artdeco-entity-lockup__title",
];

const HEADLINE_SELECTORS: &[&str] = &[
    "div.text-body-medium",
    ".top-card-layout__headline",
    ".pv-top-card-section__headline",
    ".artdeco-entity-lockup__subtitle",
];

const EXPERIENCE_ITEM_SELECTORS: &[&str] = &["li.experience-item", ".pvs-entity"];

const EXPERIENCE_TITLE_SELECTORS: &[&str] = &[
    ".experience-item__title",
    ".pvs-entity__headline-text",
    "h3",
];

const EXPERIENCE_COMPANY_SELECTORS: &[&str] = &[
    ".experience-item__subtitle",
    "[data-field=\"experience_company_name\"]",
    "h4",
];

const EXPERIENCE_DATE_SELECTORS: &[&str] = &[".date-range", ".pvs-entity__caption-wrapper", "time"];

/// Professional-network profile provider.
pub struct LinkedinProvider {
    http: reqwest::Client,
    session_cookie: Option<String>,
}

impl LinkedinProvider {
    pub fn new(session_cookie: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/124.0 Safari/537.36",
            )
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            session_cookie,
        }
    }
}

#[async_trait]
impl CapabilityProvider for LinkedinProvider {
    fn capability(&self) -> Capability {
        Capability::LinkedinProfile
    }

    fn name(&self) -> &str {
        "linkedin_profile"
    }

    async fn execute(&self, input: &str) -> Result<ProviderPayload> {
        let url = input.trim();
        if !url.contains("linkedin.com/in/") {
            return Err(AppError::InvalidInput(format!(
                "not a profile URL: '{}'",
                input
            )));
        }

        let mut request = self.http.get(url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, format!("li_at={}", cookie));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Profile fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "Profile fetch failed: HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("Profile body read failed: {}", e)))?;

        // Html is parsed and dropped synchronously; it must not live across
        // an await point.
        let profile = parse_profile(&body);

        if profile.name.is_none() && profile.headline.is_none() && profile.experiences.is_empty() {
            return Err(AppError::Provider(
                "no profile fields extracted (page may require authentication)".to_string(),
            ));
        }

        tracing::debug!(
            url,
            experiences = profile.experiences.len(),
            "linkedin profile scraped"
        );
        Ok(ProviderPayload::Profile(profile))
    }
}

/// Extract a profile document from raw page HTML.
fn parse_profile(html: &str) -> ProfileDoc {
    let document = Html::parse_document(html);

    ProfileDoc {
        name: select_first_text(&document, NAME_SELECTORS),
        headline: select_first_text(&document, HEADLINE_SELECTORS),
        experiences: parse_experiences(&document),
    }
}

fn parse_experiences(document: &Html) -> Vec<ExperienceDoc> {
    let mut experiences = Vec::new();

    for selector_str in EXPERIENCE_ITEM_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for item in document.select(&selector) {
            let fragment = Html::parse_fragment(&item.html());
            let title = select_first_text(&fragment, EXPERIENCE_TITLE_SELECTORS);
            let company = select_first_text(&fragment, EXPERIENCE_COMPANY_SELECTORS);
            if let (Some(title), Some(company)) = (title, company) {
                experiences.push(ExperienceDoc {
                    title,
                    company,
                    date_range: select_first_text(&fragment, EXPERIENCE_DATE_SELECTORS),
                });
            }
        }
        if !experiences.is_empty() {
            break;
        }
    }

    experiences
}

/// First non-empty text content matching any of the candidate selectors.
fn select_first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
