//! Academic search against the arXiv export API.
//!
//! Queries the Atom endpoint with the search terms ANDed as `all:` fields,
//! newest-updated first, and converts entries into typed paper hits at the
//! boundary.

use crate::providers::registry::CapabilityProvider;
use crate::types::{AppError, Capability, PaperHit, ProviderPayload, Result};
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::time::Duration;

const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";

/// arXiv search provider for the academic-search capability.
pub struct ArxivProvider {
    http: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl ArxivProvider {
    pub fn new(max_results: usize) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("dossier-arxiv/0.2")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: ARXIV_API_BASE.to_string(),
            max_results,
        }
    }

    /// AND all whitespace-separated terms as `all:` fields.
    fn build_query(input: &str) -> String {
        let terms: Vec<String> = input
            .split_whitespace()
            .map(|t| format!("all:{}", t))
            .collect();
        if terms.is_empty() {
            "all:*".to_string()
        } else {
            terms.join(" AND ")
        }
    }
}

#[async_trait]
impl CapabilityProvider for ArxivProvider {
    fn capability(&self) -> Capability {
        Capability::AcademicSearch
    }

    fn name(&self) -> &str {
        "arxiv_search"
    }

    async fn execute(&self, input: &str) -> Result<ProviderPayload> {
        let search_query = Self::build_query(input);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("search_query", search_query.as_str())])
            .query(&[("start", 0usize), ("max_results", self.max_results)])
            .query(&[("sortBy", "lastUpdatedDate"), ("sortOrder", "descending")])
            .header(
                reqwest::header::ACCEPT,
                "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8",
            )
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("arXiv request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Provider(format!("arXiv API error: HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("arXiv response read failed: {}", e)))?;

        let papers = parse_atom_feed(&body)?;
        tracing::debug!(query = input, count = papers.len(), "arxiv search completed");
        Ok(ProviderPayload::Papers(papers))
    }
}

/// Parse an arXiv Atom feed into paper hits.
fn parse_atom_feed(xml: &str) -> Result<Vec<PaperHit>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut in_entry = false;
    let mut title = String::new();
    let mut updated = String::new();
    let mut summary: Option<String> = None;
    let mut authors: Vec<String> = Vec::new();
    let mut url: Option<String> = None;
    let mut text_target: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf: Vec<u8> = e.name().as_ref().to_vec();
                let raw = name_buf.as_slice();
                // Strip any namespace prefix
                let name = match raw.iter().position(|b| *b == b':') {
                    Some(ix) => &raw[ix + 1..],
                    None => raw,
                };
                match name {
                    b"entry" => {
                        in_entry = true;
                        title.clear();
                        updated.clear();
                        summary = None;
                        authors.clear();
                        url = None;
                        text_target = None;
                    }
                    b"title" if in_entry => text_target = Some("title"),
                    b"updated" if in_entry => text_target = Some("updated"),
                    b"summary" if in_entry => text_target = Some("summary"),
                    b"name" if in_entry => text_target = Some("author"),
                    b"link" if in_entry => {
                        let mut rel: Option<String> = None;
                        let mut href: Option<String> = None;
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match attr.key.as_ref() {
                                b"rel" => rel = Some(value),
                                b"href" => href = Some(value),
                                _ => {}
                            }
                        }
                        if rel.as_deref() == Some("alternate") && url.is_none() {
                            url = href;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(target) = text_target.take() {
                    let text = t.unescape().unwrap_or_default().to_string();
                    match target {
                        "title" => title = text,
                        "updated" => updated = text,
                        "summary" => summary = Some(text),
                        "author" => authors.push(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name_buf: Vec<u8> = e.name().as_ref().to_vec();
                let raw = name_buf.as_slice();
                let name = match raw.iter().position(|b| *b == b':') {
                    Some(ix) => &raw[ix + 1..],
                    None => raw,
                };
                if name == b"entry" && in_entry {
                    in_entry = false;
                    papers.push(PaperHit {
                        title: title.clone(),
                        url: url.clone(),
                        authors: authors.clone(),
                        summary: summary.clone(),
                        updated: updated.clone(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::Provider(format!("Atom parse error: {}", e))),
            _ => {}
        }
    }

    Ok(papers)
}
