//! Search-page resolver
//!
//! Issues one GET against the configured search endpoint and takes the
//! first result's item link: the anchor inside the first element carrying
//! the `itemurl` class.

use std::time::Duration;

use scraper::{Html, Selector};

use crate::{
    config::ResolverConfig,
    resolver::{LinkResolver, Resolution, error::ResolutionFailure},
};

const RESULT_SELECTOR: &str = ".itemurl";
const ANCHOR_SELECTOR: &str = "a";

pub struct BandcampResolver {
    agent: ureq::Agent,
    config: ResolverConfig,
}

impl BandcampResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    /// Search URL for a track, with the artist and title query properly encoded.
    pub fn search_url(&self, artist: &str, title: &str) -> String {
        let query = format!("{artist} {title}");
        let base = &self.config.search_url;
        let separator = if base.contains('?') { '&' } else { '?' };
        format!(
            "{base}{separator}{}={}",
            self.config.query_param,
            urlencoding::encode(&query)
        )
    }

    fn fetch(&self, url: &str) -> Result<String, ResolutionFailure> {
        let response = self.agent.get(url).call()?;
        Ok(response.into_string()?)
    }

    fn fetch_with_retries(&self, url: &str) -> Result<String, ResolutionFailure> {
        let mut attempt = 0;
        loop {
            match self.fetch(url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    log::debug!("retrying {url} ({attempt}/{}): {e}", self.config.max_retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_resolve(&self, artist: &str, title: &str) -> Result<String, ResolutionFailure> {
        let url = self.search_url(artist, title);
        log::debug!("GET {url}");
        let body = self.fetch_with_retries(&url)?;
        extract_item_link(&body).ok_or(ResolutionFailure::NoMatch)
    }
}

impl LinkResolver for BandcampResolver {
    fn resolve(&self, artist: &str, title: &str) -> Resolution {
        match self.try_resolve(artist, title) {
            Ok(link) => Resolution::Found(link),
            Err(ResolutionFailure::NoMatch) => {
                log::debug!("no result for {artist} - {title}");
                Resolution::Unresolved
            }
            Err(e) => {
                log::warn!("search for {artist} - {title} failed: {e}");
                Resolution::Unresolved
            }
        }
    }
}

/// Link of the first search result, without query string or fragment.
///
/// Only the first `itemurl` element is considered. If it has no anchor the
/// search counts as unresolved, later results are never used instead.
pub fn extract_item_link(html: &str) -> Option<String> {
    let result_selector = Selector::parse(RESULT_SELECTOR).ok()?;
    let anchor_selector = Selector::parse(ANCHOR_SELECTOR).ok()?;
    let document = Html::parse_document(html);

    let first_result = document.select(&result_selector).next()?;
    let href = first_result
        .select(&anchor_selector)
        .next()?
        .value()
        .attr("href")?;
    canonical_link(href)
}

fn canonical_link(href: &str) -> Option<String> {
    let href = href.trim();
    let end = href.find(['?', '#']).unwrap_or(href.len());
    let link = &href[..end];

    if link.starts_with("https://") || link.starts_with("http://") {
        Some(link.to_string())
    } else {
        None
    }
}
