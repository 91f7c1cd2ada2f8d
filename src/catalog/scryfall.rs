//! HTTP catalog client for the Scryfall JSON API.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::rate_limiter::RateLimiter;
use super::wire::{WireCard, WireCatalog, WireList, WireSet};
use super::CatalogSource;
use crate::config;
use crate::error::{Result, SpotsError};
use crate::models::{PagedCards, Printing, SearchPage, SetSummary};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Walk a paginated card listing starting at `first_url`.
///
/// `fetch` retrieves one page. The walk stops when a page reports no more
/// results (complete), or when a page fails, a page claims more results
/// without a continuation URL, or a continuation URL repeats (incomplete).
/// Cards from the pages fetched so far are always returned.
///
/// A `NotFound` on the very first page means the listing is empty.
pub fn collect_pages<F>(label: &str, first_url: String, mut fetch: F) -> PagedCards
where
    F: FnMut(&str) -> Result<WireList<WireCard>>,
{
    let mut result = PagedCards::default();
    let mut seen = HashSet::new();
    let mut url = first_url;

    loop {
        if !seen.insert(url.clone()) {
            tracing::warn!(set = label, url = %url, "Pagination loop detected, stopping");
            return result;
        }

        let page = match fetch(&url) {
            Ok(page) => page,
            Err(SpotsError::NotFound(_)) if result.pages == 0 => {
                result.complete = true;
                return result;
            }
            Err(e) => {
                tracing::warn!(
                    set = label,
                    page = result.pages + 1,
                    cards = result.cards.len(),
                    error = %e,
                    "Card page fetch failed, keeping partial results"
                );
                return result;
            }
        };

        result.pages += 1;
        result.cards.extend(page.data.into_iter().map(Printing::from));

        if !page.has_more {
            result.complete = true;
            return result;
        }
        match page.next_page {
            Some(next) => url = next,
            None => {
                tracing::warn!(set = label, "Page reported more results without a next page");
                return result;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ScryfallClient
// ---------------------------------------------------------------------------

/// Rate-limited blocking client for a Scryfall-compatible API.
///
/// The HTTP client is created lazily on the first request, so constructing
/// a `ScryfallClient` inside an async runtime is fine.
pub struct ScryfallClient {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    limiter: Arc<RateLimiter>,
    client: OnceLock<Client>,
}

impl Default for ScryfallClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScryfallClient {
    pub fn new() -> Self {
        Self {
            base_url: config::SCRYFALL_API.to_string(),
            timeout: config::HTTP_TIMEOUT,
            user_agent: config::USER_AGENT.to_string(),
            limiter: Arc::new(RateLimiter::default()),
            client: OnceLock::new(),
        }
    }

    /// Point the client at another API root (mirrors, test servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Share a limiter with other clients hitting the same service.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .gzip(true)
            .build()?;
        // A concurrent first request may have won the race; either client works.
        let _ = self.client.set(client);
        self.client
            .get()
            .ok_or_else(|| SpotsError::Internal("HTTP client unavailable".into()))
    }

    /// Build an endpoint URL from path segments and query pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SpotsError::InvalidArgument(format!("Bad catalog URL {}: {}", self.base_url, e)))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                SpotsError::InvalidArgument(format!("Catalog URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    /// Rate-limited GET that decodes a JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let client = self.client()?;
        self.limiter.acquire();
        tracing::debug!(url, "Catalog request");

        let resp = client.get(url).send()?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SpotsError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(SpotsError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.json()?)
    }
}

impl CatalogSource for ScryfallClient {
    fn list_sets(&self) -> Result<Vec<SetSummary>> {
        let url = self.endpoint(&["sets"], &[])?;
        let list: WireList<WireSet> = self.get_json(&url)?;
        Ok(list.data.into_iter().map(SetSummary::from).collect())
    }

    fn get_set(&self, code: &str) -> Result<SetSummary> {
        let url = self.endpoint(&["sets", code], &[])?;
        let set: WireSet = self
            .get_json(&url)
            .map_err(|e| match e {
                SpotsError::NotFound(_) => SpotsError::NotFound(format!("Set {}", code)),
                other => other,
            })?;
        Ok(set.into())
    }

    fn get_set_cards(&self, code: &str) -> PagedCards {
        let query = format!("set:{}", code);
        let first = match self.endpoint(
            &["cards", "search"],
            &[("order", "set"), ("q", query.as_str()), ("unique", "prints")],
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(set = code, error = %e, "Cannot build card search URL");
                return PagedCards::default();
            }
        };
        let paged = collect_pages(code, first, |url| self.get_json(url));
        tracing::debug!(set = code, pages = paged.pages, cards = paged.cards.len(), "Fetched set cards");
        paged
    }

    fn search_cards(&self, query: &str, page: u32) -> SearchPage {
        let page = page.max(1).to_string();
        let fetched = self
            .endpoint(
                &["cards", "search"],
                &[("q", query), ("page", page.as_str()), ("unique", "prints")],
            )
            .and_then(|url| self.get_json::<WireList<WireCard>>(&url));
        match fetched {
            Ok(list) => SearchPage {
                total_cards: list.total_cards.unwrap_or(list.data.len() as i64),
                has_more: list.has_more,
                cards: list.data.into_iter().map(Printing::from).collect(),
            },
            Err(SpotsError::NotFound(_)) => SearchPage::default(),
            Err(e) => {
                tracing::warn!(query, error = %e, "Card search failed");
                SearchPage::default()
            }
        }
    }

    fn autocomplete(&self, query: &str) -> Vec<String> {
        let fetched = self
            .endpoint(&["cards", "autocomplete"], &[("q", query)])
            .and_then(|url| self.get_json::<WireCatalog>(&url));
        match fetched {
            Ok(catalog) => catalog.data,
            Err(e) => {
                tracing::warn!(query, error = %e, "Autocomplete failed");
                Vec::new()
            }
        }
    }

    fn get_card_by_id(&self, external_id: &str) -> Result<Printing> {
        let url = self.endpoint(&["cards", external_id], &[])?;
        let card: WireCard = self.get_json(&url).map_err(|e| match e {
            SpotsError::NotFound(_) => SpotsError::NotFound(format!("Card {}", external_id)),
            other => other,
        })?;
        Ok(card.into())
    }
}
