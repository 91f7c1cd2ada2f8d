//! Access to the external card catalog.
//!
//! [`CatalogSource`] is the contract the reconciliation engine and the facade
//! depend on; [`ScryfallClient`] implements it over HTTP.

pub mod rate_limiter;
pub mod scryfall;
pub mod wire;

pub use rate_limiter::RateLimiter;
pub use scryfall::{collect_pages, ScryfallClient};

use crate::error::Result;
use crate::models::{PagedCards, Printing, SearchPage, SetSummary};

/// Typed operations against a card catalog service.
///
/// Listing and lookup operations return errors; the browse-style operations
/// (`get_set_cards`, `search_cards`, `autocomplete`) degrade to partial or
/// empty results instead, and log what went wrong.
pub trait CatalogSource: Send + Sync {
    /// Every set the catalog knows about.
    fn list_sets(&self) -> Result<Vec<SetSummary>>;

    /// One set by code. `NotFound` when the catalog has no such set.
    fn get_set(&self, code: &str) -> Result<SetSummary>;

    /// All printings of a set, following pagination until exhausted or until
    /// a page fails (then `complete` is `false`).
    fn get_set_cards(&self, code: &str) -> PagedCards;

    /// One page (1-based) of free-text search results.
    fn search_cards(&self, query: &str, page: u32) -> SearchPage;

    /// Card-name completions for a partial query.
    fn autocomplete(&self, query: &str) -> Vec<String>;

    /// One printing by catalog id. `NotFound` when unknown.
    fn get_card_by_id(&self, external_id: &str) -> Result<Printing>;
}
