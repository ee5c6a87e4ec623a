pub mod amazon;
pub mod mercadolivre;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::config::Settings;
use crate::model::RawListing;
use crate::fetch::HttpClient;

pub use amazon::Amazon;
pub use mercadolivre::MercadoLivre;

/// One marketplace search adapter.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Display name, also stored as the `site` column.
    fn name(&self) -> &'static str;

    /// Fetch one result page for `query` (pages start at 1).
    async fn search(&self, http: &HttpClient, query: &str, page: u32) -> Result<Vec<RawListing>>;
}

/// Every adapter the monitor knows about, configured from settings.
pub fn all(settings: &Settings) -> Vec<Box<dyn SiteScraper>> {
    vec![
        Box::new(Amazon::new(&settings.amazon_base_url, settings.items_per_page)),
        Box::new(MercadoLivre::new(
            &settings.mercadolivre_base_url,
            settings.items_per_page,
        )),
    ]
}

/// Trimmed text of the first descendant matching `selector`.
fn first_text(el: &ElementRef, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn first_attr(el: &ElementRef, selector: &Selector, attr: &str) -> Option<String> {
    el.select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
