use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::info;

use super::{first_attr, first_text, SiteScraper};
use crate::fetch::HttpClient;
use crate::model::RawListing;

static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[cel_widget_id^="MAIN-SEARCH_RESULTS-"]"#).unwrap());
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.a-size-base-plus").unwrap());
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.a-link-normal.s-line-clamp-4").unwrap());
static PRICE_WHOLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-price-whole").unwrap());
static PRICE_FRACTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-price-fraction").unwrap());
static PRICE_OFFSCREEN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".a-offscreen").unwrap());

/// Accessory listings that match notebook queries.
const SKIP_TITLE: &str = "Flat para";

pub struct Amazon {
    base_url: String,
    limit: usize,
}

impl Amazon {
    pub fn new(base_url: &str, limit: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
        }
    }

    pub fn search_url(&self, query: &str, page: u32) -> String {
        format!("{}/s?k={}&page={}", self.base_url, query.replace(' ', "+"), page)
    }

    pub fn parse_listings(&self, html: &str, query: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        let items: Vec<_> = document.select(&ITEM_SEL).collect();
        info!("[Amazon] Result selector matched {} items", items.len());

        let mut results = Vec::new();
        for item in items.iter().take(self.limit) {
            let title = first_text(item, &TITLE_SEL).filter(|t| !t.is_empty());
            let link = first_attr(item, &LINK_SEL, "href").map(|href| {
                if href.starts_with("http") {
                    href
                } else {
                    format!("{}{}", self.base_url, href)
                }
            });
            let price = match first_text(item, &PRICE_WHOLE_SEL) {
                Some(mut whole) => {
                    if let Some(fraction) = first_text(item, &PRICE_FRACTION_SEL) {
                        if !whole.ends_with(',') {
                            whole.push(',');
                        }
                        whole.push_str(&fraction);
                    }
                    Some(format!("R$ {}", whole))
                }
                None => first_text(item, &PRICE_OFFSCREEN_SEL).filter(|p| !p.is_empty()),
            };

            let (Some(title), Some(link), Some(price)) = (title, link, price) else {
                continue;
            };
            if title.contains(SKIP_TITLE) {
                continue;
            }
            results.push(RawListing {
                site: self.name().to_string(),
                query: query.to_string(),
                title,
                price,
                link,
            });
        }
        results
    }
}

#[async_trait]
impl SiteScraper for Amazon {
    fn name(&self) -> &'static str {
        "Amazon"
    }

    async fn search(&self, http: &HttpClient, query: &str, page: u32) -> Result<Vec<RawListing>> {
        let html = http.fetch_html(&self.search_url(query, page)).await?;
        Ok(self.parse_listings(&html, query))
    }
}
