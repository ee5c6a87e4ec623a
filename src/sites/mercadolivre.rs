use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::info;

use super::{first_attr, first_text, SiteScraper};
use crate::fetch::HttpClient;
use crate::model::RawListing;

static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.andes-card.poly-card").unwrap());
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.poly-component__title").unwrap());
static SYMBOL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.andes-money-amount__currency-symbol").unwrap());
static FRACTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.andes-money-amount__fraction").unwrap());

/// Listings per MercadoLivre result page; the `_Desde_` offset steps by this.
const PAGE_SIZE: u32 = 50;

pub struct MercadoLivre {
    base_url: String,
    limit: usize,
}

impl MercadoLivre {
    pub fn new(base_url: &str, limit: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
        }
    }

    pub fn search_url(&self, query: &str, page: u32) -> String {
        let offset = 1 + page.saturating_sub(1) * PAGE_SIZE;
        format!("{}/{}_Desde_{}", self.base_url, query.replace(' ', "-"), offset)
    }

    pub fn parse_listings(&self, html: &str, query: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        let items: Vec<_> = document.select(&ITEM_SEL).collect();
        info!("[MercadoLivre] Result selector matched {} items", items.len());

        items
            .iter()
            .take(self.limit)
            .filter_map(|item| {
                let title = first_text(item, &TITLE_SEL).filter(|t| !t.is_empty())?;
                let link = first_attr(item, &TITLE_SEL, "href")?;
                let symbol = first_text(item, &SYMBOL_SEL)?;
                let fraction = first_text(item, &FRACTION_SEL)?;
                Some(RawListing {
                    site: self.name().to_string(),
                    query: query.to_string(),
                    title,
                    price: format!("{} {}", symbol, fraction),
                    link,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SiteScraper for MercadoLivre {
    fn name(&self) -> &'static str {
        "MercadoLivre"
    }

    async fn search(&self, http: &HttpClient, query: &str, page: u32) -> Result<Vec<RawListing>> {
        let html = http.fetch_html(&self.search_url(query, page)).await?;
        Ok(self.parse_listings(&html, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="andes-card poly-card">
            <a class="poly-component__title" href="https://produto.mercadolivre.com.br/MLB-1">
              Notebook Lenovo IdeaPad 3 Ryzen 5 8GB 256GB SSD 15.6 polegadas
            </a>
            <span class="andes-money-amount__currency-symbol">R$</span>
            <span class="andes-money-amount__fraction">2.799</span>
          </div>
          <div class="andes-card poly-card">
            <a class="poly-component__title" href="https://produto.mercadolivre.com.br/MLB-2">Sem preço</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn search_url_uses_offset() {
        let site = MercadoLivre::new("https://lista.mercadolivre.com.br", 5);
        assert_eq!(
            site.search_url("lenovo ideapad 3", 1),
            "https://lista.mercadolivre.com.br/lenovo-ideapad-3_Desde_1"
        );
        assert_eq!(
            site.search_url("lenovo ideapad 3", 3),
            "https://lista.mercadolivre.com.br/lenovo-ideapad-3_Desde_101"
        );
    }

    #[test]
    fn parses_cards_and_skips_incomplete() {
        let site = MercadoLivre::new("https://lista.mercadolivre.com.br", 5);
        let listings = site.parse_listings(PAGE, "lenovo ideapad 3");
        assert_eq!(listings.len(), 1);
        assert_eq!(
            listings[0].title,
            "Notebook Lenovo IdeaPad 3 Ryzen 5 8GB 256GB SSD 15.6 polegadas"
        );
        assert_eq!(listings[0].price, "R$ 2.799");
        assert_eq!(listings[0].link, "https://produto.mercadolivre.com.br/MLB-1");
        assert_eq!(listings[0].site, "MercadoLivre");
    }
}
