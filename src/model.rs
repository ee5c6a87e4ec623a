use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::specs::SpecRecord;

/// Text form of `data_hora`, both in the table and in the mirror file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One listing as a site adapter found it. `price` is the display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub site: String,
    pub query: String,
    pub title: String,
    pub price: String,
    pub link: String,
}

/// Persisted shape of a listing: raw fields, extracted specs and the batch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub data_hora: NaiveDateTime,
    pub site: String,
    pub modelo_busca: String,
    pub titulo: String,
    pub preco: String,
    pub processador: String,
    pub ram: String,
    pub armazenamento: String,
    pub gpu: String,
    pub tela: String,
    pub link: String,
}

impl Observation {
    pub fn timestamp(&self) -> String {
        self.data_hora.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Timestamp shared by every observation of one run, UTC, whole seconds.
pub fn batch_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn normalize(raw: RawListing, specs: SpecRecord, batch_ts: NaiveDateTime) -> Observation {
    Observation {
        data_hora: batch_ts,
        site: raw.site,
        modelo_busca: raw.query,
        titulo: raw.title,
        preco: raw.price,
        processador: specs.processor,
        ram: specs.ram,
        armazenamento: specs.storage,
        gpu: specs.gpu,
        tela: specs.screen,
        link: raw.link,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs;

    #[test]
    fn maps_fields_and_keeps_batch_time() {
        let raw = RawListing {
            site: "Amazon".into(),
            query: "lenovo ideapad 3".into(),
            title: "Notebook Lenovo Ryzen 5 8GB 256GB SSD RTX 3050 15.6 polegadas".into(),
            price: "R$ 3.499,90".into(),
            link: "https://www.amazon.com.br/dp/B0TEST".into(),
        };
        let ts = NaiveDateTime::parse_from_str("2025-10-29 14:30:00", TIMESTAMP_FORMAT).unwrap();
        let specs = specs::extract(&raw.title);
        let obs = normalize(raw, specs, ts);

        assert_eq!(obs.site, "Amazon");
        assert_eq!(obs.modelo_busca, "lenovo ideapad 3");
        assert_eq!(obs.preco, "R$ 3.499,90");
        assert_eq!(obs.link, "https://www.amazon.com.br/dp/B0TEST");
        assert_eq!(obs.processador, "RYZEN 5");
        assert_eq!(obs.ram, "8GB");
        assert_eq!(obs.armazenamento, "256GB SSD");
        assert_eq!(obs.gpu, "RTX");
        assert_eq!(obs.tela, "15.6\"");
        assert_eq!(obs.timestamp(), "2025-10-29 14:30:00");
    }

    #[test]
    fn batch_timestamp_has_no_fraction() {
        assert_eq!(batch_timestamp().nanosecond(), 0);
    }
}
