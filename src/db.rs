use std::path::{Path, PathBuf};

use rusqlite::{Connection, Statement};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::Observation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create database directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to initialize schema: {0}")]
    Schema(#[source] rusqlite::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const UPSERT_SQL: &str = "
    INSERT INTO produtos
        (data_hora, site, modelo_busca, titulo, preco, processador, ram, armazenamento, gpu, tela, link)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(link) DO UPDATE SET
        preco     = excluded.preco,
        data_hora = excluded.data_hora";

/// Outcome of persisting one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub updated: usize,
    pub failed: usize,
}

/// Owned handle on the `produtos` table.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let store = Self { conn };
        store.init_schema()?;
        info!(path = %path.display(), "Database ready: table \"produtos\" checked");
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS produtos (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    data_hora     TEXT NOT NULL,
                    site          TEXT,
                    modelo_busca  TEXT,
                    titulo        TEXT NOT NULL,
                    preco         TEXT,
                    processador   TEXT,
                    ram           TEXT,
                    armazenamento TEXT,
                    gpu           TEXT,
                    tela          TEXT,
                    link          TEXT UNIQUE,
                    criado_em     TEXT NOT NULL DEFAULT (datetime('now'))
                );
                CREATE INDEX IF NOT EXISTS idx_produtos_site ON produtos(site);
                ",
            )
            .map_err(StoreError::Schema)
    }

    /// Upsert every observation in input order, each in its own implicit
    /// transaction. Item failures are counted, not returned.
    pub fn persist(&self, batch: &[Observation]) -> Result<PersistSummary> {
        let mut stmt = self.conn.prepare(UPSERT_SQL)?;
        let mut summary = PersistSummary::default();

        for obs in batch {
            match upsert_one(&mut stmt, obs) {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    warn!(link = %obs.link, "Failed to persist observation: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Persisted {} observations ({} failed)",
            summary.updated, summary.failed
        );
        Ok(summary)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    // ── Read side ──

    pub fn latest(&self, limit: usize) -> Result<Vec<ProductRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data_hora, COALESCE(site,''), titulo, COALESCE(preco,''),
                    COALESCE(processador,''), COALESCE(ram,''), COALESCE(armazenamento,''),
                    COALESCE(gpu,''), COALESCE(tela,''), COALESCE(link,'')
             FROM produtos
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(ProductRow {
                    id: row.get(0)?,
                    data_hora: row.get(1)?,
                    site: row.get(2)?,
                    titulo: row.get(3)?,
                    preco: row.get(4)?,
                    processador: row.get(5)?,
                    ram: row.get(6)?,
                    armazenamento: row.get(7)?,
                    gpu: row.get(8)?,
                    tela: row.get(9)?,
                    link: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn stats(&self) -> Result<Stats> {
        let total: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM produtos", [], |r| r.get(0))?;
        let last_run: Option<String> =
            self.conn
                .query_row("SELECT MAX(data_hora) FROM produtos", [], |r| r.get(0))?;
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(site,''), COUNT(*) FROM produtos GROUP BY site ORDER BY site",
        )?;
        let per_site = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Stats {
            total,
            last_run,
            per_site,
        })
    }
}

fn upsert_one(stmt: &mut Statement, obs: &Observation) -> rusqlite::Result<()> {
    stmt.execute(rusqlite::params![
        obs.timestamp(),
        obs.site,
        obs.modelo_busca,
        obs.titulo,
        obs.preco,
        obs.processador,
        obs.ram,
        obs.armazenamento,
        obs.gpu,
        obs.tela,
        obs.link,
    ])?;
    Ok(())
}

pub struct ProductRow {
    pub id: i64,
    pub data_hora: String,
    pub site: String,
    pub titulo: String,
    pub preco: String,
    pub processador: String,
    pub ram: String,
    pub armazenamento: String,
    pub gpu: String,
    pub tela: String,
    pub link: String,
}

pub struct Stats {
    pub total: usize,
    pub last_run: Option<String>,
    pub per_site: Vec<(String, usize)>,
}
