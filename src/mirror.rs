use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{error, info, warn};

use crate::model::Observation;
use crate::specs::UNKNOWN;

pub const DELIMITER: char = ';';

pub const COLUMNS: [&str; 11] = [
    "data_hora",
    "site",
    "modelo_busca",
    "titulo",
    "preco",
    "processador",
    "ram",
    "armazenamento",
    "gpu",
    "tela",
    "link",
];

/// Append `batch` to the mirror file at `path`, writing the header only when
/// the file is new or empty. Failures are logged and reported as 0 rows.
pub fn append_batch(batch: &[Observation], path: &Path) -> usize {
    if batch.is_empty() {
        warn!("No observations to mirror");
        return 0;
    }
    match try_append(batch, path) {
        Ok(()) => {
            info!("{} observations mirrored to {}", batch.len(), path.display());
            batch.len()
        }
        Err(e) => {
            error!("Failed to write mirror file {}: {}", path.display(), e);
            0
        }
    }
}

fn try_append(batch: &[Observation], path: &Path) -> io::Result<()> {
    let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut w = BufWriter::new(file);
    write_batch(&mut w, batch, is_new)?;
    w.flush()
}

pub fn write_batch<W: Write>(mut w: W, batch: &[Observation], header: bool) -> io::Result<()> {
    if header {
        write_row(&mut w, &COLUMNS)?;
    }
    for obs in batch {
        write_row(&mut w, &record(obs))?;
    }
    Ok(())
}

fn record(obs: &Observation) -> [String; 11] {
    [
        obs.timestamp(),
        obs.site.clone(),
        obs.modelo_busca.clone(),
        obs.titulo.clone(),
        obs.preco.clone(),
        obs.processador.clone(),
        obs.ram.clone(),
        obs.armazenamento.clone(),
        obs.gpu.clone(),
        obs.tela.clone(),
        obs.link.clone(),
    ]
    .map(|cell| if cell.is_empty() { UNKNOWN.to_string() } else { cell })
}

fn needs_quotes(field: &str) -> bool {
    field.contains(DELIMITER) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", DELIMITER)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
