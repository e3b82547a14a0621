//! CSV Dataset Access
//!
//! Reads the input datasets into typed rows or schema-free tables and writes
//! the annotated output back out. Typed readers accept the short column names
//! (`entity_id`, `x`, `vx`, ...) as well as the unit-suffixed names produced
//! by the simulation exports (`phone_id`, `x_t_m`, `vx_t_mps`, ...).

use super::types::{MovementStats, Table, TrajectorySample};
use crate::Result;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

fn reader_builder(trim: csv::Trim) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(trim);
    builder
}

fn read_typed<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = reader_builder(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        crate::Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open {}: {e}", path.display()),
        ))
    })?;
    Ok(BufReader::new(file))
}

/// Parse trajectory samples from CSV
pub fn read_trajectories<R: Read>(reader: R) -> Result<Vec<TrajectorySample>> {
    read_typed(reader)
}

/// Load trajectory samples from a CSV file
pub fn load_trajectories(path: &Path) -> Result<Vec<TrajectorySample>> {
    let samples = read_trajectories(open(path)?)?;
    debug!("Loaded {} trajectory samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Parse per-tick movement statistics from CSV
pub fn read_movement_stats<R: Read>(reader: R) -> Result<Vec<MovementStats>> {
    read_typed(reader)
}

/// Load per-tick movement statistics from a CSV file
pub fn load_movement_stats(path: &Path) -> Result<Vec<MovementStats>> {
    let stats = read_movement_stats(open(path)?)?;
    debug!("Loaded {} movement-statistics rows from {:?}", stats.len(), path);
    Ok(stats)
}

/// Parse a CSV into a schema-free table.
///
/// Cells and headers are kept byte for byte; consumers that interpret a
/// column trim it themselves.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut csv_reader = reader_builder(csv::Trim::None).flexible(false).from_reader(reader);
    let headers = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut table = Table::new(headers);
    for record in csv_reader.records() {
        let record = record?;
        table.push_row(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(table)
}

/// Load a CSV file into a schema-free table
pub fn load_table(path: &Path) -> Result<Table> {
    let table = read_table(open(path)?)?;
    debug!(
        "Loaded table {:?} ({} columns, {} rows)",
        path,
        table.headers.len(),
        table.len()
    );
    Ok(table)
}

/// Write a table as CSV
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Save a table to a CSV file, creating parent directories
pub fn save_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_table(BufWriter::new(file), table)?;
    debug!("Saved {} rows to {:?}", table.len(), path);
    Ok(())
}
