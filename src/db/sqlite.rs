use async_trait::async_trait;
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::{quote_ident, validate_table_name, Warehouse, WarehouseMode};
use crate::error::{PipelineError, Result};

/// Local warehouse backed by a single SQLite file.
pub struct SqliteWarehouse {
    conn: Mutex<Option<Connection>>,
}

impl SqliteWarehouse {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Connected to warehouse in local mode: {}", path);
        Ok(SqliteWarehouse {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| PipelineError::Warehouse("warehouse connection lock poisoned".into()))
    }

    fn table_exists_in(conn: &Connection, table_name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn row_count_in(conn: &Connection, table_name: &str) -> Result<u64> {
        if !Self::table_exists_in(conn, table_name)? {
            return Ok(0);
        }
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn closed() -> PipelineError {
    PipelineError::Warehouse("warehouse connection is closed".into())
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn create_table_from_file(&self, filepath: &str, table_name: &str) -> Result<u64> {
        validate_table_name(table_name)?;
        info!(
            "Creating warehouse table \"{}\" from \"{}\" (local mode)",
            table_name, filepath
        );

        let df = ParquetReader::new(File::open(filepath)?).finish()?;
        let columns = df
            .get_columns()
            .iter()
            .map(SqlColumn::from_series)
            .collect::<Result<Vec<_>>>()?;

        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or_else(closed)?;
        let tx = conn.transaction()?;

        let table = quote_ident(table_name);
        let definitions = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({definitions});"
        ))?;

        {
            let placeholders = (1..=columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(",");
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
            for row in 0..df.height() {
                stmt.execute(params_from_iter(columns.iter().map(|c| c.value(row))))?;
            }
        }
        tx.commit()?;

        let row_count = Self::row_count_in(conn, table_name)?;
        info!("Table \"{}\" created with {} rows", table_name, row_count);
        Ok(row_count)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or_else(closed)?;
        Self::table_exists_in(conn, table_name)
    }

    async fn table_row_count(&self, table_name: &str) -> Result<u64> {
        validate_table_name(table_name)?;
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or_else(closed)?;
        Self::row_count_in(conn, table_name)
    }

    fn close(&self) -> Result<()> {
        if let Some(conn) = self.lock()?.take() {
            conn.close().map_err(|(_, e)| e)?;
            info!("Warehouse connection closed");
        }
        Ok(())
    }

    fn mode(&self) -> WarehouseMode {
        WarehouseMode::Local
    }
}

// ── Parquet -> SQLite column mapping ───────────────────────────────────────────

struct SqlColumn {
    name: String,
    values: SqlValues,
}

enum SqlValues {
    Integer(Int64Chunked),
    Real(Float64Chunked),
    Text(StringChunked),
}

impl SqlColumn {
    fn from_series(series: &Series) -> Result<Self> {
        let dtype = series.dtype();
        let values = if dtype.is_integer() || matches!(dtype, DataType::Boolean) {
            SqlValues::Integer(series.cast(&DataType::Int64)?.i64()?.clone())
        } else if dtype.is_float() {
            SqlValues::Real(series.cast(&DataType::Float64)?.f64()?.clone())
        } else {
            SqlValues::Text(series.cast(&DataType::String)?.str()?.clone())
        };
        Ok(SqlColumn {
            name: series.name().to_string(),
            values,
        })
    }

    fn sql_type(&self) -> &'static str {
        match self.values {
            SqlValues::Integer(_) => "INTEGER",
            SqlValues::Real(_) => "REAL",
            SqlValues::Text(_) => "TEXT",
        }
    }

    fn value(&self, row: usize) -> Value {
        match &self.values {
            SqlValues::Integer(ca) => ca.get(row).map_or(Value::Null, Value::Integer),
            SqlValues::Real(ca) => ca.get(row).map_or(Value::Null, Value::Real),
            SqlValues::Text(ca) => ca
                .get(row)
                .map_or(Value::Null, |s| Value::Text(s.to_string())),
        }
    }
}
