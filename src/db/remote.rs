use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::{quote_ident, validate_table_name, Warehouse, WarehouseMode};
use crate::error::{PipelineError, Result};

/// Client for a SQL-over-HTTP analytical warehouse.
///
/// Every statement is POSTed to `<url>/v1/sql` with a bearer token; the
/// warehouse reads parquet paths itself, so files are loaded server-side.
#[derive(Clone)]
pub struct RemoteWarehouse {
    http: Client,
    endpoint: Url,
    database: String,
    token: String,
}

#[derive(Serialize)]
struct SqlRequest<'a> {
    database: &'a str,
    sql: &'a str,
}

impl RemoteWarehouse {
    pub fn new(url: &str, database: &str, token: Option<String>) -> Result<Self> {
        let token = token.filter(|t| !t.is_empty()).ok_or_else(|| {
            PipelineError::Config("WAREHOUSE_TOKEN is required for production mode".into())
        })?;
        let endpoint = Url::parse(url)
            .and_then(|base| base.join("v1/sql"))
            .map_err(|e| PipelineError::Config(format!("invalid warehouse URL '{url}': {e}")))?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        info!("Connected to warehouse in production mode: {}", endpoint);
        Ok(RemoteWarehouse {
            http,
            endpoint,
            database: database.to_string(),
            token,
        })
    }

    async fn execute(&self, sql: &str) -> Result<serde_json::Value> {
        debug!("Warehouse statement: {}", sql);
        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&SqlRequest {
                database: &self.database,
                sql,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Warehouse(format!(
                "statement failed {}: {}",
                status, body
            )));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Warehouse for RemoteWarehouse {
    async fn create_table_from_file(&self, filepath: &str, table_name: &str) -> Result<u64> {
        validate_table_name(table_name)?;
        info!(
            "Creating warehouse table \"{}\" from \"{}\" (production mode)",
            table_name, filepath
        );

        self.execute(&create_table_sql(filepath, table_name)).await?;

        let row_count = self.table_row_count(table_name).await?;
        info!("Table \"{}\" created with {} rows", table_name, row_count);
        Ok(row_count)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool> {
        validate_table_name(table_name)?;
        let raw = self
            .execute(&format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = '{table_name}'"
            ))
            .await?;
        Ok(parse_count(&raw)? > 0)
    }

    async fn table_row_count(&self, table_name: &str) -> Result<u64> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }
        let raw = self
            .execute(&format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)))
            .await?;
        parse_count(&raw)
    }

    fn close(&self) -> Result<()> {
        // Stateless HTTP; nothing to release beyond the client itself.
        Ok(())
    }

    fn mode(&self) -> WarehouseMode {
        WarehouseMode::Production
    }
}

fn create_table_sql(filepath: &str, table_name: &str) -> String {
    format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM '{}'",
        quote_ident(table_name),
        filepath.replace('\'', "''")
    )
}

/// Extract a single count from a `{"rows": [[n]]}` response.
fn parse_count(raw: &serde_json::Value) -> Result<u64> {
    let cell = &raw["rows"][0][0];
    cell.as_u64()
        .or_else(|| cell.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| PipelineError::Warehouse(format!("unexpected count response: {raw}")))
}
