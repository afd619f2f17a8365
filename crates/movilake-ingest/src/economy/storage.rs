// Economy Storage Layer
//
// Reads the pre-loaded bronze indicator table and owns the aggregated income
// table. The bronze side is never written. The silver rebuild is a
// delete-all + insert inside one transaction, so readers see either the old
// or the new table, never an empty one.

use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::info;

use super::config::EconomyConfig;
use super::models::{RawEconomyRecord, SilverEconomyAggregate};
use super::{Result, DEFAULT_ECONOMY_CHUNK_SIZE};

/// Storage handler for the economy tables
pub struct EconomyStorage {
    db: PgPool,
    config: EconomyConfig,
}

impl EconomyStorage {
    pub fn new(db: PgPool, config: EconomyConfig) -> Self {
        Self { db, config }
    }

    /// Create the aggregated income table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                municipality_code VARCHAR NOT NULL,
                district_code VARCHAR NOT NULL,
                section_code VARCHAR NOT NULL,
                year INTEGER NOT NULL,
                avg_income DOUBLE PRECISION NOT NULL
            )
            "#,
            self.config.silver_table
        ))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Fetch every bronze indicator row
    ///
    /// `Periodo` is cast to text in SQL so integer-typed and text-typed
    /// publications of the column read identically.
    pub async fn fetch_bronze(&self) -> Result<Vec<RawEconomyRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT
                "Municipios" AS municipality,
                "Distritos" AS district,
                "Secciones" AS section,
                "Indicadores de renta media" AS indicator,
                CAST("Periodo" AS VARCHAR) AS period,
                "Total" AS total
            FROM {}
            "#,
            self.config.bronze_table
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RawEconomyRecord {
                    municipality: row.try_get("municipality")?,
                    district: row.try_get("district")?,
                    section: row.try_get("section")?,
                    indicator: row.try_get("indicator")?,
                    period: row.try_get("period")?,
                    total: row.try_get("total")?,
                })
            })
            .collect()
    }

    /// Replace the aggregated income table wholesale
    pub async fn replace_all(&self, aggregates: &[SilverEconomyAggregate]) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", self.config.silver_table))
            .execute(&mut *tx)
            .await?;

        for chunk in aggregates.chunks(DEFAULT_ECONOMY_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} (municipality_code, district_code, section_code, year, avg_income) ",
                self.config.silver_table
            ));

            query_builder.push_values(chunk, |mut b, aggregate| {
                b.push_bind(&aggregate.municipality_code)
                    .push_bind(&aggregate.district_code)
                    .push_bind(&aggregate.section_code)
                    .push_bind(aggregate.year)
                    .push_bind(aggregate.avg_income);
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            rows = aggregates.len(),
            table = %self.config.silver_table,
            "Replaced aggregated income table"
        );

        Ok(aggregates.len())
    }

    /// Count the rows currently stored in the aggregated income table
    pub async fn silver_row_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.config.silver_table))
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }
}
