// Mobility Storage Layer
//
// All catalog access for the mobility pipeline. Values are always bound as
// parameters; only table identifiers come from configuration. Delete+insert
// sequences run inside one transaction, so a partition is either fully
// reloaded or untouched.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::info;

use super::config::MobilityConfig;
use super::models::{DateAvailability, RawTripRecord, SilverTripAggregate};
use super::{Result, DEFAULT_TRIP_CHUNK_SIZE};

/// Storage handler for the mobility tables
pub struct MobilityStorage {
    db: PgPool,
    config: MobilityConfig,
}

impl MobilityStorage {
    pub fn new(db: PgPool, config: MobilityConfig) -> Self {
        Self { db, config }
    }

    /// Create the mobility tables when they do not exist yet
    ///
    /// `bronze_economy` is not created here: it is a pre-loaded input owned by
    /// the publishing side.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                "date" TEXT NOT NULL,
                hour_period TEXT NOT NULL,
                origin_zone TEXT NOT NULL,
                destination_zone TEXT NOT NULL,
                trips DOUBLE PRECISION NOT NULL,
                ingestion_date TIMESTAMPTZ NOT NULL
            )
            "#,
            self.config.bronze_table
        ))
        .execute(&self.db)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                data_date DATE NOT NULL,
                has_data BOOLEAN NOT NULL,
                observed_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.config.dates_table
        ))
        .execute(&self.db)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                trip_timestamp TIMESTAMP NOT NULL,
                origin_zone_id VARCHAR NOT NULL,
                destination_zone_id VARCHAR NOT NULL,
                total_trips DOUBLE PRECISION NOT NULL,
                analysis_id INTEGER NOT NULL
            )
            "#,
            self.config.silver_table
        ))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Bronze layer
    // ========================================================================

    /// Replace the raw trips table wholesale
    ///
    /// Prior content for dates not covered by the current read is lost; this
    /// is a full-refresh table, not an incremental one.
    pub async fn replace_raw_trips(&self, records: &[RawTripRecord]) -> Result<usize> {
        let ingestion_date = Utc::now();

        let mut tx = self.db.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", self.config.bronze_table))
            .execute(&mut *tx)
            .await?;

        for chunk in records.chunks(DEFAULT_TRIP_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                r#"INSERT INTO {} ("date", hour_period, origin_zone, destination_zone, trips, ingestion_date) "#,
                self.config.bronze_table
            ));

            query_builder.push_values(chunk, |mut b, record| {
                b.push_bind(&record.date)
                    .push_bind(&record.hour_period)
                    .push_bind(&record.origin_zone)
                    .push_bind(&record.destination_zone)
                    .push_bind(record.trips)
                    .push_bind(ingestion_date);
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            rows = records.len(),
            table = %self.config.bronze_table,
            "Replaced raw trips table"
        );

        Ok(records.len())
    }

    /// Replace the date-completeness calendar wholesale
    pub async fn replace_availability(&self, calendar: &[DateAvailability]) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", self.config.dates_table))
            .execute(&mut *tx)
            .await?;

        for chunk in calendar.chunks(DEFAULT_TRIP_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} (data_date, has_data, observed_at) ",
                self.config.dates_table
            ));

            query_builder.push_values(chunk, |mut b, day| {
                b.push_bind(day.date).push_bind(day.has_data).push_bind(day.observed_at);
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            rows = calendar.len(),
            table = %self.config.dates_table,
            "Replaced date-completeness calendar"
        );

        Ok(calendar.len())
    }

    /// Fetch the raw rows published for one date
    pub async fn fetch_raw_for_date(&self, process_date: NaiveDate) -> Result<Vec<RawTripRecord>> {
        let date_key = process_date.format("%Y%m%d").to_string();

        let rows = sqlx::query(&format!(
            r#"
            SELECT "date", hour_period, origin_zone, destination_zone, trips
            FROM {}
            WHERE "date" = $1
            "#,
            self.config.bronze_table
        ))
        .bind(&date_key)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RawTripRecord {
                    date: row.try_get("date")?,
                    hour_period: row.try_get("hour_period")?,
                    origin_zone: row.try_get("origin_zone")?,
                    destination_zone: row.try_get("destination_zone")?,
                    trips: row.try_get("trips")?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Silver layer
    // ========================================================================

    /// Idempotent partition reload: delete the process date's rows, insert the
    /// freshly derived aggregate
    ///
    /// Both statements run in one transaction, so a failed reload leaves the
    /// previous partition content in place instead of an emptied partition.
    pub async fn reload_partition(
        &self,
        process_date: NaiveDate,
        aggregates: &[SilverTripAggregate],
    ) -> Result<usize> {
        let (day_start, day_end) = day_bounds(process_date);

        let mut tx = self.db.begin().await?;

        sqlx::query(&format!(
            "DELETE FROM {} WHERE trip_timestamp >= $1 AND trip_timestamp < $2",
            self.config.silver_table
        ))
        .bind(day_start)
        .bind(day_end)
        .execute(&mut *tx)
        .await?;

        for chunk in aggregates.chunks(DEFAULT_TRIP_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} (trip_timestamp, origin_zone_id, destination_zone_id, total_trips, analysis_id) ",
                self.config.silver_table
            ));

            query_builder.push_values(chunk, |mut b, aggregate| {
                b.push_bind(aggregate.trip_timestamp)
                    .push_bind(&aggregate.origin_zone_id)
                    .push_bind(&aggregate.destination_zone_id)
                    .push_bind(aggregate.total_trips)
                    .push_bind(aggregate.analysis_id);
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            date = %process_date,
            rows = aggregates.len(),
            table = %self.config.silver_table,
            "Reloaded silver partition"
        );

        Ok(aggregates.len())
    }

    /// Count the silver rows currently stored for one process date
    pub async fn partition_row_count(&self, process_date: NaiveDate) -> Result<i64> {
        let (day_start, day_end) = day_bounds(process_date);

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE trip_timestamp >= $1 AND trip_timestamp < $2",
            self.config.silver_table
        ))
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Dates flagged available in the calendar with no silver partition yet
    ///
    /// The explicit work list for resumable backfills: a partition is written
    /// atomically, so a date either appears here or is fully loaded.
    pub async fn pending_dates(&self) -> Result<Vec<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(&format!(
            r#"
            SELECT d.data_date
            FROM {} d
            WHERE d.has_data = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM {} s
                  WHERE s.trip_timestamp >= d.data_date::timestamp
                    AND s.trip_timestamp < (d.data_date + 1)::timestamp
              )
            ORDER BY d.data_date ASC
            "#,
            self.config.dates_table, self.config.silver_table
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(dates)
    }
}

/// Half-open timestamp bounds covering one calendar date
fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    (start, start + chrono::Duration::days(1))
}
