use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::{
    domain::{BikeModel, RegistrationId},
    registration::RegistrationPayload,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredRegistration {
    pub id: RegistrationId,
    pub payload: RegistrationPayload,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationInsert {
    Inserted,
    /// The serial number already has a registration.
    Duplicate,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // every connection to an in-memory database sees its own empty schema
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Closes every pooled connection; later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts catalog entries that are not present yet and returns how many were added.
    pub async fn seed_catalog(&self, bikes: &[BikeModel]) -> Result<u64> {
        let mut inserted = 0;
        for bike in bikes {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO bikes (serial_number, model_description, shop_name)
                 VALUES (?, ?, ?)",
            )
            .bind(&bike.serial_number)
            .bind(&bike.model_description)
            .bind(&bike.shop_name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to seed bike {}", bike.serial_number))?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn upsert_bike(&self, bike: &BikeModel) -> Result<()> {
        sqlx::query(
            "INSERT INTO bikes (serial_number, model_description, shop_name) VALUES (?, ?, ?)
             ON CONFLICT(serial_number) DO UPDATE SET
                model_description = excluded.model_description,
                shop_name = excluded.shop_name",
        )
        .bind(&bike.serial_number)
        .bind(&bike.model_description)
        .bind(&bike.shop_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_bike(&self, serial_number: &str) -> Result<Option<BikeModel>> {
        let row = sqlx::query(
            "SELECT serial_number, model_description, shop_name FROM bikes WHERE serial_number = ?",
        )
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| bike_from_row(&row)).transpose()
    }

    pub async fn list_bikes(&self) -> Result<Vec<BikeModel>> {
        let rows = sqlx::query(
            "SELECT serial_number, model_description, shop_name FROM bikes ORDER BY serial_number",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(bike_from_row).collect()
    }

    pub async fn insert_registration(
        &self,
        id: RegistrationId,
        payload: &RegistrationPayload,
        registered_at: DateTime<Utc>,
    ) -> Result<RegistrationInsert> {
        let date_of_purchase = payload
            .date_of_purchase
            .ok_or_else(|| anyhow!("registration {id} has no date of purchase"))?;

        let result = sqlx::query(
            "INSERT INTO registrations (
                id, serial_number, model_description, shop_name, first_name, last_name,
                email, country, date_of_purchase, preferred_language, gender, date_of_birth,
                news_opt_in, consent, registered_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&payload.serial_number)
        .bind(&payload.model_description)
        .bind(&payload.shop_name)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.country)
        .bind(date_of_purchase)
        .bind(&payload.preferred_language)
        .bind(&payload.gender)
        .bind(payload.date_of_birth)
        .bind(payload.news_opt_in)
        .bind(payload.consent)
        .bind(registered_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RegistrationInsert::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(RegistrationInsert::Duplicate)
            }
            Err(err) => Err(err).context("failed to insert registration"),
        }
    }

    pub async fn registration_for_serial(
        &self,
        serial_number: &str,
    ) -> Result<Option<StoredRegistration>> {
        let row = sqlx::query(&format!(
            "{REGISTRATION_COLUMNS} WHERE serial_number = ?"
        ))
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| registration_from_row(&row)).transpose()
    }

    pub async fn list_registrations(&self) -> Result<Vec<StoredRegistration>> {
        let rows = sqlx::query(&format!("{REGISTRATION_COLUMNS} ORDER BY registered_at, id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(registration_from_row).collect()
    }
}

const REGISTRATION_COLUMNS: &str = "SELECT id, serial_number, model_description, shop_name,
    first_name, last_name, email, country, date_of_purchase, preferred_language, gender,
    date_of_birth, news_opt_in, consent, registered_at FROM registrations";

fn bike_from_row(row: &SqliteRow) -> Result<BikeModel> {
    Ok(BikeModel {
        serial_number: row.try_get("serial_number")?,
        model_description: row.try_get("model_description")?,
        shop_name: row.try_get("shop_name")?,
    })
}

fn registration_from_row(row: &SqliteRow) -> Result<StoredRegistration> {
    let raw_id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&raw_id)
        .with_context(|| format!("stored registration id '{raw_id}' is not a uuid"))?;
    let date_of_purchase: NaiveDate = row.try_get("date_of_purchase")?;
    Ok(StoredRegistration {
        id: RegistrationId(id),
        payload: RegistrationPayload {
            serial_number: row.try_get("serial_number")?,
            model_description: row.try_get("model_description")?,
            shop_name: row.try_get("shop_name")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            country: row.try_get("country")?,
            date_of_purchase: Some(date_of_purchase),
            preferred_language: row.try_get("preferred_language")?,
            gender: row.try_get("gender")?,
            date_of_birth: row.try_get("date_of_birth")?,
            news_opt_in: row.try_get("news_opt_in")?,
            consent: row.try_get("consent")?,
        },
        registered_at: row.try_get("registered_at")?,
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
