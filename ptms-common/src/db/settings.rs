//! Settings database operations
//!
//! Key/value config store for scalar runtime configuration (current academic
//! year, submission windows). Typed get/set accessors over the settings table.

use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{Pool, Sqlite};

/// Settings key holding the current academic year (`YYYY-YY`)
pub const ACADEMIC_YEAR_KEY: &str = "academic_current_year";

/// Get the current academic year, e.g. "2026-27"
///
/// Falls back to a value derived from today's date when the key is not set;
/// the academic year turns over in July.
pub async fn get_current_academic_year(db: &Pool<Sqlite>) -> Result<String> {
    match get_setting::<String>(db, ACADEMIC_YEAR_KEY).await? {
        Some(year) => Ok(year),
        None => Ok(default_academic_year(Utc::now().date_naive())),
    }
}

/// Set the current academic year
pub async fn set_current_academic_year(db: &Pool<Sqlite>, year: String) -> Result<()> {
    set_setting(db, ACADEMIC_YEAR_KEY, year).await
}

/// Academic year containing a date: July onwards belongs to `Y-(Y+1)`
pub fn default_academic_year(date: NaiveDate) -> String {
    let start = if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start, (start + 1) % 100)
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[test]
    fn academic_year_turns_over_in_july() {
        let june = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let july = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert_eq!(default_academic_year(june), "2025-26");
        assert_eq!(default_academic_year(july), "2026-27");
    }

    #[tokio::test]
    async fn academic_year_prefers_stored_value() {
        let pool = setup_test_db().await;

        set_current_academic_year(&pool, "2031-32".to_string())
            .await
            .unwrap();

        let year = get_current_academic_year(&pool).await.unwrap();
        assert_eq!(year, "2031-32");
    }

    #[tokio::test]
    async fn academic_year_defaults_when_unset() {
        let pool = setup_test_db().await;

        let year = get_current_academic_year(&pool).await.unwrap();
        assert_eq!(year, default_academic_year(Utc::now().date_naive()));
    }

    #[tokio::test]
    async fn set_setting_upserts() {
        let pool = setup_test_db().await;

        set_setting(&pool, "window_days", 7_i64).await.unwrap();
        set_setting(&pool, "window_days", 14_i64).await.unwrap();

        let value: Option<i64> = get_setting(&pool, "window_days").await.unwrap();
        assert_eq!(value, Some(14));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'window_days'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
