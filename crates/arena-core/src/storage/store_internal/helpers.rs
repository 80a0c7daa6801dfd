use chrono::{DateTime, Utc};
use rusqlite::types::Type;

pub(crate) fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

pub(crate) fn parse_ts_impl(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

pub(crate) fn parse_opt_ts_impl(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts_impl(idx, &s)).transpose()
}

pub(crate) fn parse_json_impl<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, Type::Text, e))
}

pub(crate) fn ts_to_sql(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn u64_from_sql(idx: usize, v: i64) -> rusqlite::Result<u64> {
    u64::try_from(v).map_err(|e| conversion_error(idx, Type::Integer, e))
}

/// Row count for one of the store's own tables.
pub(crate) fn count_rows_impl(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<i64, crate::storage::StoreError> {
    if !crate::storage::schema::TABLES.contains(&table) {
        return Err(crate::storage::StoreError::validation(format!(
            "unknown table: {table}"
        )));
    }
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_roundtrip_at_microsecond_precision() {
        let t = DateTime::parse_from_rfc3339("2026-03-01T10:00:00.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let s = ts_to_sql(&t);
        assert_eq!(s, "2026-03-01T10:00:00.123456Z");
        assert_eq!(parse_ts_impl(0, &s).unwrap(), t);
    }

    #[test]
    fn bad_timestamp_is_a_conversion_failure() {
        let err = parse_ts_impl(3, "yesterday").unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, _)
        ));
    }

    #[test]
    fn count_rows_rejects_foreign_tables() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(count_rows_impl(&conn, "sqlite_master").is_err());
    }
}
