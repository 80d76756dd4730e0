// Record store adapter
// Owns the SQLite schema and the row <-> Fighter mapping. Every statement
// in this crate goes through bound parameters; query text never embeds
// user input.

use rusqlite::{Connection, Row};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Fighter, PaymentStatus};

/// Open the store at `path` and ensure the schema exists.
///
/// Schema setup failure here is the one unrecovered error in the system:
/// the process refuses to start without its table.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_schema(&conn)?;
    Ok(conn)
}

/// Create the fighters table if it doesn't exist.
pub fn setup_schema(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fighters (
            fighter_id INTEGER PRIMARY KEY,
            fighter_name TEXT NOT NULL,
            father_name TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('Paid', 'Not Paid')),
            registration_date TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Column list used by every SELECT that maps into a [`Fighter`].
pub(crate) const FIGHTER_COLUMNS: &str =
    "fighter_id, fighter_name, father_name, status, registration_date";

/// Map a row selected with [`FIGHTER_COLUMNS`] into a [`Fighter`].
pub(crate) fn fighter_from_row(row: &Row<'_>) -> rusqlite::Result<Fighter> {
    let status_text: String = row.get(3)?;
    let status: PaymentStatus = status_text.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let date_text: String = row.get(4)?;
    let registration_date = crate::model::parse_registration_date(&date_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Fighter {
        fighter_id: row.get(0)?,
        fighter_name: row.get(1)?,
        father_name: row.get(2)?,
        status,
        registration_date,
    })
}

/// Classify an insert failure: a uniqueness/CHECK violation on the given
/// id surfaces as the recoverable [`Error::DuplicateId`], anything else
/// as [`Error::Store`].
pub(crate) fn classify_insert_error(e: rusqlite::Error, fighter_id: i64) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::DuplicateId(fighter_id)
        }
        other => Error::Store(other),
    }
}
