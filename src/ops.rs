// Record lifecycle operations
// Create, lookup-for-edit, update, delete. Each takes the connection
// explicitly and maps store failures into the crate error taxonomy at
// this boundary; nothing here panics on user input.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::{classify_insert_error, fighter_from_row, FIGHTER_COLUMNS};
use crate::error::{Error, Result};
use crate::model::{parse_registration_date, Fighter, PaymentStatus};

// ============================================================================
// FORM INPUT
// ============================================================================

/// Raw form fields for create and update, exactly as the HTTP layer
/// receives them. Validation and parsing happen in [`parse_form`] so the
/// handlers stay thin.
#[derive(Debug, Clone, Default)]
pub struct FighterForm {
    pub id: String,
    pub name: String,
    pub father_name: String,
    pub status: String,
    pub registration_date: String,
}

/// Validate and parse a submitted form into a typed [`Fighter`].
///
/// All five fields are required and non-empty; the id must be an integer,
/// the status one of the two known values, the date `YYYY-MM-DD`.
pub fn parse_form(form: &FighterForm) -> Result<Fighter> {
    let required = [
        ("id", &form.id),
        ("name", &form.name),
        ("father name", &form.father_name),
        ("status", &form.status),
        ("registration date", &form.registration_date),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} is required", label)));
        }
    }

    let fighter_id: i64 = form
        .id
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("invalid fighter id: {:?}", form.id)))?;
    let status: PaymentStatus = form.status.parse()?;
    let registration_date = parse_registration_date(&form.registration_date)?;

    Ok(Fighter {
        fighter_id,
        fighter_name: form.name.trim().to_string(),
        father_name: form.father_name.trim().to_string(),
        status,
        registration_date,
    })
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Create a new fighter record.
///
/// Fails with [`Error::DuplicateId`] if the id is already registered;
/// a failed insert never leaves a partial row behind.
pub fn create(conn: &Connection, form: &FighterForm) -> Result<Fighter> {
    let fighter = parse_form(form)?;

    conn.execute(
        "INSERT INTO fighters (fighter_id, fighter_name, father_name, status, registration_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fighter.fighter_id,
            fighter.fighter_name,
            fighter.father_name,
            fighter.status.as_str(),
            fighter.registration_date.to_string(),
        ],
    )
    .map_err(|e| classify_insert_error(e, fighter.fighter_id))?;

    debug!(fighter_id = fighter.fighter_id, "fighter created");
    Ok(fighter)
}

/// Look up a fighter for editing, by id, name, or both.
///
/// At least one criterion is required. Returns the first matching record
/// in store order, or [`Error::NotFound`].
pub fn find(conn: &Connection, id: Option<i64>, name: Option<&str>) -> Result<Fighter> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if id.is_none() && name.is_none() {
        return Err(Error::Validation(
            "provide either an id or a name to search".to_string(),
        ));
    }

    let fighter = conn
        .query_row(
            &format!(
                "SELECT {} FROM fighters WHERE fighter_id = ?1 OR fighter_name = ?2",
                FIGHTER_COLUMNS
            ),
            params![id, name],
            fighter_from_row,
        )
        .optional()?;

    fighter.ok_or(Error::NotFound)
}

/// Overwrite the four mutable fields of a fighter by id.
///
/// The write is unconditional: no partial-field update, no concurrency
/// check. The edit flow always finds the record first, so an update that
/// matches zero rows is treated as a successful no-op, mirroring delete.
pub fn update(conn: &Connection, form: &FighterForm) -> Result<Fighter> {
    let fighter = parse_form(form)?;

    let affected = conn.execute(
        "UPDATE fighters
         SET fighter_name = ?1, father_name = ?2, status = ?3, registration_date = ?4
         WHERE fighter_id = ?5",
        params![
            fighter.fighter_name,
            fighter.father_name,
            fighter.status.as_str(),
            fighter.registration_date.to_string(),
            fighter.fighter_id,
        ],
    )?;

    debug!(fighter_id = fighter.fighter_id, affected, "fighter updated");
    Ok(fighter)
}

/// Delete a fighter by id.
///
/// Idempotent by decision: deleting an id that is not present is a
/// successful no-op. The affected-row count is returned so callers can
/// log which case occurred.
pub fn delete(conn: &Connection, fighter_id: i64) -> Result<usize> {
    let affected = conn.execute(
        "DELETE FROM fighters WHERE fighter_id = ?1",
        params![fighter_id],
    )?;

    debug!(fighter_id, affected, "fighter delete");
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_schema;
    use chrono::NaiveDate;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_schema(&conn).unwrap();
        conn
    }

    fn ana_form() -> FighterForm {
        FighterForm {
            id: "7".to_string(),
            name: "Ana".to_string(),
            father_name: "Ion".to_string(),
            status: "Paid".to_string(),
            registration_date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_create_then_find_returns_identical_fields() {
        let conn = test_conn();
        let created = create(&conn, &ana_form()).unwrap();

        let found = find(&conn, Some(7), None).unwrap();
        assert_eq!(found, created);
        assert_eq!(found.fighter_name, "Ana");
        assert_eq!(found.father_name, "Ion");
        assert_eq!(found.status, PaymentStatus::Paid);
        assert_eq!(
            found.registration_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_duplicate_id_leaves_exactly_one_record() {
        let conn = test_conn();
        create(&conn, &ana_form()).unwrap();

        let mut second = ana_form();
        second.name = "Bea".to_string();
        match create(&conn, &second) {
            Err(Error::DuplicateId(7)) => {}
            other => panic!("expected DuplicateId(7), got {:?}", other),
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM fighters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        // First record untouched by the failed insert
        let found = find(&conn, Some(7), None).unwrap();
        assert_eq!(found.fighter_name, "Ana");
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        let conn = test_conn();

        let mut form = ana_form();
        form.name = "  ".to_string();
        assert!(matches!(create(&conn, &form), Err(Error::Validation(_))));

        let mut form = ana_form();
        form.id = "seven".to_string();
        assert!(matches!(create(&conn, &form), Err(Error::Validation(_))));

        let mut form = ana_form();
        form.registration_date = "01/01/2024".to_string();
        assert!(matches!(create(&conn, &form), Err(Error::Validation(_))));

        // Nothing was inserted by any of the rejected forms
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM fighters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_find_requires_a_criterion() {
        let conn = test_conn();
        assert!(matches!(
            find(&conn, None, None),
            Err(Error::Validation(_))
        ));
        // Whitespace-only name counts as absent
        assert!(matches!(
            find(&conn, None, Some("   ")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_find_by_name_and_not_found() {
        let conn = test_conn();
        create(&conn, &ana_form()).unwrap();

        let by_name = find(&conn, None, Some("Ana")).unwrap();
        assert_eq!(by_name.fighter_id, 7);

        assert!(matches!(
            find(&conn, Some(99), None),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            find(&conn, None, Some("Zoe")),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_update_overwrites_all_mutable_fields() {
        let conn = test_conn();
        create(&conn, &ana_form()).unwrap();

        let form = FighterForm {
            id: "7".to_string(),
            name: "Ana Maria".to_string(),
            father_name: "Vasile".to_string(),
            status: "Not Paid".to_string(),
            registration_date: "2024-03-10".to_string(),
        };
        update(&conn, &form).unwrap();

        let found = find(&conn, Some(7), None).unwrap();
        assert_eq!(found.fighter_name, "Ana Maria");
        assert_eq!(found.father_name, "Vasile");
        assert_eq!(found.status, PaymentStatus::NotPaid);
        assert_eq!(
            found.registration_date,
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_update_unknown_id_is_a_no_op() {
        let conn = test_conn();
        let mut form = ana_form();
        form.id = "42".to_string();
        assert!(update(&conn, &form).is_ok());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM fighters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let conn = test_conn();
        create(&conn, &ana_form()).unwrap();

        assert_eq!(delete(&conn, 7).unwrap(), 1);
        assert!(matches!(find(&conn, Some(7), None), Err(Error::NotFound)));

        // Second delete of the same id is a successful no-op
        assert_eq!(delete(&conn, 7).unwrap(), 0);
    }
}
