// Status lapse sweep
// Recomputes payment status from elapsed time since registration: a Paid
// record older than the lapse window reverts to Not Paid. Runs once before
// the server starts serving and again from a recurring background task.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{parse_registration_date, PaymentStatus};

/// Days a Paid status survives without re-registration.
pub const LAPSE_WINDOW_DAYS: i64 = 30;

// ============================================================================
// PURE RECOMPUTATION
// ============================================================================

/// Recompute a record's status for a given day.
///
/// `Paid` lapses to `NotPaid` strictly after the window closes
/// (`today > registration_date + 30 days`); `NotPaid` never flips back.
pub fn recompute_status(
    status: PaymentStatus,
    registration_date: NaiveDate,
    today: NaiveDate,
) -> PaymentStatus {
    match status {
        PaymentStatus::Paid if today > registration_date + Duration::days(LAPSE_WINDOW_DAYS) => {
            PaymentStatus::NotPaid
        }
        other => other,
    }
}

// ============================================================================
// BATCH SWEEP
// ============================================================================

/// One record the sweep could not process.
#[derive(Debug, Clone)]
pub struct SweepFailure {
    pub fighter_id: i64,
    pub message: String,
}

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Records examined.
    pub scanned: usize,
    /// Records whose status was flipped to Not Paid.
    pub lapsed: usize,
    /// Records skipped because of a malformed date or a failed update.
    pub failures: Vec<SweepFailure>,
}

/// Sweep every record, updating only those that actually lapsed.
///
/// Idempotent: rerunning with no time elapsed issues zero writes. A
/// failure on one record is recorded and the batch continues; only a
/// failure to read the table at all aborts the run.
pub fn run_sweep(conn: &Connection, today: NaiveDate) -> Result<SweepReport> {
    let mut stmt =
        conn.prepare("SELECT fighter_id, status, registration_date FROM fighters")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut report = SweepReport {
        scanned: rows.len(),
        ..Default::default()
    };

    for (fighter_id, status_text, date_text) in rows {
        let status = match status_text.parse::<PaymentStatus>() {
            Ok(s) => s,
            Err(e) => {
                warn!(fighter_id, %e, "sweep skipping record");
                report.failures.push(SweepFailure {
                    fighter_id,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let registration_date = match parse_registration_date(&date_text) {
            Ok(d) => d,
            Err(e) => {
                warn!(fighter_id, %e, "sweep skipping record");
                report.failures.push(SweepFailure {
                    fighter_id,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if recompute_status(status, registration_date, today) == status {
            continue;
        }

        let result = conn.execute(
            "UPDATE fighters SET status = ?1 WHERE fighter_id = ?2",
            params![PaymentStatus::NotPaid.as_str(), fighter_id],
        );
        match result {
            Ok(_) => report.lapsed += 1,
            Err(e) => {
                warn!(fighter_id, %e, "sweep update failed");
                report.failures.push(SweepFailure {
                    fighter_id,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        scanned = report.scanned,
        lapsed = report.lapsed,
        failures = report.failures.len(),
        "lapse sweep finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_schema;
    use crate::ops::{create, find, FighterForm};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_conn(status: &str, date: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_schema(&conn).unwrap();
        create(
            &conn,
            &FighterForm {
                id: "7".to_string(),
                name: "Ana".to_string(),
                father_name: "Ion".to_string(),
                status: status.to_string(),
                registration_date: date.to_string(),
            },
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_recompute_window_boundaries() {
        let reg = day(2024, 1, 1);

        // Same day and day 30 are inside the window
        assert_eq!(
            recompute_status(PaymentStatus::Paid, reg, reg),
            PaymentStatus::Paid
        );
        assert_eq!(
            recompute_status(PaymentStatus::Paid, reg, day(2024, 1, 31)),
            PaymentStatus::Paid
        );

        // Day 31 is past it
        assert_eq!(
            recompute_status(PaymentStatus::Paid, reg, day(2024, 2, 1)),
            PaymentStatus::NotPaid
        );

        // Not Paid never flips back, however old
        assert_eq!(
            recompute_status(PaymentStatus::NotPaid, reg, day(2025, 1, 1)),
            PaymentStatus::NotPaid
        );
    }

    #[test]
    fn test_sweep_lapses_stale_paid_record() {
        // 35 days after registration: lapses
        let conn = seeded_conn("Paid", "2024-01-01");
        let report = run_sweep(&conn, day(2024, 2, 5)).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.lapsed, 1);
        assert!(report.failures.is_empty());
        assert_eq!(
            find(&conn, Some(7), None).unwrap().status,
            PaymentStatus::NotPaid
        );
    }

    #[test]
    fn test_sweep_holds_fresh_paid_record() {
        // 19 days after registration: still Paid
        let conn = seeded_conn("Paid", "2024-01-01");
        let report = run_sweep(&conn, day(2024, 1, 20)).unwrap();
        assert_eq!(report.lapsed, 0);
        assert_eq!(
            find(&conn, Some(7), None).unwrap().status,
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_sweep_no_op_on_registration_day() {
        let conn = seeded_conn("Paid", "2024-01-01");
        let report = run_sweep(&conn, day(2024, 1, 1)).unwrap();
        assert_eq!(report.lapsed, 0);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let conn = seeded_conn("Paid", "2024-01-01");
        let first = run_sweep(&conn, day(2024, 2, 5)).unwrap();
        assert_eq!(first.lapsed, 1);

        // Immediate rerun writes nothing further
        let second = run_sweep(&conn, day(2024, 2, 5)).unwrap();
        assert_eq!(second.lapsed, 0);
        assert!(second.failures.is_empty());
    }

    #[test]
    fn test_malformed_date_does_not_abort_the_batch() {
        let conn = seeded_conn("Paid", "2024-01-01");
        // The date column is free text to the store; a corrupt row can exist
        conn.execute(
            "INSERT INTO fighters (fighter_id, fighter_name, father_name, status, registration_date)
             VALUES (8, 'Bogdan', 'Dan', 'Paid', 'last tuesday')",
            [],
        )
        .unwrap();

        let report = run_sweep(&conn, day(2024, 2, 5)).unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.lapsed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].fighter_id, 8);

        // The well-formed record was still processed
        assert_eq!(
            find(&conn, Some(7), None).unwrap().status,
            PaymentStatus::NotPaid
        );
    }
}
