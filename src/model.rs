// Fighter record model
// The single entity this application persists: one row per registered
// fighter, keyed by a caller-supplied integer id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ============================================================================
// PAYMENT STATUS
// ============================================================================

/// Payment status of a fighter.
///
/// Stored as TEXT in the fighters table using the wire text `'Paid'` /
/// `'Not Paid'`. Transitions: `NotPaid -> Paid` only via explicit
/// create/update; `Paid -> NotPaid` via explicit update or the lapse sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    NotPaid,
}

impl PaymentStatus {
    /// Text stored in the database and shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::NotPaid => "Not Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Paid" => Ok(PaymentStatus::Paid),
            "Not Paid" | "NotPaid" => Ok(PaymentStatus::NotPaid),
            other => Err(Error::Validation(format!(
                "invalid payment status: {:?}",
                other
            ))),
        }
    }
}

// ============================================================================
// FIGHTER RECORD
// ============================================================================

/// A registered fighter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fighter {
    /// Primary key, immutable once created.
    pub fighter_id: i64,

    pub fighter_name: String,

    pub father_name: String,

    pub status: PaymentStatus,

    /// Drives the lapse sweep: Paid reverts to Not Paid 30 days after this.
    pub registration_date: NaiveDate,
}

/// Parse a registration date in the store's `YYYY-MM-DD` form.
pub fn parse_registration_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid registration date {:?}: {}", s, e)))
}
