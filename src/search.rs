// Search/filter engine
// Folds the view page's optional criteria into a dynamic WHERE clause.
// Read-only: never mutates the store, and "no matches" is an empty Vec.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::db::{fighter_from_row, FIGHTER_COLUMNS};
use crate::error::Result;
use crate::model::{Fighter, PaymentStatus};

/// Sentinel status meaning "no status filter".
pub const STATUS_ALL: &str = "All";

/// Zero or more optional search criteria.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Free text matched against the name (substring) or the id (exact).
    pub text: Option<String>,

    /// Exact status filter; `None` means all statuses.
    pub status: Option<PaymentStatus>,
}

impl SearchQuery {
    /// Build a query from raw form input.
    ///
    /// Empty text and the `"All"` sentinel both mean "criterion absent".
    pub fn from_input(search: Option<&str>, status: Option<&str>) -> Result<Self> {
        let text = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let status = match status.map(str::trim) {
            None | Some("") | Some(STATUS_ALL) => None,
            Some(value) => Some(value.parse::<PaymentStatus>()?),
        };

        Ok(SearchQuery { text, status })
    }
}

/// Return every fighter matching the query, in store-defined order.
///
/// Criteria groups are conjoined with AND; the free-text group is the
/// only internal disjunction (`name LIKE ... OR id = ...`). All values
/// are bound parameters.
pub fn list(conn: &Connection, query: &SearchQuery) -> Result<Vec<Fighter>> {
    let mut sql = format!("SELECT {} FROM fighters", FIGHTER_COLUMNS);
    let mut filters: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    // Bare `?` placeholders bind positionally, in the order the values
    // are pushed, so clause text stays independent of how many criteria
    // precede it.
    if let Some(text) = &query.text {
        filters.push("(fighter_name LIKE ? OR fighter_id = ?)");
        values.push(Value::Text(format!("%{}%", text)));
        // Bind the id clause as an integer when the text is one; anything
        // else cannot equal an INTEGER column and falls through to the
        // name clause.
        match text.parse::<i64>() {
            Ok(id) => values.push(Value::Integer(id)),
            Err(_) => values.push(Value::Text(text.clone())),
        }
    }

    if let Some(status) = query.status {
        filters.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }

    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }

    let mut stmt = conn.prepare(&sql)?;
    let fighters = stmt
        .query_map(params_from_iter(values), fighter_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(fighters)
}
