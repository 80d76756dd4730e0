// Fighter Payment Registry - Core Library
// Exposes all modules for use in the web server and tests

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod ops;
pub mod search;
pub mod sweep;

// Re-export commonly used types
pub use config::Config;
pub use db::{open, setup_schema};
pub use error::{Error, Result};
pub use model::{parse_registration_date, Fighter, PaymentStatus};
pub use ops::{create, delete, find, parse_form, update, FighterForm};
pub use search::{list, SearchQuery, STATUS_ALL};
pub use sweep::{recompute_status, run_sweep, SweepReport, LAPSE_WINDOW_DAYS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
