//! Shared primitive types used across the panel.

use chrono::{DateTime, Utc};

/// Wall-clock instant, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Login name as typed by the user. Lookups are exact-match.
pub type Username = String;

/// Product key in the reference table (`item_name`).
pub type ItemName = String;
