//! Process-local session identifier

use once_cell::sync::Lazy;
use uuid::Uuid;

static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Generated on first read, fixed for the life of the process
pub fn session_id() -> &'static str {
    SESSION_ID.as_str()
}
