pub mod auth;
pub mod cron;
pub mod security_headers;

pub use auth::{require_admin, CurrentAdmin};
pub use cron::require_cron_secret;
pub use security_headers::security_headers;
