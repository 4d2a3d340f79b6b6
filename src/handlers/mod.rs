// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod admin;
mod flow;
mod health;
mod login;
mod metrics;
mod password_reset;
mod register;
mod root;
mod shared_types;
mod validate;
mod verify;

// Core handlers
pub use health::health_check;
pub use metrics::metrics_handler;
pub use root::root_handler;

// Authentication flow handlers
pub use login::login;
pub use register::register;
pub use verify::{resend, verify};

// Password-reset flow handlers
pub use password_reset::{confirm_reset, probe_reset, request_reset};

// Administration
pub use admin::clear_rate_limits;
