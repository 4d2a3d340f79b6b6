mod counter_store;
mod lockout;
mod mailer;
mod metrics;
mod models;
mod repository;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose the persistence and dispatch abstractions
pub use counter_store::{CounterStore, CounterStorePtr};
pub use lockout::{create_noop_lockout, LockoutPolicy, LockoutPolicyPtr};
pub use mailer::{EmailMessage, Mailer, MailerPtr};
pub use models::{NewUser, PasswordResetToken, Session, User, VerificationCode};
pub use repository::{Repository, RepositoryPtr};
