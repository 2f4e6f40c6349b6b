pub mod auth_service;
pub mod failure_writer;
pub mod lock_service;
pub mod upload_service;

pub use auth_service::{Authenticator, Credentials, Session};
pub use failure_writer::FailureWriter;
pub use lock_service::{AcquireOutcome, LockService};
pub use upload_service::{manage_url, replace_url, UploadService};
