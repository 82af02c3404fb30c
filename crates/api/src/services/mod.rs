//! External service integrations.

pub mod cookies;
pub mod email;
pub mod storage;

pub use cookies::CookieHelper;
pub use email::EmailService;
pub use storage::{S3Storage, UnconfiguredStorage};
