// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

mod sse;

// Re-exports
pub use client::Polaris;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use session::SessionGuard;
pub use types::*;
