//! Business logic handlers
//!
//! These handlers contain the request logic served by the HTTP API. They know
//! nothing about sockets; the API layer adapts axum requests into them.

pub mod messages;
pub mod order;

// Re-export commonly used types
pub use messages::{default_headers, MessageHandler, Request, Response, MESSAGES_ROUTE};
pub use order::{Direction, SortOrder};
