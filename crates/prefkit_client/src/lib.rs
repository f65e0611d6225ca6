//! PrefKit Client Seams
//!
//! The network edge of the preferences engine:
//!
//! - [`AuthGateway`]: token storage (crypto and login live elsewhere)
//! - [`PreferencesTransport`]: the raw wire, token-per-call
//! - [`PreferencesClient`]: what the store consumes
//! - [`RetryingClient`]: the 401 refresh-and-replay-exactly-once bridge
//! - [`MemoryServer`]: in-memory reference transport for tests/examples
//!
//! # Example
//!
//! ```rust,ignore
//! let server = MemoryServer::new(None);
//! let gateway = MemoryAuthGateway::new();
//! let tokens = server.issue_tokens();
//! gateway.set_tokens(&tokens.access, &tokens.refresh);
//!
//! let client = RetryingClient::new(server, gateway);
//! let doc = client.fetch().await?; // None: no preferences stored yet
//! ```

pub mod auth;
pub mod client;
pub mod memory;

pub use auth::{AuthGateway, MemoryAuthGateway, TokenPair};
pub use client::{ApiError, PreferencesClient, PreferencesTransport, RetryingClient};
pub use memory::MemoryServer;
