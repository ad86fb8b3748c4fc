//! Progressive discovery gateway for OData service catalogs.
//!
//! Instead of generating one MCP tool per service, entity and verb (which
//! buries a language-model caller under hundreds of tool descriptors), the
//! gateway exposes a fixed three-stage protocol over an in-memory catalog:
//!
//! 1. **search** — rank services and entities against a free-text query
//! 2. **describe** — fetch the full schema for one chosen entity
//! 3. **execute** — validate and dispatch one CRUD operation
//!
//! The catalog is loaded once at startup and read-only afterwards; the only
//! outbound call happens at the transport boundary in stage 3.

pub mod catalog;
pub mod cli;
pub mod error;
pub mod gateway;
pub mod stdio;
pub mod transport;

pub use catalog::Catalog;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use stdio::GatewayServer;
