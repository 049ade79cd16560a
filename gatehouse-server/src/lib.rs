//! HTTP surface of the Gatehouse authentication service.
//!
//! The binary in `main.rs` wires configuration, the PostgreSQL-backed
//! credential store, and background maintenance together; everything
//! routable lives here so integration tests can build the router against
//! fake repositories.

pub mod handlers;
pub mod infra;
pub mod middleware;
pub mod routes;
