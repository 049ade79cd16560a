//! # Gatehouse Core
//!
//! Core library for the Gatehouse identity service, providing the credential
//! store, the bearer-token codec, and the authentication domain logic shared
//! by the authentication service and the SSO gateway.
//!
//! ## Overview
//!
//! `gatehouse-core` is the foundation of the Gatehouse workspace, offering:
//!
//! - **Credential Store**: trait-based repositories over PostgreSQL for
//!   domains, roles, users, refresh tokens, and revoked-token markers
//! - **Token Codec**: HS256-signed access tokens with per-token ids (`jti`)
//!   and distinct decode failures for malformed/tampered/expired input
//! - **Password Hashing**: Argon2id with a server-side pepper
//! - **Authentication Service**: register, login, verify, refresh-rotation,
//!   revocation, and the admin domain/user operations
//!
//! ## Architecture
//!
//! - [`api_types`]: request/response bodies shared across service boundaries
//! - [`token`]: access-token encode/decode
//! - [`crypto`]: password hashing
//! - [`store`]: repository ports and their PostgreSQL implementations
//! - [`service`]: the authentication service built on top of the store
//! - [`error`]: the crate-wide error taxonomy

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Request/response types shared across the Gatehouse services
pub mod api_types;

/// Password hashing with Argon2id and a server-side pepper
pub mod crypto;

/// Error types and the crate-wide [`Result`] alias
pub mod error;

/// Persistent records and derived read models
pub mod model;

/// The authentication service: token issuance, verification, and rotation
pub mod service;

/// Credential store ports and PostgreSQL adapters
pub mod store;

/// Signed access-token encoding and decoding
pub mod token;

pub use error::{AuthError, Result};

/// Embedded, versioned schema migrations for the credential store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
