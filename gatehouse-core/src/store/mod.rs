//! Credential store: repository ports, their PostgreSQL implementations,
//! pool bootstrap, and idempotent seeding.

pub mod ports;
pub mod postgres;
pub mod seed;

pub use ports::{
    CredentialStore, DomainRepository, RefreshTokenRepository, RevokedTokenRepository,
    UserRepository,
};
pub use postgres::connect_with_retry;
pub use seed::{SeedOutcome, seed};
