pub mod auth;
pub mod domains;
pub mod sessions;
pub mod users;
