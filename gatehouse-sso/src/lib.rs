//! SSO gateway for the applications behind gatehouse.
//!
//! One login page serves every consuming application: credentials are
//! exchanged for tokens at the Authentication Service, the tokens land in
//! HttpOnly cookies shared across the apps, and the browser is sent back to
//! where it came from. Redirect targets pass a trusted-host allow-list;
//! anything else is silently replaced by a configured default.
//!
//! Consuming applications mount [`guard::sso_guard`] to require a login and
//! receive the verified identity in their request extensions.

pub mod client;
pub mod cookies;
pub mod guard;
pub mod handlers;
pub mod pages;
pub mod redirect;
pub mod routes;
pub mod state;
