//! HTTP middleware for the portal.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Route guards are extractors: [`RequireSession`], [`RequireAdmin`] and
//! [`OptionalSession`].

pub mod auth;
pub mod session;

pub use auth::{
    Access, GuardRejection, OptionalSession, RequireAdmin, RequireSession, check_access,
    clear_session_context, set_session_context,
};
pub use session::{create_session_layer, create_session_store};
