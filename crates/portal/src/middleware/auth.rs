//! Route guards and session helpers for the identity gate.
//!
//! Guards read the [`SessionContext`] stored at login. Signed-out visitors are
//! sent to the sign-up form (or the admin login page for admin routes);
//! signed-in visitors without the required role are sent to the sign-up form.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use shopfloor_core::Role;

use crate::models::{SessionContext, session_keys};

/// Customer sign-up form.
pub const SIGN_IN_PATH: &str = "/login";
/// Admin email login page.
pub const ADMIN_SIGN_IN_PATH: &str = "/login-page";

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in visitor.
    Authenticated,
    /// Signed-in administrators only.
    Admin,
}

/// Why a guard turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// No session; sign in first.
    SignIn,
    /// No session on an admin route.
    AdminSignIn,
    /// Signed in, but not with the required role.
    WrongRole,
    /// The session layer is missing from the stack.
    NoSessionLayer,
}

impl GuardRejection {
    /// Where the visitor is redirected.
    #[must_use]
    pub const fn location(self) -> Option<&'static str> {
        match self {
            Self::SignIn | Self::WrongRole => Some(SIGN_IN_PATH),
            Self::AdminSignIn => Some(ADMIN_SIGN_IN_PATH),
            Self::NoSessionLayer => None,
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self.location() {
            Some(path) => Redirect::to(path).into_response(),
            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Decide whether `context` may reach a route requiring `access`.
///
/// # Errors
///
/// Returns the rejection that names where to send the visitor.
pub fn check_access(
    context: Option<&SessionContext>,
    access: Access,
) -> Result<(), GuardRejection> {
    match (context, access) {
        (None, Access::Authenticated) => Err(GuardRejection::SignIn),
        (None, Access::Admin) => Err(GuardRejection::AdminSignIn),
        (Some(ctx), Access::Admin) if ctx.role != Role::Admin => Err(GuardRejection::WrongRole),
        (Some(_), _) => Ok(()),
    }
}

async fn session_context(parts: &Parts) -> Result<Option<SessionContext>, GuardRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(GuardRejection::NoSessionLayer)?;

    Ok(session
        .get::<SessionContext>(session_keys::CURRENT_SESSION)
        .await
        .ok()
        .flatten())
}

/// Extractor that requires any signed-in visitor.
pub struct RequireSession(pub SessionContext);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = session_context(parts).await?;
        check_access(context.as_ref(), Access::Authenticated)?;
        context.map(Self).ok_or(GuardRejection::SignIn)
    }
}

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub SessionContext);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = session_context(parts).await?;
        check_access(context.as_ref(), Access::Admin)?;
        context.map(Self).ok_or(GuardRejection::AdminSignIn)
    }
}

/// Extractor that optionally gets the session context.
pub struct OptionalSession(pub Option<SessionContext>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_context(parts).await.ok().flatten()))
    }
}

/// Store the session context at login, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_context(
    session: &Session,
    context: &SessionContext,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_SESSION, context).await
}

/// Clear the session context (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_context(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<SessionContext>(session_keys::CURRENT_SESSION)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use shopfloor_core::{BasketId, UserId};

    use super::*;

    fn customer() -> SessionContext {
        SessionContext::customer(UserId::new("user_1"), BasketId::new("basket_a"), "Jo")
    }

    #[test]
    fn test_signed_out_visitors_are_sent_to_sign_in() {
        assert_eq!(
            check_access(None, Access::Authenticated),
            Err(GuardRejection::SignIn)
        );
        assert_eq!(
            check_access(None, Access::Admin),
            Err(GuardRejection::AdminSignIn)
        );
        assert_eq!(GuardRejection::AdminSignIn.location(), Some("/login-page"));
    }

    #[test]
    fn test_customers_cannot_reach_admin_routes() {
        let ctx = customer();
        assert_eq!(check_access(Some(&ctx), Access::Authenticated), Ok(()));
        assert_eq!(
            check_access(Some(&ctx), Access::Admin),
            Err(GuardRejection::WrongRole)
        );
        assert_eq!(GuardRejection::WrongRole.location(), Some("/login"));
    }

    #[test]
    fn test_admins_reach_everything() {
        let ctx = SessionContext::admin("Admin");
        assert_eq!(check_access(Some(&ctx), Access::Authenticated), Ok(()));
        assert_eq!(check_access(Some(&ctx), Access::Admin), Ok(()));
    }

    #[test]
    fn test_rejection_redirects() {
        let response = GuardRejection::SignIn.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }
}
