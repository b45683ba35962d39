//! Identity gate routes: customer sign-up, admin email login and logout.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfloor_core::Role;

use super::render;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_session_context, set_session_context};
use crate::models::SessionContext;
use crate::services::{Admission, Change};
use crate::state::AppState;

/// Sign-up form template.
#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    name: String,
    phone: String,
    error: Option<String>,
}

/// Admin login template.
#[derive(Template)]
#[template(path = "auth/admin_login.html")]
struct AdminLoginTemplate {
    email: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub email: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(signup_page).post(signup))
        .route("/login-page", get(admin_login_page).post(admin_login))
        .route("/logout", post(logout))
}

/// GET /login
async fn signup_page() -> impl IntoResponse {
    render(&SignupTemplate {
        name: String::new(),
        phone: String::new(),
        error: None,
    })
}

/// Sign up as a customer, or sign in with the configured admin identity.
///
/// POST /login
#[instrument(skip_all)]
async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let rerender = |error: String| {
        render(&SignupTemplate {
            name: form.name.clone(),
            phone: form.phone.clone(),
            error: Some(error),
        })
        .into_response()
    };

    let admission = match state.identity_gate().admit_customer(&form.name, &form.phone) {
        Ok(admission) => admission,
        Err(err) => return Ok(rerender(err.to_string())),
    };

    match admission {
        Admission::Admin { display_name } => {
            set_session_context(&session, &SessionContext::admin(&display_name)).await?;
            set_sentry_user("admin", &display_name);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Admission::Customer { name, phone } => {
            let registration = match state.workflow().register(&name, phone.as_str()).await {
                Ok(registration) => registration,
                Err(err) => {
                    tracing::error!(error = %err, "Registration failed");
                    return Ok(rerender(
                        "Failed to create user and basket. Please try again.".to_string(),
                    ));
                }
            };

            let context = SessionContext::customer(
                registration.user.id.clone(),
                registration.basket.id.clone(),
                &name,
            );
            set_session_context(&session, &context).await?;
            set_sentry_user(registration.user.id.as_str(), &name);

            let live = state.live();
            live.apply(Change::Basket(registration.basket)).await;
            live.apply(Change::User(registration.user)).await;

            Ok(Redirect::to("/home").into_response())
        }
    }
}

/// GET /login-page
async fn admin_login_page() -> impl IntoResponse {
    render(&AdminLoginTemplate {
        email: String::new(),
        error: None,
    })
}

/// POST /login-page
#[instrument(skip_all)]
async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, AppError> {
    let role = match state.identity_gate().admit_by_email(&form.email) {
        Ok(role) => role,
        Err(err) => {
            return Ok(render(&AdminLoginTemplate {
                email: form.email,
                error: Some(err.to_string()),
            })
            .into_response());
        }
    };

    let email = form.email.trim();
    match role {
        Role::Admin => {
            let name = state.config().admin.name.clone();
            set_session_context(&session, &SessionContext::admin(&name)).await?;
            set_sentry_user("admin", &name);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Role::User => {
            let context = SessionContext {
                role: Role::User,
                user_id: None,
                basket_id: None,
                display_name: email.to_string(),
            };
            set_session_context(&session, &context).await?;
            Ok(Redirect::to("/home").into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /logout
async fn logout(session: Session) -> impl IntoResponse {
    let _ = clear_session_context(&session).await;
    clear_sentry_user();
    Redirect::to("/login")
}
