//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! # Identity
//! GET  /login                    - Customer sign-up form
//! POST /login                    - Sign up (or sign in as the configured admin)
//! GET  /login-page               - Admin email login
//! POST /login-page               - Admin email login submit
//! POST /logout                   - Clear the session
//!
//! # Customer
//! GET  /home                     - Signed-in customer's basket
//! GET  /shop                     - Catalog listing (public)
//! POST /baskets/{id}/items       - Add a product to a basket (owner or admin)
//!
//! # Cashier
//! GET  /cart                     - Basket board (any signed-in visitor)
//! GET  /cart/events              - Board updates as server-sent events
//! POST /cart/{id}/approve        - Approve a pending basket (admin)
//!
//! # Admin
//! GET  /dashboard                - Store metrics
//! GET  /upload                   - Catalog upload form
//! POST /upload                   - Upload a catalog sheet
//! GET  /print                    - Label print form
//! POST /print                    - Render a printable label sheet
//! GET  /bill                     - Baskets available for billing
//! GET  /bill/{id}                - Printable receipt
//! POST /bill/{id}/payment        - Record the payment mode
//!
//! # Everything else
//! *                              - /dashboard when signed in, else /login-page
//! ```

pub mod auth;
pub mod bill;
pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod home;
pub mod labels;
pub mod shop;

use std::collections::HashMap;

use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart},
    response::{Html, Redirect},
};

use crate::error::AppError;

use crate::middleware::OptionalSession;
use crate::models::SessionContext;
use crate::state::AppState;

/// Header navigation shown on every signed-in page.
#[derive(Debug, Clone)]
pub struct NavView {
    pub display_name: String,
    pub is_admin: bool,
    pub current_path: String,
}

impl NavView {
    #[must_use]
    pub fn new(context: &SessionContext, current_path: &str) -> Self {
        Self {
            display_name: context.display_name.clone(),
            is_admin: context.is_admin(),
            current_path: current_path.to_string(),
        }
    }
}

/// Build the portal router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(home::router())
        .merge(shop::router())
        .merge(cart::router())
        .merge(dashboard::router())
        .merge(catalog::router())
        .merge(labels::router())
        .merge(bill::router())
        .fallback(fallback)
}

/// Largest accepted spreadsheet upload.
pub const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// A submitted upload form: the `file` part plus any text fields.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart body.
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
                form.file = Some(bytes.to_vec());
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid {name}: {e}")))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Body limit layer for routes that take spreadsheets.
pub(crate) fn upload_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)
}

/// Render a template, logging render failures.
pub(crate) fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|err| {
        tracing::error!(error = %err, "Template render failed");
        String::from("Error rendering template")
    }))
}

/// Unknown paths.
async fn fallback(OptionalSession(context): OptionalSession) -> Redirect {
    Redirect::to(fallback_target(context.as_ref()))
}

/// Where an unknown path leads.
#[must_use]
pub fn fallback_target(context: Option<&SessionContext>) -> &'static str {
    if context.is_some() {
        "/dashboard"
    } else {
        crate::middleware::auth::ADMIN_SIGN_IN_PATH
    }
}
