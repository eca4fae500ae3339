//! Authorization gate for protected routes.
//!
//! `protect` resolves the bearer token to an account and stores it in the
//! request extensions; `admin_only` then checks the account's `role`.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use log::warn;

use crate::modules::accounts::error::AccountError;
use crate::modules::accounts::model::{AccountView, Role};
use crate::modules::http::AppState;

/// The authenticated caller, without password material
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub AccountView);

fn token_not_found() -> AccountError {
    AccountError::Unauthorized("Unauthorized, Token Not Found!".to_string())
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn protect(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AccountError> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or_else(token_not_found)?;

    let account = state.service.authenticate(&token).await.map_err(|e| {
        warn!("Rejected bearer token on {}: {}", request.uri().path(), e);
        e
    })?;

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

/// Fails with `Forbidden` unless the account's role is in `allowed`
pub fn restrict_to(account: &AccountView, allowed: &[Role]) -> Result<(), AccountError> {
    if allowed.contains(&account.role) {
        Ok(())
    } else {
        warn!(
            "Forbidden: account {} with role {} not in {:?}",
            account.id, account.role, allowed
        );
        Err(AccountError::Forbidden)
    }
}

/// Must run after `protect`
pub async fn admin_only(request: Request, next: Next) -> Result<Response, AccountError> {
    let current = request
        .extensions()
        .get::<CurrentAccount>()
        .ok_or_else(token_not_found)?;
    restrict_to(&current.0, &[Role::Admin])?;
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or_else(token_not_found)
    }
}
