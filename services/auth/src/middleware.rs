//! Middleware for bearer token validation

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;

use crate::{error::AuthError, models::User, service::AuthService};

/// The authenticated caller, placed in request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Validate the bearer token and attach the current user to the request
pub async fn auth_middleware(
    State(auth): State<AuthService>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        debug!("Request to {} without bearer token", req.uri().path());
        return Err(AuthError::InvalidToken);
    };

    let user = auth.verify(bearer.token()).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
