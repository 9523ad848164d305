//! Role-based access for the HTTP API.
//!
//! Callers present `Authorization: Bearer <token>`, where the token is one of:
//!
//! - the journal admin or guest password, resolved to [`Role::Admin`] or
//!   [`Role::Guest`];
//! - a signed session token from `POST /consortium/admin-login`, resolved to
//!   [`Role::ConsortiumAdmin`].
//!
//! The resolved identity is attached to the request as a [`RequestContext`]
//! extension and checked by the per-group role middlewares.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

use crate::domain::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Guest,
    ConsortiumAdmin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_view_journal(&self) -> bool {
        matches!(self, Role::Admin | Role::Guest)
    }

    pub fn can_manage_consortium(&self) -> bool {
        matches!(self, Role::Admin | Role::ConsortiumAdmin)
    }
}

fn digest(password: &str) -> Zeroizing<[u8; 32]> {
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&Sha256::digest(password.as_bytes()));
    out
}

/// Journal passwords for each role, kept only as SHA-256 digests.
///
/// Candidates are digested before comparison, so the comparison never walks
/// the plaintext of a configured password.
#[derive(Clone)]
pub struct Credentials {
    admin_digest: Zeroizing<[u8; 32]>,
    guest_digest: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(admin_password: Zeroizing<String>, guest_password: Zeroizing<String>) -> Self {
        Self {
            admin_digest: digest(&admin_password),
            guest_digest: digest(&guest_password),
        }
    }

    /// Resolve a password to a role. Admin wins if both passwords are equal.
    pub fn role_for(&self, password: &str) -> Option<Role> {
        if password.is_empty() {
            return None;
        }
        let candidate = digest(password);
        if *candidate == *self.admin_digest {
            Some(Role::Admin)
        } else if *candidate == *self.guest_digest {
            Some(Role::Guest)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: u64,
    exp: u64,
}

/// Signs and checks consortium admin session tokens (HS256).
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Sign a token identifying `username` as a consortium admin.
    pub fn issue(&self, username: &str) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| {
                ApiError::InternalServerError("system clock is before UNIX_EPOCH".into())
            })?;
        let claims = Claims {
            sub: username.to_string(),
            role: Role::ConsortiumAdmin,
            iat: now.as_secs(),
            exp: (now + self.ttl).as_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign session token: {}", e);
            ApiError::InternalServerError("failed to issue session token".to_string())
        })
    }

    /// Check a token's signature and expiry. `None` for anything that fails.
    pub fn verify(&self, token: &str) -> Option<RequestContext> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(RequestContext {
                role: data.claims.role,
                username: Some(data.claims.sub),
            }),
            Err(e) => {
                if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                    tracing::debug!("Expired session token presented");
                }
                None
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Everything the auth middleware needs to resolve a bearer token.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<Credentials>,
    sessions: Arc<SessionIssuer>,
}

impl Authenticator {
    pub fn new(credentials: Credentials, sessions: SessionIssuer) -> Self {
        Self {
            credentials: Arc::new(credentials),
            sessions: Arc::new(sessions),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Journal passwords first, then consortium session tokens.
    pub fn resolve(&self, token: &str) -> Option<RequestContext> {
        if let Some(role) = self.credentials.role_for(token) {
            return Some(RequestContext { role, username: None });
        }
        self.sessions.verify(token)
    }
}

/// Per-request caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub role: Role,
    /// Set for consortium admin sessions
    pub username: Option<String>,
}

impl RequestContext {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require(Role::is_admin, "admin access required")
    }

    pub fn require_viewer(&self) -> Result<(), ApiError> {
        self.require(Role::can_view_journal, "journal access required")
    }

    pub fn require_consortium_admin(&self) -> Result<(), ApiError> {
        self.require(Role::can_manage_consortium, "consortium admin access required")
    }

    fn require(&self, allowed: fn(&Role) -> bool, message: &str) -> Result<(), ApiError> {
        if allowed(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(message.to_string()))
        }
    }
}

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header {
        Some(auth) => auth.strip_prefix("Bearer ").map(str::trim).ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format (expected Bearer token)");
            ApiError::Unauthorized("expected a Bearer token".to_string())
        }),
        None => {
            tracing::warn!("Missing Authorization header");
            Err(ApiError::Unauthorized("missing Authorization header".to_string()))
        }
    }
}

/// Middleware resolving the caller's identity; rejects unknown tokens with 401.
pub async fn require_auth(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = auth.resolve(bearer_token(&request)?).ok_or_else(|| {
        tracing::warn!("Invalid credentials presented on {}", request.uri().path());
        ApiError::Unauthorized("invalid credentials".to_string())
    })?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

async fn check_role(
    context: Option<Extension<RequestContext>>,
    request: Request,
    next: Next,
    check: fn(&RequestContext) -> Result<(), ApiError>,
) -> Result<Response, ApiError> {
    let Some(Extension(context)) = context else {
        return Err(ApiError::Unauthorized("not authenticated".to_string()));
    };
    if let Err(e) = check(&context) {
        tracing::warn!("{:?} refused on {}", context.role, request.uri().path());
        return Err(e);
    }
    Ok(next.run(request).await)
}

/// Journal admin only. Must run after [`require_auth`].
pub async fn require_admin(
    context: Option<Extension<RequestContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_role(context, request, next, RequestContext::require_admin).await
}

/// Journal admin or guest. Must run after [`require_auth`].
pub async fn require_viewer(
    context: Option<Extension<RequestContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_role(context, request, next, RequestContext::require_viewer).await
}

/// Journal admin or a consortium admin session. Must run after [`require_auth`].
pub async fn require_consortium_admin(
    context: Option<Extension<RequestContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_role(context, request, next, RequestContext::require_consortium_admin).await
}
