use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password,
        repo::{ConflictField, User},
    },
    error::ApiError,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Outcome of a successful register or login.
#[derive(Debug)]
pub struct AuthSuccess {
    pub user: PublicUser,
    pub token: String,
}

/// Normalizes and validates registration input without touching the
/// store: email lowercased and trimmed, name trimmed, password length
/// checked against the minimum.
fn validate_registration(payload: &RegisterRequest) -> Result<(String, String), ApiError> {
    let name = payload.name.trim().to_owned();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Name, email, and password are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok((name, email))
}

/// Registers a new principal: uniqueness pre-check on email and name,
/// hash, persist, issue token. The store's unique indexes remain the
/// final arbiter: a racing duplicate insert comes back as the same
/// conflict result the pre-check would have produced.
pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<AuthSuccess, ApiError> {
    let (name, email) = validate_registration(&payload)?;

    if let Some(existing) =
        User::find_by_email_or_name(&state.db, state.config.store_timeout, &email, &name).await?
    {
        let field = if existing.email == email {
            ConflictField::Email
        } else {
            ConflictField::Name
        };
        warn!(%field, "registration conflict");
        return Err(ApiError::Conflict(field));
    }

    let password = payload.password;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;

    let user = User::create(&state.db, state.config.store_timeout, &email, &name, &hash).await?;

    let keys = JwtKeys::new(&state.config.jwt.secret);
    let token = keys.sign(user.id, &user.email, &user.name)?;
    Ok(AuthSuccess {
        user: user.into(),
        token,
    })
}

/// Authenticates by email and password. Unknown email and wrong
/// password produce the same generic failure so callers cannot
/// enumerate accounts.
pub async fn login(state: &AppState, payload: LoginRequest) -> Result<AuthSuccess, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".into(),
        ));
    }

    let user = User::find_by_email(&state.db, state.config.store_timeout, &email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let password = payload.password;
    let hash = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::from)??;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::new(&state.config.jwt.secret);
    let token = keys.sign(user.id, &user.email, &user.name)?;
    Ok(AuthSuccess {
        user: user.into(),
        token,
    })
}

/// Profile fetch; the hash never leaves the repo layer.
pub async fn get_by_id(state: &AppState, id: Uuid) -> Result<Option<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, state.config.store_timeout, id).await?;
    Ok(user.map(PublicUser::from))
}
