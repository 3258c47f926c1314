use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use herptrack_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserDto};

use crate::error::join_error;
use crate::{ApiError, AppState, validate};

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate::username(&req.username)?;
    let email = validate::email(&req.email)?;
    validate::password(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();
    let now = state.clock.now();

    // Uniqueness is enforced by the store at write time; a duplicate
    // surfaces as a conflict rather than a silent overwrite.
    let db = state.clone();
    let stored_username = username.clone();
    let stored_email = email.clone();
    tokio::task::spawn_blocking(move || {
        db.db
            .create_user(user_id, &stored_username, &stored_email, &password_hash, now)
    })
    .await
    .map_err(join_error)??;

    let token = issue_token(&state.jwt_secret, user_id, &username, now)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserDto {
                id: user_id,
                username,
                email,
                created_at: now,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_username(&username))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&req.password, &user.password)?;

    let token = issue_token(&state.jwt_secret, user.id, &user.username, state.clock.now())?;

    Ok(Json(AuthResponse {
        token,
        user: UserDto {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        },
    }))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash invalid: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)
}

fn issue_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    now: DateTime<Utc>,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn issued_token_decodes_to_the_same_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_token("secret", user_id, "sam", Utc::now()).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.username, "sam");
    }

    #[test]
    fn token_with_wrong_secret_fails_to_decode() {
        let token = issue_token("secret", Uuid::new_v4(), "sam", Utc::now()).unwrap();
        assert!(
            decode::<Claims>(
                &token,
                &DecodingKey::from_secret(b"other"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}
