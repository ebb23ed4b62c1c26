/// JWT issuance and validation shared by social-api services
///
/// Tokens are signed with RS256 only. Keys are loaded once at startup from PEM
/// strings and kept in process-wide cells; validation never falls back to a
/// symmetric algorithm.
///
/// ```ignore
/// use crypto_core::jwt;
///
/// jwt::initialize_jwt_keys(&private_pem, &public_pem)?;
/// let tokens = jwt::generate_token_pair(user_id, "ana@example.com", "ana")?;
/// let claims = jwt::validate_token(&tokens.access_token)?.claims;
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 3;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Claims carried by every token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id as UUID string)
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    /// "access" or "refresh"
    pub token_type: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Initialize both signing and verification keys.
///
/// Can only succeed once per process.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;
    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY
        .get()
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup."))
}

fn generate_token(
    user_id: Uuid,
    email: &str,
    username: &str,
    token_type: &str,
    lifetime: Duration,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.to_string(),
        email: email.to_string(),
        username: username.to_string(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, get_encoding_key()?)
        .map_err(|e| anyhow!("Failed to generate {token_type} token: {e}"))
}

pub fn generate_access_token(user_id: Uuid, email: &str, username: &str) -> Result<String> {
    generate_token(
        user_id,
        email,
        username,
        "access",
        Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS),
    )
}

pub fn generate_refresh_token(user_id: Uuid, email: &str, username: &str) -> Result<String> {
    generate_token(
        user_id,
        email,
        username,
        "refresh",
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    )
}

/// Generate access and refresh tokens in one call
pub fn generate_token_pair(user_id: Uuid, email: &str, username: &str) -> Result<TokenResponse> {
    Ok(TokenResponse {
        access_token: generate_access_token(user_id, email, username)?,
        refresh_token: generate_refresh_token(user_id, email, username)?,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_EXPIRY_HOURS * 3600,
    })
}

/// Verify signature and expiry, returning the decoded claims
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, get_decoding_key()?, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}
