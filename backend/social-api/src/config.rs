use crate::error::AppError;
use db_pool::env_utils::parse_env_with_default;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_AVATAR_BASE_PATH: &str = "Resources/Images/";
pub const DEFAULT_IMAGE_DIR: &str = "Resources/Images";
pub const DEFAULT_USER_PAGE_SIZE: i64 = 5;
/// Largest page `GET /users` serves, default or explicit
pub const MAX_USER_PAGE_SIZE: i64 = 100;

/// Who may delete a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Any authenticated caller
    #[default]
    Any,
    /// The message author or an admin
    AuthorOrAdmin,
}

impl FromStr for DeletePolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(DeletePolicy::Any),
            "author_or_admin" => Ok(DeletePolicy::AuthorOrAdmin),
            other => Err(AppError::Config(format!(
                "MESSAGE_DELETE_POLICY must be 'any' or 'author_or_admin', got '{other}'"
            ))),
        }
    }
}

/// Settings the services need at request time
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub avatar_base_path: String,
    /// Where uploaded profile and cover pictures are written
    pub image_dir: PathBuf,
    pub delete_policy: DeletePolicy,
    pub user_page_size: i64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            avatar_base_path: DEFAULT_AVATAR_BASE_PATH.to_string(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            delete_policy: DeletePolicy::default(),
            user_page_size: DEFAULT_USER_PAGE_SIZE,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_private_key_pem: String,
    pub jwt_public_key_pem: String,
    pub settings: ServiceSettings,
}

impl Config {
    /// Inline PEM wins over the `*_FILE` path variant
    fn read_pem(pem_var: &str, file_var: &str) -> Result<String, AppError> {
        if let Ok(pem) = env::var(pem_var) {
            return Ok(pem);
        }
        let path = env::var(file_var)
            .map_err(|_| AppError::Config(format!("{pem_var} or {file_var} must be set")))?;
        tracing::info!(%path, "reading {file_var}");
        std::fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("read {file_var} ({path}): {e}")))
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let port = parse_env_with_default("PORT", 8080u16);
        let jwt_private_key_pem = Self::read_pem("JWT_PRIVATE_KEY_PEM", "JWT_PRIVATE_KEY_FILE")?;
        let jwt_public_key_pem = Self::read_pem("JWT_PUBLIC_KEY_PEM", "JWT_PUBLIC_KEY_FILE")?;

        let avatar_base_path = env::var("AVATAR_BASE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR_BASE_PATH.to_string());

        let image_dir = env::var("IMAGE_UPLOAD_DIR")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR));

        let delete_policy = match env::var("MESSAGE_DELETE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => DeletePolicy::default(),
        };

        let user_page_size = parse_env_with_default("USER_PAGE_SIZE", DEFAULT_USER_PAGE_SIZE);
        if !(1..=MAX_USER_PAGE_SIZE).contains(&user_page_size) {
            return Err(AppError::Config(format!(
                "USER_PAGE_SIZE must be between 1 and {MAX_USER_PAGE_SIZE}, got {user_page_size}"
            )));
        }

        Ok(Self {
            port,
            jwt_private_key_pem,
            jwt_public_key_pem,
            settings: ServiceSettings {
                avatar_base_path,
                image_dir,
                delete_policy,
                user_page_size,
            },
        })
    }
}
