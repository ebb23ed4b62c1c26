use crate::config::{ServiceSettings, MAX_USER_PAGE_SIZE};
use crate::error::{AppError, AppResult};
use crate::middleware::authorization::{require_admin, require_self_or_admin};
use crate::middleware::guards::AuthenticatedCaller;
use crate::models::{
    normalize_image_path, ImageSlot, NewUser, ProfileUpdate, Role, SocialLink, User, UserProfile,
    UserSummary,
};
use crate::security::password;
use crate::store::UserDirectory;
use chrono::{Datelike, NaiveDate, Utc};
use crypto_core::jwt::{self, TokenResponse};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Applicants must be older than this many calendar years
pub const MINIMUM_AGE_YEARS: i32 = 12;

lazy_static! {
    static ref USER_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9_.]{3,32}$").expect("user name pattern is valid");
}

/// Largest accepted picture upload
pub const MAX_IMAGE_BYTES: usize = 500 * 1024;

/// A picture as received from a multipart form field
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Maps an upload to the extension it is stored under
fn image_extension(upload: &ImageUpload) -> Option<&'static str> {
    if !upload
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("image/"))
    {
        return None;
    }

    let ext = Path::new(upload.file_name.as_deref()?)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub password: String,
    pub birth_date: NaiveDate,
}

pub fn is_valid_user_name(user_name: &str) -> bool {
    USER_NAME_RE.is_match(user_name)
}

/// Year difference only; month and day are ignored
pub fn is_old_enough(birth_date: NaiveDate, today: NaiveDate) -> bool {
    today.year() - birth_date.year() > MINIMUM_AGE_YEARS
}

pub struct UserService {
    users: Arc<dyn UserDirectory>,
    avatar_base_path: String,
    image_dir: PathBuf,
    page_size: i64,
}

impl UserService {
    pub fn new(users: Arc<dyn UserDirectory>, settings: &ServiceSettings) -> Self {
        Self {
            users,
            avatar_base_path: settings.avatar_base_path.clone(),
            image_dir: settings.image_dir.clone(),
            page_size: settings.user_page_size.clamp(1, MAX_USER_PAGE_SIZE),
        }
    }

    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        if !is_valid_user_name(&input.user_name) {
            return Err(AppError::BadRequest(
                "user_name must be 3-32 letters, digits, '_' or '.'".into(),
            ));
        }
        if input.full_name.trim().is_empty() {
            return Err(AppError::BadRequest("full_name must not be empty".into()));
        }
        if !is_old_enough(input.birth_date, Utc::now().date_naive()) {
            return Err(AppError::BadRequest(format!(
                "applicant must be older than {MINIMUM_AGE_YEARS} years"
            )));
        }

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("email".into()));
        }
        if self.users.find_by_user_name(&input.user_name).await?.is_some() {
            return Err(AppError::Conflict("user_name".into()));
        }

        let password_hash = password::hash_password(&input.password)?;

        let user = self
            .users
            .insert(NewUser {
                email: input.email,
                user_name: input.user_name,
                full_name: input.full_name.trim().to_string(),
                password_hash,
                birth_date: input.birth_date,
                role: Role::Member,
            })
            .await?;

        tracing::info!(user_id = %user.id, user_name = %user.user_name, "user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

        password::verify_password(password, &user.password_hash)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "login attempt on disabled account");
            return Err(AppError::AccountDisabled);
        }

        let tokens = jwt::generate_token_pair(user.id, &user.email, &user.user_name).map_err(|e| {
            tracing::error!(error = %e, "failed to issue tokens");
            AppError::Internal
        })?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(tokens)
    }

    pub async fn change_password(
        &self,
        caller: &AuthenticatedCaller,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        password::verify_password(current_password, &user.password_hash)?;
        let password_hash = password::hash_password(new_password)?;

        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub async fn current_user(&self, caller: &AuthenticatedCaller) -> AppResult<UserProfile> {
        self.user_by_id(caller.user_id).await
    }

    pub async fn user_by_id(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let links = self.users.social_links(user_id).await?;
        Ok(UserProfile::new(user, links, &self.avatar_base_path))
    }

    /// One page of users plus the total count
    pub async fn list_users(
        &self,
        skip: Option<i64>,
        take: Option<i64>,
    ) -> AppResult<(i64, Vec<UserSummary>)> {
        let skip = skip.unwrap_or(0);
        let take = take.unwrap_or(self.page_size);
        if skip < 0 || !(1..=MAX_USER_PAGE_SIZE).contains(&take) {
            return Err(AppError::BadRequest(format!(
                "skip must be >= 0 and take between 1 and {MAX_USER_PAGE_SIZE}"
            )));
        }

        let (count, users) = self.users.list(skip, take).await?;
        Ok((count, self.summaries(users)))
    }

    pub async fn search_users(&self, query: Option<&str>) -> AppResult<Vec<UserSummary>> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("query is required".into()))?;

        let users = self.users.search(query).await?;
        if users.is_empty() {
            return Err(AppError::UserNotFound);
        }
        Ok(self.summaries(users))
    }

    pub async fn update_profile(
        &self,
        caller: &AuthenticatedCaller,
        user_id: Uuid,
        update: ProfileUpdate,
        social_links: Option<Vec<SocialLink>>,
    ) -> AppResult<UserProfile> {
        require_self_or_admin(caller, user_id)?;

        if update.full_name.trim().is_empty() {
            return Err(AppError::BadRequest("full_name must not be empty".into()));
        }
        if let Some(links) = &social_links {
            if links.iter().any(|l| l.name.trim().is_empty() || l.url.trim().is_empty()) {
                return Err(AppError::BadRequest("social links need a name and a url".into()));
            }
        }

        if !self
            .users
            .update_profile(user_id, &update, social_links.as_deref())
            .await?
        {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(user_id = %user_id, updated_by = %caller.user_id, "profile updated");
        self.user_by_id(user_id).await
    }

    /// Returns the new active state
    pub async fn toggle_active(&self, caller: &AuthenticatedCaller, user_id: Uuid) -> AppResult<bool> {
        require_admin(caller)?;

        let active = self
            .users
            .toggle_active(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id = %user_id, is_active = active, admin = %caller.user_id, "user activity toggled");
        Ok(active)
    }

    /// Stores a new profile or cover picture for the caller and returns its
    /// public path. The replaced file is removed from disk.
    pub async fn update_image(
        &self,
        caller: &AuthenticatedCaller,
        slot: ImageSlot,
        upload: ImageUpload,
    ) -> AppResult<String> {
        if upload.bytes.is_empty() {
            return Err(AppError::BadRequest("image must not be empty".into()));
        }
        if upload.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "image must be at most {MAX_IMAGE_BYTES} bytes"
            )));
        }
        let ext = image_extension(&upload).ok_or_else(|| {
            AppError::BadRequest("image must be a jpg, png, gif or webp file".into())
        })?;

        let file_name = format!("{}.{ext}", Uuid::new_v4());
        let target = self.image_dir.join(&file_name);
        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|e| {
                tracing::error!(dir = %self.image_dir.display(), error = %e, "cannot create image directory");
                AppError::Internal
            })?;
        tokio::fs::write(&target, &upload.bytes).await.map_err(|e| {
            tracing::error!(path = %target.display(), error = %e, "cannot write image");
            AppError::Internal
        })?;

        let previous = match self.users.replace_image(caller.user_id, slot, &file_name).await {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                self.remove_image_file(&target).await;
                return Err(AppError::UserNotFound);
            }
            Err(e) => {
                self.remove_image_file(&target).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous.as_deref().and_then(|p| Path::new(p).file_name()) {
            self.remove_image_file(&self.image_dir.join(old)).await;
        }

        tracing::info!(user_id = %caller.user_id, slot = ?slot, file = %file_name, "image replaced");
        Ok(normalize_image_path(Some(file_name), &self.avatar_base_path).unwrap_or_default())
    }

    async fn remove_image_file(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "image file not removed");
        }
    }

    fn summaries(&self, users: Vec<User>) -> Vec<UserSummary> {
        users
            .into_iter()
            .map(|u| UserSummary::new(u, &self.avatar_base_path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_user_name_rules() {
        assert!(is_valid_user_name("ana.k_99"));
        assert!(!is_valid_user_name("ab"));
        assert!(!is_valid_user_name("has space"));
        assert!(!is_valid_user_name(&"x".repeat(33)));
    }

    #[tokio::test]
    async fn test_oversized_default_page_is_clamped() {
        let store = MemoryStore::new();
        for i in 0..3 {
            UserDirectory::insert(
                &store,
                NewUser {
                    email: format!("u{i}@example.com"),
                    user_name: format!("user{i}"),
                    full_name: format!("User {i}"),
                    password_hash: "hash".into(),
                    birth_date: date(1990, 1, 1),
                    role: Role::Member,
                },
            )
            .await
            .unwrap();
        }
        let settings = ServiceSettings {
            user_page_size: 200,
            ..ServiceSettings::default()
        };
        let service = UserService::new(Arc::new(store), &settings);

        let (count, users) = service.list_users(None, None).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(users.len(), 3);
        assert!(matches!(
            service.list_users(None, Some(MAX_USER_PAGE_SIZE + 1)).await,
            Err(AppError::BadRequest(_))
        ));
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: Some(name.into()),
            content_type: Some("image/png".into()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_image_extension_rules() {
        assert_eq!(image_extension(&png("me.PNG")), Some("png"));
        assert_eq!(
            image_extension(&ImageUpload {
                content_type: Some("image/jpeg".into()),
                ..png("me.jpeg")
            }),
            Some("jpg")
        );
        assert_eq!(image_extension(&png("me.exe")), None);
        assert_eq!(image_extension(&png("noext")), None);
        assert_eq!(
            image_extension(&ImageUpload {
                content_type: Some("text/plain".into()),
                ..png("me.png")
            }),
            None
        );
    }

    #[tokio::test]
    async fn test_update_image_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let user = UserDirectory::insert(
            store.as_ref(),
            NewUser {
                email: "pic@example.com".into(),
                user_name: "pic".into(),
                full_name: "Pic Owner".into(),
                password_hash: "hash".into(),
                birth_date: date(1990, 1, 1),
                role: Role::Member,
            },
        )
        .await
        .unwrap();
        let settings = ServiceSettings {
            image_dir: dir.path().to_path_buf(),
            ..ServiceSettings::default()
        };
        let service = UserService::new(store.clone(), &settings);
        let caller = AuthenticatedCaller {
            user_id: user.id,
            email: user.email.clone(),
            roles: vec![Role::Member],
        };

        let first = service
            .update_image(&caller, ImageSlot::Profile, png("a.png"))
            .await
            .unwrap();
        let first_file = dir.path().join(first.trim_start_matches("Resources/Images/"));
        assert!(first.starts_with("Resources/Images/"));
        assert!(first_file.exists());

        let second = service
            .update_image(&caller, ImageSlot::Profile, png("b.png"))
            .await
            .unwrap();
        assert_ne!(first, second);
        assert!(!first_file.exists());
        assert!(dir
            .path()
            .join(second.trim_start_matches("Resources/Images/"))
            .exists());

        let too_big = ImageUpload {
            bytes: vec![0; MAX_IMAGE_BYTES + 1],
            ..png("big.png")
        };
        assert!(matches!(
            service.update_image(&caller, ImageSlot::Cover, too_big).await,
            Err(AppError::BadRequest(_))
        ));
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.cover_pic_url, None);
    }

    #[test]
    fn test_age_uses_year_difference() {
        let today = date(2024, 1, 1);
        assert!(is_old_enough(date(2011, 12, 31), today));
        assert!(!is_old_enough(date(2012, 1, 1), today));
    }
}
