pub mod chat;
pub mod message;
pub mod user;

pub use chat::{GroupChat, PrivateChat};
pub use message::{AuthorSummary, ChatRef, Message, MessageView, NewMessage};
pub use user::{
    ImageSlot, NewUser, ProfileUpdate, Role, SocialLink, User, UserProfile, UserSummary,
};

/// Prefix `path` with `base` unless it already contains it
pub fn normalize_image_path(path: Option<String>, base: &str) -> Option<String> {
    path.map(|p| {
        if p.contains(base) {
            p
        } else {
            format!("{base}{p}")
        }
    })
}
