pub mod chat_service;
pub mod message_service;
pub mod user_service;

pub use chat_service::ChatService;
pub use message_service::{CreateMessageInput, MessageService};
pub use user_service::{ImageUpload, RegisterInput, UserService, MAX_IMAGE_BYTES};
