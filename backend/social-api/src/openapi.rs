/// OpenAPI documentation for the social API
use crate::models::{AuthorSummary, MessageView, Role, SocialLink, UserProfile, UserSummary};
use crate::routes::{chats, messages, users};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social API",
        version = "1.0.0",
        description = "Users, chats and messages with read tracking",
        license(name = "MIT")
    ),
    paths(
        users::register,
        users::login,
        users::change_password,
        users::current_user,
        users::search_users,
        users::list_users,
        users::update_profile,
        users::user_by_id,
        users::toggle_active,
        users::upload_profile_pic,
        users::upload_cover_pic,
        chats::create_private_chat,
        chats::create_group_chat,
        messages::create_message,
        messages::delete_message,
        messages::private_chat_messages,
        messages::group_chat_messages,
        messages::mark_read,
        messages::mark_chat_read,
    ),
    components(schemas(
        AuthorSummary,
        MessageView,
        Role,
        SocialLink,
        UserProfile,
        UserSummary,
        users::RegisterRequest,
        users::RegisterResponse,
        users::LoginRequest,
        users::LoginResponse,
        users::ChangePasswordRequest,
        users::ListUsersResponse,
        users::UpdateProfileRequest,
        users::ToggleActiveResponse,
        users::ImageUploadForm,
        users::ImageResponse,
        chats::CreatePrivateChatRequest,
        chats::CreateGroupChatRequest,
        chats::ChatIdResponse,
        messages::CreateMessageRequest,
        messages::MessageIdResponse,
        messages::MessageIdRequest,
        messages::MarkChatReadRequest,
        messages::MarkChatReadResponse,
        messages::StatusResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Profiles and user administration"),
        (name = "Chats", description = "Private and group chats"),
        (name = "Messages", description = "Message CRUD and read state"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
