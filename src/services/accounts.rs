use crate::{
    auth::{
        password::{generate_token, hash_password, hash_reset_token, verify_password},
        AuthService,
    },
    config::AppConfig,
    entities::{user, UserRole},
    errors::ServiceError,
    notifications::{password_reset_email, Mailer},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Returned by forgot-password whether or not the account exists.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// A user without password hash, session or reset secrets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and password management
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            auth,
            mailer,
            config,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&*self.db)
            .await?)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    fn auth_response(&self, user: &user::Model, session_token: &str) -> Result<AuthResponse, ServiceError> {
        let access_token = self.auth.issue_token(user, session_token)?;
        Ok(AuthResponse {
            access_token,
            user: UserSummary::from(user),
        })
    }

    /// Creates a customer account and signs it in.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let session_token = generate_token();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&request.email)),
            password_hash: Set(hash_password(&request.password)?),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            phone: Set(request.phone),
            role: Set(UserRole::Customer),
            current_session_token: Set(Some(session_token.clone())),
            reset_password_token: Set(None),
            reset_password_expires: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "User already exists"))?;

        info!(user_id = %user.id, "user registered");
        self.auth_response(&user, &session_token)
    }

    /// Verifies credentials and rotates the stored session token, which
    /// invalidates every token issued by earlier logins.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;

        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized("Incorrect password".to_string()));
        }

        let session_token = generate_token();
        let mut active: user::ActiveModel = user.into();
        active.current_session_token = Set(Some(session_token.clone()));
        active.updated_at = Set(Utc::now());
        let user = active.update(&*self.db).await?;

        info!(user_id = %user.id, "login succeeded, previous sessions invalidated");
        self.auth_response(&user, &session_token)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        self.find_user(user_id).await.map(UserProfile::from)
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ServiceError> {
        request.validate()?;

        let mut active: user::ActiveModel = self.find_user(user_id).await?.into();
        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_at = Set(Utc::now());

        let user = active.update(&*self.db).await?;
        info!(user_id = %user.id, "profile updated");
        Ok(user.into())
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        request.validate()?;

        let user = self.find_user(user_id).await?;
        if !verify_password(&request.old_password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        info!(user_id = %user_id, "password changed");
        Ok(MessageResponse::new("Password changed successfully"))
    }

    /// Emails a reset link when the account exists. The response never
    /// reveals whether it does, and a mail failure is only logged.
    #[instrument(skip(self, request))]
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        request.validate()?;

        let Some(user) = self.find_by_email(&request.email).await? else {
            info!("password reset requested for unknown email");
            return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
        };

        let token = generate_token();
        let ttl = self.config.password_reset_ttl_secs;
        let expires = Utc::now() + Duration::seconds(ttl as i64);

        let email = user.email.clone();
        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.reset_password_token = Set(Some(hash_reset_token(&token)));
        active.reset_password_expires = Set(Some(expires));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        let message = password_reset_email(
            &self.config.mail_from,
            &email,
            &self.config.password_reset_link(&token),
            ttl / 60,
        );
        if let Err(e) = self.mailer.send(message).await {
            warn!(user_id = %user_id, error = %e, "failed to send password reset email");
        } else {
            info!(user_id = %user_id, "password reset email sent");
        }

        Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
    }

    #[instrument(skip(self, request))]
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        request.validate()?;

        let user = user::Entity::find()
            .filter(user::Column::ResetPasswordToken.eq(hash_reset_token(request.token.trim())))
            .filter(user::Column::ResetPasswordExpires.gt(Utc::now()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError("Invalid or expired reset token".to_string())
            })?;

        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.reset_password_token = Set(None);
        active.reset_password_expires = Set(None);
        active.current_session_token = Set(Some(generate_token()));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        info!(user_id = %user_id, "password reset, existing sessions invalidated");
        Ok(MessageResponse::new("Password has been reset successfully"))
    }
}
