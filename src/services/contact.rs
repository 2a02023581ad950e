use crate::{
    config::AppConfig,
    errors::ServiceError,
    notifications::{contact_email, ContactSubmission, Mailer},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Phone number must be at least 8 characters"))]
    pub phone: String,
    #[validate(length(min = 3, message = "Subject must be at least 3 characters"))]
    pub subject: String,
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Forwards contact form messages to the shop mailbox
#[derive(Clone)]
pub struct ContactService {
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl ContactService {
    pub fn new(mailer: Arc<dyn Mailer>, config: Arc<AppConfig>) -> Self {
        Self { mailer, config }
    }

    #[instrument(skip(self, request), fields(subject = %request.subject))]
    pub async fn submit(&self, request: ContactRequest) -> Result<ContactResponse, ServiceError> {
        request.validate()?;

        let submission = ContactSubmission {
            name: request.name,
            email: request.email.filter(|e| !e.trim().is_empty()),
            phone: request.phone,
            subject: request.subject,
            message: request.message,
        };
        let message = contact_email(
            &self.config.mail_from,
            &self.config.contact_recipient,
            &submission,
        );

        self.mailer.send(message).await.map_err(|e| {
            error!(error = %e, "failed to forward contact message");
            ServiceError::InternalError("Failed to send message, please try again later".to_string())
        })?;

        info!("contact message forwarded");
        Ok(ContactResponse {
            success: true,
            message: "Your message has been sent successfully".to_string(),
        })
    }
}
