//! Outgoing mail: password reset links and contact form forwarding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// A single outgoing email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "email (log transport)"
        );
        Ok(())
    }
}

/// POSTs each message as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpRelayMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayMailer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpRelayMailer {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }
        info!(subject = %message.subject, "email relayed");
        Ok(())
    }
}

pub fn password_reset_email(from: &str, to: &str, link: &str, ttl_minutes: u64) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        reply_to: None,
        subject: "Réinitialisation de votre mot de passe - L'Artistou".to_string(),
        text: format!(
            "Bonjour,\n\nVous avez demandé la réinitialisation de votre mot de passe.\n\
             Ouvrez ce lien pour choisir un nouveau mot de passe :\n{}\n\n\
             Ce lien expire dans {} minutes. Si vous n'êtes pas à l'origine de cette demande, \
             ignorez cet email.\n\nL'Artistou",
            link, ttl_minutes
        ),
    }
}

/// Contact form fields forwarded to the shop mailbox
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

pub fn contact_email(from: &str, recipient: &str, submission: &ContactSubmission) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: recipient.to_string(),
        reply_to: submission.email.clone(),
        subject: format!("[Contact] {}", submission.subject),
        text: format!(
            "Nom : {}\nEmail : {}\nTéléphone : {}\nSujet : {}\n\n{}",
            submission.name,
            submission.email.as_deref().unwrap_or("-"),
            submission.phone,
            submission.subject,
            submission.message
        ),
    }
}
