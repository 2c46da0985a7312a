use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to deliver email: {0}")]
    Transport(String),
}

/// Outbound mail seam; selected at startup by `MAIL_TRANSPORT`.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError>;
}

/// Rendered subject and bodies for one message.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

pub fn verification_email(full_name: &str, link: &str) -> EmailContent {
    let html_body = format!(
        r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Welcome, {name}!</h2>
        <p>Please confirm your email address to activate your tournament account:</p>
        <p>
            <a href="{link}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Verify Email
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            If you didn't create an account, you can ignore this email.
        </p>
    </body>
</html>"###,
        name = html_escape::encode_text(full_name),
        link = link
    );

    let text_body = format!(
        "Welcome, {}!\n\nPlease confirm your email address to activate your tournament account:\n\n{}\n\nIf you didn't create an account, you can ignore this email.",
        full_name, link
    );

    EmailContent {
        subject: "Verify your email address".to_string(),
        html_body,
        text_body,
    }
}

pub fn password_reset_email(link: &str) -> EmailContent {
    let html_body = format!(
        r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Password Reset Request</h2>
        <p>We received a request to reset your password. Click the link below to choose a new one:</p>
        <p>
            <a href="{link}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Reset Password
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link expires in 1 hour. If you didn't request this, please ignore this email.
        </p>
    </body>
</html>"###,
        link = link
    );

    let text_body = format!(
        "Password Reset Request\n\nWe received a request to reset your password. Visit the link below to choose a new one:\n\n{}\n\nThis link expires in 1 hour. If you didn't request this, please ignore this email.",
        link
    );

    EmailContent {
        subject: "Reset your password".to_string(),
        html_body,
        text_body,
    }
}

#[derive(Clone)]
pub struct SmtpEmailProvider {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpEmailProvider {
    pub fn new(config: &SmtpConfig, from_email: &str) -> Result<Self, EmailError> {
        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP email provider initialized");

        Ok(Self {
            mailer,
            from_email: from_email.to_string(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        EmailError::InvalidAddress(e.to_string())
                    })?,
            )
            .to(to
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    EmailError::InvalidAddress(e.to_string())
                })?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| EmailError::Build(e.to_string()))?;

        // SmtpTransport is blocking.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to, "Failed to send email");
                Err(EmailError::Transport(e.to_string()))
            }
        }
    }
}

/// Development provider: writes the message to the log instead of sending it.
#[derive(Clone, Default)]
pub struct LogEmailProvider;

#[async_trait]
impl EmailProvider for LogEmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        let body = redact_query_tokens(text_body);
        tracing::info!(to = %to, subject = %subject, body = %body, "Email (log transport)");
        Ok(())
    }
}

/// Masks `token=` query values. Verification links carry their token in the
/// path and stay readable.
fn redact_query_tokens(body: &str) -> String {
    const MARKER: &str = "token=";

    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(idx) = rest.find(MARKER) {
        let (head, tail) = rest.split_at(idx + MARKER.len());
        out.push_str(head);
        out.push_str("[REDACTED]");
        let end = tail
            .find(|c: char| c.is_whitespace() || c == '&')
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Records every message in memory; used by tests.
#[derive(Default)]
pub struct MockEmailProvider {
    pub sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<SentEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        self.sent
            .lock()
            .map_err(|e| EmailError::Transport(format!("Mock mailbox poisoned: {}", e)))?
            .push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
                text_body: text_body.to_string(),
            });
        Ok(())
    }
}
