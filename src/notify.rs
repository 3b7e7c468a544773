//! Outbound notification delivery.
//!
//! Mail transport is an injected capability rather than module-level state:
//! handlers receive a `dyn Notifier` and call `send(kind, recipient,
//! payload)`. When SMTP is not configured the server falls back to a
//! log-only sender, so password-reset flows stay testable in development
//! (the token lands in the server log instead of an inbox).

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SmtpConfig;

/// The kinds of mail this service sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    PasswordReset,
    PasswordChanged,
}

/// Per-message template inputs.
#[derive(Debug, Clone, Default)]
pub struct NotificationPayload {
    pub first_name: String,
    /// Reset link, present for `PasswordReset` only.
    pub reset_url: Option<String>,
}

/// Capability for delivering notifications. Failure must be surfaced to the
/// caller; what to do about it (roll back a token, or just log) is the
/// caller's decision.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: &NotificationPayload,
    ) -> Result<()>;
}

/// Render the subject and plain-text body for a notification.
fn render(kind: NotificationKind, payload: &NotificationPayload) -> (String, String) {
    let name = if payload.first_name.is_empty() {
        "User"
    } else {
        &payload.first_name
    };

    match kind {
        NotificationKind::PasswordReset => {
            let url = payload.reset_url.as_deref().unwrap_or("");
            (
                "Password Reset Request".to_string(),
                format!(
                    "Hello {},\n\n\
                     We received a request to reset the password for your account.\n\n\
                     Open this link to choose a new password:\n{}\n\n\
                     The link expires in 1 hour. If you didn't request this reset,\n\
                     you can ignore this email.\n",
                    name, url
                ),
            )
        }
        NotificationKind::PasswordChanged => (
            "Password Changed Successfully".to_string(),
            format!(
                "Hello {},\n\n\
                 Your password has been changed. You can now log in with your\n\
                 new password.\n\n\
                 If you didn't make this change, contact support immediately.\n",
                name
            ),
        ),
    }
}

/// SMTP-backed sender using lettre's async transport.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("invalid SMTP relay host")?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .from
            .parse::<Mailbox>()
            .context("invalid SMTP from address")?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        let to = recipient
            .parse::<Mailbox>()
            .context("invalid recipient address")?;
        let (subject, body) = render(kind, payload);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;

        info!(recipient = %recipient, kind = ?kind, "Notification sent");
        Ok(())
    }
}

/// Log-only sender used when SMTP is unconfigured. Reset links are written
/// to the server log; delivery never fails.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        match kind {
            NotificationKind::PasswordReset => {
                info!(
                    recipient = %recipient,
                    reset_url = %payload.reset_url.as_deref().unwrap_or(""),
                    "Password reset requested (SMTP not configured, logging link)"
                );
            }
            NotificationKind::PasswordChanged => {
                info!(recipient = %recipient, "Password change confirmation (SMTP not configured)");
            }
        }
        Ok(())
    }
}

/// Build the configured sender: SMTP when settings are present and valid,
/// otherwise the log-only fallback.
pub fn build_notifier(smtp: Option<&SmtpConfig>) -> Arc<dyn Notifier> {
    match smtp {
        Some(config) => match SmtpNotifier::new(config) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!("SMTP configuration rejected ({}); falling back to log-only notifier", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            info!("Email service not configured; reset links will be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_template_includes_link_and_expiry() {
        let payload = NotificationPayload {
            first_name: "Sneha".to_string(),
            reset_url: Some("http://localhost:5174/reset-password?token=abc".to_string()),
        };
        let (subject, body) = render(NotificationKind::PasswordReset, &payload);

        assert_eq!(subject, "Password Reset Request");
        assert!(body.contains("Hello Sneha"));
        assert!(body.contains("reset-password?token=abc"));
        assert!(body.contains("expires in 1 hour"));
    }

    #[test]
    fn confirmation_template_has_no_link() {
        let payload = NotificationPayload {
            first_name: String::new(),
            reset_url: None,
        };
        let (subject, body) = render(NotificationKind::PasswordChanged, &payload);

        assert_eq!(subject, "Password Changed Successfully");
        assert!(body.contains("Hello User"));
        assert!(!body.contains("http"));
    }
}
