use std::path::PathBuf;

use tracing::info;

use crate::error::AgrilogError;

/// Outgoing message handed to a [`MailSender`]. The attachment, when present,
/// is a rendered report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

/// Delivery seam for billing and report mail. The core never talks SMTP
/// itself; callers plug in a transport.
pub trait MailSender {
    fn send(&mut self, message: &EmailMessage) -> Result<(), AgrilogError>;
}

/// Sender that logs instead of delivering. Default transport for the CLI, so
/// a billing run is inspectable before any mail leaves the farm.
#[derive(Debug, Default)]
pub struct DryRunSender {
    pub sent: Vec<EmailMessage>,
}

impl DryRunSender {
    pub fn new() -> DryRunSender {
        DryRunSender::default()
    }
}

impl MailSender for DryRunSender {
    fn send(&mut self, message: &EmailMessage) -> Result<(), AgrilogError> {
        if message.to.trim().is_empty() {
            return Err(AgrilogError::Mail {
                recipient: message.to.clone(),
                reason: "no recipient address".to_string(),
            });
        }
        info!(
            to = %message.to,
            subject = %message.subject,
            attachment = ?message.attachment,
            "dry-run: mail not delivered"
        );
        self.sent.push(message.clone());
        Ok(())
    }
}
