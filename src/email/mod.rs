//! Outbound email.
//!
//! Callers hand an [`EmailMessage`] to an [`EmailSender`] and get back `Ok` or
//! an error; there is no retry here. [`LogEmailSender`] is used when no SMTP
//! relay is configured: it logs the envelope at `info` and the plain-text
//! body, which carries any reset link, at `debug`.

use crate::utils::toml_config::{EmailConfig, SmtpSecurity};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs messages instead of sending real email.
#[derive(Clone, Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "no SMTP relay configured, email not delivered"
        );
        debug!(to = %message.to, body = %message.text, "undelivered email body");
        Ok(())
    }
}

/// SMTP delivery through lettre's async transport.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig, host: &str, credentials: Option<(String, String)>) -> Result<Self> {
        let builder = match config.smtp_security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .with_context(|| format!("invalid SMTP relay '{}'", host))?,
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .with_context(|| format!("invalid SMTP relay '{}'", host))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let Some((user, pass)) = credentials {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address '{}'", config.from))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address '{}'", message.to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .context("failed to build email")?;

        let response = self
            .transport
            .send(email)
            .await
            .context("SMTP delivery failed")?;

        info!(to = %message.to, code = %response.code(), "email sent");
        Ok(())
    }
}

/// Builds the password-reset message for `name` with a link to `reset_url`.
pub fn password_reset_message(to: &str, name: &str, reset_url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "RecuperaJud - Redefinição de Senha".to_string(),
        text: format!(
            "Você solicitou a redefinição de sua senha. Acesse o link a seguir para criar uma \
             nova senha: {}. O link é válido por 1 hora.",
            reset_url
        ),
        html: format!(
            r#"<p>Olá {name},</p>
<p>Você solicitou a redefinição de sua senha.</p>
<p>Clique no botão abaixo para criar uma nova senha:</p>
<a href="{url}" style="display: inline-block; padding: 10px 20px; background-color: #4A6FDC; color: white; text-decoration: none; border-radius: 5px;">Redefinir Senha</a>
<p>O link é válido por 1 hora.</p>
<p>Se você não solicitou esta redefinição, ignore este email.</p>
<p>Atenciosamente,<br>Equipe RecuperaJud</p>"#,
            name = escape_html(name),
            url = escape_html(reset_url),
        ),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
