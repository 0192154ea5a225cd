//! SMTP delivery of new-quote notifications to the administrator.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use quotedesk_core::config::{MailConfig, MailCredentials};
use quotedesk_core::domain::quote::iso8601_millis;
use quotedesk_core::{NotificationOutcome, NotificationSink, QuoteRecord};
use secrecy::ExposeSecret;
use tera::{Context, Tera};

pub const NEW_QUOTE_SUBJECT: &str = "📩 Yêu cầu báo giá mới";

const HTML_TEMPLATE: &str = "new_quote.html";
const TEXT_TEMPLATE: &str = "new_quote.txt";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("template error: {0}")]
    Template(String),
    #[error("invalid mail address `{address}`: {source}")]
    Address { address: String, source: lettre::address::AddressError },
    #[error("message build error: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Renders the notification body. User-supplied fields are HTML-escaped in the
/// HTML part because the templates are registered under `.html` names.
#[derive(Clone, Debug)]
pub struct QuoteMailRenderer {
    tera: Tera,
}

impl QuoteMailRenderer {
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_template(HTML_TEMPLATE, include_str!("../templates/new_quote.html.tera"))
            .map_err(|e| MailError::Template(e.to_string()))?;
        tera.add_raw_template(TEXT_TEMPLATE, include_str!("../templates/new_quote.txt.tera"))
            .map_err(|e| MailError::Template(e.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, record: &QuoteRecord) -> Result<RenderedMail, MailError> {
        let mut context = Context::new();
        context.insert("quote", record);
        context.insert("created_at", &iso8601_millis::format(&record.created_at));

        let html = self
            .tera
            .render(HTML_TEMPLATE, &context)
            .map_err(|e| MailError::Template(e.to_string()))?;
        let text = self
            .tera
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(RenderedMail { subject: NEW_QUOTE_SUBJECT.to_string(), html, text })
    }
}

pub struct SmtpNotificationSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    renderer: QuoteMailRenderer,
}

impl SmtpNotificationSink {
    pub fn new(config: &MailConfig, credentials: MailCredentials) -> Result<Self, MailError> {
        let from = Mailbox::new(
            Some(config.sender_name.clone()),
            parse_address(&credentials.username)?,
        );
        let to = Mailbox::new(None, parse_address(&credentials.admin_email)?);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(config.smtp_host.trim())?
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.expose_secret().to_string(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport, from, to, renderer: QuoteMailRenderer::new()? })
    }

    pub fn build_message(&self, record: &QuoteRecord) -> Result<Message, MailError> {
        let rendered = self.renderer.render(record)?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))?;
        Ok(message)
    }
}

#[async_trait]
impl NotificationSink for SmtpNotificationSink {
    async fn notify(&self, record: &QuoteRecord) -> NotificationOutcome {
        let message = match self.build_message(record) {
            Ok(message) => message,
            Err(error) => return NotificationOutcome::Failed { reason: error.to_string() },
        };

        match self.transport.send(message).await {
            Ok(_) => NotificationOutcome::Delivered,
            Err(error) => NotificationOutcome::Failed { reason: error.to_string() },
        }
    }
}

fn parse_address(raw: &str) -> Result<Address, MailError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|source| MailError::Address { address: raw.to_string(), source })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use quotedesk_core::config::{AppConfig, MailCredentials};
    use quotedesk_core::{NotificationOutcome, NotificationSink, QuoteId, QuoteRecord};

    use super::{MailError, QuoteMailRenderer, SmtpNotificationSink, NEW_QUOTE_SUBJECT};

    fn record() -> QuoteRecord {
        QuoteRecord {
            id: QuoteId(1_792_398_600_000),
            fullname: "Anna <script>alert(1)</script>".to_string(),
            phone: "0123".to_string(),
            email: "a@x.com".to_string(),
            message: "Quote please & thanks".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).single().expect("timestamp"),
        }
    }

    fn credentials(username: &str, admin_email: &str) -> MailCredentials {
        MailCredentials {
            username: username.to_string(),
            password: "app-password".to_string().into(),
            admin_email: admin_email.to_string(),
        }
    }

    #[test]
    fn html_body_escapes_submitted_text() {
        let rendered = QuoteMailRenderer::new().expect("renderer").render(&record()).expect("render");

        assert_eq!(rendered.subject, NEW_QUOTE_SUBJECT);
        assert!(rendered.html.contains("Anna &lt;script&gt;alert(1)&lt;&#x2F;script&gt;"));
        assert!(rendered.html.contains("Quote please &amp; thanks"));
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("2026-10-19T08:30:00.000Z"));
    }

    #[test]
    fn text_body_keeps_submitted_text_verbatim() {
        let rendered = QuoteMailRenderer::new().expect("renderer").render(&record()).expect("render");

        assert!(rendered.text.contains("Họ tên: Anna <script>alert(1)</script>"));
        assert!(rendered.text.contains("Mã yêu cầu 1792398600000"));
    }

    #[tokio::test]
    async fn invalid_sender_address_is_rejected_at_construction() {
        let config = AppConfig::default();

        let result = SmtpNotificationSink::new(&config.mail, credentials("not an address", "a@x.com"));

        assert!(matches!(result, Err(MailError::Address { .. })));
    }

    #[tokio::test]
    async fn message_is_addressed_from_sender_to_admin() {
        let config = AppConfig::default();
        let sink = SmtpNotificationSink::new(
            &config.mail,
            credentials("sender@example.com", "owner@example.com"),
        )
        .expect("sink");

        let message = sink.build_message(&record()).expect("message");
        let envelope = message.envelope();

        assert_eq!(envelope.from().map(ToString::to_string), Some("sender@example.com".to_string()));
        assert_eq!(
            envelope.to().iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["owner@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn unreachable_relay_reports_failure_instead_of_erroring() {
        let mut config = AppConfig::default();
        config.mail.smtp_host = "localhost".to_string();
        config.mail.timeout_secs = 1;
        let sink = SmtpNotificationSink::new(
            &config.mail,
            credentials("sender@example.com", "owner@example.com"),
        )
        .expect("sink");

        let outcome = sink.notify(&record()).await;

        assert!(matches!(outcome, NotificationOutcome::Failed { .. }));
    }
}
