use crate::{configuration::EmailClientSettings, domain::UserEmail};
use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

/// A plain-text message. Nothing is escaped and there is no size limit.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub sender_name: String,
    pub recipient: UserEmail,
    pub subject: String,
    pub text_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), anyhow::Error>;
}

/// Sends mail through an SMTP relay.
pub struct EmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: UserEmail,
}

impl EmailClient {
    pub fn new(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = settings.sender().map_err(anyhow::Error::msg)?;
        let builder = if settings.require_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .with_context(|| format!("Failed to set up a TLS relay to {}", settings.host))?
        } else {
            // Plaintext, for local catch-all servers such as Mailpit.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout()));
        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, anyhow::Error> {
        let from_address: Address = self
            .sender
            .as_ref()
            .parse()
            .context("Invalid sender address.")?;
        let to_address: Address = message
            .recipient
            .as_ref()
            .parse()
            .context("Invalid recipient address.")?;
        Message::builder()
            .from(Mailbox::new(Some(message.sender_name.clone()), from_address))
            .to(Mailbox::new(None, to_address))
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body.clone())
            .context("Failed to build the email message.")
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    #[tracing::instrument(
        name = "Send email",
        skip(self, message),
        fields(recipient = %message.recipient, subject = %message.subject)
    )]
    async fn send_email(&self, message: &EmailMessage) -> Result<(), anyhow::Error> {
        let email = self.build_message(message)?;
        self.transport
            .send(email)
            .await
            .context("The SMTP relay rejected the message.")?;
        Ok(())
    }
}
