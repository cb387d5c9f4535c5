//! Feedback inbox and outbound trip forecasts.
//!
//! The two email paths have different contracts. A feedback notification is
//! best-effort and runs detached from the request; a trip forecast is the
//! request, so its delivery outcome is returned to the caller.

use crate::{
    domain::{compose_forecast, Feedback, NewFeedback, UserEmail, WeatherEntry},
    email_client::{EmailMessage, EmailSender},
    error_handling::{error_chain_fmt, json_error},
    repository::{FeedbackStore, StoreError},
};
use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::Instrument;

const FEEDBACK_SENDER_NAME: &str = "Feedback System";
const FEEDBACK_SUBJECT: &str = "New Feedback Received";
const TRIP_SENDER_NAME: &str = "Trip Planner";
const TRIP_SUBJECT: &str = "Your Trip Weather Forecast";

#[derive(thiserror::Error)]
pub enum NotificationError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Failed to send email.")]
    EmailDelivery(#[source] anyhow::Error),
    #[error("Server error.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for NotificationError {
    fn from(e: StoreError) -> Self {
        NotificationError::UnexpectedError(anyhow::Error::new(e))
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let status = match self {
            NotificationError::InvalidArgument(_) => {
                tracing::warn!("{self:?}");
                StatusCode::BAD_REQUEST
            }
            NotificationError::EmailDelivery(_) | NotificationError::UnexpectedError(_) => {
                tracing::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        json_error(status, self.to_string())
    }
}

/// Owns the outbound mail channel and the two delivery contracts built on it.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    admin_recipient: UserEmail,
    timeout: Duration,
}

impl Notifier {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        admin_recipient: UserEmail,
        timeout: Duration,
    ) -> Self {
        Self {
            sender,
            admin_recipient,
            timeout,
        }
    }

    /// Tells the admin inbox about new feedback without waiting for the
    /// relay. Failures and timeouts are logged and go no further.
    pub fn notify_feedback(&self, feedback: &Feedback) -> JoinHandle<()> {
        let message = EmailMessage {
            sender_name: FEEDBACK_SENDER_NAME.into(),
            recipient: self.admin_recipient.clone(),
            subject: FEEDBACK_SUBJECT.into(),
            text_body: format!(
                "You have received new feedback.\n\nName: {}\nEmail: {}\nMessage: {}",
                feedback.name, feedback.email, feedback.message
            ),
        };
        let sender = Arc::clone(&self.sender);
        let timeout = self.timeout;
        let span = tracing::info_span!("Notify admin of feedback", feedback_id = %feedback.id);
        tokio::spawn(
            async move {
                match tokio::time::timeout(timeout, sender.send_email(&message)).await {
                    Ok(Ok(())) => tracing::info!("Feedback notification sent."),
                    Ok(Err(e)) => tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Failed to send feedback notification."
                    ),
                    Err(_) => tracing::error!("Feedback notification timed out."),
                }
            }
            .instrument(span),
        )
    }

    /// Sends one email with every entry of the trip. The caller learns
    /// whether the relay accepted it.
    #[tracing::instrument(
        name = "Send trip forecast",
        skip(self, entries),
        fields(entries = entries.len())
    )]
    pub async fn send_trip_forecast(
        &self,
        entries: &[WeatherEntry],
        recipient: &str,
    ) -> Result<(), NotificationError> {
        if entries.is_empty() || recipient.trim().is_empty() {
            return Err(NotificationError::InvalidArgument(
                "Missing weather data or recipient email".into(),
            ));
        }
        let recipient = UserEmail::parse(recipient.to_owned())
            .map_err(NotificationError::InvalidArgument)?;
        let message = EmailMessage {
            sender_name: TRIP_SENDER_NAME.into(),
            recipient,
            subject: TRIP_SUBJECT.into(),
            text_body: compose_forecast(entries),
        };
        tokio::time::timeout(self.timeout, self.sender.send_email(&message))
            .await
            .context("Timed out waiting for the SMTP relay.")
            .map_err(NotificationError::EmailDelivery)?
            .map_err(NotificationError::EmailDelivery)
    }
}

/// Persists the feedback, then fires the admin notification. The stored
/// record is the whole success contract.
#[tracing::instrument(
    name = "Submit feedback",
    skip(store, notifier, name, email, message),
    fields(feedback_email = %email)
)]
pub async fn submit_feedback(
    store: &dyn FeedbackStore,
    notifier: &Notifier,
    name: String,
    email: String,
    message: String,
) -> Result<Feedback, NotificationError> {
    let new_feedback =
        NewFeedback::parse(name, email, message).map_err(NotificationError::InvalidArgument)?;
    let feedback = Feedback::new(new_feedback);
    store
        .insert(&feedback)
        .await
        .context("Failed to store feedback.")?;
    notifier.notify_feedback(&feedback);
    Ok(feedback)
}

#[tracing::instrument(name = "List feedback", skip(store))]
pub async fn list_feedback(store: &dyn FeedbackStore) -> Result<Vec<Feedback>, NotificationError> {
    Ok(store.list().await?)
}
