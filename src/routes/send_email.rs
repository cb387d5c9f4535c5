use crate::{domain::WeatherEntry, notifications::NotificationError, startup::AppState};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForecastData {
    #[serde(default)]
    weather_data: Vec<WeatherEntry>,
    #[serde(default)]
    recipient_email: String,
}

#[tracing::instrument(name = "Email a trip forecast", skip(state, payload))]
pub async fn send_trip_forecast(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TripForecastData>, JsonRejection>,
) -> Result<impl IntoResponse, NotificationError> {
    let Json(body) = payload.map_err(|e| NotificationError::InvalidArgument(e.body_text()))?;
    state
        .notifier
        .send_trip_forecast(&body.weather_data, &body.recipient_email)
        .await?;
    Ok(Json(
        serde_json::json!({ "message": "Email sent successfully." }),
    ))
}
