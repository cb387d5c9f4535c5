use serde::Deserialize;

/// One stop of a planned trip, shaped like the forecast payload the
/// dashboard already has in hand.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherEntry {
    pub city: String,
    pub date: String,
    pub weather: WeatherReport,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub description: String,
}

impl WeatherEntry {
    fn condition(&self) -> &str {
        self.weather
            .weather
            .first()
            .map(|c| c.description.as_str())
            .unwrap_or("n/a")
    }

    /// Plain-text block for a single stop. Values are interpolated as-is.
    pub fn render(&self) -> String {
        format!(
            "City: {} ({})\nTemperature: {}°C\nCondition: {}\nSuggestion: {}",
            self.city,
            self.date,
            self.weather.main.temp,
            self.condition(),
            self.suggestion.as_deref().unwrap_or_default(),
        )
    }
}

/// Body of the trip forecast email: every entry, separated by a blank line.
pub fn compose_forecast(entries: &[WeatherEntry]) -> String {
    let mut body = String::from("Here is your trip weather forecast:\n\n");
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            body.push_str("\n\n");
        }
        body.push_str(&entry.render());
    }
    body
}
