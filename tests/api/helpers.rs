use async_trait::async_trait;
use once_cell::sync::Lazy;
use secrecy::Secret;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use weather_desk::{
    configuration::{get_configuration, AdminSettings, DatabaseSettings, Settings},
    email_client::{EmailMessage, EmailSender},
    repository::{
        FeedbackStore, InMemoryFeedbackStore, InMemoryUserStore, PgFeedbackStore, PgUserStore,
        UserStore,
    },
    startup::{get_connection_pool, Application},
    telemetry::{get_subscriber, init_subscriber},
};

// Ensure that the `tracing` stack is only initialised once
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub const ADMIN_EMAIL: &str = "admin@weather-desk.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Stands in for the SMTP relay.
#[derive(Default)]
pub struct FakeEmailSender {
    fail: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl FakeEmailSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for FakeEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), anyhow::Error> {
        if self.fail {
            anyhow::bail!("The relay is down.");
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub users: Arc<dyn UserStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub email_sender: Arc<FakeEmailSender>,
    pub db_pool: Option<PgPool>,
    pub api_client: reqwest::Client,
}

fn authorized(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

impl TestApp {
    pub async fn post_signup(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/signup", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Logs in and returns the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_login(&serde_json::json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_owned()
    }

    /// Registers a user and returns the bearer token issued at signup.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .post_signup(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_owned()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn put_update_profile(
        &self,
        email: &str,
        body: &serde_json::Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        let request = self
            .api_client
            .put(&format!("{}/api/update-profile/{}", &self.address, email))
            .json(body);
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_users(&self, token: Option<&str>) -> reqwest::Response {
        let request = self.api_client.get(&format!("{}/api/users", &self.address));
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_user(&self, id: &str, token: Option<&str>) -> reqwest::Response {
        let request = self
            .api_client
            .get(&format!("{}/api/users/{}", &self.address, id));
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_user(
        &self,
        id: &str,
        body: &serde_json::Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        let request = self
            .api_client
            .put(&format!("{}/api/users/{}", &self.address, id))
            .json(body);
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_user(&self, id: &str, token: Option<&str>) -> reqwest::Response {
        let request = self
            .api_client
            .delete(&format!("{}/api/users/{}", &self.address, id));
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_feedback(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/feedback", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_feedback(&self, token: Option<&str>) -> reqwest::Response {
        let request = self
            .api_client
            .get(&format!("{}/api/feedback", &self.address));
        authorized(request, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_send_email(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/send-email", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn db_pool(&self) -> &PgPool {
        self.db_pool
            .as_ref()
            .expect("The application was spawned without Postgres.")
    }

    /// The id of the user registered under `email`, as the admin sees it.
    pub async fn user_id(&self, email: &str) -> String {
        let token = self.admin_token().await;
        let users: Vec<serde_json::Value> = self
            .get_users(Some(&token))
            .await
            .json()
            .await
            .unwrap();
        users
            .into_iter()
            .find(|u| u["email"] == email)
            .and_then(|u| u["id"].as_str().map(str::to_owned))
            .expect("No user with this email.")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_sender(FakeEmailSender::default()).await
}

fn test_configuration() -> Settings {
    let mut c = get_configuration().expect("Failed to read configuration.");
    // Use a random OS port
    c.application.host = "127.0.0.1".into();
    c.application.port = 0;
    c.email_client.timeout_milliseconds = 500;
    c.admin = Some(AdminSettings {
        name: "Site Admin".into(),
        email: ADMIN_EMAIL.into(),
        password: Secret::new(ADMIN_PASSWORD.into()),
    });
    c
}

pub async fn spawn_app_with_sender(email_sender: FakeEmailSender) -> TestApp {
    Lazy::force(&TRACING);

    let configuration = test_configuration();
    let users = Arc::new(InMemoryUserStore::new());
    let feedback = Arc::new(InMemoryFeedbackStore::new());
    let email_sender = Arc::new(email_sender);

    let application = Application::build_with(
        &configuration,
        users.clone(),
        feedback.clone(),
        email_sender.clone(),
    )
    .await
    .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        users,
        feedback,
        email_sender,
        db_pool: None,
        api_client: reqwest::Client::new(),
    }
}

/// Runs the production wiring against a fresh database. Mail goes to the
/// configured relay, so `email_sender` records nothing.
pub async fn spawn_app_with_postgres() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = test_configuration();
        // Use a different database for each test case
        c.database.database_name = Uuid::new_v4().to_string();
        c
    };
    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    let db_pool = get_connection_pool(&configuration.database);
    TestApp {
        address,
        users: Arc::new(PgUserStore::new(db_pool.clone())),
        feedback: Arc::new(PgFeedbackStore::new(db_pool.clone())),
        email_sender: Arc::new(FakeEmailSender::default()),
        db_pool: Some(db_pool),
        api_client: reqwest::Client::new(),
    }
}

/// Creates the database; `Application::build` runs the migrations.
async fn configure_database(config: &DatabaseSettings) {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres.");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");
}
