use crate::{
    accounts,
    authentication::{reject_anonymous_users, reject_non_admin_users, TokenIssuer},
    configuration::{DatabaseSettings, Settings},
    email_client::{EmailClient, EmailSender},
    notifications::Notifier,
    repository::{FeedbackStore, PgFeedbackStore, PgUserStore, UserStore},
    routes::{
        delete_user, get_user, health_check, list_feedback, list_users, login,
        send_trip_forecast, signup, submit_feedback, update_profile, update_user,
    },
};
use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post, put, IntoMakeService},
    Router, Server,
};
use hyper::server::conn::AddrIncoming;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{net::TcpListener, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

/// Shared, read-only request context. Durable state lives in the stores.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub notifier: Notifier,
    pub tokens: TokenIssuer,
}

pub struct Application {
    port: u16,
    server: Server<AddrIncoming, IntoMakeService<Router>>,
}

impl Application {
    /// Production wiring: Postgres stores and the SMTP relay.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .context("Failed to migrate the database.")?;

        let email_client = EmailClient::new(&configuration.email_client)
            .context("Failed to configure the email client.")?;

        Self::build_with(
            &configuration,
            Arc::new(PgUserStore::new(connection_pool.clone())),
            Arc::new(PgFeedbackStore::new(connection_pool)),
            Arc::new(email_client),
        )
        .await
    }

    /// Wires the application around the given stores and mail sender.
    pub async fn build_with(
        configuration: &Settings,
        users: Arc<dyn UserStore>,
        feedback: Arc<dyn FeedbackStore>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<Self, anyhow::Error> {
        if let Some(admin) = &configuration.admin {
            let created = accounts::ensure_admin(
                users.as_ref(),
                admin.name.clone(),
                admin.email.clone(),
                admin.password.clone(),
            )
            .await
            .context("Failed to bootstrap the admin account.")?;
            if created {
                tracing::info!(admin_email = %admin.email, "Created the admin account.");
            }
        }

        let admin_recipient = configuration
            .email_client
            .admin_recipient()
            .map_err(anyhow::Error::msg)?;
        let state = Arc::new(AppState {
            users,
            feedback,
            notifier: Notifier::new(
                email_sender,
                admin_recipient,
                configuration.email_client.timeout(),
            ),
            tokens: TokenIssuer::new(&configuration.jwt.secret, configuration.jwt.token_ttl()),
        });

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address).context("Failed to bind the listener.")?;
        let port = listener.local_addr()?.port();
        let server = Server::from_tcp(listener)?.serve(app(state).into_make_service());

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), hyper::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn app(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/api/users", get(list_users))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/feedback", get(list_feedback))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            reject_non_admin_users,
        ));

    let member_routes = Router::new()
        .route("/api/update-profile/:email", put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            reject_anonymous_users,
        ));

    Router::new()
        .route("/health_check", get(health_check))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/feedback", post(submit_feedback))
        .route("/api/send-email", post(send_trip_forecast))
        .merge(admin_routes)
        .merge(member_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
