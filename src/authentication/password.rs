use crate::{
    domain::{Password, UserEmail, UserRecord},
    repository::UserStore,
    telemetry::spawn_blocking_with_tracing,
};
use anyhow::Context;
use argon2::{
    password_hash::SaltString, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
    Version,
};
use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

/// Checks an email/password pair against the stored hash.
///
/// An unknown email is verified against a fixed dummy hash so that both
/// failure modes take the same time and report the same error.
#[tracing::instrument(name = "Validate credentials", skip(credentials, store))]
pub async fn validate_credentials(
    credentials: Credentials,
    store: &dyn UserStore,
) -> Result<UserRecord, AuthError> {
    let mut user = None;
    let mut expected_password_hash = Secret::new(
        "$argon2id$v=19$m=19456,t=2,p=1$\
        aXQxUFVHWUtFOVBWdENDYw$\
        PlswAoDyDIzJ5ME4Eja3NeKFOSIwlwaXAnnyEmuK46o"
            .to_string(),
    );

    if let Some(stored_user) = get_stored_credentials(&credentials.email, store).await? {
        expected_password_hash = stored_user.password_hash.clone();
        user = Some(stored_user);
    }

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;

    user.ok_or_else(|| anyhow::anyhow!("Unknown email."))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)?;

    if !uses_current_params(&expected_password_hash)? {
        tracing::info!(
            "The stored password hash parameters are not consistent with the current parameters."
        );
    }

    Ok(())
}

#[tracing::instrument(name = "Get stored credentials", skip(email, store))]
async fn get_stored_credentials(
    email: &str,
    store: &dyn UserStore,
) -> Result<Option<UserRecord>, anyhow::Error> {
    // A malformed address cannot belong to anybody.
    let email = match UserEmail::parse(email.to_owned()) {
        Ok(email) => email,
        Err(_) => return Ok(None),
    };
    let user = store
        .find_by_email(&email)
        .await
        .context("Failed to perform a query to retrieve stored credentials.")?;
    Ok(user)
}

/// Hashes on the blocking pool; Argon2 is deliberately slow.
#[tracing::instrument(name = "Hash password", skip(password))]
pub async fn hash_password(password: Password) -> Result<Secret<String>, anyhow::Error> {
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn blocking task.")?
        .context("Failed to hash password")
}

pub fn compute_password_hash(password: Password) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::new(
        argon2::Algorithm::Argon2id,
        Version::V0x13,
        get_argon_params()?,
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)?
    .to_string();
    Ok(Secret::new(password_hash))
}

/// Compares the work factor only; the output length is not part of it.
fn uses_current_params(password_hash: &PasswordHash) -> Result<bool, anyhow::Error> {
    let stored = Params::try_from(password_hash)
        .context("Failed to determine parameters from hasher")?;
    let current = get_argon_params()?;
    Ok(stored.m_cost() == current.m_cost()
        && stored.t_cost() == current.t_cost()
        && stored.p_cost() == current.p_cost())
}

/// Fixed work factor for every hash we produce.
fn get_argon_params() -> Result<Params, anyhow::Error> {
    Params::new(19456, 2, 1, None).context("Invalid Argon2 parameters.")
}
