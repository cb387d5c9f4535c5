use anyhow::anyhow;
use derive_more::{Deref, DerefMut};
use passwords::analyzer;
use secrecy::{ExposeSecret, Secret};

/// A plaintext password that passed our input checks. It never leaves
/// its `Secret` wrapper until it is hashed.
#[derive(Deref, DerefMut, Debug)]
pub struct Password(Secret<String>);

impl Password {
    pub fn parse(input: Secret<String>) -> Result<Self, anyhow::Error> {
        let analysis = analyzer::analyze(input.expose_secret());
        if analysis.password() != input.expose_secret() {
            return Err(anyhow!("Password contains invalid characters."));
        }
        if analysis.length() == 0 {
            return Err(anyhow!("Password must not be empty."));
        }
        if analysis.length() > 128 {
            return Err(anyhow!("Password is longer than 128 characters."));
        }
        Ok(Self(input))
    }
}
