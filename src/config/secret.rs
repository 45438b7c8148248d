//! Credentials that must not leak into logs
//!
//! The source API secret and the PostgreSQL connection string are loaded as
//! [`SecretString`]. Formatting one with `{:?}` prints a redaction marker,
//! the buffer is wiped on drop, and reading it requires an explicit
//! `expose_secret()`.
//!
//! ```rust
//! use secrecy::ExposeSecret;
//! use vitex::config::secret_string;
//!
//! let secret = secret_string("api-secret".to_string());
//! assert_eq!(secret.expose_secret().as_ref(), "api-secret");
//! assert!(!format!("{secret:?}").contains("api-secret"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Owned credential text
///
/// Derefs to `str` once exposed, so string methods such as `is_empty`,
/// `starts_with` or `parse` apply directly.
#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl Deref for SecretValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub type SecretString = Secret<SecretValue>;

#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_output_hides_value() {
        let secret = secret_string("hunter2".to_string());
        assert_eq!(secret.expose_secret(), "hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn test_exposed_value_parses_as_connection_string() {
        let secret = secret_string("postgresql://u:p@localhost/vitex".to_string());
        assert!(secret.expose_secret().starts_with("postgresql://"));

        let parsed: Result<tokio_postgres::Config, _> = secret.expose_secret().parse();
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_loads_from_toml_table() {
        #[derive(Deserialize)]
        struct Source {
            secret: SecretString,
        }

        let source: Source = toml::from_str("secret = \"abc\"").unwrap();
        assert_eq!(source.secret.expose_secret(), "abc");
        assert!(!source.secret.expose_secret().is_empty());
    }
}
