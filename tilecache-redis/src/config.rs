//! Connection security settings.
//!
//! Credentials and TLS options are kept out of the backend constructor's
//! own parameters: the application resolves a [`ConnectionSecurity`] once,
//! usually with [`ConnectionSecurity::from_env`], and hands it to the
//! builder.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Username for the Redis connection.
pub const REDIS_USERNAME: &str = "REDIS_USERNAME";
/// Password for the Redis connection.
pub const REDIS_PASSWORD: &str = "REDIS_PASSWORD";
/// `"true"` enables TLS.
pub const REDIS_TLS: &str = "REDIS_TLS";
/// Certificate verification mode override.
pub const SSL_CERTS_REQS: &str = "SSL_CERTS_REQS";

/// Server certificate verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertRequirements {
    /// Certificates are not verified.
    None,
    /// Certificates are verified when presented.
    ///
    /// The rustls client has no optional mode and verifies as with `Required`.
    Optional,
    /// Certificates must be present and valid.
    Required,
}

impl CertRequirements {
    /// Whether the connection skips certificate verification.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl FromStr for CertRequirements {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            other => Err(Error::InvalidConfig(format!(
                "unknown {SSL_CERTS_REQS} value {other:?}, expected none, optional or required"
            ))),
        }
    }
}

/// Credentials and TLS options of a Redis connection.
///
/// `cert_reqs` stays `None` unless explicitly set, letting the client apply
/// its own default (verify certificates).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionSecurity {
    /// Connection username.
    pub username: Option<String>,
    /// Connection password.
    pub password: Option<String>,
    /// Connect over TLS.
    pub tls: bool,
    /// Certificate verification override.
    pub cert_reqs: Option<CertRequirements>,
}

impl ConnectionSecurity {
    /// Reads `REDIS_USERNAME`, `REDIS_PASSWORD`, `REDIS_TLS` and
    /// `SSL_CERTS_REQS` from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let cert_reqs = non_empty(SSL_CERTS_REQS)
            .map(|value| value.parse::<CertRequirements>())
            .transpose()?;

        Ok(Self {
            username: non_empty(REDIS_USERNAME),
            password: non_empty(REDIS_PASSWORD),
            tls: parse_flag(lookup(REDIS_TLS).as_deref()),
            cert_reqs,
        })
    }
}

// Never print the password.
impl fmt::Debug for ConnectionSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSecurity")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("tls", &self.tls)
            .field("cert_reqs", &self.cert_reqs)
            .finish()
    }
}

/// Boolean environment rule: only `"true"` (trimmed, any case) is true.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}
