//! Batch-service credentials for 3DPassport.
//!
//! A batch service is registered in 3D Passport Control Center
//! (Integration → Batch Services), which issues the service name and secret.
//! The credential is loaded once at startup and never changes afterwards.

use std::fmt;

use crate::error::EnoviaError;

/// Platform base URL, e.g. `https://3dx.example.com`.
pub const ENV_BASE_URL: &str = "BASE_URL";
/// Batch service name (`DS-SERVICE-NAME`).
pub const ENV_SERVICE_NAME: &str = "SERVICE_NAME";
/// Batch service secret (`DS-SERVICE-SECRET`).
pub const ENV_SERVICE_SECRET: &str = "SERVICE_SECRET";
/// Login of the user the batch service acts for.
pub const ENV_USER: &str = "ENOVIA_USER";
/// TLS certificate verification switch.
pub const ENV_SSL_VERIFY: &str = "SSL_VERIFY";

/// Interpret an `SSL_VERIFY` value.
///
/// Verification stays on unless the value is literally `false` in any case;
/// `0`, `no` and the empty string all keep it on.
pub fn parse_ssl_verify(value: Option<&str>) -> bool {
    value.is_none_or(|v| !v.eq_ignore_ascii_case("false"))
}

/// Credentials of a 3DPassport batch service plus the platform location.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential {
    base_url: String,
    service_name: String,
    service_secret: String,
    user_identifier: String,
    tls_verify: bool,
}

impl ServiceCredential {
    /// Validate and assemble a credential.
    ///
    /// Every value but `ssl_verify` is required and must be non-blank.
    /// Values are kept verbatim, except that surrounding whitespace and a
    /// trailing `/` are dropped from `base_url`.
    pub fn load(
        base_url: Option<String>,
        service_name: Option<String>,
        service_secret: Option<String>,
        user_identifier: Option<String>,
        ssl_verify: Option<&str>,
    ) -> Result<Self, EnoviaError> {
        fn required(name: &str, value: Option<String>) -> Result<String, EnoviaError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(EnoviaError::Config(format!(
                    "[{name}] variable has not been set in environment"
                ))),
            }
        }

        let base_url = required(ENV_BASE_URL, base_url)?
            .trim()
            .trim_end_matches('/')
            .to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            EnoviaError::Config(format!("invalid {ENV_BASE_URL} \"{base_url}\": {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EnoviaError::Config(format!(
                "invalid {ENV_BASE_URL} \"{base_url}\": scheme must be http or https"
            )));
        }

        Ok(Self {
            base_url,
            service_name: required(ENV_SERVICE_NAME, service_name)?,
            service_secret: required(ENV_SERVICE_SECRET, service_secret)?,
            user_identifier: required(ENV_USER, user_identifier)?,
            tls_verify: parse_ssl_verify(ssl_verify),
        })
    }

    /// Load from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnoviaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ssl_verify = lookup(ENV_SSL_VERIFY);
        Self::load(
            lookup(ENV_BASE_URL),
            lookup(ENV_SERVICE_NAME),
            lookup(ENV_SERVICE_SECRET),
            lookup(ENV_USER),
            ssl_verify.as_deref(),
        )
    }

    /// Load from the process environment.
    ///
    /// | Variable         | Required | Description                               |
    /// |------------------|----------|-------------------------------------------|
    /// | `BASE_URL`       | yes      | Platform root, without `/3dspace`         |
    /// | `SERVICE_NAME`   | yes      | Batch service name                        |
    /// | `SERVICE_SECRET` | yes      | Batch service secret                      |
    /// | `ENOVIA_USER`    | yes      | User the batch service impersonates       |
    /// | `SSL_VERIFY`     | no       | `false` disables certificate verification |
    pub fn from_env() -> Result<Self, EnoviaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Platform root URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Batch service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Batch service secret.
    pub fn service_secret(&self) -> &str {
        &self.service_secret
    }

    /// User identifier passed to the batch ticket endpoint.
    pub fn user_identifier(&self) -> &str {
        &self.user_identifier
    }

    /// Whether TLS certificates are verified.
    pub fn tls_verify(&self) -> bool {
        self.tls_verify
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredential")
            .field("base_url", &self.base_url)
            .field("service_name", &self.service_name)
            .field("service_secret", &"<redacted>")
            .field("user_identifier", &self.user_identifier)
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}
