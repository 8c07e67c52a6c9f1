//! Credentials, read once from the environment and passed around by value.

use std::fmt;

use crate::config::ConfigError;

pub const ENTSOE_KEY: &str = "ENTSOE_KEY";
pub const PUSHOVER_USER_KEY: &str = "PUSHOVER_USER_KEY";
pub const PUSHOVER_API_TOKEN: &str = "PUSHOVER_API_TOKEN";
pub const EMAIL_SENDER: &str = "EMAIL_SENDER";
pub const EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
pub const EMAIL_TARGET: &str = "EMAIL_TARGET";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub entsoe_key: Option<String>,
    pub pushover_user_key: Option<String>,
    pub pushover_api_token: Option<String>,
    pub email_sender: Option<String>,
    pub email_password: Option<String>,
    pub email_target: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary name → value lookup. Every value is cleaned
    /// with [`clean_secret`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).and_then(|v| clean_secret(&v));
        Self {
            entsoe_key: get(ENTSOE_KEY),
            pushover_user_key: get(PUSHOVER_USER_KEY),
            pushover_api_token: get(PUSHOVER_API_TOKEN),
            email_sender: get(EMAIL_SENDER),
            email_password: get(EMAIL_PASSWORD),
            email_target: get(EMAIL_TARGET),
        }
    }

    pub fn require_entsoe_key(&self) -> Result<&str, ConfigError> {
        self.entsoe_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret(ENTSOE_KEY))
    }

    /// Both halves of the Pushover credential pair, if present.
    pub fn pushover(&self) -> Option<(&str, &str)> {
        Some((
            self.pushover_user_key.as_deref()?,
            self.pushover_api_token.as_deref()?,
        ))
    }

    /// Sender and password, if both present.
    pub fn email(&self) -> Option<(&str, &str)> {
        Some((
            self.email_sender.as_deref()?,
            self.email_password.as_deref()?,
        ))
    }
}

// Never print credential values.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("entsoe_key", &mark(&self.entsoe_key))
            .field("pushover_user_key", &mark(&self.pushover_user_key))
            .field("pushover_api_token", &mark(&self.pushover_api_token))
            .field("email_sender", &mark(&self.email_sender))
            .field("email_password", &mark(&self.email_password))
            .field("email_target", &mark(&self.email_target))
            .finish()
    }
}

/// Trim whitespace and drop non-breaking spaces (pasted secrets often carry
/// them). Empty after cleaning means absent.
pub fn clean_secret(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '\u{a0}').collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn clean_strips_whitespace_and_nbsp() {
        assert_eq!(clean_secret("  abc\u{a0}def \n"), Some("abcdef".into()));
        assert_eq!(clean_secret("\u{a0} \t"), None);
        assert_eq!(clean_secret(""), None);
    }

    #[test]
    fn incomplete_pairs_are_none() {
        let secrets = Secrets::from_lookup(lookup(&[
            (ENTSOE_KEY, "k"),
            (PUSHOVER_USER_KEY, "u"),
            (EMAIL_SENDER, "a@example.com"),
            (EMAIL_PASSWORD, "   "),
        ]));
        assert_eq!(secrets.require_entsoe_key().unwrap(), "k");
        assert!(secrets.pushover().is_none());
        assert!(secrets.email().is_none());
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = Secrets::default().require_entsoe_key().unwrap_err();
        assert_eq!(err.to_string(), "missing secret ENTSOE_KEY");
    }

    #[test]
    fn debug_hides_values() {
        let secrets = Secrets::from_lookup(lookup(&[(EMAIL_PASSWORD, "hunter2")]));
        let printed = format!("{secrets:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("email_password: \"<set>\""));
    }
}
