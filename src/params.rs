//! Connection parameters and per-connection options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["passwd", "password", "x509cert", "mysapsso2"];

/// Connection-setup parameters (destination, host, system number, client,
/// user, credential, language, ...).
///
/// Keys and values are opaque to this crate and are handed to the runtime
/// unmodified.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameters {
    entries: BTreeMap<String, String>,
}

impl ConnectionParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter.
    ///
    /// # Example
    ///
    /// ```
    /// use sap_rfc_rs::ConnectionParameters;
    ///
    /// let params = ConnectionParameters::new()
    ///     .with("ashost", "10.0.0.1")
    ///     .with("sysnr", "00")
    ///     .with("client", "100");
    /// assert_eq!(params.get("sysnr"), Some("00"));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Parameters naming a configured destination.
    pub fn from_dest(dest: impl Into<String>) -> Self {
        Self::new().with("dest", dest)
    }

    /// Collect parameters from environment variables starting with `prefix`.
    ///
    /// `SAPRFC_ASHOST=host` with prefix `SAPRFC_` becomes `ashost=host`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(std::env::vars(), prefix)
    }

    fn from_vars<I>(vars: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entries = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_ascii_lowercase(), value))
            })
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if SECRET_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
                map.entry(key, &"********");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionParameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Conversion policies applied to call results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Remove trailing blanks from fixed-width text results.
    pub rstrip: bool,
    /// Include import parameters in call results.
    pub return_import_params: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            rstrip: true,
            return_import_params: false,
        }
    }
}

/// Runtime-reported attributes of an open connection.
pub type ConnectionAttributes = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credentials() {
        let params = ConnectionParameters::new()
            .with("user", "DEVELOPER")
            .with("passwd", "s3cret")
            .with("PASSWORD", "other");
        let debug = format!("{params:?}");
        assert!(debug.contains("DEVELOPER"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("other"));
        assert_eq!(params.get("passwd"), Some("s3cret"));
    }

    #[test]
    fn test_from_dest() {
        let params = ConnectionParameters::from_dest("NPL");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("dest"), Some("NPL"));
    }

    #[test]
    fn test_from_vars_strips_prefix() {
        let vars = vec![
            ("SAPRFC_ASHOST".to_string(), "host".to_string()),
            ("SAPRFC_SYSNR".to_string(), "00".to_string()),
            ("SAPRFC_".to_string(), "ignored".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
        ];
        let params = ConnectionParameters::from_vars(vars, "SAPRFC_");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("ashost", "host"), ("sysnr", "00")]
        );
    }

    #[test]
    fn test_options_default() {
        let options = ConnectionOptions::default();
        assert!(options.rstrip);
        assert!(!options.return_import_params);
    }
}
