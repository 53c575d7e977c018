use std::env;
use std::ffi::OsString;

use config::{Config, Environment, Map};
use log::info;
use serde::de::DeserializeOwned;

use crate::PORT_OVERRIDE_VAR;
use crate::models::config::Settings;
use crate::services::{SettingsError, SettingsResult};

/// Load settings from the current process environment.
pub fn load() -> SettingsResult<Settings> {
    ConfigLoader::from_env().load()
}

/// Captured environment variables ready to be bound onto [`Settings`].
///
/// Only variables whose lowercased name is a declared key are kept. Empty
/// values count as unset. When a key appears both in its exact lowercase
/// spelling and in another case, the lowercase spelling wins.
#[derive(Clone, Debug, Default)]
pub struct ConfigLoader {
    vars: Map<String, String>,
    port_override: Option<String>,
    non_unicode: Vec<String>,
}

impl ConfigLoader {
    /// Capture the process environment.
    pub fn from_env() -> Self {
        Self::from_os_vars(env::vars_os())
    }

    /// Capture raw OS variables. A declared key (or `PORT`) holding a value
    /// that is not valid unicode makes [`ConfigLoader::load`] fail; any
    /// other non-unicode variable is ignored.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut non_unicode = Vec::new();
        let mut valid = Vec::new();

        for (key, value) in vars {
            let Ok(key) = key.into_string() else {
                continue;
            };
            match value.into_string() {
                Ok(value) => valid.push((key, value)),
                Err(_) if is_bound(&key) => non_unicode.push(key),
                Err(_) => {}
            }
        }

        let mut loader = Self::from_vars(valid);
        loader.non_unicode = non_unicode;
        loader
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut bound = Map::new();
        let mut port_override = None;

        for (key, value) in vars {
            let key: String = key.into();
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            if key == PORT_OVERRIDE_VAR {
                port_override = Some(value);
                continue;
            }

            if !is_bound(&key) {
                continue;
            }
            let normalized = key.to_ascii_lowercase();
            if key == normalized {
                bound.insert(normalized, value);
            } else {
                bound.entry(normalized).or_insert(value);
            }
        }

        Self {
            vars: bound,
            port_override,
            non_unicode: Vec::new(),
        }
    }

    /// Bind every group and apply the `PORT` override.
    pub fn load(&self) -> SettingsResult<Settings> {
        if let Some(key) = self.non_unicode.first() {
            return Err(SettingsError::NonUnicode { key: key.clone() });
        }

        let source = Config::builder()
            .add_source(Environment::default().source(Some(self.vars.clone())))
            .build()
            .map_err(SettingsError::Source)?;

        let mut settings = Settings {
            server: group(&source, "server")?,
            database: group(&source, "database")?,
            cache: group(&source, "cache")?,
            password: group(&source, "password")?,
            cors: group(&source, "cors")?,
            logger: group(&source, "logger")?,
            otp: group(&source, "otp")?,
            jwt: group(&source, "jwt")?,
        };

        if let Some(port) = &self.port_override {
            settings.server.external_port = port.clone();
            info!("Overriding external port from PORT env -> {}", port);
        }

        Ok(settings)
    }
}

fn is_bound(key: &str) -> bool {
    key == PORT_OVERRIDE_VAR || {
        let normalized = key.to_ascii_lowercase();
        Settings::env_keys().any(|declared| declared == normalized)
    }
}

fn group<T: DeserializeOwned>(source: &Config, name: &'static str) -> SettingsResult<T> {
    source
        .clone()
        .try_deserialize()
        .map_err(|err| SettingsError::Coercion {
            group: name,
            source: err,
        })
}
