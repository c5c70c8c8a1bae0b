use std::env;
use std::net::SocketAddr;

use crate::error::{invalid_input_error, Error};

pub const DEFAULT_GOOGLE_MAPS_API_BASE: &str = "https://maps.googleapis.com";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub google_maps_api_base: String,
    pub google_maps_api_key: String,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, Error> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::info!("loaded {}", path.display());
        }

        Self::from_lookup(|name| env::var(name))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let google_maps_api_key = lookup("GOOGLE_MAPS_API_KEY").map_err(|err| {
            tracing::error!("GOOGLE_MAPS_API_KEY: {}", err);
            err
        })?;

        let google_maps_api_base = lookup("GOOGLE_MAPS_API_BASE")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_MAPS_API_BASE.to_string());

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| {
                tracing::error!("LISTEN_ADDR: {}", err);
                invalid_input_error()
            })?;

        Ok(Config {
            google_maps_api_base,
            google_maps_api_key,
            listen_addr,
        })
    }
}

#[cfg(test)]
fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
    let vars: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    move |name| vars.get(name).cloned().ok_or(env::VarError::NotPresent)
}

#[test]
fn defaults_apply_when_only_key_is_set() {
    let config = Config::from_lookup(lookup_from(&[("GOOGLE_MAPS_API_KEY", "secret")])).unwrap();

    assert_eq!(config.google_maps_api_key, "secret");
    assert_eq!(config.google_maps_api_base, DEFAULT_GOOGLE_MAPS_API_BASE);
    assert_eq!(config.listen_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
}

#[test]
fn missing_key_is_an_environment_error() {
    let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
    assert_eq!(err.code, 1);
}

#[test]
fn bad_listen_addr_is_rejected() {
    let err = Config::from_lookup(lookup_from(&[
        ("GOOGLE_MAPS_API_KEY", "secret"),
        ("LISTEN_ADDR", "not an address"),
    ]))
    .unwrap_err();
    assert_eq!(err.code, 101);
}

#[test]
fn overrides_are_read() {
    let config = Config::from_lookup(lookup_from(&[
        ("GOOGLE_MAPS_API_KEY", "secret"),
        ("GOOGLE_MAPS_API_BASE", "http://localhost:8080"),
        ("LISTEN_ADDR", "0.0.0.0:8000"),
    ]))
    .unwrap();

    assert_eq!(config.google_maps_api_base, "http://localhost:8080");
    assert_eq!(config.listen_addr.port(), 8000);
}
