//! Runtime secret resolution.
//!
//! The YAML stores env var NAMES only. Resolve once at startup and pass the
//! result into constructors. Errors name the variable, never the value.

use anyhow::{bail, Result};

use crate::WhalingConfig;

/// Credentials of the Game Statistics API. Redacted in `Debug` output.
#[derive(Clone)]
pub struct ApiSecrets {
    pub application_id: String,
}

impl std::fmt::Debug for ApiSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSecrets")
            .field("application_id", &"<REDACTED>")
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

pub fn resolve_api_secrets(cfg: &WhalingConfig) -> Result<ApiSecrets> {
    let var = cfg.api.application_id_env.trim();
    if var.is_empty() {
        bail!("CONFIG_INVALID api.application_id_env must name an environment variable");
    }
    match resolve_env(var) {
        Some(application_id) => Ok(ApiSecrets { application_id }),
        None => bail!("SECRET_MISSING env var {var} is unset or empty"),
    }
}
