pub mod prompt;

use crate::registry::RegistryConfig;

/// Environment variable name for providing the registry API key
pub const ENV_API_KEY_VAR: &str = "TRADE_VALUE_API_KEY";

pub use prompt::prompt_for_api_key;

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check for an API key in the TRADE_VALUE_API_KEY environment variable.
/// Returns Some(key) if the env var is set and non-empty, None otherwise.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(ENV_API_KEY_VAR)
        .ok()
        .and_then(|val| non_empty(&val))
}

/// Pick the API key: environment first, then the config file.
pub fn resolve_api_key(config: &RegistryConfig) -> Option<String> {
    select_api_key(get_api_key_from_env(), config)
}

fn select_api_key(from_env: Option<String>, config: &RegistryConfig) -> Option<String> {
    from_env.or_else(|| config.api_key.as_deref().and_then(non_empty))
}
