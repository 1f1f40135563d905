use anyhow::{Context, Result};

/// Prompts for the vehicle registry API key without echoing it.
/// An empty answer means "no key"; lookups then fall back to manual entry.
pub fn prompt_for_api_key() -> Result<Option<String>> {
    println!("A vehicle enquiry API key enables registration lookups.");
    println!("Request one at: https://register-for-ves.driver-vehicle-licensing.api.gov.uk/");
    println!("Leave blank to enter vehicle details manually.");
    println!();

    let key = rpassword::prompt_password("API key: ").context("Failed to read API key from stdin")?;
    let key = key.trim();

    if key.is_empty() {
        Ok(None)
    } else {
        Ok(Some(key.to_string()))
    }
}
