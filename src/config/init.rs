use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, save_config, validate_config, Config};
use crate::credentials::prompt_for_api_key;
use crate::registry::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::registry::EstimationConfig;
use crate::valuation::config::DEFAULT_MILEAGE_CAP;
use crate::valuation::ValuationConfig;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(12));
    }
    println!();
}

/// Parse a mileage cap answer. "none" disables the cap.
fn parse_mileage_cap(input: &str) -> Result<Option<f64>, String> {
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 1.0 => Ok(Some(v)),
        Ok(_) => Err("must be a number >= 1.0".to_string()),
        Err(_) => Err("must be a number or 'none'".to_string()),
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Trade Value Configuration Wizard");
    println!("================================");
    println!();

    // 1. Registry
    typewriter("Registration lookups use the government vehicle enquiry service.");
    let endpoint = prompt_with_default("Registry endpoint", DEFAULT_ENDPOINT)?;
    let timeout = loop {
        let input = prompt_with_default("Request timeout", DEFAULT_TIMEOUT)?;
        match humantime::parse_duration(&input) {
            Ok(_) => break input,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };
    println!();
    let store_key = prompt_yes_no(
        "Store an API key in the config file? (n reads TRADE_VALUE_API_KEY instead)",
        false,
    )?;
    let api_key = if store_key {
        prompt_for_api_key()?
    } else {
        None
    };

    // 2. Valuation
    println!();
    typewriter("A car with unusually low mileage earns a bonus. The cap limits that bonus.");
    let mileage_cap = loop {
        let input = prompt_with_default(
            "Mileage factor cap ('none' for uncapped)",
            &DEFAULT_MILEAGE_CAP.to_string(),
        )?;
        match parse_mileage_cap(&input) {
            Ok(cap) => break cap,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    let mut config = Config {
        valuation: ValuationConfig { mileage_cap },
        estimation: EstimationConfig::default(),
        ..Default::default()
    };
    config.registry.endpoint = endpoint;
    config.registry.timeout = timeout;
    config.registry.api_key = api_key;

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            println!("  - {}", error);
        }
        anyhow::bail!("Configuration is invalid; nothing was written");
    }

    // 3. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 4. Write config
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    typewriter("Brand base prices and emissions cutoff years can be tuned under 'estimation'.");
    println!("Run `trade-value value --reg <REG> --mileage <MILES>` to get started.");

    Ok(())
}
