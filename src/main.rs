use clap::{Parser, Subcommand};
use std::path::PathBuf;

use trade_value::config::Config;
use trade_value::registry::{create_client, HeuristicEstimator, RegistryClient};
use trade_value::session::{LookupState, Orchestrator, ValuationForm, VehicleDraft};
use trade_value::valuation::{Condition, FuelType, MotStatus, ServiceHistory, UserInputs};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID_INPUT: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Value a vehicle, optionally starting from a registration lookup
    Value {
        /// Registration to look up first (e.g. "AB21 ABC")
        #[arg(long = "reg")]
        registration: Option<String>,

        #[arg(long)]
        make: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Manufacture year
        #[arg(long)]
        year: Option<i32>,

        /// Original price when new, in GBP
        #[arg(long)]
        price: Option<f64>,

        /// petrol, diesel, hybrid or electric
        #[arg(long)]
        fuel: Option<FuelType>,

        /// Emissions-zone compliance (true/false)
        #[arg(long, action = clap::ArgAction::Set)]
        ulez: Option<bool>,

        /// Current odometer reading in miles
        #[arg(long)]
        mileage: u32,

        /// excellent, verygood, good, fair or poor
        #[arg(long, default_value_t = Condition::default())]
        condition: Condition,

        /// full, partial or none
        #[arg(long, default_value_t = ServiceHistory::default())]
        service: ServiceHistory,

        /// current, advisories or expired
        #[arg(long, default_value_t = MotStatus::default())]
        mot: MotStatus,
    },
    /// Look up a registration and show the vehicle record
    Lookup {
        registration: String,
    },
    /// List reference valuation sites
    Links,
    /// Open a reference site in the browser by its index number
    Open {
        /// Index number of the site to open (1-based, as shown by `links`)
        index: usize,
    },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "trade-value")]
#[command(about = "UK used-car market and trade-in valuation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and the factor-by-factor breakdown
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/trade-value/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn load_validated_config(path: Option<PathBuf>) -> Config {
    let config = match trade_value::config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = trade_value::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    config
}

fn build_orchestrator(config: &Config) -> Orchestrator<RegistryClient> {
    let api_key = trade_value::credentials::resolve_api_key(&config.registry);
    if api_key.is_none() {
        tracing::debug!(
            "no API key in {} or config",
            trade_value::credentials::ENV_API_KEY_VAR
        );
    }

    let client = match create_client(&config.registry, api_key) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create registry client: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    Orchestrator::new(client, HeuristicEstimator::from_config(&config.estimation))
}

async fn run_lookup(config: &Config, registration: &str) -> LookupState {
    let orchestrator = build_orchestrator(config);
    match orchestrator
        .lookup(&LookupState::default(), registration)
        .await
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_INVALID_INPUT);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match trade_value::output::format_json(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_INVALID_INPUT);
        }
    }
}

#[tokio::main]
async fn main() {
    trade_value::registry::client::install_crypto_provider();

    let cli = Cli::parse();

    if let Err(e) = trade_value::telemetry::init(cli.verbose) {
        eprintln!("Logging disabled: {}", e);
    }

    let config_path = cli.config.map(PathBuf::from);
    let use_colors = trade_value::output::should_use_colors();

    match cli.command {
        Commands::Init => {
            if let Err(e) = trade_value::config::init::run_init_wizard(config_path) {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
        Commands::Links => {
            let links = &trade_value::links::REFERENCE_LINKS;
            if cli.json {
                print_json(links);
            } else {
                println!("{}", trade_value::output::format_links(links, use_colors));
            }
        }
        Commands::Open { index } => {
            let Some(link) = trade_value::links::link_at(index) else {
                eprintln!(
                    "Invalid index {}. Must be between 1 and {}.",
                    index,
                    trade_value::links::REFERENCE_LINKS.len()
                );
                std::process::exit(EXIT_INVALID_INPUT);
            };

            if let Err(e) = trade_value::links::open_url(link.url) {
                eprintln!("Failed to open browser: {}", e);
                std::process::exit(EXIT_NETWORK);
            }

            println!("Opening {} in browser: {}", link.label, link.url);
        }
        Commands::Lookup { registration } => {
            let config = load_validated_config(config_path);
            match run_lookup(&config, &registration).await {
                LookupState::Resolved {
                    registration,
                    vehicle,
                } => {
                    if cli.json {
                        print_json(&trade_value::output::VehicleReport {
                            registration: &registration,
                            vehicle: &vehicle,
                        });
                    } else {
                        println!(
                            "{}",
                            trade_value::output::format_vehicle(&registration, &vehicle, use_colors)
                        );
                    }
                }
                LookupState::Fallback { failure, .. } => {
                    eprintln!(
                        "{}",
                        trade_value::output::format_lookup_failure(&failure, use_colors)
                    );
                    std::process::exit(EXIT_NETWORK);
                }
                LookupState::AwaitingRegistration | LookupState::LookupInFlight { .. } => {
                    eprintln!("Lookup did not complete.");
                    std::process::exit(EXIT_NETWORK);
                }
            }
        }
        Commands::Value {
            registration,
            make,
            model,
            year,
            price,
            fuel,
            ulez,
            mileage,
            condition,
            service,
            mot,
        } => {
            let config = load_validated_config(config_path);

            let inputs = UserInputs {
                current_mileage: mileage,
                condition,
                service_history: service,
                mot_status: mot,
            };
            let overrides = VehicleDraft {
                make,
                model,
                year,
                original_price: price,
                fuel_type: fuel,
                is_ulez_compliant: ulez,
            };

            let mut form = ValuationForm::new(inputs);
            let mut lookup_failure = None;
            if let Some(registration) = registration.as_deref() {
                let state = run_lookup(&config, registration).await;
                if let LookupState::Fallback { failure, .. } = &state {
                    // Continue with whatever was given on the command line
                    eprintln!(
                        "{}",
                        trade_value::output::format_lookup_failure(failure, use_colors)
                    );
                    eprintln!("Continuing with manually entered details.");
                    lookup_failure = Some(failure.clone());
                }
                form = form.apply_lookup(&state);
            }
            let form = form.with_overrides(overrides);

            let vehicle = match form.vehicle_attributes() {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("{}", e);
                    eprintln!("Pass --year and --price, or --reg for a registry lookup.");
                    std::process::exit(EXIT_INVALID_INPUT);
                }
            };

            let result = match trade_value::valuation::value_vehicle_now(
                &vehicle,
                &form.inputs,
                &config.valuation,
            ) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_INVALID_INPUT);
                }
            };

            if cli.json {
                print_json(&trade_value::output::ValuationReport {
                    registration: form.registration.as_deref(),
                    vehicle: &vehicle,
                    details: form.details.as_ref(),
                    inputs: &form.inputs,
                    valuation: &result,
                    lookup_failure: lookup_failure.as_ref(),
                });
            } else {
                println!(
                    "{}",
                    trade_value::output::format_valuation(
                        &vehicle,
                        &form.inputs,
                        &result,
                        cli.verbose,
                        use_colors
                    )
                );
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
