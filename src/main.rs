use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use apisetu_transport::config::{
    self, BASE_URL_ENV, CONFIG_PATH_ENV, CredentialStore, EnvOverride, FileCredentialStore,
    PORTAL_URL, SETUP_HINT, Setting,
};
use apisetu_transport::output;
use apisetu_transport::{
    ApiSetuError, DrivingLicenseParams, ResponseFormat, VehicleRegistrationParams,
    VerificationClient, VerificationParams, error, hint, success,
};

// ============================================================================
// ERROR HANDLING STRATEGY
// ============================================================================
//
// Every failure bubbles up to `main` through `anyhow`, is printed once with a
// red marker and exits with status 1. Nothing is retried.
//
// Status lines and colours ignore write errors (`let _ =`); the verification
// result itself is written with `?`.
// ============================================================================

type Store = EnvOverride<FileCredentialStore>;

#[derive(Parser)]
#[command(name = "apisetu")]
#[command(
    version,
    about = "APIsetu Transport CLI - Kerala Motor Vehicle Department from your terminal",
    arg_required_else_help = true
)]
struct Cli {
    /// Path to the settings file (defaults to the user config directory)
    #[arg(long = "config", global = true, env = CONFIG_PATH_ENV, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Gateway base URL override
    #[arg(long, global = true, env = BASE_URL_ENV, hide = true)]
    base_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Driving License verification
    Dl {
        #[command(subcommand)]
        action: DlAction,
    },
    /// Vehicle Registration Certificate verification
    Rc {
        #[command(subcommand)]
        action: RcAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set configuration values
    Set {
        /// APIsetu API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// APIsetu Client ID
        #[arg(long, value_name = "ID")]
        client_id: Option<String>,
    },
    /// Show current configuration
    Show,
}

#[derive(Subcommand)]
enum DlAction {
    /// Verify driving license
    Verify(DlVerifyArgs),
}

#[derive(Subcommand)]
enum RcAction {
    /// Verify vehicle registration
    Verify(RcVerifyArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Response format (xml or pdf)
    #[arg(long, default_value = "xml")]
    format: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DlVerifyArgs {
    /// Driving License Number
    #[arg(long, value_name = "NUMBER")]
    dlno: Option<String>,

    /// Aadhaar number
    #[arg(long, value_name = "AADHAAR")]
    uid: Option<String>,

    /// Full name
    #[arg(long, value_name = "FULLNAME")]
    name: Option<String>,

    /// Date of birth (DD-MM-YYYY)
    #[arg(long, value_name = "DATE")]
    dob: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct RcVerifyArgs {
    /// Vehicle Registration Number
    #[arg(long, value_name = "NUMBER")]
    reg_no: Option<String>,

    /// Chassis Number
    #[arg(long, value_name = "NUMBER")]
    chasis_no: Option<String>,

    /// Aadhaar number
    #[arg(long, value_name = "AADHAAR")]
    uid: Option<String>,

    /// Owner full name
    #[arg(long, value_name = "FULLNAME")]
    name: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if let Err(e) = apisetu_transport::logging::init(cli.verbose) {
        eprintln!("[WARN] Logging disabled: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_store = match cli.config_file {
        Some(path) => FileCredentialStore::new(path),
        None => FileCredentialStore::open_default()?,
    };
    let store = EnvOverride::new(file_store);

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Set { api_key, client_id } => {
                config_set(&store, api_key.as_deref(), client_id.as_deref())
            }
            ConfigAction::Show => config_show(&store),
        },
        Command::Dl {
            action: DlAction::Verify(args),
        } => {
            let params = VerificationParams::DrivingLicense(DrivingLicenseParams {
                dlno: args.dlno,
                uid: args.uid,
                full_name: args.name,
                dob: args.dob,
            });
            verify(
                store,
                cli.base_url,
                params,
                &args.output,
                "--dlno, --uid, --name, or --dob",
            )
            .await
        }
        Command::Rc {
            action: RcAction::Verify(args),
        } => {
            let params = VerificationParams::VehicleRegistration(VehicleRegistrationParams {
                reg_no: args.reg_no,
                chasis_no: args.chasis_no,
                uid: args.uid,
                full_name: args.name,
            });
            verify(
                store,
                cli.base_url,
                params,
                &args.output,
                "--reg-no, --chasis-no, --uid, or --name",
            )
            .await
        }
    }
}

fn config_set(store: &Store, api_key: Option<&str>, client_id: Option<&str>) -> Result<()> {
    let mut updated = false;

    for (setting, value) in [(Setting::ApiKey, api_key), (Setting::ClientId, client_id)] {
        if let Some(value) = value {
            store.set(setting, value)?;
            success!("{} set", setting.display_name());
            updated = true;
        }
    }

    if !updated {
        return Err(ApiSetuError::Validation(
            "No options provided. Use --api-key and/or --client-id".to_string(),
        )
        .into());
    }
    Ok(())
}

fn config_show(store: &Store) -> Result<()> {
    output::heading("APIsetu CLI Configuration");

    for (setting, label) in [(Setting::ApiKey, "API Key:"), (Setting::ClientId, "Client ID:")] {
        let value = store
            .get(setting)?
            .filter(|v| !v.is_empty())
            .map(|v| config::mask_secret(&v));
        let shown = match value {
            Some(masked) if store.is_overridden(setting) => {
                Some(format!("{masked} (from {})", setting.env_var()))
            }
            other => other,
        };
        output::setting_line(label, shown.as_deref());
    }

    println!("\nSettings file: {}\n", store.inner().path().display());
    Ok(())
}

async fn verify(
    store: Store,
    base_url: Option<String>,
    params: VerificationParams,
    output_args: &OutputArgs,
    accepted_flags: &str,
) -> Result<()> {
    // Credentials first, then input, matching the order users fix things in.
    store.credentials()?;

    if !params.has_identifier() {
        return Err(ApiSetuError::Validation(format!(
            "At least one parameter required: {accepted_flags}"
        ))
        .into());
    }
    let format: ResponseFormat = output_args.format.parse()?;

    let kind = params.kind();
    let mut client = VerificationClient::new(store)?;
    if let Some(base_url) = base_url {
        client = client.with_base_url(base_url);
    }

    output::progress(&format!(
        "Verifying {}...",
        kind.display_name().to_lowercase()
    ));
    let data = client.verify(&params, format).await?;

    if output_args.json {
        output::print_json(&data)?;
        return Ok(());
    }

    output::heading(&format!("{} Verification", kind.display_name()));

    match format {
        ResponseFormat::Pdf => {
            output::notice("PDF response received. Use --json to see raw data.");
        }
        ResponseFormat::Xml => {
            output::dim("Use --format pdf to get PDF certificate");
            println!();
            output::print_json(&data)?;
        }
    }

    println!();
    success!("Verification complete");
    Ok(())
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ApiSetuError>() {
        Some(ApiSetuError::Configuration(_)) => {
            error!("API credentials not configured.");
            eprintln!("\nRun the following to configure:");
            hint!("{SETUP_HINT}");
            eprintln!("\nGet credentials at: {PORTAL_URL}");
        }
        _ => {
            error!("{err}");
        }
    }
}
