use clap::Parser;
use enom::{cli::{Cli, USAGE}, Client, Config, ConfigOverrides, EnomError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Command line tool for the Enom reseller API.
#[derive(Parser, Debug)]
#[command(name = "enom", version, disable_help_subcommand = true)]
struct Args {
    #[arg(short = 'u', long)]
    username: Option<String>,

    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Use the test interface
    #[arg(short = 't')]
    test: bool,

    #[arg(long = "proxyaddr")]
    proxy_addr: Option<String>,

    #[arg(long = "proxyport")]
    proxy_port: Option<u16>,

    #[arg(long = "proxyuser")]
    proxy_user: Option<String>,

    #[arg(long = "proxypass")]
    proxy_pass: Option<String>,

    /// Credentials file (defaults to ~/.enomconfig)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    command: Option<String>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            username: self.username.clone(),
            password: self.password.clone(),
            test_mode: self.test,
            proxy_addr: self.proxy_addr.clone(),
            proxy_port: self.proxy_port,
            proxy_user: self.proxy_user.clone(),
            proxy_pass: self.proxy_pass.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("enom=warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    let args = Args::parse();

    let command = match args.command.as_deref() {
        None | Some("help") => {
            println!("{}", USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        Some(command) => command,
    };

    match run(&args, command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_registrar_error() => {
            println!("{}", e);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(args: &Args, command: &str) -> Result<String, EnomError> {
    let config = Config::load_with(args.config.as_deref(), &args.overrides())?;
    debug!("Using endpoint {}", config.endpoint_url()?);

    let client = Client::new(&config)?;
    Cli::new(client).execute(command, &args.args).await
}
