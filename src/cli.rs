//! Subcommand dispatch for the `enom` binary.

use crate::{
    client::Client,
    domain::{Domain, RegisterOptions, RenewOptions, TransferOptions},
    errors::EnomError,
};
use tracing::debug;

pub const USAGE: &str = "\
This is a command line tool for Enom.

Before using this tool you should create a file called .enomconfig in your home
directory and add the following to that file:

username: YOUR_USERNAME
password: YOUR_PASSWORD

Alternatively you can pass the credentials via command-line arguments, as in:

enom -u username -p password command

You can run commands from the test interface with the -t flag:
enom -u username -p password -t command

You can set an http proxy host with the --proxyaddr flag, e.g. to use a proxy
server with an already-whitelisted IP. You can also optionally specify
the proxy port, user, and password.

enom -u username -p password --proxyaddr enom-proxy.example.com --proxyport 1080 --proxyuser user --proxypass pass

== Commands

All commands are executed as enom [options] command args

help                                    # Show this usage

list                                    # List all domains
check domain.com                        # Check if a domain is available (for registration)
describe domain.com                     # Describe a domain
register domain.com                     # Register a domain with Enom
renew domain.com                        # Renew a domain with Enom
transfer domain.com 867e5926e93         # Transfer a domain to Enom (requires auth/EPP code)
";

/// Runs one subcommand and returns what should be printed.
pub struct Cli {
    client: Client,
}

impl Cli {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn execute(&self, command: &str, args: &[String]) -> Result<String, EnomError> {
        debug!("CLI command {} with {} argument(s)", command, args.len());

        match command {
            "help" => Ok(USAGE.to_string()),
            "list" => self.list().await,
            "check" => {
                let name = required(args, 0, "domain")?;
                let status = Domain::check(&self.client, name, None).await?;
                Ok(format!("{} is {}", name, status))
            }
            "describe" => self.describe(required(args, 0, "domain")?).await,
            "register" => {
                let name = required(args, 0, "domain")?;
                let domain = Domain::register(&self.client, name, RegisterOptions::default()).await?;
                Ok(format!("Registered {}", domain))
            }
            "renew" => {
                let name = required(args, 0, "domain")?;
                let domain = Domain::renew(&self.client, name, RenewOptions::default()).await?;
                Ok(format!("Renewed {}, now expires {}", domain, domain.expiration_date()))
            }
            "transfer" => {
                let name = required(args, 0, "domain")?;
                let auth_code = required(args, 1, "auth code")?;
                if Domain::transfer(&self.client, name, auth_code, TransferOptions::default()).await? {
                    Ok(format!("Transfer of {} requested", name))
                } else {
                    Ok(format!("Transfer of {} failed", name))
                }
            }
            other => Err(EnomError::CommandNotFound(format!("Unknown command: {}", other))),
        }
    }

    async fn list(&self) -> Result<String, EnomError> {
        let domains = Domain::all(&self.client).await?;
        Ok(domains
            .iter()
            .map(|domain| format!("{}  (expires {})", domain, domain.expiration_date()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn describe(&self, name: &str) -> Result<String, EnomError> {
        let mut domain = Domain::find(&self.client, name, None).await?;

        let status = domain.registration_status().await?.to_string();
        let nameservers = domain.nameservers().await?.join(", ");

        Ok([
            format!("Domain:      {}", domain),
            format!("Expires:     {}", domain.expiration_date()),
            format!("Status:      {}", status),
            format!("Nameservers: {}", nameservers),
        ]
        .join("\n"))
    }
}

fn required<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str, EnomError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| EnomError::InvalidArgument(format!("missing {} argument", what)))
}
