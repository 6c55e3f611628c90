//! exodb CLI - mailbox provisioning against the groupware directory database
//!
//! Subcommands cover the full provisioning surface: creating a mailbox with
//! its well-known root folders, checking for an existing user record, and
//! reading or replacing the message database's replica counters.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;

use config::CliConfig;
use error::{CliError, CliResult};

use exodb_directory::LdapDirectory;
use exodb_provision::{counter, mailbox, GlobalCount, OrgNames, TemplateSet};

/// exodb - groupware directory provisioning
#[derive(Parser)]
#[command(name = "exodb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "exodb.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a mailbox: user record plus all well-known root folders
    NewMailbox {
        /// Username to provision
        username: String,
    },

    /// Check whether a mailbox user record exists
    UserExists {
        /// Username to look up
        username: String,
    },

    /// Print the message database's replica counters
    GetCounter,

    /// Replace the global counter (hex, e.g. 0x64)
    SetCounter {
        /// New counter value
        value: String,
    },

    /// Allocate a range of identifier slots and print the first
    Allocate {
        /// Number of slots
        count: u64,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig::load(&cli.config)?;

    // One fresh connection per invocation; nothing is shared or reused
    // across operations.
    let directory = LdapDirectory::new(config.directory.clone())?;
    let org = OrgNames::new(&config.first_org_dn);
    let templates = match &config.template_dir {
        Some(dir) => TemplateSet::from_dir(dir)?,
        None => TemplateSet::embedded(),
    };

    match cli.command {
        Commands::NewMailbox { username } => {
            let summary = mailbox::provision_mailbox(
                &directory,
                &config.server,
                &org,
                &templates,
                &username,
            )
            .await?;
            println!("[+] Adding '{username}' record");
            for (folder, fid) in &summary.folders {
                println!(
                    "[+] Adding SystemRoot folder '{fid}' ({}) to {username}",
                    folder.display_name()
                );
            }
            println!("GlobalCount is now {}", summary.next_global_count);
        }

        Commands::UserExists { username } => {
            let exists = mailbox::user_exists(&directory, &config.server, &username).await?;
            if exists {
                println!("user '{username}' exists");
            } else {
                println!("user '{username}' does not exist");
            }
        }

        Commands::GetCounter => {
            let count = counter::global_count(&directory, &config.server).await?;
            let replica = counter::replica_id(&directory, &config.server).await?;
            println!("GlobalCount: {count}");
            println!("ReplicaID:   {replica}");
        }

        Commands::SetCounter { value } => {
            let count = GlobalCount::from_attribute(&value)
                .map_err(|_| CliError::InvalidCounter(value.clone()))?;
            counter::set_global_count(&directory, &config.server, count).await?;
            println!("GlobalCount set to {count}");
        }

        Commands::Allocate { count } => {
            let start = counter::allocate(&directory, &config.server, count).await?;
            println!("allocated {count} slot(s) starting at {start}");
        }
    }

    Ok(())
}
