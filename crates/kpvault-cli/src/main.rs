//! kpvault - create entries in a KeePass-style database from the command
//! line.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use kpvault_core::{NewEntry, PlainXmlCodec, VaultKey, VaultSession};

/// Write a new entry into a password database.
#[derive(Parser, Debug)]
#[command(name = "kpvault")]
#[command(about = "Create entries in a KeePass-style password database")]
struct Args {
    /// Database file (falls back to the configured default)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Password of the database
    #[arg(short, long)]
    password: Option<String>,

    /// Keyfile to unlock the database
    #[arg(short, long)]
    keyfile: Option<PathBuf>,

    /// File to write the updated database to (defaults to in place)
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Group path to write the new entry to, e.g. "Internet/Mail"
    #[arg(short = 'D', long)]
    destination: Option<String>,

    /// Create the entry even if one with the same title already exists
    #[arg(short, long)]
    force: bool,

    /// Title of the new entry
    #[arg(short, long)]
    entry: String,

    /// Username for the new entry
    #[arg(short = 'U', long)]
    entry_username: String,

    /// Password for the new entry
    #[arg(short = 'P', long)]
    entry_password: String,

    /// URL for the new entry
    #[arg(long)]
    entry_url: Option<String>,

    /// Notes for the new entry
    #[arg(short = 'N', long)]
    entry_notes: Option<String>,

    /// Tag for the new entry (repeatable)
    #[arg(short = 'T', long)]
    entry_tags: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kpvault=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    let database = args
        .database
        .clone()
        .or(config.database_path)
        .context("No database given and no default configured")?;

    let mut key = VaultKey::new();
    if let Some(password) = &args.password {
        key = key.with_password(password);
    }
    if let Some(keyfile) = &args.keyfile {
        key = key.with_keyfile(keyfile);
    }

    let destination = args.destination.clone().unwrap_or(config.default_group);

    tracing::info!(
        database = %database.display(),
        destination = %destination,
        title = %args.entry,
        "writing entry"
    );

    let session = VaultSession::unlock(&database, key, PlainXmlCodec)?;
    session.add_entry(
        &destination,
        NewEntry {
            title: Some(args.entry.clone()),
            username: Some(args.entry_username),
            password: Some(args.entry_password),
            url: args.entry_url,
            notes: args.entry_notes,
            tags: (!args.entry_tags.is_empty()).then_some(args.entry_tags),
            ..Default::default()
        },
        args.force,
    )?;

    let target = args.outfile.unwrap_or(database);
    session.save_to(&target)?;

    println!("Wrote entry \"{}\" to {}", args.entry, target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_full_invocation() {
        let args = Args::parse_from([
            "kpvault",
            "-d",
            "vault.xml",
            "-p",
            "master",
            "-D",
            "Internet/Mail",
            "-e",
            "GMail",
            "-U",
            "jdoe",
            "-P",
            "s3cr3t",
            "-T",
            "email",
            "-T",
            "work",
            "--force",
        ]);
        assert_eq!(args.database.as_deref(), Some(std::path::Path::new("vault.xml")));
        assert_eq!(args.destination.as_deref(), Some("Internet/Mail"));
        assert_eq!(args.entry, "GMail");
        assert_eq!(args.entry_tags, vec!["email", "work"]);
        assert!(args.force);
        assert_eq!(args.outfile, None);
    }
}
