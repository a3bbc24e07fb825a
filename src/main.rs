//! Media Vault - CLI
//!
//! Command-line interface for vault operations.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use media_vault::{MediaKind, MediaVault, NoHardwareKey, VaultConfig};

#[derive(Parser)]
#[command(name = "media-vault")]
#[command(version = media_vault::VERSION)]
#[command(about = "Local encrypted media vault")]
struct Cli {
    /// Vault path
    #[arg(short, long, default_value = "./vault")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up a new vault with a password
    Init {
        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Import a media file
    Import {
        /// File to import
        path: PathBuf,

        /// Media kind: photo, video, audio or note
        #[arg(short, long, default_value = "photo")]
        kind: MediaKind,

        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// List all media
    List {
        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Export decrypted media
    Export {
        /// Media ID
        id: Uuid,

        /// Output path
        output: PathBuf,

        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Export a decrypted thumbnail
    Thumbnail {
        /// Media ID
        id: Uuid,

        /// Output path
        output: PathBuf,

        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Delete media
    Delete {
        /// Media ID
        id: Uuid,

        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Print the recovery token (salt)
    ExportSalt {
        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Recover on a new device from a token + password
    ImportSalt {
        /// Recovery token from `export-salt`
        token: String,

        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Generate missing thumbnails in the background
    Backfill {
        /// Vault password
        #[arg(short, long)]
        password: String,
    },

    /// Show vault status and statistics
    Status,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let vault = MediaVault::open(&cli.vault, &NoHardwareKey, VaultConfig::default())
        .context("failed to open vault")?;

    match cli.command {
        Commands::Init { password } => {
            let token = vault.setup_password(&password)?;
            println!("🔐 Vault created at: {}", cli.vault.display());
            println!("Recovery token (store it somewhere safe):");
            println!("  {token}");
        }

        Commands::Import {
            path,
            kind,
            password,
        } => {
            vault.unlock(&password)?;

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            let mut file = std::fs::File::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?;

            let id = vault.import_media(&mut file, kind, name)?;
            println!("✅ Imported {kind} media with ID: {id}");
        }

        Commands::List { password } => {
            vault.unlock(&password)?;
            let media = vault.list_media()?;

            if media.is_empty() {
                println!("📭 Vault is empty");
            } else {
                println!("🗃️  Media in vault ({}):", media.len());
                for record in media {
                    println!(
                        "  {} [{}] {} ({} encrypted bytes, thumb: {})",
                        record.id,
                        record.kind,
                        record.original_name,
                        record.encrypted_size,
                        if record.has_thumbnail { "yes" } else { "no" },
                    );
                }
            }
        }

        Commands::Export {
            id,
            output,
            password,
        } => {
            vault.unlock(&password)?;

            let mut reader = vault.open_for_read(id)?;
            let mut out = std::fs::File::create(&output)
                .with_context(|| format!("cannot create {}", output.display()))?;
            let bytes = std::io::copy(&mut reader, &mut out)?;

            println!("✅ Exported {bytes} bytes to: {}", output.display());
        }

        Commands::Thumbnail {
            id,
            output,
            password,
        } => {
            vault.unlock(&password)?;
            let thumb = vault.get_thumbnail(id)?;
            std::fs::write(&output, &thumb)?;
            println!("✅ Thumbnail written to: {}", output.display());
        }

        Commands::Delete { id, password } => {
            vault.unlock(&password)?;
            vault.delete_media(id)?;
            println!("🗑️  Deleted media: {id}");
        }

        Commands::ExportSalt { password } => {
            vault.unlock(&password)?;
            println!("{}", vault.export_salt()?);
        }

        Commands::ImportSalt { token, password } => {
            vault.import_and_unlock(&token, &password)?;
            println!("✅ Vault recovered and unlocked at: {}", cli.vault.display());
        }

        Commands::Backfill { password } => {
            vault.unlock(&password)?;
            let scheduled = vault.backfill_thumbnails()?;
            println!("⏳ Scheduled {scheduled} thumbnail backfills");
            // MediaVault joins its workers on drop, so jobs finish before exit.
        }

        Commands::Status => {
            let stats = vault.stats()?;
            println!("📊 Vault status");
            println!("{:-<40}", "");
            println!("Path:            {}", cli.vault.display());
            println!("Initialized:     {}", vault.is_initialized());
            println!("State:           {:?}", vault.state());
            println!("Media items:     {}", stats.media_count);
            println!("Encrypted bytes: {}", stats.encrypted_bytes_on_disk);
        }
    }

    Ok(())
}
