//! Command-line surface and command execution.

use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use kakehashi::FileSystem;
use tokio::io::AsyncReadExt;

/// Path-based access to every configured storage adapter.
#[derive(Parser, Debug)]
#[command(name = "kakehashi", version)]
#[command(about = "Read and write files across local, in-memory and SFTP storage")]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/kakehashi/kakehashi.ron)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit JSON instead of plain text where it applies
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List a directory
    Ls {
        path: String,
        /// Only files
        #[arg(long, conflicts_with = "dirs")]
        files: bool,
        /// Only directories
        #[arg(long)]
        dirs: bool,
    },
    /// Show metadata for a file or directory
    Stat { path: String },
    /// Print a file to stdout
    Cat { path: String },
    /// Write stdin (or --file) to a path
    Put {
        path: String,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Append stdin (or --file) to an existing file
    Append {
        path: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Create a directory and its parents
    Mkdir { path: String },
    /// Delete a file or an empty directory; -r removes a whole tree
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Copy a file, possibly between adapters
    Cp {
        source: String,
        destination: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Move a file, possibly between adapters
    Mv {
        source: String,
        destination: String,
        #[arg(short, long)]
        force: bool,
    },
    /// List registered prefixes
    Prefixes,
}

impl Cli {
    /// Default `EnvFilter` directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Run one command against `fs`, writing results to `out`.
pub async fn run<W: Write>(fs: &FileSystem, command: &Command, json: bool, out: &mut W) -> Result<()> {
    match command {
        Command::Ls { path, files, dirs } => {
            let listed_files = if *dirs {
                Vec::new()
            } else {
                fs.list_files(path).await?
            };
            let listed_dirs = if *files {
                Vec::new()
            } else {
                fs.list_directories(path).await?
            };
            if json {
                let value = serde_json::json!({
                    "directories": listed_dirs,
                    "files": listed_files,
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                for dir in &listed_dirs {
                    writeln!(out, "{}/", dir.name)?;
                }
                for file in &listed_files {
                    writeln!(out, "{}\t{}", file.name, file.size)?;
                }
            }
        }
        Command::Stat { path } => stat(fs, path, json, out).await?,
        Command::Cat { path } => {
            let data = fs.read_file(path).await?;
            out.write_all(&data)?;
        }
        Command::Put { path, file, force } => {
            let data = read_input(file.as_ref()).await?;
            fs.write_file(path, &data, *force).await?;
        }
        Command::Append { path, file } => {
            let data = read_input(file.as_ref()).await?;
            fs.append_file(path, &data).await?;
        }
        Command::Mkdir { path } => fs.create_directory(path).await?,
        Command::Rm { path, recursive } => {
            if fs.directory_exists(path).await? {
                fs.delete_directory(path, *recursive).await?;
            } else {
                fs.delete_file(path).await?;
            }
        }
        Command::Cp {
            source,
            destination,
            force,
        } => fs.copy_file(source, destination, *force).await?,
        Command::Mv {
            source,
            destination,
            force,
        } => fs.move_file(source, destination, *force).await?,
        Command::Prefixes => {
            for prefix in fs.prefixes() {
                let marker = if fs.default_prefix() == Some(prefix) {
                    " (default)"
                } else {
                    ""
                };
                writeln!(out, "{}{}", prefix, marker)?;
            }
        }
    }
    Ok(())
}

async fn stat<W: Write>(fs: &FileSystem, path: &str, json: bool, out: &mut W) -> Result<()> {
    match fs.get_file(path).await {
        Ok(file) => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&file)?)?;
            } else {
                writeln!(out, "file\t{}\t{}\t{}", file.size, epoch_secs(file.last_modified), file.path)?;
            }
            return Ok(());
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    match fs.get_directory(path).await {
        Ok(dir) => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&dir)?)?;
            } else {
                writeln!(out, "directory\t-\t{}\t{}", epoch_secs(dir.last_modified), dir.path)?;
            }
            Ok(())
        }
        Err(e) if e.is_not_found() => bail!("{}: no such file or directory", path),
        Err(e) => Err(e.into()),
    }
}

fn epoch_secs(time: Option<SystemTime>) -> String {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|| "-".into())
}

async fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("reading stdin")?;
            Ok(data)
        }
    }
}
