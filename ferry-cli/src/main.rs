//! Ferry CLI - operator client for mounted migration endpoints

mod client;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client::{Direction, FerryClient, Listing, Target};
use colored::*;
use ferry_core::MigrationMeta;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Ferry - inspect and run migrations over HTTP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL, including the host application's base path
    #[arg(long, env = "FERRY_URL", default_value = "http://127.0.0.1:8080", global = true)]
    url: String,

    /// Shared secret sent as x-secret-key
    #[arg(long, env = "FERRY_SECRET_KEY", hide_env_values = true, global = true)]
    secret: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: Format,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List executed then pending migrations
    All,

    /// List migrations not yet applied
    Pending,

    /// List applied migrations
    Executed,

    /// Apply pending migrations (all of them by default)
    Up(TargetArgs),

    /// Revert executed migrations (the last one by default)
    Down(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Stop at this migration, inclusive
    #[arg(long, conflicts_with = "step")]
    to: Option<String>,

    /// Number of migrations
    #[arg(long)]
    step: Option<usize>,
}

impl TargetArgs {
    fn target(self) -> Target {
        match (self.to, self.step) {
            (Some(id), _) => Target::To(id),
            (None, Some(count)) => Target::Step(count),
            (None, None) => Target::Default,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("ferry=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(secret) = cli.secret.filter(|s| !s.is_empty()) else {
        bail!("A secret key is required (--secret or FERRY_SECRET_KEY)");
    };
    let client = FerryClient::new(&cli.url, secret)?;

    match cli.command {
        Commands::All => list_command(&client, Listing::All, cli.format).await,
        Commands::Pending => list_command(&client, Listing::Pending, cli.format).await,
        Commands::Executed => list_command(&client, Listing::Executed, cli.format).await,
        Commands::Up(args) => {
            migrate_command(&client, Direction::Up, args.target(), cli.format).await
        }
        Commands::Down(args) => {
            migrate_command(&client, Direction::Down, args.target(), cli.format).await
        }
    }
}

async fn list_command(client: &FerryClient, listing: Listing, format: Format) -> Result<()> {
    let migrations = client.list(listing).await?;

    match format {
        Format::Json => print_json(listing.key(), &migrations)?,
        Format::Text => {
            let title = match listing {
                Listing::All => "All migrations",
                Listing::Pending => "Pending migrations",
                Listing::Executed => "Executed migrations",
            };
            println!("{} {} ({})", "═".blue().bold(), title, migrations.len());
            print_names(&migrations);
        }
    }
    Ok(())
}

async fn migrate_command(
    client: &FerryClient,
    direction: Direction,
    target: Target,
    format: Format,
) -> Result<()> {
    let start = Instant::now();
    let migrations = client.run(direction, &target).await?;

    match format {
        Format::Json => print_json("migrations", &migrations)?,
        Format::Text => {
            let verb = match direction {
                Direction::Up => "Applied",
                Direction::Down => "Reverted",
            };
            println!(
                "{} {} {} migration(s) in {:.3}ms",
                "✓".green(),
                verb,
                migrations.len(),
                start.elapsed().as_secs_f64() * 1000.0
            );
            print_names(&migrations);
        }
    }
    Ok(())
}

fn print_names(migrations: &[MigrationMeta]) {
    if migrations.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for migration in migrations {
        match &migration.path {
            Some(path) => println!(
                "{} {} {}",
                "▸".blue(),
                migration.name,
                path.display().to_string().dimmed()
            ),
            None => println!("{} {}", "▸".blue(), migration.name),
        }
    }
}

fn print_json(key: &str, migrations: &[MigrationMeta]) -> Result<()> {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), serde_json::to_value(migrations)?);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
