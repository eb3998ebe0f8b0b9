use std::{error::Error, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use engine::{
    ApplyBankedCmd, BankSurplusCmd, CbParameters, ComputeComplianceCmd, CreatePoolCmd, Engine,
    RouteNew,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;
use uuid::Uuid;

mod settings;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "fueleu")]
#[command(about = "Compliance balance ledger: banking, applying surplus and pooling")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Compliance(Compliance),
    Bank(Bank),
    Pool(Pool),
    Route(Route),
}

#[derive(Args, Debug)]
struct Compliance {
    #[command(subcommand)]
    command: ComplianceCommand,
}

#[derive(Subcommand, Debug)]
enum ComplianceCommand {
    /// Compute a ship's balance from its GHG intensity and store it.
    Compute(ComputeArgs),
    /// Show the stored balance.
    Show(ShipYearArgs),
    /// Show the balance together with the banked surplus.
    Adjusted(ShipYearArgs),
    /// Add a (possibly negative) delta to the stored balance.
    Increment(IncrementArgs),
}

#[derive(Args, Debug)]
struct ShipYearArgs {
    #[arg(long)]
    ship: String,
    #[arg(long)]
    year: i32,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    #[arg(long)]
    ship: String,
    #[arg(long)]
    year: i32,
    /// gCO2e/MJ.
    #[arg(long)]
    intensity: f64,
    /// MJ in scope. Defaults to the configured energy basis.
    #[arg(long)]
    energy: Option<f64>,
}

#[derive(Args, Debug)]
struct IncrementArgs {
    #[arg(long)]
    ship: String,
    #[arg(long)]
    year: i32,
    #[arg(long, allow_hyphen_values = true)]
    delta: f64,
}

#[derive(Args, Debug)]
struct Bank {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    /// Bank part of a positive balance.
    Surplus(AmountArgs),
    /// Offset a deficit in `year` with banked surplus.
    Apply(AmountArgs),
    /// List every bank entry of a ship, spent ones included.
    Entries(ShipArgs),
    /// Banked surplus still available to a ship.
    Balance(ShipArgs),
}

#[derive(Args, Debug)]
struct AmountArgs {
    #[arg(long)]
    ship: String,
    #[arg(long)]
    year: i32,
    /// gCO2e.
    #[arg(long)]
    amount: f64,
}

#[derive(Args, Debug)]
struct ShipArgs {
    #[arg(long)]
    ship: String,
}

#[derive(Args, Debug)]
struct Pool {
    #[command(subcommand)]
    command: PoolCommand,
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    /// Pool the balances of the given ships for a year.
    Create {
        #[arg(long)]
        year: i32,
        #[arg(long = "ship", required = true)]
        ships: Vec<String>,
    },
    Show {
        id: Uuid,
    },
    List {
        #[arg(long)]
        year: i32,
    },
}

#[derive(Args, Debug)]
struct Route {
    #[command(subcommand)]
    command: RouteCommand,
}

#[derive(Subcommand, Debug)]
enum RouteCommand {
    List {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Register routes from a CSV file with a header row. All rows are
    /// stored, or none if one of them is rejected.
    Import { path: PathBuf },
    /// Make a route the baseline of its year.
    Baseline { id: i32 },
    /// Compare every route of a year against its baseline.
    Compare {
        #[arg(long)]
        year: i32,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fueleu={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = connect(&settings.database).await?;
    let engine = Engine::builder()
        .database(db)
        .parameters(CbParameters {
            target_intensity: settings.compliance.target_intensity,
            energy_mj: settings.compliance.energy_mj,
        })
        .store_timeout(Duration::from_millis(settings.compliance.store_timeout_ms))
        .build()
        .await?;

    run(&engine, cli.command).await
}

async fn connect(config: &settings::Database) -> AppResult<sea_orm::DatabaseConnection> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!(url = %config.url(), "database ready");
    Ok(database)
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::Compliance(Compliance { command }) => match command {
            ComplianceCommand::Compute(args) => {
                let mut cmd = ComputeComplianceCmd::new(args.ship, args.year, args.intensity);
                if let Some(energy) = args.energy {
                    cmd = cmd.energy_mj(energy);
                }
                print_json(&engine.compute_compliance(cmd).await?)
            }
            ComplianceCommand::Show(args) => {
                print_json(&engine.compliance_record(&args.ship, args.year).await?)
            }
            ComplianceCommand::Adjusted(args) => {
                print_json(&engine.adjusted_cb(&args.ship, args.year).await?)
            }
            ComplianceCommand::Increment(args) => print_json(
                &engine
                    .increment_cb(&args.ship, args.year, args.delta)
                    .await?,
            ),
        },
        Command::Bank(Bank { command }) => match command {
            BankCommand::Surplus(args) => {
                let cmd = BankSurplusCmd::new(args.ship, args.year, args.amount);
                print_json(&engine.bank_surplus(cmd).await?)
            }
            BankCommand::Apply(args) => {
                let cmd = ApplyBankedCmd::new(args.ship, args.year, args.amount);
                print_json(&engine.apply_banked_surplus(cmd).await?)
            }
            BankCommand::Entries(args) => print_json(&engine.bank_entries(&args.ship).await?),
            BankCommand::Balance(args) => {
                print_json(&engine.available_balance(&args.ship).await?)
            }
        },
        Command::Pool(Pool { command }) => match command {
            PoolCommand::Create { year, ships } => {
                print_json(&engine.create_pool(CreatePoolCmd::new(year, ships)).await?)
            }
            PoolCommand::Show { id } => print_json(&engine.pool(id).await?),
            PoolCommand::List { year } => print_json(&engine.pools(year).await?),
        },
        Command::Route(Route { command }) => match command {
            RouteCommand::List { year } => print_json(&engine.routes(year).await?),
            RouteCommand::Import { path } => {
                let mut reader = csv::Reader::from_path(&path)?;
                let rows = reader
                    .deserialize::<RouteNew>()
                    .collect::<Result<Vec<_>, _>>()?;
                let imported = engine.import_routes(rows).await?;
                tracing::info!(count = imported.len(), path = %path.display(), "routes imported");
                print_json(&imported)
            }
            RouteCommand::Baseline { id } => print_json(&engine.set_baseline(id).await?),
            RouteCommand::Compare { year } => print_json(&engine.route_comparison(year).await?),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
