mod generate;
mod preview;
mod schema;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "duckseed")]
#[command(version)]
#[command(about = "Generate customer and order seed data through DuckDB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate customers and orders, load them into DuckDB and export CSV seeds
    Generate {
        /// YAML configuration file (flags override its values)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Total customers to generate
        #[arg(long)]
        customers: Option<usize>,

        /// Customers per load batch
        #[arg(long)]
        customer_batch: Option<usize>,

        /// Total orders to generate
        #[arg(long)]
        orders: Option<usize>,

        /// Orders per load batch
        #[arg(long)]
        order_batch: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for the CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Working DuckDB file (default: <output>/data.duckdb)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Date treated as today by the date generators (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<chrono::NaiveDate>,

        /// When a relation falls short of its target: accept, retry, reject
        #[arg(long)]
        short_batch: Option<String>,

        /// Keep the working DuckDB file after the run
        #[arg(long)]
        keep_database: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Show a progress bar while loading
        #[arg(short, long)]
        progress: bool,

        /// Only print warnings and the final summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print generated records without touching a database
    Preview {
        /// Customers to generate
        #[arg(long, default_value = "5")]
        customers: usize,

        /// Orders to generate, referencing the previewed customers
        #[arg(long, default_value = "5")]
        orders: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Date treated as today by the date generators (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<chrono::NaiveDate>,

        /// Output format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Print the CREATE TABLE statements
    Ddl,

    /// Print JSON schemas for the config file and the --json summary
    Schema {
        /// Schema to print (omit to print all)
        name: Option<String>,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            config,
            customers,
            customer_batch,
            orders,
            order_batch,
            seed,
            output,
            database,
            reference_date,
            short_batch,
            keep_database,
            json,
            progress,
            quiet,
        } => generate::run(generate::GenerateArgs {
            config,
            customers,
            customer_batch,
            orders,
            order_batch,
            seed,
            output,
            database,
            reference_date,
            short_batch,
            keep_database,
            json,
            progress,
            quiet,
        }),
        Commands::Preview {
            customers,
            orders,
            seed,
            reference_date,
            format,
        } => preview::run(customers, orders, seed, reference_date, &format),
        Commands::Ddl => {
            print!("{}", duckseed::store::schema_ddl());
            Ok(())
        }
        Commands::Schema { name, list } => schema::run(name, list),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "duckseed", &mut io::stdout());
            Ok(())
        }
    }
}
