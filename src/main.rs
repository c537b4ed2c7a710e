use anyhow::Result;
use clap::{Parser, Subcommand};
use folio::build::{build_site, plan_site};
use folio::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Args {
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
struct BuildArgs {
    /// The project directory (or any directory below it)
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// The output directory [default: `_site` in the project root]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct PlanArgs {
    /// The project directory (or any directory below it)
    #[arg(short, long, default_value = ".")]
    project: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site
    Build(BuildArgs),

    /// Print the pages the site would have without writing anything
    Plan(PlanArgs),
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Build(args) => {
            let config = Config::from_directory(&args.project, args.output.as_deref())?;
            build_site(&config)?;
        }
        Command::Plan(args) => {
            let config = Config::from_directory(&args.project, None)?;
            for page in plan_site(&config)?.pages {
                println!("{}\t{}\t{}", page.path, page.template, page.context);
            }
        }
    }
    Ok(())
}
