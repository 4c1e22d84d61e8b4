//! Quay CLI - build and package C++ libraries across a settings matrix

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = &cli.global;
    match cli.command {
        Commands::Validate => commands::validate::execute(global),
        Commands::Version => commands::version::execute(global),
        Commands::Layout(args) => commands::layout::execute(global, args),
        Commands::Flags => commands::flags::execute(global),
        Commands::Configure(args) => commands::lifecycle::configure(global, args),
        Commands::Build(args) => commands::lifecycle::build(global, args),
        Commands::Test(args) => commands::lifecycle::test(global, args),
        Commands::Package(args) => commands::lifecycle::package(global, args),
        Commands::Create(args) => commands::lifecycle::create(global, args),
        Commands::Metadata(args) => commands::metadata::execute(global, args),
        Commands::Export(args) => commands::export::execute(global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
