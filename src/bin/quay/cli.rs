//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Quay - build and package C++ libraries across a settings matrix
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to Quay.toml (default: search upward from the current directory)
    #[arg(long, global = true, env = "QUAY_MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Set a setting, e.g. `-s compiler=gcc -s compiler.version=13`
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", global = true)]
    pub settings: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the settings against the package's language requirements
    Validate,

    /// Print the resolved package version
    Version,

    /// Print the folder layout for the settings
    Layout(LayoutArgs),

    /// Print the extra compiler flags for the settings
    Flags,

    /// Configure the build folder
    Configure(BackendArgs),

    /// Configure and build
    Build(BackendArgs),

    /// Configure, build and run the tests
    Test(BackendArgs),

    /// Configure, build and package (without tests)
    Package(PackageArgs),

    /// Run the whole lifecycle: configure, build, test and package
    Create(CreateArgs),

    /// Print the consumer metadata for the settings
    Metadata(MetadataArgs),

    /// Copy the package sources to a folder
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct LayoutArgs {
    /// Vary a setting across values, e.g. `--axis compiler.version=12,13`
    #[arg(long, value_name = "KEY=V1,V2")]
    pub axis: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// CMake generator (e.g. "Ninja")
    #[arg(short = 'G', long)]
    pub generator: Option<String>,

    /// Number of parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Package folder (default: package/<layout>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Package folder (default: package/<layout>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't run the tests
    #[arg(long)]
    pub skip_tests: bool,

    /// Vary a setting across values, e.g. `--axis compiler.version=12,13`
    #[arg(long, value_name = "KEY=V1,V2")]
    pub axis: Vec<String>,
}

#[derive(Args)]
pub struct MetadataArgs {
    /// Print JSON instead of `key = value` lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination folder (default: <build-root>/export/<name>)
    pub dest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_settings_are_global() {
        let cli = Cli::try_parse_from([
            "quay",
            "layout",
            "-s",
            "compiler=gcc",
            "--setting",
            "compiler.version=13",
        ])
        .unwrap();
        assert_eq!(cli.global.settings, vec!["compiler=gcc", "compiler.version=13"]);
    }
}
