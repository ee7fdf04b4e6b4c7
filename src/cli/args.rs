//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// NVML-based GPU information tool
///
/// Show NVIDIA GPU properties, telemetry and compute processes.
#[derive(Parser, Debug)]
#[command(name = "nvinfo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NVINFO_CONFIG")]
    pub config: Option<String>,

    /// Target GPU by index (0-based)
    #[arg(long, global = true, conflicts_with = "visible")]
    pub gpu: Option<u32>,

    /// Only show GPUs listed in the visible-device allow-list
    #[arg(long, global = true)]
    pub visible: bool,

    /// Environment variable holding the allow-list
    #[arg(long, global = true, value_name = "VAR")]
    pub visible_env: Option<String>,

    /// Skip OS lookups for GPU processes
    #[arg(long, global = true)]
    pub no_resolve: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count installed and visible GPUs
    Count,

    /// List all detected GPUs
    List,

    /// Show GPU information
    Info(InfoArgs),

    /// Show processes with a compute context on the GPU
    Processes,

    /// Show the driver version
    Driver,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the info command
///
/// Without section flags every section is shown.
#[derive(Parser, Debug, Default)]
pub struct InfoArgs {
    /// Show memory information
    #[arg(long)]
    pub memory: bool,

    /// Show utilization information
    #[arg(long)]
    pub utilization: bool,

    /// Show PCI information
    #[arg(long)]
    pub pci: bool,

    /// Show clock information
    #[arg(long)]
    pub clocks: bool,

    /// Show power information
    #[arg(long)]
    pub power: bool,

    /// Show compute processes
    #[arg(long)]
    pub processes: bool,
}

impl InfoArgs {
    /// Whether no section was selected
    pub fn shows_all(&self) -> bool {
        !(self.memory
            || self.utilization
            || self.pci
            || self.clocks
            || self.power
            || self.processes)
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_list() {
        let args = Cli::try_parse_from(["nvinfo", "list"]).unwrap();
        assert!(matches!(args.command, Commands::List));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["nvinfo", "-v", "count"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Commands::Count));
    }

    #[test]
    fn test_cli_parse_format() {
        let args = Cli::try_parse_from(["nvinfo", "--format", "json", "driver"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_cli_parse_gpu_after_subcommand() {
        let args = Cli::try_parse_from(["nvinfo", "info", "--gpu", "1"]).unwrap();
        assert_eq!(args.gpu, Some(1));
    }

    #[test]
    fn test_cli_gpu_conflicts_with_visible() {
        let result = Cli::try_parse_from(["nvinfo", "--gpu", "0", "--visible", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_info_sections() {
        let args = Cli::try_parse_from(["nvinfo", "info", "--memory", "--power"]).unwrap();
        if let Commands::Info(info) = args.command {
            assert!(info.memory);
            assert!(info.power);
            assert!(!info.pci);
            assert!(!info.shows_all());
        } else {
            panic!("Expected Info command");
        }
    }

    #[test]
    fn test_info_defaults_to_all_sections() {
        assert!(InfoArgs::default().shows_all());
    }

    #[test]
    fn test_cli_parse_resolution_flags() {
        let args = Cli::try_parse_from([
            "nvinfo",
            "processes",
            "--no-resolve",
            "--visible-env",
            "MY_GPUS",
        ])
        .unwrap();
        assert!(args.no_resolve);
        assert_eq!(args.visible_env.as_deref(), Some("MY_GPUS"));
    }

    #[test]
    fn test_cli_negative_gpu_rejected() {
        assert!(Cli::try_parse_from(["nvinfo", "--gpu", "-1", "info"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
