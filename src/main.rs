//! nvinfo - NVML-based GPU information tool
//!
//! A command-line tool for inspecting NVIDIA GPU properties, telemetry and
//! the processes running on them.

use clap::Parser;
use nvinfo::cli::args::{generate_completions, Cli, Commands};
use nvinfo::commands::{run_count, run_driver, run_info, run_list, run_processes, Selection};
use nvinfo::config::{Config, ConfigBuilder};
use nvinfo::error::{AppError, DeviceError, NvmlError};
use nvinfo::host::SysinfoResolver;
use nvinfo::nvml::NvmlSource;
use nvinfo::services::DeviceDirectory;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // The verbose setting may come from the config file, so the logger
    // is installed once the config is known
    let result = load_config(&cli).and_then(|config| {
        logger(config.general.verbose).init();
        run(&cli, &config)
    });

    if let Err(e) = result {
        log::debug!("{:?}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

/// Logger with the `warn` default filter, or `debug` when verbose
fn logger(verbose: bool) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp(None);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_visible_env(cli.visible_env.clone())
        .with_process_resolution(cli.no_resolve.then_some(false))
        .build()?;
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    // Counting and the driver query report "nothing" without NVML
    let source = match NvmlSource::try_new() {
        Ok(source) => source,
        Err(e) if matches!(cli.command, Commands::Count | Commands::Driver) => {
            log::warn!("{}", e);
            NvmlSource::unavailable()
        }
        Err(e) => return Err(e.into()),
    };

    let directory = DeviceDirectory::from_config(source, SysinfoResolver::new(), config);
    let selection = Selection::from_flags(cli.gpu, cli.visible);

    match &cli.command {
        Commands::Count => run_count(&directory, cli.format),

        Commands::List => run_list(&directory, cli.format, selection),

        Commands::Info(args) => run_info(&directory, args, cli.format, selection),

        Commands::Processes => run_processes(&directory, cli.format, selection),

        Commands::Driver => run_driver(&directory, cli.format),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Nvml(NvmlError::LibraryNotFound) => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      On Linux, install the nvidia-utils package.");
        }
        AppError::Nvml(NvmlError::InitializationFailed(_)) => {
            eprintln!();
            eprintln!("Hint: Check that the NVIDIA kernel module is loaded ('nvidia-smi').");
        }
        AppError::Device(DeviceError::NoDevices) => {
            eprintln!();
            eprintln!("Hint: Make sure you have an NVIDIA GPU installed.");
            eprintln!("      Check 'nvidia-smi' for GPU detection.");
        }
        AppError::AllowList(_) => {
            eprintln!();
            eprintln!("Hint: The allow-list must be comma-separated device indices, e.g. 0,2.");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_logger_enables_debug() {
        let filter = logger(true).build().filter();
        assert!(filter >= log::LevelFilter::Debug);
    }

    #[test]
    fn test_quiet_logger_defaults_to_warn() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(logger(false).build().filter(), log::LevelFilter::Warn);
    }
}
