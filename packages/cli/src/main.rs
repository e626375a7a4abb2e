use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use v8host_core::{format_severity, BootstrapConfig, SeverityLevel};
use v8host_kernel::kernel::{init_module_with, LoadedModule};
use v8host_kernel::V8Engine;

/// v8host CLI
/// Bootstraps the embedded V8 engine and reports the exposed module surface
#[derive(Parser)]
#[command(name = "v8host")]
#[command(about = "Embedded V8 bootstrap driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap and list exposed capabilities
    Init {
        /// Directory holding icudtl.dat and snapshot_blob.bin
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Script whose directory holds the data (ignored with --data-dir)
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Diagnostic threshold (overrides V8HOST_LOG)
        #[arg(short, long)]
        log: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the severity levels, least severe first
    Levels,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            data_dir,
            script,
            log,
            json,
        } => {
            let mut config = BootstrapConfig::from_env().context("reading environment")?;
            if let Some(level) = log {
                config = config.with_log_level(level);
            }
            if let Some(dir) = data_dir {
                config = config.with_data_dir(dir);
            }
            if let Some(script) = script {
                config = config.with_invoking_script(script);
            }

            let module = init_module_with(&config).context("module bootstrap failed")?;
            debug!("root execution unit {}", module.identity);
            report(&module, json)?;
        }
        Commands::Levels => {
            for level in SeverityLevel::ALL {
                let marker = if level == SeverityLevel::DEFAULT_THRESHOLD { " (default)" } else { "" };
                println!("{}{}", format_severity(level), marker);
            }
        }
    }

    Ok(())
}

fn report(module: &LoadedModule<V8Engine>, as_json: bool) -> Result<()> {
    let namespace = &module.namespace;

    if as_json {
        let doc = json!({
            "module": namespace.module(),
            "identity": module.identity,
            "data_dir": module.data_dir.path(),
            "capabilities": namespace.exposed_capabilities(),
            "symbols": namespace.symbols(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{} loaded from {}", namespace.module(), module.data_dir.path().display());
    println!("root execution unit {}", module.identity);
    for capability in namespace.exposed_capabilities() {
        let symbols: Vec<_> = namespace.symbols_of(capability).map(|s| s.name.as_str()).collect();
        println!("  {:<12} {}", capability, symbols.join(", "));
    }
    Ok(())
}
