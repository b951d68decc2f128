use clap::Parser;
use lintlayers::cli::format;
use lintlayers::cli::{Cli, Commands, OutputFormat};
use lintlayers::scan;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("lintlayers=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lintlayers=error"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("\x1b[31merror\x1b[0m: {}", e);
    process::exit(2);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Resolve {
            paths,
            config,
            root,
            format: output_format,
        } => {
            let result = match scan::run_scan(&config, &paths, root.as_deref()) {
                Ok(r) => r,
                Err(e) => fail(e),
            };

            match output_format {
                OutputFormat::Pretty => format::print_pretty(&result),
                OutputFormat::Json => format::print_json(&result),
            }
        }
        Commands::Check { config, strict } => {
            let loaded = match scan::load_config(&config) {
                Ok(l) => l,
                Err(e) => fail(e),
            };

            format::print_warnings(&loaded.warnings);
            println!(
                "\x1b[32m✓\x1b[0m {} ({} rules, {} overrides, {} warning{})",
                loaded.name.as_deref().unwrap_or("config"),
                loaded.config.catalog().len(),
                loaded.config.layers().len(),
                loaded.warnings.len(),
                if loaded.warnings.len() == 1 { "" } else { "s" }
            );

            process::exit(if strict && !loaded.warnings.is_empty() { 1 } else { 0 });
        }
    }
}
