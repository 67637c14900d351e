mod cli;

use postergrid::{
    config::{self, Config},
    devices::{self, DeviceProfile},
    encode,
    generator::Generator,
    report::{Outcome, RunReport},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; the environment or config file may carry the key.
    let dotenv = dotenvy::dotenv();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "postergrid=debug,postergrid_common=debug".to_string()
        } else {
            "postergrid=info".to_string()
        }
    });

    // Logs go to stderr so stdout stays clean for reports.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Generate {
            devices,
            count,
            output,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(generate(cli.config.as_deref(), &devices, count, output, json))
        }
        Commands::Devices => list_devices(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("postergrid {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Configured device list, or the built-in one, narrowed to `names`.
fn resolve_profiles(config: &Config, names: &[String]) -> Result<Vec<DeviceProfile>> {
    let all = if config.devices.is_empty() {
        devices::default_profiles()
    } else {
        config.devices.clone()
    };
    let selected = devices::select_profiles(all, names);
    if selected.is_empty() {
        anyhow::bail!("No device profile matches {}", names.join(", "));
    }
    Ok(selected)
}

async fn generate(
    config_path: Option<&Path>,
    names: &[String],
    count: Option<usize>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(count) = count {
        config.output.poster_count = count;
    }
    if let Some(dir) = output {
        config.output.dir = dir;
    }
    config::validate_config(&mut config)?;

    let profiles = resolve_profiles(&config, names)?;
    tracing::info!(
        devices = profiles.len(),
        posters = config.output.poster_count,
        storage = config.storage.enabled,
        "Starting wallpaper generation"
    );

    let generator =
        Generator::new(&config, profiles).context("Failed to initialise generator")?;
    let report = generator.generate_all().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &config);
    }
    Ok(())
}

fn print_summary(report: &RunReport, config: &Config) {
    println!(
        "\nSuccessfully generated {}/{} wallpapers",
        report.succeeded(),
        report.devices.len()
    );
    println!(
        "Posters cached: {} ({} movies, {} series fetched)",
        report.fetch.posters_cached, report.fetch.movies, report.fetch.series
    );

    if report.remote_storage {
        println!("\nFiles uploaded to bucket '{}'", config.storage.bucket);
    } else {
        println!("\nFiles saved in:");
        for dir in ["original", "jpeg", "webp"] {
            println!("  {}", config.output.dir.join(dir).display());
        }
    }

    for device in &report.devices {
        match &device.outcome {
            Outcome::Success(artifacts) => {
                println!(
                    "  ✓ {} {}x{}  JPEG q{} / {} KB target, WebP q{}",
                    device.device,
                    device.width,
                    device.height,
                    artifacts.jpeg_quality,
                    artifacts.target_kb,
                    artifacts.webp_quality
                );
                for (format, reference) in &artifacts.references {
                    println!("      {format}: {reference}");
                }
            }
            Outcome::Skipped(skip) => println!("  ✗ {}: {}", device.device, skip),
        }
    }

    let skips = report.all_skips();
    if !skips.is_empty() {
        println!("\n{} items skipped:", skips.len());
        for skip in skips {
            println!("  - {skip}");
        }
    }

    println!("\nFile size targets:");
    println!("  - 4K+ (8M+ pixels): ~2MB JPEG");
    println!("  - 1440p+ (4M+ pixels): ~1.4MB JPEG");
    println!("  - 1080p+ (2M+ pixels): ~1MB JPEG");
    println!("  - 720p+ (1M+ pixels): ~800KB JPEG");
    println!("  - Smaller: ~500KB JPEG");
}

fn list_devices(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let profiles = resolve_profiles(&config, &[])?;

    println!(
        "{:<20} {:>11} {:>6} {:<8} {:>12}",
        "DEVICE", "OUTPUT", "SCALE", "CLASS", "JPEG BUDGET"
    );
    for profile in &profiles {
        let (w, h) = profile.scaled_size();
        let budget = encode::target_kb(u64::from(w) * u64::from(h));
        println!(
            "{:<20} {:>11} {:>6} {:<8} {:>9} KB",
            profile.name,
            format!("{w}x{h}"),
            profile.scale_factor,
            profile.category.to_string(),
            budget
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let mut config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults and environment");
            config::load_config_or_default(None)?
        }
    };

    config::validate_config(&mut config)?;
    resolve_profiles(&config, &[])?;

    println!("✓ Configuration is valid");
    println!(
        "  Storage: {}",
        if config.storage.enabled {
            "object storage"
        } else {
            "local"
        }
    );
    println!();
    print!(
        "{}",
        toml::to_string_pretty(&config.redacted()).context("Failed to render config")?
    );
    Ok(())
}
