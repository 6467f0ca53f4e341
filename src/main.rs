//! CLI entry point for hda_codec_binding
//!
//! Runs one simulated enumeration pass:
//! - registers the driver with an in-memory framework
//! - builds controllers from the `[[controllers]]` config section
//! - probes and attaches each controller in order
//! - optionally detaches everything that bound
//!
//! # Usage
//!
//! ```bash
//! hda_codec_binding --config config/hda_binding.toml --log-level debug --disconnect
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use hda_codec_binding::config::{AppConfig, ControllerDefinition, DEFAULT_CONFIG_PATH};
use hda_codec_binding::logging::{self, LoggingConfig};
use hda_codec_binding::mock::{
    InMemoryDriverRegistry, InMemoryRegistry, SimulatedCodec, SimulatedPath,
};
use hda_codec_binding::{
    register, BindingDescriptor, ComponentName, DeviceIdentity, HdaCodecBinding, RequesterId,
    TransportError,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Requester identity this process leases under
const DRIVER_REQUESTER: RequesterId = RequesterId::new(0x4844_4100);

#[derive(Parser)]
#[command(name = "hda_codec_binding")]
#[command(about = "Simulated enumeration pass for the HDA codec driver binding", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Detach every bound controller before exiting
    #[arg(long)]
    disconnect: bool,
}

enum Outcome {
    Bound(Option<DeviceIdentity>, String),
    Declined(String),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("invalid configuration")?;

    let logging_config = LoggingConfig::from_section(&config.logging).map_err(anyhow::Error::msg)?;
    logging::init(logging_config).map_err(anyhow::Error::msg)?;

    let registry = Arc::new(build_registry(&config.controllers));
    let binding = Arc::new(HdaCodecBinding::new(
        registry.clone(),
        DRIVER_REQUESTER,
        config.binding_options(),
    ));
    tracing::debug!(
        requester = %binding.requester(),
        settle_delay = ?binding.settle_delay(),
        "binding created"
    );

    let framework = InMemoryDriverRegistry::new();
    let descriptor =
        BindingDescriptor::new(config.driver.name.clone(), binding.clone(), config.driver.version);
    register(&framework, descriptor, ComponentName::english(config.driver.name.clone()))
        .context("driver registration failed")?;

    let installed = framework
        .get(&config.driver.name)
        .context("registered driver is missing from the framework")?;
    let driver = installed.binding();

    let mut outcomes = Vec::with_capacity(config.controllers.len());
    for controller in &config.controllers {
        let handle = controller.handle;
        let outcome = match driver.probe(handle).and_then(|_| driver.attach(handle)) {
            Ok(()) => Outcome::Bound(
                binding.identity(handle),
                binding.location_path(handle).unwrap_or_default(),
            ),
            Err(err) => Outcome::Declined(err.to_string()),
        };
        outcomes.push((handle, outcome));
    }

    println!("{} v{:#x}", installed.driver_name(), installed.version());
    for (handle, outcome) in &outcomes {
        match outcome {
            Outcome::Bound(Some(identity), path) => println!("  {handle}: bound {identity} at {path}"),
            Outcome::Bound(None, path) => println!("  {handle}: bound (unidentified) at {path}"),
            Outcome::Declined(reason) => println!("  {handle}: declined ({reason})"),
        }
    }

    if cli.disconnect {
        for handle in binding.bound_handles() {
            driver
                .detach(handle, &[])
                .with_context(|| format!("detaching {handle}"))?;
            println!("  {handle}: detached");
        }
        println!("leases still held: {}", registry.held_by(binding.requester()));
    }

    Ok(())
}

fn build_registry(controllers: &[ControllerDefinition]) -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    for controller in controllers {
        let handle = controller.handle;
        if controller.expose_command {
            let mut codec = SimulatedCodec::new(controller.address, controller.response);
            if controller.command_fails {
                codec = codec.failing_command(TransportError::NoResponse);
            }
            registry.add_codec(handle, Arc::new(codec));
        }
        if controller.expose_path {
            registry.add_path(handle, Arc::new(SimulatedPath::new(controller.path_text())));
        }
    }
    registry
}
