//! fluxlink - Command line entry point
//!
//! Looks devices up on the local network and reports which protocol
//! generation would be used to talk to them.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use fluxlink_core::{DeviceIdentity, DeviceMetadata, DeviceProfile, StrictVersion};
use fluxlink_discovery::{progress_fn, Announcement, Discover, UdpDiscovery};
use fluxlink_upnp::{ProfileResolver, ProtocolGeneration};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "fluxlink")]
#[command(about = "Discover FLUX devices and negotiate their protocol backend")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fluxlink.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look a device up and print its announced profile
    Discover(Target),
    /// Resolve a device and report which protocol generation drives it
    Negotiate {
        #[command(flatten)]
        target: Target,
        /// Use this metadata (JSON file) instead of discovering the device
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Write a default configuration file
    InitConfig,
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Device UUID
    #[arg(long)]
    uuid: Option<Uuid>,

    /// Device IP address, used when the UUID is unknown
    #[arg(long)]
    ip: Option<IpAddr>,

    /// Lookup timeout in seconds, overrides the configuration; 0 waits forever
    #[arg(short, long)]
    timeout: Option<u64>,
}

impl Target {
    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.uuid.unwrap_or_else(Uuid::nil), self.ip)
    }

    fn lookup_timeout(&self, config: &config::Config) -> Option<Duration> {
        match self.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.client.lookup_timeout(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("fluxlink v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::InitConfig => {
            config::save_default_config(&args.config)?;
            println!("Wrote default configuration to {}", args.config.display());
        }
        Command::Discover(target) => {
            let config = config::load_config(&args.config)?;
            let mut discovery = UdpDiscovery::new(config.discovery.clone());
            let identity = checked_identity(&target)?;
            let mut observer = progress_fn(print_progress);
            let metadata = discovery
                .discover(&identity, &mut observer, target.lookup_timeout(&config))
                .await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Negotiate { target, metadata } => {
            let config = config::load_config(&args.config)?;
            let mut discovery = UdpDiscovery::new(config.discovery.clone());
            let identity = target.identity();
            let supplied = metadata.as_deref().map(load_metadata).transpose()?;
            if supplied.is_none() {
                checked_identity(&target)?;
            }

            let mut resolver = ProfileResolver::new(&identity);
            let mut observer = progress_fn(print_progress);
            let profile = resolver
                .resolve(
                    &identity,
                    supplied,
                    &mut discovery,
                    &mut observer,
                    target.lookup_timeout(&config),
                )
                .await?;

            print_profile(&profile);
            match ProtocolGeneration::for_device(&profile.model_id, &profile.version) {
                Ok(generation) => println!("  Backend:  {}", generation),
                Err(e) => println!("  Backend:  none ({})", e),
            }
        }
    }

    Ok(())
}

fn checked_identity(target: &Target) -> Result<DeviceIdentity> {
    let identity = target.identity();
    if identity.lookup_mode().is_none() {
        bail!("either --uuid or --ip is required");
    }
    Ok(identity)
}

fn load_metadata(path: &Path) -> Result<DeviceMetadata> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading metadata from {}", path.display()))?;
    let metadata = serde_json::from_str(&content)
        .with_context(|| format!("parsing metadata in {}", path.display()))?;
    Ok(metadata)
}

fn print_progress(announcement: &Announcement) {
    eprintln!(
        "  seen {} ({}) at {}",
        announcement.metadata.name, announcement.metadata.uuid, announcement.metadata.ipaddr
    );
}

fn firmware_label(version: &StrictVersion) -> String {
    if version.is_prerelease() {
        format!("{} (pre-release)", version)
    } else {
        version.to_string()
    }
}

fn print_profile(profile: &DeviceProfile) {
    println!("{} ({})", profile.name, profile.uuid);
    println!("  Model:    {}", profile.model_id);
    println!("  Serial:   {}", profile.serial);
    println!("  Firmware: {}", firmware_label(&profile.version));
    println!("  Address:  {}", profile.ipaddr);
}
