//! camctl - tethered camera session demo over the simulated SDK.
//!
//! Human output goes to stdout, logs to stderr. `--json` switches both to
//! machine-readable form.
#![forbid(unsafe_code)]

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use console::style;
use serde::Serialize;

use camsession::device::mock::MockSdk;
use camsession::device::{PropertyEventKind, PropertyId, StatusCode};
use camsession::events::{ObjectEvent, PictureInfo, PropertyEvent};
use camsession::{Camera, CameraError, PropertyValue, SaveDestination, Settings};
use cli::{CaptureArgs, Cli, Commands, LiveViewArgs, SetTextArgs};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    camsession::logging::init_logging(cli.json, cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        cmd_version(cli);
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let sdk = Arc::new(if cli.legacy {
        MockSdk::legacy()
    } else {
        MockSdk::eos()
    });
    let mut camera =
        Camera::new(sdk.clone(), sdk.camera_ref()).context("Failed to connect camera")?;

    let result = match &cli.command {
        Commands::Info => cmd_info(cli, &mut camera),
        Commands::Capture(args) => cmd_capture(cli, &mut camera, &settings, args),
        Commands::LiveView(args) => cmd_live_view(cli, &mut camera, &sdk, &settings, args),
        Commands::Props => cmd_props(cli, &mut camera),
        Commands::SetText(args) => cmd_set_text(cli, &mut camera, args),
        Commands::Version => Ok(()),
    };
    camera.dispose();
    result
}

// === Commands ===

#[derive(Serialize)]
struct InfoOutput {
    description: String,
    port_name: String,
    legacy: bool,
    product_name: String,
    battery_level: u32,
    available_shots: u32,
    save_to: SaveDestination,
    evf_mode: bool,
}

fn cmd_info(cli: &Cli, camera: &mut Camera) -> anyhow::Result<()> {
    let info = InfoOutput {
        description: camera.description().to_string(),
        port_name: camera.port_name().to_string(),
        legacy: camera.is_legacy(),
        product_name: camera.product_name()?,
        battery_level: camera.battery_level()?,
        available_shots: camera.available_shots()?,
        save_to: camera.save_destination()?,
        evf_mode: camera.is_evf_mode()?,
    };

    if cli.json {
        output_json(&info)?;
    } else {
        println!("{}", style(&info.description).bold().cyan());
        println!("  Port:            {}", info.port_name);
        println!("  Protocol:        {}", if info.legacy { "legacy" } else { "current" });
        println!("  Product:         {}", info.product_name);
        println!("  Battery:         {}%", info.battery_level);
        println!("  Available shots: {}", info.available_shots);
        println!("  Save to:         {}", info.save_to);
        println!("  Evf mode:        {}", if info.evf_mode { "on" } else { "off" });
    }
    Ok(())
}

fn cmd_capture(
    cli: &Cli,
    camera: &mut Camera,
    settings: &Settings,
    args: &CaptureArgs,
) -> anyhow::Result<()> {
    settings.apply(camera).context("Failed to apply settings")?;
    if let Some(dir) = &args.host {
        camera.save_to_host(dir)?;
    }

    let (_id, pictures) = camera.events().object().subscribe_channel();
    for _ in 0..args.count {
        camera.take_picture()?;
        camera.process_events()?;
    }

    let taken: Vec<PictureInfo> = pictures
        .try_iter()
        .filter_map(|event| match event {
            ObjectEvent::PictureTaken(info) => Some(info),
            _ => None,
        })
        .collect();

    if cli.json {
        output_json(&taken)?;
    } else {
        for info in &taken {
            let target = info.host_path.as_ref().map_or_else(
                || "on card".to_string(),
                |p| format!("-> {}", p.display()),
            );
            println!(
                "{} {} ({} bytes) {}",
                style("captured").green(),
                style(&info.file_name).bold(),
                info.size,
                style(target).dim()
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LiveViewSummary {
    frames: u64,
    started: bool,
    stopped: bool,
}

fn cmd_live_view(
    cli: &Cli,
    camera: &mut Camera,
    sdk: &MockSdk,
    settings: &Settings,
    args: &LiveViewArgs,
) -> anyhow::Result<()> {
    let frames = args.frames.unwrap_or(settings.live_view.frames);
    let (_id, events) = camera.events().property().subscribe_channel();

    camera.start_live_view()?;
    // Stand in for the body: one histogram update per frame.
    for n in 0..frames {
        sdk.queue_property(
            PropertyEventKind::PropertyChanged,
            PropertyId::EvfHistogramStatus.code(),
            n,
        );
    }
    camera.process_events()?;
    camera.stop_live_view()?;

    let mut summary = LiveViewSummary {
        frames: 0,
        started: false,
        stopped: false,
    };
    for event in events.try_iter() {
        match event {
            PropertyEvent::LiveViewStarted => summary.started = true,
            PropertyEvent::LiveViewStopped => summary.stopped = true,
            PropertyEvent::LiveViewUpdate(frame) => {
                summary.frames = frame.sequence;
                if !cli.json {
                    println!("{} frame {}", style("evf").magenta(), frame.sequence);
                }
            }
            _ => {}
        }
    }

    if cli.json {
        output_json(&summary)?;
    } else {
        println!("Live view: {} frames", summary.frames);
    }
    Ok(())
}

#[derive(Serialize)]
struct PropertyEntry {
    name: String,
    code: u32,
    value: PropertyValue,
}

fn cmd_props(cli: &Cli, camera: &mut Camera) -> anyhow::Result<()> {
    let mut entries = Vec::new();
    for &id in PropertyId::ALL {
        match camera.property(id) {
            Ok(value) => entries.push(PropertyEntry {
                name: id.to_string(),
                code: id.code(),
                value,
            }),
            Err(e) if e.status() == Some(StatusCode::NOT_SUPPORTED) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if cli.json {
        output_json(&entries)?;
    } else {
        for entry in &entries {
            let value = match &entry.value {
                PropertyValue::Integer(v) => format!("{v} (0x{v:X})"),
                PropertyValue::Text(s) => format!("{s:?}"),
            };
            println!("{:<22} {}", style(&entry.name).bold(), value);
        }
    }
    Ok(())
}

fn cmd_set_text(cli: &Cli, camera: &mut Camera, args: &SetTextArgs) -> anyhow::Result<()> {
    let property = args.field.property();
    let value = PropertyValue::Text(args.value.clone());
    camera.set_property(property.id(), &value)?;
    let stored = camera.property(property.id())?;

    if cli.json {
        output_json(&PropertyEntry {
            name: property.id().to_string(),
            code: property.id().code(),
            value: stored,
        })?;
    } else if let PropertyValue::Text(s) = stored {
        println!("{} = {s:?}", style(property.id()).bold());
    }
    Ok(())
}

fn cmd_version(cli: &Cli) {
    if cli.json {
        let json = serde_json::json!({
            "version": build_info::VERSION,
            "git_sha": build_info::git_sha(),
            "git_dirty": build_info::git_dirty(),
            "build_timestamp": build_info::build_timestamp(),
            "rustc_version": build_info::rustc_semver(),
            "target": build_info::target(),
        });
        println!("{json:#}");
    } else {
        println!("camctl {}", build_info::VERSION);
        println!(
            "commit: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() { " (dirty)" } else { "" }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
}

// === Output ===

fn output_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

fn output_error(cli: &Cli, error: &anyhow::Error) {
    let camera_error = error.downcast_ref::<CameraError>();
    let suggestion = camera_error.and_then(CameraError::suggestion);

    if cli.json {
        let json = serde_json::json!({
            "error": true,
            "message": format!("{error:#}"),
            "status": camera_error.and_then(CameraError::status).map(|s| s.to_string()),
            "suggestion": suggestion,
            "recoverable": camera_error.is_some_and(CameraError::is_user_recoverable),
        });
        eprintln!("{json:#}");
    } else {
        eprintln!("{}: {error:#}", style("Error").red().bold());
        if let Some(suggestion) = suggestion {
            eprintln!("{}: {suggestion}", style("Hint").yellow());
        }
    }
}
