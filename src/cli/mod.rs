//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use camsession::TextProperty;

/// camctl - drive a simulated tethered camera through a full session.
///
/// Every invocation connects, runs one command, and releases the camera.
#[derive(Parser, Debug)]
#[command(name = "camctl", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Emit JSON on stdout and JSON log lines on stderr
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Settings file (defaults to <config dir>/camsession/config.toml)
    #[arg(long, short = 'c', global = true, env = "CAMSESSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Simulate a legacy-protocol body
    #[arg(long, global = true)]
    pub legacy: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show descriptor and status of the camera
    Info,

    /// Take pictures
    Capture(CaptureArgs),

    /// Run live view for a number of frames
    LiveView(LiveViewArgs),

    /// Dump every readable property
    Props,

    /// Write a bounded text property and read it back
    SetText(SetTextArgs),

    /// Show version and build information
    Version,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Transfer pictures to this host directory instead of the card
    #[arg(long)]
    pub host: Option<PathBuf>,

    /// Number of shots
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct LiveViewArgs {
    /// Frames to receive before stopping (overrides settings)
    #[arg(long)]
    pub frames: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SetTextArgs {
    /// Which field to write
    pub field: TextField,

    /// New value
    pub value: String,
}

/// Text fields writable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TextField {
    Artist,
    Copyright,
    Owner,
}

impl TextField {
    pub const fn property(self) -> TextProperty {
        match self {
            Self::Artist => TextProperty::ARTIST,
            Self::Copyright => TextProperty::COPYRIGHT,
            Self::Owner => TextProperty::OWNER_NAME,
        }
    }
}
