//! Command-line interface for device-login.

pub mod errors;
pub mod login;

use clap::{Args, Parser, Subcommand};

/// Log in to an API account from the terminal via the browser.
#[derive(Parser, Debug)]
#[command(name = "device-login", version, about = "Browser-delegated API login")]
pub struct Cli {
    /// Log filter when RUST_LOG is not set (e.g. info, debug)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in through the browser and store the issued key
    Login(LoginArgs),
    /// Show the stored account for a profile
    Status(ProfileArgs),
    /// Remove the stored key for a profile
    Logout(ProfileArgs),
}

/// Arguments for `device-login login`.
#[derive(Args, Debug, Default)]
pub struct LoginArgs {
    /// Authorization endpoint (defaults to the hosted service)
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Name used to label the issued key
    #[arg(long)]
    pub device_name: Option<String>,

    /// Profile to store the key under
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Print the login link instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Initial wait between poll attempts, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting for the browser login after this many seconds
    #[arg(long)]
    pub poll_timeout_secs: Option<u64>,
}

/// Arguments for commands that only need a profile name.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// Profile name
    #[arg(short, long)]
    pub profile: Option<String>,
}
