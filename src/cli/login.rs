//! Handlers for `login`, `status` and `logout`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::errors::CliError;
use super::{LoginArgs, ProfileArgs};
use crate::auth::login::print_event;
use crate::auth::{
    BrowserLauncher, LoginEvent, LoginFlow, ManualBrowser, ProfileStore, SecretKeyValidator,
    SystemBrowser,
};
use crate::config::LoginConfig;

/// Layer command-line flags over the environment-derived config.
pub fn apply_login_args(mut config: LoginConfig, args: &LoginArgs) -> Result<LoginConfig, CliError> {
    if let Some(url) = &args.auth_url {
        config.auth_url = Some(url.clone());
    }
    if let Some(name) = &args.device_name {
        config.device_name = Some(name.clone());
    }
    if let Some(profile) = &args.profile {
        config.profile = Some(profile.clone());
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll.initial_interval = Duration::from_millis(ms);
        config.poll.max_interval = config.poll.max_interval.max(config.poll.initial_interval);
    }
    if let Some(secs) = args.poll_timeout_secs {
        config.poll.max_total_wait = Duration::from_secs(secs);
    }
    config.poll.validate()?;
    Ok(config)
}

/// Handle `device-login login`.
pub async fn handle_login(args: LoginArgs, cancel: CancellationToken) -> Result<(), CliError> {
    let config = apply_login_args(LoginConfig::from_env()?, &args)?;
    let profile = config.profile();

    let launcher: Arc<dyn BrowserLauncher> = if args.no_browser {
        Arc::new(ManualBrowser)
    } else {
        Arc::new(SystemBrowser)
    };
    let no_browser = args.no_browser;
    let sink = Arc::new(move |event: LoginEvent| match event {
        LoginEvent::LinksReady { links } if no_browser => {
            println!(
                "Open this link in your browser to log in: {}\nVerification code is {}",
                links.browser_url, links.verification_code
            );
        }
        LoginEvent::Saved { profile } => {
            println!("Done! Credentials saved to profile \"{profile}\".");
        }
        other => print_event(other),
    });

    let flow = LoginFlow::new(
        launcher,
        Arc::new(SecretKeyValidator),
        Arc::new(config.store()),
    )
    .with_auth_url(config.auth_url())
    .with_poll_config(config.poll.clone())
    .with_cancellation(cancel)
    .with_event_sink(sink);

    let credential = flow.run(&profile).await?;
    println!(
        "Logged in to account {} ({} mode).",
        credential
            .account_display_name
            .as_deref()
            .unwrap_or(credential.account_id.as_str()),
        credential.api_key.mode()
    );
    Ok(())
}

/// Handle `device-login status`.
pub fn handle_status(args: ProfileArgs) -> Result<(), CliError> {
    let config = LoginConfig::from_env()?;
    let name = args
        .profile
        .or(config.profile.clone())
        .unwrap_or_else(|| "default".to_string());

    match config.store().load(&name)? {
        Some(stored) => {
            println!("Profile \"{name}\": logged in");
            println!("  account: {}", stored.account_id);
            if let Some(display) = &stored.account_display_name {
                println!("  name:    {display}");
            }
            println!("  device:  {}", stored.device_name);
            println!("  key:     {} ({} mode)", stored.api_key().redacted(), stored.mode);
            println!("  saved:   {}", stored.saved_at.format("%Y-%m-%d %H:%M"));
        }
        None => println!("Profile \"{name}\": not logged in"),
    }
    Ok(())
}

/// Handle `device-login logout`.
pub fn handle_logout(args: ProfileArgs) -> Result<(), CliError> {
    let config = LoginConfig::from_env()?;
    let name = args
        .profile
        .or(config.profile.clone())
        .unwrap_or_else(|| "default".to_string());
    config.store().clear(&name)?;
    println!("Logged out of profile \"{name}\"");
    Ok(())
}
