//! `portal-client`: sign in against the portal API, report the session, and
//! evaluate the route guards for a set of locations.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::cell::RefCell;
use std::env;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use portal_client::domain::Session;
use portal_client::inbound::{GuardView, Navigator};
use portal_client::{PortalRuntime, PortalSettings};

/// `portal-client` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portal-client",
    about = "Sign in to the portal API and evaluate route guards",
    version
)]
struct CliArgs {
    /// Account email address.
    #[arg(long, value_name = "email")]
    email: String,
    /// Account password.
    #[arg(long, value_name = "password")]
    password: String,
    /// Locations to evaluate, such as `/dashboard/admin`.
    #[arg(long = "path", value_name = "location", default_value = "/dashboard")]
    paths: Vec<String>,
}

/// Records where guards sent us.
#[derive(Default)]
struct History(RefCell<Vec<String>>);

impl Navigator for History {
    fn navigate(&self, to: &str, _replace: bool) {
        self.0.borrow_mut().push(to.to_owned());
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = PortalSettings::load_from_iter(env::args_os().take(1))
        .map_err(|error| eyre!("failed to load settings: {error}"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args, &settings))
}

async fn run(args: CliArgs, settings: &PortalSettings) -> Result<()> {
    let portal = PortalRuntime::from_settings(settings).wrap_err("wire portal runtime")?;
    let session = portal.session();
    session.bootstrap().await;

    let user = session
        .login(&args.email, &args.password)
        .await
        .wrap_err("sign-in failed")?;
    info!(user_id = %user.id(), role = %user.role(), "signed in");
    println!("user={} role={}", user.display_name(), user.role());

    let snapshot = session.session();
    for path in &args.paths {
        println!("{path} -> {}", describe(&portal, &snapshot, path));
    }

    session.logout().await;
    println!("signed out");
    Ok(())
}

fn describe(portal: &PortalRuntime, session: &Session, location: &str) -> String {
    let history = History::default();
    let view = portal.guard().render(session, location, || location.to_owned());
    let redirected = matches!(view, GuardView::Redirect { .. });
    match view.perform(&history) {
        Some(page) => format!("render {page}"),
        None if redirected => history
            .0
            .borrow()
            .last()
            .map_or_else(|| "redirect".to_owned(), |to| format!("redirect {to}")),
        None => "loading".to_owned(),
    }
}
