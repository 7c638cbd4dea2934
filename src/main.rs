use anyhow::Context;
use gtk::glib;
use gtk::prelude::*;

use maritime_watch::config::Config;
use maritime_watch::data::APP_ID;
use maritime_watch::ui;

fn main() -> glib::ExitCode {
    pretty_env_logger::init_custom_env("RUST_LOG");

    match run() {
        Ok(exit_code) => exit_code,
        Err(e) => {
            log::error!("{e:#}");
            glib::ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<glib::ExitCode> {
    // Tokio runtime for network requests; the GTK main loop stays on this thread
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let _guard = rt.enter();

    let config = Config::load().context("failed to load configuration")?;
    log::debug!("Using model {} at {}", config.model, config.endpoint);

    let app = libadwaita::Application::builder()
        .application_id(APP_ID)
        .build();

    let handle = rt.handle().clone();
    app.connect_activate(move |app| ui::build_ui(app, &config, handle.clone()));

    let exit_code = app.run();

    // Keep runtime alive until app exits
    drop(_guard);
    drop(rt);

    Ok(exit_code)
}
