//! ScrumBot - A voice and text stand-up client for Linux
//!
//! This is the main entry point for the ScrumBot application.

mod api;
mod app;
mod audio;
mod cli;
mod models;
mod settings;
mod state;
mod tokio_runtime;

use anyhow::Context as _;
use api::{HttpApi, ScrumApi};
use app::ScrumBot;
use clap::Parser;
use gpui::prelude::*;
use gpui::*;
use log::{error, info};
use settings::ClientSettings;
use std::sync::Arc;

const APP_ID: &str = "com.scrumbot.Client";

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and initialize logging
    let args = cli::Args::parse();
    cli::init_logging(&args);

    let settings = ClientSettings::from(&args);
    let api: Arc<dyn ScrumApi> = Arc::new(
        HttpApi::new(settings.api_url.clone(), settings.request_timeout)
            .context("Failed to build HTTP client")?,
    );

    info!("Starting ScrumBot against {}", settings.api_url);

    Application::new().run(move |cx: &mut App| {
        // Initialize global Tokio runtime for reqwest and playback tasks
        if let Err(e) = tokio_runtime::init(cx) {
            error!("Failed to start async runtime: {}", e);
            cx.quit();
            return;
        }

        let bounds = Bounds::centered(None, size(px(1200.0), px(800.0)), cx);
        let opened = cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                titlebar: Some(TitlebarOptions {
                    title: Some("ScrumBot".into()),
                    ..Default::default()
                }),
                // App ID for Wayland/GNOME desktop integration
                app_id: Some(APP_ID.to_string()),
                ..Default::default()
            },
            |window, cx| {
                window.set_app_id(APP_ID);
                cx.new(|cx| ScrumBot::new(settings, api, window, cx))
            },
        );
        if let Err(e) = opened {
            error!("Failed to open window: {}", e);
            cx.quit();
        }
    });

    Ok(())
}
