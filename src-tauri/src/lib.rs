//! Snipping Tool: Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Control panel, hotkey and Tauri commands (panel.rs)
//! - System tray (tray.rs)
//! - Selection overlay window (overlay.rs)
//! - The platform-free core: capture/, selection/, orchestrator.rs,
//!   storage.rs, session.rs, config.rs, logging.rs

pub mod capture;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod selection;
pub mod session;
pub mod storage;

mod overlay;
mod panel;
mod tray;

use config::Settings;
use overlay::OverlayState;

/// Entry point, called by `main.rs`.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    dotenvy::dotenv().ok();
    logging::init();
    let settings = Settings::from_env();
    log::info!(
        "Snipping Tool starting (delay {}ms, tray {})",
        settings.capture_delay.as_millis(),
        if settings.tray_enabled { "on" } else { "off" }
    );

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(OverlayState::default())
        .invoke_handler(tauri::generate_handler![
            panel::capture_now,
            panel::select_grid,
            panel::clear_region,
            panel::choose_folder,
            panel::reset_folder,
            panel::open_folder,
            panel::panel_status,
            panel::exit_app_command,
            overlay::overlay_ready,
            overlay::overlay_pointer,
        ])
        .setup(move |app| {
            panel::setup(app.handle(), &settings)?;
            log::info!("Ready for snips");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Snipping Tool");
}
