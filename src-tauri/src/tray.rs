//! System tray presence and menu handler.
//!
//! The tray mirrors the panel's main actions (Capture, Show, Exit). It is
//! optional: `DISABLE_TRAY` skips it, and if the platform refuses a tray
//! icon the app carries on panel-only.

use crate::config::Settings;
use crate::panel;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::sync::{Mutex, MutexGuard};
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::{TrayIcon, TrayIconBuilder},
    AppHandle, Runtime, Wry,
};

pub const TRAY_ID: &str = "snipping-tool";
const ICON_SIZE: u32 = 32;

/// Owns the tray icon; stopping it is idempotent and never blocks.
///
/// Managed as Tauri state on its own so shutdown can reach it without the
/// rest of the app state.
pub struct TrayController<R: Runtime = Wry> {
    icon: Mutex<Option<TrayIcon<R>>>,
}

impl<R: Runtime> TrayController<R> {
    pub fn disabled() -> Self {
        Self {
            icon: Mutex::new(None),
        }
    }

    fn running(icon: TrayIcon<R>) -> Self {
        Self {
            icon: Mutex::new(Some(icon)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<TrayIcon<R>>> {
        self.icon.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    pub fn stop(&self) {
        let Some(icon) = self.lock().take() else {
            return;
        };
        if let Err(e) = icon.set_visible(false) {
            log::warn!("[TRAY] Failed to hide tray icon: {}", e);
        }
        let _ = icon.app_handle().remove_tray_by_id(TRAY_ID);
        log::info!("[TRAY] Tray stopped");
    }
}

/// Starts the tray unless settings disable it. Failures degrade to no tray.
pub fn start_tray<R: Runtime>(app: &AppHandle<R>, settings: &Settings) -> TrayController<R> {
    if !settings.tray_enabled {
        log::info!("[TRAY] Tray disabled by env");
        return TrayController::disabled();
    }

    match setup_tray(app) {
        Ok(icon) => {
            log::info!("[TRAY] Tray started");
            TrayController::running(icon)
        }
        Err(e) => {
            crate::logging::log_error("tray_init", &e);
            TrayController::disabled()
        }
    }
}

/// Builds the tray icon with its Capture / Show / Exit menu.
///
/// Left-click: shows the panel.
/// Right-click: opens the menu.
fn setup_tray<R: Runtime>(app: &AppHandle<R>) -> Result<TrayIcon<R>, Box<dyn std::error::Error>> {
    let capture_item = MenuItemBuilder::with_id("capture", "Capture").build(app)?;
    let show_item = MenuItemBuilder::with_id("show", "Show").build(app)?;
    let exit_item = MenuItemBuilder::with_id("exit", "Exit").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&capture_item)
        .item(&show_item)
        .separator()
        .item(&exit_item)
        .build()?;

    let glyph = tray_glyph(ICON_SIZE);
    let (w, h) = (glyph.width(), glyph.height());
    let tray_icon = TauriImage::new_owned(glyph.into_raw(), w, h);

    let tray = TrayIconBuilder::with_id(TRAY_ID)
        .icon(tray_icon)
        .tooltip("Snipping Tool")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                panel::show_panel(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().0.as_str() {
            "capture" => {
                log::info!("[TRAY] Capture requested");
                panel::spawn_capture(app.clone());
            }
            "show" => panel::show_panel(app),
            "exit" => {
                log::info!("[TRAY] Exit requested");
                panel::exit_app(app);
            }
            _ => {}
        })
        .build(app)?;

    Ok(tray)
}

/// Scissors-like glyph on a dark translucent square: two crossed blades
/// with a finger ring at each end.
pub fn tray_glyph(size: u32) -> RgbaImage {
    let s = size as f32 / 64.0;
    let blade = Rgba([255, 255, 255, 255]);
    let ring = Rgba([200, 200, 200, 255]);
    let mut glyph = RgbaImage::from_pixel(size, size, Rgba([34, 34, 34, 230]));

    for offset in [-1.0, 0.0, 1.0] {
        let o = offset * s;
        draw_line_segment_mut(&mut glyph, (16.0 * s + o, 16.0 * s), (48.0 * s + o, 48.0 * s), blade);
        draw_line_segment_mut(&mut glyph, (48.0 * s + o, 16.0 * s), (16.0 * s + o, 48.0 * s), blade);
    }

    let radius = ((6.0 * s).round() as i32).max(1);
    for (cx, cy) in [(18.0, 18.0), (46.0, 46.0)] {
        let center = ((cx * s).round() as i32, (cy * s).round() as i32);
        draw_hollow_circle_mut(&mut glyph, center, radius, ring);
    }

    glyph
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri::Manager;

    #[test]
    fn glyph_has_requested_size_and_all_three_colours() {
        let glyph = tray_glyph(32);
        assert_eq!(glyph.dimensions(), (32, 32));
        // Corner is background, centre is where the blades cross.
        assert_eq!(*glyph.get_pixel(0, 0), Rgba([34, 34, 34, 230]));
        assert_eq!(*glyph.get_pixel(16, 16), Rgba([255, 255, 255, 255]));
        assert!(glyph.pixels().any(|p| *p == Rgba([200, 200, 200, 255])));
    }

    #[test]
    fn disabled_controller_stops_without_a_tray() {
        let tray = TrayController::<tauri::test::MockRuntime>::disabled();
        assert!(!tray.is_running());
        tray.stop();
        tray.stop();
        assert!(!tray.is_running());
    }

    #[test]
    fn disabled_setting_starts_no_tray_and_exit_path_still_runs() {
        let app = tauri::test::mock_app();
        let settings = Settings {
            tray_enabled: false,
            ..Settings::default()
        };

        let tray = start_tray(app.handle(), &settings);
        assert!(!tray.is_running());
        assert!(app.handle().tray_by_id(TRAY_ID).is_none());

        app.manage(tray);
        panel::release_tray(app.handle());
        panel::release_tray(app.handle());
        assert!(!app.state::<TrayController<tauri::test::MockRuntime>>().is_running());
    }
}
