//! Control surface: the always-on-top panel, its commands, and the hotkey.
//!
//! Owns the session state and the orchestrator. Panel buttons, tray items
//! and the global shortcut all funnel into the helpers here.

use crate::capture::XcapGrabber;
use crate::config::Settings;
use crate::orchestrator::{CaptureOrchestrator, CaptureResult, Surface};
use crate::overlay::OverlaySelector;
use crate::session::{Session, SessionConfig};
use crate::storage;
use crate::tray::{self, TrayController};
use tauri::{
    AppHandle, Emitter, LogicalPosition, LogicalSize, Manager, Runtime, WebviewUrl,
    WebviewWindow, WebviewWindowBuilder,
};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

pub const PANEL_LABEL: &str = "main";
pub const PANEL_WIDTH: f64 = 460.0;
pub const PANEL_HEIGHT: f64 = 104.0;
/// One inch at 96 DPI, in logical pixels.
pub const PANEL_INSET: f64 = 96.0;

pub const STATUS_EVENT: &str = "status-changed";

/// Everything the panel, tray and hotkey share. The tray itself is managed
/// separately as a [`TrayController`].
pub struct AppState {
    pub session: Session,
    pub orchestrator: CaptureOrchestrator<XcapGrabber, PanelSurface>,
}

/// [`Surface`] implementation over the panel window.
pub struct PanelSurface {
    app: AppHandle,
}

impl PanelSurface {
    fn window(&self) -> Result<WebviewWindow, String> {
        self.app
            .get_webview_window(PANEL_LABEL)
            .ok_or_else(|| "Panel window is gone".to_string())
    }
}

impl Surface for PanelSurface {
    fn hide(&self) -> Result<(), String> {
        self.window()?.hide().map_err(|e| e.to_string())
    }

    fn show(&self) -> Result<(), String> {
        self.window()?.show().map_err(|e| e.to_string())
    }
}

/// Top-left corner that puts the panel `inset` away from the bottom-right
/// of a monitor, never past its top-left.
pub fn panel_position(
    monitor_origin: (f64, f64),
    monitor_size: (f64, f64),
    panel_size: (f64, f64),
    inset: f64,
) -> (f64, f64) {
    let x = (monitor_size.0 - panel_size.0 - inset).max(0.0);
    let y = (monitor_size.1 - panel_size.1 - inset).max(0.0);
    (monitor_origin.0 + x, monitor_origin.1 + y)
}

/// Builds the panel, state, hotkey and tray. Called from Tauri's `setup`.
pub fn setup(app: &AppHandle, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let window = build_panel_window(app)?;

    let orchestrator = CaptureOrchestrator::new(
        XcapGrabber,
        PanelSurface { app: app.clone() },
        settings.capture_delay,
    );
    let tray = tray::start_tray(app, settings);

    app.manage(AppState {
        session: Session::new(SessionConfig::default()),
        orchestrator,
    });
    app.manage(tray);

    if let Err(e) = register_capture_hotkey(app) {
        log::warn!("[PANEL] Capture hotkey unavailable: {}", e);
    }

    window.show()?;
    log::info!("[PANEL] Panel shown");
    Ok(())
}

fn build_panel_window(app: &AppHandle) -> tauri::Result<WebviewWindow> {
    let window = WebviewWindowBuilder::new(app, PANEL_LABEL, WebviewUrl::App("index.html".into()))
        .title("Snipping Tool")
        .inner_size(PANEL_WIDTH, PANEL_HEIGHT)
        .decorations(false)
        .always_on_top(true)
        .resizable(false)
        .visible(false)
        .build()?;

    if let Some(monitor) = window.primary_monitor()? {
        let scale = monitor.scale_factor();
        let size: LogicalSize<f64> = monitor.size().to_logical(scale);
        let origin: LogicalPosition<f64> = monitor.position().to_logical(scale);
        let (x, y) = panel_position(
            (origin.x, origin.y),
            (size.width, size.height),
            (PANEL_WIDTH, PANEL_HEIGHT),
            PANEL_INSET,
        );
        window.set_position(LogicalPosition::new(x, y))?;
    }

    Ok(window)
}

fn capture_shortcut() -> Shortcut {
    Shortcut::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyS)
}

fn register_capture_hotkey(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let shortcut = capture_shortcut();
    app.plugin(
        tauri_plugin_global_shortcut::Builder::new()
            .with_handler(move |app, pressed, event| {
                if *pressed == shortcut && event.state() == ShortcutState::Pressed {
                    log::info!("[PANEL] Capture hotkey pressed");
                    spawn_capture(app.clone());
                }
            })
            .build(),
    )?;
    app.global_shortcut().register(shortcut)?;
    log::info!("[PANEL] Capture hotkey registered (Ctrl+Shift+S)");
    Ok(())
}

fn emit_status<R: Runtime>(app: &AppHandle<R>, session: &Session) {
    if let Err(e) = app.emit_to(PANEL_LABEL, STATUS_EVENT, session.status_text()) {
        log::debug!("[PANEL] Status not delivered: {}", e);
    }
}

/// Runs one capture and refreshes the status line.
pub async fn run_capture<R: Runtime>(app: &AppHandle<R>) -> CaptureResult {
    let state = app.state::<AppState>();
    let result = state.orchestrator.capture(&state.session).await;
    emit_status(app, &state.session);
    result
}

/// Fire-and-forget capture for the tray and the hotkey.
pub fn spawn_capture<R: Runtime>(app: AppHandle<R>) {
    tauri::async_runtime::spawn(async move {
        // Outcome is already logged by the orchestrator.
        let _ = run_capture(&app).await;
    });
}

pub fn show_panel<R: Runtime>(app: &AppHandle<R>) {
    let Some(window) = app.get_webview_window(PANEL_LABEL) else {
        return;
    };
    let shown = window
        .show()
        .and_then(|_| window.unminimize())
        .and_then(|_| window.set_focus());
    if let Err(e) = shown {
        log::warn!("[PANEL] Failed to show panel: {}", e);
    }
}

/// Stops the tray if one is running. Safe to call repeatedly.
pub fn release_tray<R: Runtime>(app: &AppHandle<R>) {
    if let Some(tray) = app.try_state::<TrayController<R>>() {
        tray.stop();
    }
}

pub fn exit_app<R: Runtime>(app: &AppHandle<R>) {
    release_tray(app);
    log::info!("[PANEL] Exiting");
    app.exit(0);
}

/// Tauri command: capture now. Returns the saved path.
#[tauri::command]
pub async fn capture_now(app: AppHandle) -> Result<String, String> {
    run_capture(&app)
        .await
        .map(|path| path.display().to_string())
        .map_err(|e| e.to_string())
}

/// Tauri command: pick a new capture region on the overlay.
#[tauri::command]
pub async fn select_grid(app: AppHandle) -> Result<String, String> {
    let selector = OverlaySelector::new(app.clone());
    let state = app.state::<AppState>();
    let result = state
        .orchestrator
        .select_region(&state.session, &selector)
        .await;
    emit_status(&app, &state.session);
    result.map(|_| state.session.status_text()).map_err(|e| e.to_string())
}

/// Tauri command: go back to capturing the full display.
#[tauri::command]
pub fn clear_region(app: AppHandle, state: tauri::State<'_, AppState>) -> String {
    state.session.set_region(None);
    log::info!("[PANEL] Region cleared; capturing full display");
    emit_status(&app, &state.session);
    state.session.status_text()
}

/// Tauri command: open the OS folder picker and use the choice as base.
#[tauri::command]
pub fn choose_folder(app: AppHandle) {
    let handle = app.clone();
    app.dialog()
        .file()
        .set_title("Choose screenshots folder")
        .pick_folder(move |folder| {
            let Some(folder) = folder else {
                return;
            };
            match folder.into_path() {
                Ok(path) => {
                    log::info!("[PANEL] Save folder set to {}", path.display());
                    let state = handle.state::<AppState>();
                    state.session.set_base_folder(Some(path));
                    emit_status(&handle, &state.session);
                }
                Err(e) => log::warn!("[PANEL] Unusable folder choice: {}", e),
            }
        });
}

/// Tauri command: drop the folder override.
#[tauri::command]
pub fn reset_folder(app: AppHandle, state: tauri::State<'_, AppState>) -> String {
    state.session.set_base_folder(None);
    log::info!("[PANEL] Save folder reset to default");
    emit_status(&app, &state.session);
    state.session.status_text()
}

/// Tauri command: create the current base folder if needed and open it.
#[tauri::command]
#[allow(deprecated)]
pub fn open_folder(app: AppHandle, state: tauri::State<'_, AppState>) -> Result<(), String> {
    use tauri_plugin_shell::ShellExt;

    let config = state.session.snapshot();
    let folder = storage::ensure_base_folder(config.base_folder.as_deref()).map_err(|e| {
        crate::logging::log_error("open_current_folder", &e);
        e.to_string()
    })?;

    app.shell()
        .open(folder.to_string_lossy().to_string(), None)
        .map_err(|e| {
            crate::logging::log_error("open_current_folder", &e);
            e.to_string()
        })
}

/// Tauri command: current status line.
#[tauri::command]
pub fn panel_status(state: tauri::State<'_, AppState>) -> String {
    state.session.status_text()
}

/// Tauri command: stop the tray and quit.
#[tauri::command]
pub fn exit_app_command(app: AppHandle) {
    exit_app(&app);
}
