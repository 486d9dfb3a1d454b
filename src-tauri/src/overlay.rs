//! Fullscreen selection overlay.
//!
//! The overlay webview reports its size once it has loaded, receives the
//! frozen frame already scaled to fit, and then streams pointer events
//! back. The [`SelectionMachine`] decides everything; the page only draws
//! what it is told. The `select` future waits on a oneshot channel that the
//! terminal transition (or the window closing) fires.

use crate::capture::{Bitmap, Region};
use crate::selection::{
    DisplayRect, PointerEvent, ScaleFit, SelectionMachine, Selector, Transition,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use tokio::sync::oneshot;

pub const OVERLAY_LABEL: &str = "overlay";

/// The scaled frame and where to draw it, sent to the overlay page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    /// `data:image/png;base64,...`
    pub image: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: u32,
    pub height: u32,
}

/// Reply to a pointer event.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayUpdate {
    Ignored,
    Dragging { rect: DisplayRect },
    Done,
}

struct ActiveSelection {
    bitmap: Bitmap,
    machine: Option<SelectionMachine>,
    reply: oneshot::Sender<Option<Region>>,
}

/// Tauri-managed slot for the one selection that may run at a time.
#[derive(Default)]
pub struct OverlayState {
    active: Mutex<Option<ActiveSelection>>,
}

impl OverlayState {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveSelection>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, bitmap: Bitmap) -> Result<oneshot::Receiver<Option<Region>>, String> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err("A selection is already in progress".to_string());
        }
        let (reply, rx) = oneshot::channel();
        *slot = Some(ActiveSelection {
            bitmap,
            machine: None,
            reply,
        });
        Ok(rx)
    }

    /// Fits the frozen frame to the overlay surface and starts the machine.
    fn prepare(&self, surface_width: u32, surface_height: u32) -> Result<OverlayFrame, String> {
        let mut slot = self.lock();
        let active = slot.as_mut().ok_or("No selection in progress")?;

        let fit = ScaleFit::compute(
            surface_width,
            surface_height,
            active.bitmap.width(),
            active.bitmap.height(),
        )
        .ok_or_else(|| format!("Cannot fit frame on a {}x{} surface", surface_width, surface_height))?;

        let scaled = imageops::resize(
            &active.bitmap,
            fit.display_width,
            fit.display_height,
            imageops::FilterType::Triangle,
        );
        let mut png_bytes: Vec<u8> = Vec::new();
        scaled
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .map_err(|e| format!("PNG encoding failed: {}", e))?;

        active.machine = Some(SelectionMachine::new(fit));
        log::debug!(
            "[SELECT] Surface {}x{}, scale {:.4}, image {}x{} at ({},{})",
            surface_width,
            surface_height,
            fit.scale,
            fit.display_width,
            fit.display_height,
            fit.offset_x,
            fit.offset_y
        );

        Ok(OverlayFrame {
            image: format!("data:image/png;base64,{}", STANDARD.encode(&png_bytes)),
            offset_x: fit.offset_x,
            offset_y: fit.offset_y,
            width: fit.display_width,
            height: fit.display_height,
        })
    }

    fn pointer(&self, event: PointerEvent) -> Result<OverlayUpdate, String> {
        let mut slot = self.lock();

        let transition = match slot.as_mut() {
            None => return Ok(OverlayUpdate::Done),
            Some(active) => match active.machine.as_mut() {
                Some(machine) => machine.handle(event),
                // Escape before the frame arrived.
                None if event == PointerEvent::Cancel => Transition::Finished(None),
                None => Transition::Ignored,
            },
        };

        match transition {
            Transition::Ignored => Ok(OverlayUpdate::Ignored),
            Transition::Dragged(rect) => Ok(OverlayUpdate::Dragging { rect }),
            Transition::Finished(region) => {
                if let Some(active) = slot.take() {
                    let _ = active.reply.send(region);
                }
                Ok(OverlayUpdate::Done)
            }
        }
    }

    /// Resolves any running selection as canceled. No-op when idle.
    fn abandon(&self) {
        if let Some(active) = self.lock().take() {
            log::info!("[SELECT] Overlay closed without a selection");
            let _ = active.reply.send(None);
        }
    }
}

/// [`Selector`] backed by the overlay webview window.
pub struct OverlaySelector {
    app: AppHandle,
}

impl OverlaySelector {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Selector for OverlaySelector {
    async fn select(&self, bitmap: Bitmap) -> Option<Region> {
        let rx = {
            let state = self.app.state::<OverlayState>();
            match state.begin(bitmap) {
                Ok(rx) => rx,
                Err(e) => {
                    log::warn!("[SELECT] {}", e);
                    return None;
                }
            }
        };

        if let Err(e) = open_overlay_window(&self.app) {
            log::error!("[SELECT] Failed to open overlay: {}", e);
            self.app.state::<OverlayState>().abandon();
        }

        // A dropped sender means the state was torn down; treat as cancel.
        let region = rx.await.unwrap_or(None);
        close_overlay_window(&self.app);
        region
    }
}

fn open_overlay_window(app: &AppHandle) -> tauri::Result<()> {
    let window = WebviewWindowBuilder::new(
        app,
        OVERLAY_LABEL,
        WebviewUrl::App("overlay.html".into()),
    )
    .fullscreen(true)
    .decorations(false)
    .always_on_top(true)
    .skip_taskbar(true)
    .focused(true)
    .title("Select capture area")
    .build()?;

    let handle = app.clone();
    window.on_window_event(move |event| {
        if matches!(event, WindowEvent::Destroyed) {
            handle.state::<OverlayState>().abandon();
        }
    });

    log::info!("[SELECT] Overlay opened");
    Ok(())
}

fn close_overlay_window(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(OVERLAY_LABEL) {
        if let Err(e) = window.destroy() {
            log::warn!("[SELECT] Failed to close overlay: {}", e);
        }
    }
}

/// Tauri command: the overlay page has loaded and measured itself.
#[tauri::command]
pub async fn overlay_ready(
    state: tauri::State<'_, OverlayState>,
    width: u32,
    height: u32,
) -> Result<OverlayFrame, String> {
    let start = std::time::Instant::now();
    let frame = state.prepare(width, height)?;
    log::info!(
        "[SELECT] Frame prepared in {}ms ({} bytes)",
        start.elapsed().as_millis(),
        frame.image.len()
    );
    Ok(frame)
}

/// Tauri command: one pointer (or cancel) event from the overlay page.
#[tauri::command]
pub fn overlay_pointer(
    state: tauri::State<'_, OverlayState>,
    event: PointerEvent,
) -> Result<OverlayUpdate, String> {
    state.pointer(event)
}
