//! Capture choreography: hide the panel, wait, grab, crop, save, show.
//!
//! Every step's failure ends up in [`CaptureFailure`]; the panel is shown
//! again on every exit path.

use crate::capture::{self, Bitmap, GrabError, ScreenGrabber};
use crate::logging::log_error;
use crate::selection::Selector;
use crate::session::Session;
use crate::storage::{self, StorageError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// The control surface as the orchestrator sees it.
pub trait Surface: Send + Sync {
    fn hide(&self) -> Result<(), String>;
    fn show(&self) -> Result<(), String>;
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureFailure {
    #[error("Panel could not be hidden: {0}")]
    Surface(String),

    #[error(transparent)]
    Grab(#[from] GrabError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Another capture or selection is already running")]
    Busy,
}

/// `Ok(path)` of the written PNG, or why nothing was written.
pub type CaptureResult = Result<PathBuf, CaptureFailure>;

pub struct CaptureOrchestrator<G, S> {
    grabber: G,
    surface: S,
    delay: Duration,
    busy: AtomicBool,
}

/// Clears the busy flag on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<G: ScreenGrabber, S: Surface> CaptureOrchestrator<G, S> {
    pub fn new(grabber: G, surface: S, delay: Duration) -> Self {
        Self {
            grabber,
            surface,
            delay,
            busy: AtomicBool::new(false),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn begin(&self) -> Result<BusyGuard<'_>, CaptureFailure> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| CaptureFailure::Busy)
    }

    /// Captures the desktop (or the session's region of it) to a new PNG.
    pub async fn capture(&self, session: &Session) -> CaptureResult {
        let result = match self.begin() {
            Ok(_guard) => {
                let result = self.capture_steps(session).await;
                self.restore("capture");
                result
            }
            Err(busy) => Err(busy),
        };

        match &result {
            Ok(path) => log::info!("Saved screenshot: {}", path.display()),
            Err(e) => log_error("capture", e),
        }
        result
    }

    async fn capture_steps(&self, session: &Session) -> CaptureResult {
        self.hide_and_settle().await?;

        let full = self.grabber.grab_virtual_desktop()?;
        log::info!("[CAPTURE] Grabbed desktop {}x{}", full.width(), full.height());

        let config = session.snapshot();
        let frame = match &config.region {
            None => full,
            Some(region) => match capture::apply_region(&full, region) {
                Ok(cropped) => cropped,
                Err(e) => {
                    log::warn!("[CAPTURE] Region {:?} not applied ({}); saving full frame", region, e);
                    full
                }
            },
        };

        Ok(storage::save_screenshot(&frame, config.base_folder.as_deref())?)
    }

    /// Lets the user pick a new capture region over a frozen frame.
    ///
    /// `Ok(None)` means the selection was canceled or too small; the session
    /// keeps its previous region in that case.
    pub async fn select_region<Sel: Selector>(
        &self,
        session: &Session,
        selector: &Sel,
    ) -> Result<Option<capture::Region>, CaptureFailure> {
        let result = match self.begin() {
            Ok(_guard) => {
                let result = self.select_steps(session, selector).await;
                self.restore("select_region");
                result
            }
            Err(busy) => Err(busy),
        };

        match &result {
            Ok(Some(r)) => log::info!(
                "Grid updated to: rect ({},{})-({},{})",
                r.left, r.top, r.right, r.bottom
            ),
            Ok(None) => log::info!("Grid not changed (no selection)"),
            Err(e) => log_error("select_region", e),
        }
        result
    }

    async fn select_steps<Sel: Selector>(
        &self,
        session: &Session,
        selector: &Sel,
    ) -> Result<Option<capture::Region>, CaptureFailure> {
        self.hide_and_settle().await?;

        let frozen: Bitmap = self.grabber.grab_virtual_desktop()?;
        let selected = selector.select(frozen).await;

        if let Some(region) = selected {
            session.set_region(Some(region));
        }
        Ok(selected)
    }

    async fn hide_and_settle(&self) -> Result<(), CaptureFailure> {
        self.surface.hide().map_err(CaptureFailure::Surface)?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }

    fn restore(&self, context: &str) {
        if let Err(e) = self.surface.show() {
            log::warn!("[{}] Panel could not be shown again: {}", context, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Region;
    use crate::session::SessionConfig;
    use image::Rgb;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSurface {
        calls: Mutex<Vec<&'static str>>,
        fail_hide: bool,
    }

    impl FakeSurface {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Surface for FakeSurface {
        fn hide(&self) -> Result<(), String> {
            self.calls.lock().unwrap().push("hide");
            if self.fail_hide {
                Err("window gone".into())
            } else {
                Ok(())
            }
        }

        fn show(&self) -> Result<(), String> {
            self.calls.lock().unwrap().push("show");
            Ok(())
        }
    }

    struct FixedGrabber(Option<(u32, u32)>);

    impl ScreenGrabber for FixedGrabber {
        fn grab_virtual_desktop(&self) -> Result<Bitmap, GrabError> {
            match self.0 {
                Some((w, h)) => Ok(Bitmap::from_pixel(w, h, Rgb([1, 2, 3]))),
                None => Err(GrabError::NoMonitors),
            }
        }
    }

    struct FixedSelector(Option<Region>);

    impl Selector for FixedSelector {
        async fn select(&self, _bitmap: Bitmap) -> Option<Region> {
            self.0
        }
    }

    fn orchestrator(size: Option<(u32, u32)>) -> CaptureOrchestrator<FixedGrabber, FakeSurface> {
        CaptureOrchestrator::new(FixedGrabber(size), FakeSurface::default(), Duration::ZERO)
    }

    fn session_in(tmp: &TempDir, region: Option<Region>) -> Session {
        Session::new(SessionConfig {
            base_folder: Some(tmp.path().to_path_buf()),
            region,
        })
    }

    #[tokio::test]
    async fn capture_hides_then_shows_and_saves() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((40, 30)));

        let path = orch.capture(&session_in(&tmp, None)).await.unwrap();

        assert!(path.starts_with(tmp.path()));
        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (40, 30));
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
        assert!(orch.begin().is_ok(), "busy flag released after capture");
    }

    #[tokio::test]
    async fn capture_applies_session_region() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((200, 200)));
        let session = session_in(&tmp, Some(Region::new(190, 190, 250, 250)));

        let path = orch.capture(&session).await.unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (10, 10));
    }

    #[tokio::test]
    async fn capture_ignores_region_outside_frame() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((50, 50)));
        let session = session_in(&tmp, Some(Region::new(100, 100, 200, 200)));

        let path = orch.capture(&session).await.unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (50, 50));
    }

    #[tokio::test]
    async fn grab_failure_still_restores_panel() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(None);

        let result = orch.capture(&session_in(&tmp, None)).await;
        assert!(matches!(result, Err(CaptureFailure::Grab(GrabError::NoMonitors))));
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
    }

    #[tokio::test]
    async fn hide_failure_is_reported_and_panel_shown() {
        let tmp = TempDir::new().unwrap();
        let orch = CaptureOrchestrator::new(
            FixedGrabber(Some((4, 4))),
            FakeSurface {
                fail_hide: true,
                ..Default::default()
            },
            Duration::ZERO,
        );

        let result = orch.capture(&session_in(&tmp, None)).await;
        assert!(matches!(result, Err(CaptureFailure::Surface(_))));
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
    }

    #[tokio::test]
    async fn capture_while_busy_is_rejected_without_touching_panel() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((4, 4)));
        let _held = orch.begin().unwrap();

        let result = orch.capture(&session_in(&tmp, None)).await;
        assert!(matches!(result, Err(CaptureFailure::Busy)));
        assert!(orch.surface().calls().is_empty());
    }

    #[tokio::test]
    async fn selection_replaces_region() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((100, 100)));
        let session = session_in(&tmp, Some(Region::new(0, 0, 10, 10)));
        let chosen = Region::new(5, 5, 50, 60);

        let result = orch.select_region(&session, &FixedSelector(Some(chosen))).await;
        assert_eq!(result.unwrap(), Some(chosen));
        assert_eq!(session.snapshot().region, Some(chosen));
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
    }

    #[tokio::test]
    async fn canceled_selection_keeps_region() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(Some((100, 100)));
        let previous = Region::new(0, 0, 10, 10);
        let session = session_in(&tmp, Some(previous));

        let result = orch.select_region(&session, &FixedSelector(None)).await;
        assert_eq!(result.unwrap(), None);
        assert_eq!(session.snapshot().region, Some(previous));
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
    }

    #[tokio::test]
    async fn selection_grab_failure_restores_panel() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(None);
        let session = session_in(&tmp, None);

        let result = orch.select_region(&session, &FixedSelector(Some(Region::new(0, 0, 9, 9)))).await;
        assert!(matches!(result, Err(CaptureFailure::Grab(_))));
        assert_eq!(session.snapshot().region, None);
        assert_eq!(orch.surface().calls(), vec!["hide", "show"]);
    }
}
