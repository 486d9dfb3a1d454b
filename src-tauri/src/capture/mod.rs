//! Screen capture domain: public API.
//!
//! This module owns grabbing the virtual desktop and cropping frames to a
//! stored region. External code should only use the items exported here.

mod region;
mod screenshot;

pub use region::{apply_region, crop, CropError, Region};
pub use screenshot::{compose_virtual_desktop, GrabError, MonitorTile, ScreenGrabber, XcapGrabber};

/// A frozen desktop frame: row-major RGB, no alpha.
///
/// Produced by a [`ScreenGrabber`], shown by the region selector and
/// persisted by the file store. Nothing holds on to it past the call that
/// consumes it.
pub type Bitmap = image::RgbImage;
