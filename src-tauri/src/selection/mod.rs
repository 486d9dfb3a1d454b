//! Region selection, the interactive core.
//!
//! A frozen frame is shown scaled-to-fit on a fullscreen surface and the
//! user drags a rectangle over it. The geometry lives in [`fit`], the
//! interaction in [`machine`]; the surface that feeds pointer events in is
//! provided by whoever implements [`Selector`].

mod fit;
mod machine;

pub use fit::{DisplayRect, ScaleFit};
pub use machine::{PointerEvent, SelectionMachine, SelectionState, Transition, MIN_SELECTION_PX};

use crate::capture::{Bitmap, Region};
use std::future::Future;

/// Runs a modal selection over a frozen frame.
///
/// Resolves to the chosen region in source pixels, or `None` when the user
/// cancels or the drag is too small. The frame is consumed and dropped once
/// the surface closes.
pub trait Selector: Send + Sync {
    fn select(&self, bitmap: Bitmap) -> impl Future<Output = Option<Region>> + Send;
}
