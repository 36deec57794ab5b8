//! In-memory state for the board. Nothing here touches disk: every store is
//! constructed empty at startup and lost on restart.

pub mod canvas;
pub mod clients;
pub mod log;

use std::sync::{Mutex, MutexGuard};

pub use canvas::{Canvas, CanvasError};
pub use clients::{ClientTracker, PostDecision};
pub use log::BoundedLog;

/// Lock a store mutex, recovering from poisoning. Every critical section in
/// this crate leaves its state consistent, so a panic elsewhere never makes
/// the data unusable.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
