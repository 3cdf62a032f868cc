//! Virtual driver implementations.

mod audio;
mod output;

pub use audio::VirtualAudioEngine;
pub use output::VirtualOutputDriver;

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
