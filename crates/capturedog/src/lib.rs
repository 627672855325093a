//! Process-wide access to RenderDoc's in-application capture API.
//!
//! This crate wraps RenderDoc's *in-app API* (`renderdoc_app.h`) behind a single
//! [`CaptureSession`] per process. It supports:
//! - connecting to an injected RenderDoc (Windows/Linux) or loading the library,
//! - binding a requested API version and reporting the version RenderDoc actually serves,
//! - bit-level overlay control without client-side caching,
//! - triggering captures and notifying [`CaptureListener`]s from a polling heartbeat.
//!
//! ```no_run
//! use capturedog::{CaptureRecord, CaptureSession};
//!
//! let session = CaptureSession::builder()?
//!     .with_capture_listener(|capture: &CaptureRecord| println!("{}", capture.path().display()))
//!     .build()?;
//!
//! session.trigger_capture_and_notify();
//! // Later, once per frame:
//! session.update_listeners();
//! # Ok::<(), capturedog::CaptureError>(())
//! ```

mod builder;
mod config;
mod entry;
mod error;
mod handle;
mod listener;
mod loader;
mod overlay;
mod session;
mod settings;
mod version;

#[cfg(test)]
mod fake;

pub use builder::*;
pub use config::*;
pub use entry::NativeEntryTable;
pub use error::*;
pub use handle::*;
pub use listener::*;
pub use loader::*;
pub use overlay::*;
pub use session::{CaptureSession, DeferredTask};
pub use settings::*;
pub use version::*;

pub use capturedog_sys as sys;
