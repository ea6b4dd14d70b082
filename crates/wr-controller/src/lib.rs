//! Mini app view controller.
//!
//! Owns the confirm sequence: bind the host's main button while a wallet is
//! connected, sign an attestation on tap, relay the payload through the host
//! data channel, then close the view. Rendering lives in the browser crate.

pub mod config;
pub mod controller;
pub mod runtime;

pub use config::{Captions, ControllerConfig};
pub use controller::{ConfirmOutcome, Controller};
pub use runtime::{LocalTask, Runtime};
