#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod cmd;
pub mod config;
#[cfg(feature = "direction-finding")]
pub mod cte;
pub mod dtm;
pub mod pdu;
pub mod radio;
pub mod soc;
pub mod timing;
pub mod uart;
pub mod vendor;

#[cfg(test)]
mod fake;

pub use cmd::{Command, Event};
pub use config::Config;
pub use dtm::{Dtm, Error, State};
pub use soc::Hardware;
pub use vendor::{Diagnostics, NoDiagnostics};
