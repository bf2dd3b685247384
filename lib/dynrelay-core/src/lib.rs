//! A pluggable relay component.
//!
//! A relay is configured from loosely-typed parameters, and then moves bytes from the input endpoints wired to it by
//! its host to every output endpoint, either as chunks are pushed to it or by pulling from its inputs directly, while
//! measuring how long reads and writes take.
#![deny(warnings)]
#![deny(missing_docs)]

mod component;
pub use self::component::{Phase, RelayComponent};

mod engine;

mod errors;
pub use self::errors::RelayError;

pub mod fault;
pub mod host;
pub mod io;

mod state;
pub use self::state::RelayState;

pub mod stats;
pub mod timing;

#[cfg(test)]
mod test_util;

pub use dynrelay_params::{ParamKey, ParamMap, ParamValue, RelayConfiguration};
