//! Loosely-typed relay parameters, and their resolution into a typed relay configuration.
#![deny(warnings)]
#![deny(missing_docs)]

mod config;
pub use self::config::{RelayConfiguration, DEFAULT_BUFFER_SIZE};

mod resolve;
pub use self::resolve::{resolve, resolve_map, Diagnostic, DiagnosticKind, Resolution, ResolveError};

mod value;
pub use self::value::{ParamKey, ParamMap, ParamValue};
