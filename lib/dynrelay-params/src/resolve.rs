use std::fmt;

use snafu::Snafu;
use tracing::{debug, trace, warn};

use crate::{ParamKey, ParamMap, ParamValue, RelayConfiguration};

/// A parameter resolution error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ResolveError {
    /// The top-level parameters value was not a mapping.
    #[snafu(display("Expected parameters to be a mapping, got '{}' instead.", actual_ty))]
    NotAMapping {
        /// Type of the value that was given instead.
        actual_ty: String,
    },
}

/// What was wrong with a skipped parameter entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiagnosticKind {
    /// The entry's key is not textual, so it cannot name a parameter.
    KeyNotText {
        /// Type of the key.
        ty: String,
    },

    /// The entry's value has a type the parameter does not accept.
    InvalidType {
        /// Type, or types, the parameter accepts.
        expected: &'static str,

        /// Type of the value that was given.
        actual: String,
    },

    /// The entry's value has the right type, but falls outside of the range the parameter accepts.
    OutOfRange {
        /// Value that was given.
        value: i64,

        /// Smallest accepted value.
        min: u64,

        /// Largest accepted value.
        max: u64,
    },
}

/// A diagnostic about a parameter entry that was skipped during resolution.
///
/// Skipped entries leave the corresponding configuration field at its default value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    /// Position of the entry within the parameter mapping, in iteration order.
    pub position: usize,

    /// Name of the parameter, if the key was textual.
    pub key: Option<String>,

    /// What was wrong with the entry.
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::KeyNotText { ty } => {
                write!(f, "Key at position {} is not a string (got '{}').", self.position, ty)
            }
            DiagnosticKind::InvalidType { expected, actual } => write!(
                f,
                "Value at position {} ('{}') is not the correct type: expected {}, got '{}'.",
                self.position,
                self.key.as_deref().unwrap_or_default(),
                expected,
                actual
            ),
            DiagnosticKind::OutOfRange { value, min, max } => write!(
                f,
                "Value at position {} ('{}') is out of range: {} is not within [{}, {}].",
                self.position,
                self.key.as_deref().unwrap_or_default(),
                value,
                min,
                max
            ),
        }
    }
}

/// The result of resolving a parameter mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// The resolved configuration.
    pub configuration: RelayConfiguration,

    /// Diagnostics for every entry that was skipped.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Copy)]
enum Parameter {
    PrintStats,
    CrashAndBurn,
    Total,
    WriteDuration,
    BufSize,
    SleepSeconds,
}

impl Parameter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "print_stats" => Some(Self::PrintStats),
            "crash_and_burn" => Some(Self::CrashAndBurn),
            "total" => Some(Self::Total),
            "write_duration" => Some(Self::WriteDuration),
            "bufsize" => Some(Self::BufSize),
            "sleep_seconds" => Some(Self::SleepSeconds),
            _ => None,
        }
    }
}

/// Coerces a flag value.
///
/// Booleans map directly, and integers are accepted with `1` meaning `true` and anything else meaning `false`.
fn coerce_flag(value: &ParamValue) -> Result<bool, DiagnosticKind> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        ParamValue::Integer(i) => Ok(*i == 1),
        other => Err(DiagnosticKind::InvalidType {
            expected: "bool or integer",
            actual: other.type_name().to_string(),
        }),
    }
}

fn coerce_unsigned(value: &ParamValue, min: u64, max: u64) -> Result<u64, DiagnosticKind> {
    match value {
        ParamValue::Integer(i) => match u64::try_from(*i) {
            Ok(n) if (min..=max).contains(&n) => Ok(n),
            _ => Err(DiagnosticKind::OutOfRange { value: *i, min, max }),
        },
        other => Err(DiagnosticKind::InvalidType {
            expected: "integer",
            actual: other.type_name().to_string(),
        }),
    }
}

/// Resolves a parameter mapping into a relay configuration.
///
/// Resolution is lenient: unknown keys are ignored, missing keys keep their default value, and entries with a
/// non-textual key or a value of the wrong type are skipped, producing a diagnostic. Diagnostics are also logged.
pub fn resolve_map(params: &ParamMap) -> Resolution {
    let mut configuration = RelayConfiguration::default();
    let mut diagnostics = Vec::new();

    for (position, (key, value)) in params.iter().enumerate() {
        let name = match key {
            ParamKey::Other { ty, .. } => Err(ty.clone()),
            key => key.as_text().ok_or_else(|| "bytes (not UTF-8)".to_string()),
        };
        let name = match name {
            Ok(name) => name,
            Err(ty) => {
                diagnostics.push(Diagnostic {
                    position,
                    key: None,
                    kind: DiagnosticKind::KeyNotText { ty },
                });
                continue;
            }
        };

        let parameter = match Parameter::from_name(name) {
            Some(parameter) => parameter,
            None => {
                trace!(key = name, "Ignoring unknown parameter.");
                continue;
            }
        };

        let outcome = match parameter {
            Parameter::PrintStats => coerce_flag(value).map(|b| configuration.print_stats = b),
            Parameter::CrashAndBurn => coerce_flag(value).map(|b| configuration.crash_and_burn = b),
            Parameter::BufSize => {
                coerce_unsigned(value, 1, u64::from(u32::MAX)).map(|n| configuration.buffer_size = n as usize)
            }
            Parameter::SleepSeconds => {
                coerce_unsigned(value, 0, u64::from(u32::MAX)).map(|n| configuration.sleep_seconds = n)
            }
            Parameter::Total | Parameter::WriteDuration => {
                debug!(key = name, "Parameter is reserved and has no effect.");
                Ok(())
            }
        };

        if let Err(kind) = outcome {
            diagnostics.push(Diagnostic {
                position,
                key: Some(name.to_string()),
                kind,
            });
        }
    }

    for diagnostic in &diagnostics {
        warn!(position = diagnostic.position, "Skipping parameter. {}", diagnostic);
    }

    Resolution {
        configuration,
        diagnostics,
    }
}

/// Resolves a loosely-typed parameters value into a relay configuration.
///
/// See [`resolve_map`] for how individual entries are handled.
///
/// # Errors
///
/// If `params` is not a mapping, an error is returned.
pub fn resolve(params: &ParamValue) -> Result<Resolution, ResolveError> {
    match params.as_mapping() {
        Some(map) => Ok(resolve_map(map)),
        None => NotAMapping {
            actual_ty: params.type_name(),
        }
        .fail(),
    }
}
