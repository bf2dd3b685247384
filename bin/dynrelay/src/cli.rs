use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::params::{parse_override, ParamOverride};

/// How the relay is driven.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Mode {
    /// The relay pulls every input itself, in a single run.
    #[default]
    Batch,

    /// Inputs are read by the harness and pushed to the relay chunk by chunk.
    Streamed,
}

#[derive(Clone, Debug, Parser)]
#[command(about)]
pub struct Cli {
    /// Path to a YAML or JSON document holding the relay parameters.
    ///
    /// Files ending in `.json` are parsed as JSON, and anything else as YAML.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Overrides a single relay parameter, such as `bufsize=4096` or `print_stats=true`.
    ///
    /// The value is parsed as a YAML scalar. May be repeated, with later overrides winning.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<ParamOverride>,

    /// Input to relay from, where `-` means standard input.
    ///
    /// May be repeated. Inputs are drained in the order given.
    #[arg(long = "input", value_name = "PATH")]
    pub inputs: Vec<String>,

    /// Output to relay to, where `-` means standard output.
    ///
    /// May be repeated. Every output receives everything relayed.
    #[arg(long = "output", value_name = "PATH")]
    pub outputs: Vec<String>,

    /// How the relay is driven.
    #[arg(long, value_enum, default_value_t = Mode::Batch)]
    pub mode: Mode,

    /// Size of the chunks pushed to the relay in streamed mode, in bytes.
    #[arg(long, default_value_t = 65536, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: u32,
}
