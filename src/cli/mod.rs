//! Command-line entry points

pub mod commands;

pub use commands::{
    cmd_serve, cmd_show_config, devnet_dispatcher, init_logging, load_config, logger_builder,
    CliResult,
};
