//! Command handlers for the `coin` binary

pub mod commands;

pub use commands::{
    cmd_address, cmd_config, cmd_decode, cmd_keygen, cmd_pack, load_unspent, CliResult,
};
