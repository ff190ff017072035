pub mod badge;
pub mod client;
pub mod cmd;
pub mod commit;
pub mod config;
pub mod dashboard;
pub mod git;
pub mod input;
pub mod participant;
pub mod poll;
pub mod render;
pub mod stats;

use env_logger::WriteStyle;
use log::LevelFilter;

/// Logger used by the binaries. Defaults to info level which can
/// be overridden with `RUST_LOG`
pub fn init_logger() {
    env_logger::builder()
        .write_style(WriteStyle::Auto)
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .ok();
}
