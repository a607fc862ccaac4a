// Library surface for the experiment binary, the analysis binary and headless tests.
// Terminal rendering of the experiment itself stays in main.rs.
pub mod analysis;
pub mod app_dirs;
pub mod charting;
pub mod combo;
pub mod config;
pub mod error;
pub mod input;
pub mod keys;
pub mod logging;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod sink;
pub mod util;
