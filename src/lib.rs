pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpProbe, JupyterLauncher, RuntimeDir, SystemBrowser};
pub use config::{settings::Settings, CliConfig};
pub use core::opener::{NotebookOpener, OpenOutcome, ServerSource};
pub use utils::error::{NotebookError, Result};
