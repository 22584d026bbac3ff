// Adapters layer: concrete implementations for external systems (runtime files, processes, http, browser)

pub mod browser;
pub mod http;
pub mod launcher;
pub mod runtime_dir;

pub use browser::SystemBrowser;
pub use http::HttpProbe;
pub use launcher::{free_port, JupyterLauncher};
pub use runtime_dir::{runtime_dir, RuntimeDir};
