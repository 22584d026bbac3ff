use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("Path {} is outside the server root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("No notebook server found: {reason}")]
    NoServer { reason: String },

    #[error("Failed to launch `{command}`: {source}")]
    LaunchError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Port {port} is already used by notebook server pid {pid}")]
    PortInUse { port: u16, pid: u32 },

    #[error("Notebook server on port {port} exited before it was ready ({status})")]
    ServerExited { port: u16, status: String },

    #[error("Notebook server on port {port} was not ready after {seconds}s")]
    StartupTimeout { port: u16, seconds: u64 },

    #[error("Failed to open browser: {message}")]
    BrowserError { message: String },

    #[error("Invalid runtime file {}: {message}", path.display())]
    RuntimeFileError { path: PathBuf, message: String },

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 使用者輸入或設定檔問題
    Input,
    /// 找不到、無法啟動或無回應的 notebook server
    Server,
    Browser,
    System,
}

impl NotebookError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PathNotFound { .. }
            | Self::OutsideRoot { .. }
            | Self::UrlError(_)
            | Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Input,
            Self::NoServer { .. }
            | Self::LaunchError { .. }
            | Self::PortInUse { .. }
            | Self::ServerExited { .. }
            | Self::StartupTimeout { .. }
            | Self::ApiError(_) => ErrorCategory::Server,
            Self::BrowserError { .. } => ErrorCategory::Browser,
            Self::RuntimeFileError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::PatternError(_) => ErrorCategory::System,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input => 1,
            ErrorCategory::Server => 2,
            ErrorCategory::Browser => 3,
            ErrorCategory::System => 4,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PathNotFound { path } => format!("File not found: {}", path.display()),
            Self::OutsideRoot { path, root } => format!(
                "{} cannot be served from {}",
                path.display(),
                root.display()
            ),
            Self::NoServer { .. } => {
                "No server found and none could be started".to_string()
            }
            Self::LaunchError { command, .. } => {
                format!("Could not start the notebook server (`{}`)", command)
            }
            Self::ServerExited { .. } | Self::StartupTimeout { .. } => {
                "The notebook server did not start".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::PathNotFound { .. } => "Check the path and try again",
            Self::OutsideRoot { .. } => {
                "Pass --root with a directory containing the file, or use --new-server"
            }
            Self::NoServer { .. } => {
                "Start a server with `jupyter notebook`, or drop --no-start"
            }
            Self::LaunchError { .. } => {
                "Make sure jupyter is installed and on PATH, or set --server-command"
            }
            Self::PortInUse { .. } => "Pick another --port, or leave it unset to get a free one",
            Self::ServerExited { .. } => "Run the server command by hand to see its output",
            Self::StartupTimeout { .. } => "Increase --timeout or check the server logs",
            Self::BrowserError { .. } => "Set --browser (or BROWSER), or use --print-url",
            Self::RuntimeFileError { .. } => "Remove stale files from the Jupyter runtime directory",
            Self::ApiError(_) => "Check that the server URL is reachable",
            Self::TomlError(_) | Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix .open-notebook.toml, or run with --no-config"
            }
            Self::UrlError(_) => "Pass a full URL such as http://localhost:8888/",
            Self::IoError(_) | Self::SerializationError(_) | Self::PatternError(_) => {
                "Re-run with --verbose for details"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, NotebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_category() {
        let missing = NotebookError::PathNotFound {
            path: PathBuf::from("nope.ipynb"),
        };
        assert_eq!(missing.category(), ErrorCategory::Input);
        assert_eq!(missing.exit_code(), 1);

        let timeout = NotebookError::StartupTimeout {
            port: 8888,
            seconds: 30,
        };
        assert_eq!(timeout.exit_code(), 2);

        let browser = NotebookError::BrowserError {
            message: "no display".to_string(),
        };
        assert_eq!(browser.exit_code(), 3);
    }

    #[test]
    fn test_no_server_message() {
        let err = NotebookError::NoServer {
            reason: "--no-start was given".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "No server found and none could be started"
        );
        assert!(err.to_string().contains("--no-start"));
    }
}
