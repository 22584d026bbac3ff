use crate::domain::model::ServerInfo;
use crate::domain::ports::ServerRegistry;
use crate::utils::error::{NotebookError, Result};
use crate::utils::process::ProcessTable;
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use url::Url;

/// Jupyter 寫入的 `jpserver-<pid>.json` / `nbserver-<pid>.json`
#[derive(Debug, Deserialize)]
struct RuntimeRecord {
    pid: u32,
    port: u16,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    token: Option<String>,
    /// jupyter_server
    #[serde(default)]
    root_dir: Option<PathBuf>,
    /// classic notebook (< 7)
    #[serde(default)]
    notebook_dir: Option<PathBuf>,
    #[serde(default)]
    version: Option<String>,
}

pub fn runtime_dir() -> Option<PathBuf> {
    runtime_dir_with(|key| std::env::var_os(key))
}

/// 依 jupyter_core 的順序決定 runtime 目錄
pub fn runtime_dir_with<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(dir) = non_empty("JUPYTER_RUNTIME_DIR") {
        return Some(dir);
    }
    if let Some(dir) = non_empty("JUPYTER_DATA_DIR") {
        return Some(dir.join("runtime"));
    }

    let base = directories::BaseDirs::new()?;
    let data_dir = if cfg!(target_os = "macos") {
        base.home_dir().join("Library").join("Jupyter")
    } else {
        // Linux: $XDG_DATA_HOME 或 ~/.local/share；Windows: %APPDATA%
        base.data_dir().join("jupyter")
    };
    Some(data_dir.join("runtime"))
}

pub fn parse_runtime_file(path: &Path, content: &str) -> Result<ServerInfo> {
    let record: RuntimeRecord =
        serde_json::from_str(content).map_err(|e| NotebookError::RuntimeFileError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let root = record
        .root_dir
        .or(record.notebook_dir)
        .ok_or_else(|| NotebookError::RuntimeFileError {
            path: path.to_path_buf(),
            message: "missing root_dir/notebook_dir".to_string(),
        })?;
    let root_dir = root.canonicalize().unwrap_or(root);

    let raw_url = match record.url.filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => {
            let scheme = if record.secure { "https" } else { "http" };
            let host = record
                .hostname
                .filter(|h| !h.is_empty() && h != "0.0.0.0")
                .unwrap_or_else(|| "localhost".to_string());
            let base_url = record.base_url.unwrap_or_else(|| "/".to_string());
            format!(
                "{}://{}:{}/{}",
                scheme,
                host,
                record.port,
                base_url.trim_start_matches('/')
            )
        }
    };

    let mut url = Url::parse(&raw_url).map_err(|e| NotebookError::RuntimeFileError {
        path: path.to_path_buf(),
        message: format!("invalid url '{}': {}", raw_url, e),
    })?;
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }

    Ok(ServerInfo {
        pid: record.pid,
        port: record.port,
        url,
        root_dir,
        token: record.token.filter(|t| !t.is_empty()),
        version: record.version,
        runtime_file: Some(path.to_path_buf()),
    })
}

/// 以 runtime 目錄作為 `ServerRegistry`
pub struct RuntimeDir {
    dir: PathBuf,
    pattern: Regex,
    processes: Mutex<ProcessTable>,
}

impl RuntimeDir {
    pub fn new(dir: PathBuf) -> Result<Self> {
        Ok(Self {
            dir,
            pattern: Regex::new(r"^(?:jp|nb)server-\d+\.json$")?,
            processes: Mutex::new(ProcessTable::new()),
        })
    }

    pub fn discover() -> Result<Self> {
        let dir = runtime_dir().ok_or_else(|| NotebookError::ConfigError {
            message: "cannot determine the Jupyter runtime directory".to_string(),
        })?;
        Self::new(dir)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn runtime_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            tracing::debug!("Runtime directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if self.pattern.is_match(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

impl ServerRegistry for RuntimeDir {
    fn running_servers(&self) -> Result<Vec<ServerInfo>> {
        let mut processes = self
            .processes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut servers = Vec::new();

        for file in self.runtime_files()? {
            // 已結束的 server 常留下寫到一半或過期的檔案
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping unreadable runtime file {}: {}", file.display(), e);
                    continue;
                }
            };
            let server = match parse_runtime_file(&file, &content) {
                Ok(server) => server,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}", e);
                    continue;
                }
            };

            if !processes.is_alive(server.pid) {
                tracing::debug!("Ignoring stale runtime file {} (pid {} not running)", file.display(), server.pid);
                continue;
            }
            servers.push(server);
        }

        servers.sort_by_key(|s| s.pid);
        tracing::debug!("Found {} running server(s) in {}", servers.len(), self.dir.display());
        Ok(servers)
    }
}
