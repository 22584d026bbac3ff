use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// 一個正在執行的 notebook server（由 runtime file 解析而來）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub pid: u32,
    pub port: u16,
    /// 一律以 `/` 結尾，已包含 base_url
    pub url: Url,
    pub root_dir: PathBuf,
    pub token: Option<String>,
    pub version: Option<String>,
    pub runtime_file: Option<PathBuf>,
}

impl ServerInfo {
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 已 canonicalize 的絕對路徑
    pub path: PathBuf,
    pub kind: TargetKind,
}

impl Target {
    pub fn is_dir(&self) -> bool {
        self.kind == TargetKind::Directory
    }

    /// 目錄本身，或檔案所在的目錄
    pub fn directory(&self) -> &Path {
        match self.kind {
            TargetKind::Directory => &self.path,
            TargetKind::File => self.path.parent().unwrap_or(&self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Notebook,
    Lab,
}

impl Interface {
    pub fn default_server_command(&self) -> Vec<String> {
        let sub = match self {
            Interface::Notebook => "notebook",
            Interface::Lab => "lab",
        };
        vec!["jupyter".to_string(), sub.to_string()]
    }

    pub fn dir_prefix(&self) -> &'static str {
        match self {
            Interface::Notebook => "tree",
            Interface::Lab => "lab/tree",
        }
    }

    pub fn file_prefix(&self, path: &Path) -> &'static str {
        match self {
            Interface::Lab => "lab/tree",
            Interface::Notebook => {
                let is_notebook = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ipynb"));
                if is_notebook {
                    "notebooks"
                } else {
                    "edit"
                }
            }
        }
    }
}

/// 啟動新 server 所需的資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub command: Vec<String>,
    pub host: String,
    pub port: u16,
    pub root: PathBuf,
}

impl LaunchRequest {
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push("--no-browser".to_string());
        args.push(format!("--ip={}", self.host));
        args.push(format!("--port={}", self.port));
        args.push("--port-retries=0".to_string());
        args.push(format!("--notebook-dir={}", self.root.display()));
        args
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.command.first().cloned().unwrap_or_default()];
        parts.extend(self.args());
        parts.join(" ")
    }

    /// 新 server 預期的 URL（尚未知道 token）
    pub fn expected_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
    }
}
