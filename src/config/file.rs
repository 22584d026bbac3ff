use crate::domain::model::Interface;
use crate::utils::error::{NotebookError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".open-notebook.toml";
pub const PYPROJECT_FILE_NAME: &str = "pyproject.toml";
const PYPROJECT_TABLE: &str = "open-notebook";

#[derive(Debug, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Option<ToolTable>,
}

#[derive(Debug, Deserialize)]
struct ToolTable {
    #[serde(rename = "open-notebook", default)]
    open_notebook: Option<FileConfig>,
}

/// `.open-notebook.toml` 或 `pyproject.toml` 的 `[tool.open-notebook]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub root: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub interface: Option<Interface>,
    #[serde(alias = "dir-prefix")]
    pub dir_prefix: Option<String>,
    #[serde(alias = "file-prefix")]
    pub file_prefix: Option<String>,
    #[serde(alias = "server-command")]
    pub server_command: Option<Vec<String>>,
    pub timeout: Option<u64>,
    pub browser: Option<String>,
}

impl FileConfig {
    /// 從檔案載入；`pyproject.toml` 必須含有 `[tool.open-notebook]`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        if path.file_name().is_some_and(|name| name == PYPROJECT_FILE_NAME) {
            return Self::from_pyproject_str(&content)?.ok_or_else(|| NotebookError::ConfigError {
                message: format!("{} has no [tool.{}] table", path.display(), PYPROJECT_TABLE),
            });
        }
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    pub fn from_pyproject_str(content: &str) -> Result<Option<Self>> {
        let processed_content = Self::substitute_env_vars(content)?;
        let pyproject: PyProject = toml::from_str(&processed_content)?;
        Ok(pyproject.tool.and_then(|tool| tool.open_notebook))
    }

    /// 替換環境變數 (例如 ${HOME})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 由 `start` 往上層找第一個設定檔
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("Using config file {}", candidate.display());
                let config = Self::from_file(&candidate)?;
                return Ok(Some((candidate, config)));
            }

            let pyproject = dir.join(PYPROJECT_FILE_NAME);
            if pyproject.is_file() {
                let content = std::fs::read_to_string(&pyproject)?;
                if let Some(config) = Self::from_pyproject_str(&content)? {
                    tracing::debug!("Using [tool.{}] from {}", PYPROJECT_TABLE, pyproject.display());
                    return Ok(Some((pyproject, config)));
                }
            }
        }
        Ok(None)
    }

    /// `~` 展開為家目錄，相對路徑以設定檔所在目錄為基準
    pub fn resolved_root(&self, base_dir: &Path, home: Option<&Path>) -> Option<PathBuf> {
        let root = self.root.as_deref()?;

        let expanded = match (root.strip_prefix('~'), home) {
            (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
            _ => PathBuf::from(root),
        };

        if expanded.is_absolute() {
            Some(expanded)
        } else {
            Some(base_dir.join(expanded))
        }
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(root) = &self.root {
            validation::validate_path("root", root)?;
        }
        if let Some(host) = &self.host {
            validation::validate_host("host", host)?;
        }
        if let Some(port) = self.port {
            validation::validate_within("port", port, 1..=u16::MAX)?;
        }
        if let Some(timeout) = self.timeout {
            validation::validate_within("timeout", timeout, 1..=3600)?;
        }
        if let Some(prefix) = &self.dir_prefix {
            validation::validate_url_prefix("dir_prefix", prefix)?;
        }
        if let Some(prefix) = &self.file_prefix {
            validation::validate_url_prefix("file_prefix", prefix)?;
        }
        if let Some(command) = &self.server_command {
            if command.is_empty() {
                return Err(NotebookError::InvalidConfigValueError {
                    field: "server_command".to_string(),
                    value: "[]".to_string(),
                    reason: "Command cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
