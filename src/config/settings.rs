use crate::config::file::FileConfig;
use crate::config::CliConfig;
use crate::domain::model::Interface;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{NotebookError, Result};
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 命令列 > 設定檔 > 預設值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub paths: Vec<PathBuf>,
    pub root: Option<PathBuf>,
    pub host: String,
    pub port: Option<u16>,
    pub interface: Interface,
    pub dir_prefix: Option<String>,
    pub file_prefix: Option<String>,
    pub server_command: Option<Vec<String>>,
    pub startup_timeout: Duration,
    pub browser: Option<String>,
    pub server_url: Option<Url>,
    pub token: Option<String>,
    pub home_dir: Option<PathBuf>,
    pub new_server: bool,
    pub no_start: bool,
    pub dry_run: bool,
    pub print_url: bool,
    pub list: bool,
    pub config_file: Option<PathBuf>,
}

impl Settings {
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

        let file = if cli.no_config {
            None
        } else if let Some(path) = &cli.config {
            Some((path.clone(), FileConfig::from_file(path)?))
        } else {
            FileConfig::discover(&cwd)?
        };

        Self::merge(cli, file, &cwd, home)
    }

    pub fn merge(
        cli: &CliConfig,
        file: Option<(PathBuf, FileConfig)>,
        cwd: &Path,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        let (config_file, file_config) = match file {
            Some((path, config)) => {
                config.validate()?;
                (Some(path), config)
            }
            None => (None, FileConfig::default()),
        };

        let file_root = config_file.as_ref().and_then(|path| {
            let base_dir = path.parent().unwrap_or(cwd);
            file_config.resolved_root(base_dir, home.as_deref())
        });
        let root = cli.root.as_ref().map(|r| cwd.join(r)).or(file_root);

        let paths = if cli.paths.is_empty() {
            vec![cwd.to_path_buf()]
        } else {
            cli.paths.iter().map(|p| cwd.join(p)).collect()
        };

        let server_command = match &cli.server_command {
            Some(command) => Some(command.split_whitespace().map(str::to_string).collect()),
            None => file_config.server_command,
        };

        let server_url = match &cli.url {
            Some(raw) => Some(validation::validate_server_url("url", raw)?),
            None => None,
        };

        Ok(Self {
            paths,
            root,
            host: cli
                .host
                .clone()
                .or(file_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_config.port),
            interface: cli.interface.or(file_config.interface).unwrap_or_default(),
            dir_prefix: cli.dir_prefix.clone().or(file_config.dir_prefix),
            file_prefix: cli.file_prefix.clone().or(file_config.file_prefix),
            server_command,
            startup_timeout: Duration::from_secs(
                cli.timeout.or(file_config.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            browser: cli.browser.clone().or(file_config.browser),
            server_url,
            token: cli.token.clone(),
            home_dir: home,
            new_server: cli.new_server,
            no_start: cli.no_start,
            dry_run: cli.dry_run,
            print_url: cli.print_url,
            list: cli.list,
            config_file,
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_host("host", &self.host)?;
        if let Some(port) = self.port {
            validation::validate_within("port", port, 1..=u16::MAX)?;
        }
        validation::validate_within("timeout", self.startup_timeout.as_secs(), 1..=3600)?;
        if let Some(prefix) = &self.dir_prefix {
            validation::validate_url_prefix("dir_prefix", prefix)?;
        }
        if let Some(prefix) = &self.file_prefix {
            validation::validate_url_prefix("file_prefix", prefix)?;
        }
        if let Some(root) = &self.root {
            validation::validate_path("root", &root.to_string_lossy())?;
        }
        if self.server_command.as_ref().is_some_and(|c| c.is_empty()) {
            return Err(NotebookError::InvalidConfigValueError {
                field: "server_command".to_string(),
                value: String::new(),
                reason: "Command cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn interface(&self) -> Interface {
        self.interface
    }

    fn dir_prefix(&self) -> Option<&str> {
        self.dir_prefix.as_deref()
    }

    fn file_prefix(&self) -> Option<&str> {
        self.file_prefix.as_deref()
    }

    fn server_command(&self) -> Vec<String> {
        self.server_command
            .clone()
            .unwrap_or_else(|| self.interface.default_server_command())
    }

    fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    fn server_url(&self) -> Option<&Url> {
        self.server_url.as_ref()
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn new_server(&self) -> bool {
        self.new_server
    }

    fn no_start(&self) -> bool {
        self.no_start
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn print_only(&self) -> bool {
        self.print_url
    }
}
