use crate::adapters::launcher::free_port;
use crate::core::discovery::select_server;
use crate::core::resolver::{default_root, relative_to_root, resolve_targets, url_for, UrlPrefixes};
use crate::domain::model::{LaunchRequest, ServerInfo, Target};
use crate::domain::ports::{Browser, ConfigProvider, ServerLauncher, ServerProbe, ServerRegistry};
use crate::utils::error::{NotebookError, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// server 的來源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSource {
    /// `--url` 指定
    Explicit,
    Running,
    Started,
    /// dry run：只列出會執行的啟動指令
    Planned(LaunchRequest),
}

#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub server: ServerInfo,
    pub source: ServerSource,
    pub urls: Vec<Url>,
    pub opened: bool,
}

pub struct NotebookOpener<R, P, L, B>
where
    R: ServerRegistry,
    P: ServerProbe,
    L: ServerLauncher,
    B: Browser,
{
    registry: R,
    probe: P,
    launcher: L,
    browser: B,
}

impl<R, P, L, B> NotebookOpener<R, P, L, B>
where
    R: ServerRegistry,
    P: ServerProbe,
    L: ServerLauncher,
    B: Browser,
{
    pub fn new(registry: R, probe: P, launcher: L, browser: B) -> Self {
        Self {
            registry,
            probe,
            launcher,
            browser,
        }
    }

    pub async fn run<C: ConfigProvider>(&self, config: &C) -> Result<OpenOutcome> {
        // 先確認檔案存在，再做任何 server 相關的事
        let targets = resolve_targets(config.paths())?;
        tracing::debug!("Resolved {} target(s)", targets.len());

        let (server, source) = self.locate_or_start(config, &targets).await?;

        let prefixes = UrlPrefixes {
            interface: config.interface(),
            dir_prefix: config.dir_prefix(),
            file_prefix: config.file_prefix(),
        };
        let urls = targets
            .iter()
            .map(|target| url_for(&server, target, &prefixes))
            .collect::<Result<Vec<_>>>()?;

        let opened = !config.dry_run() && !config.print_only();
        if opened {
            for url in &urls {
                tracing::info!("🌐 Opening {}", url);
                self.browser.open(url)?;
            }
        }

        Ok(OpenOutcome {
            server,
            source,
            urls,
            opened,
        })
    }

    async fn locate_or_start<C: ConfigProvider>(
        &self,
        config: &C,
        targets: &[Target],
    ) -> Result<(ServerInfo, ServerSource)> {
        let root = config.root().map(canonical_root).transpose()?;

        if let Some(url) = config.server_url() {
            let root_dir = match root.or_else(|| config.home_dir().map(Path::to_path_buf)) {
                Some(root_dir) => root_dir,
                None => {
                    return Err(NotebookError::ConfigError {
                        message: "--url needs --root to map paths".to_string(),
                    })
                }
            };
            return Ok((explicit_server(url, root_dir, config.token()), ServerSource::Explicit));
        }

        if !config.new_server() {
            let mut servers = self.registry.running_servers()?;
            if let Some(root) = &root {
                servers.retain(|server| &server.root_dir == root);
            }

            if let Some(server) = select_server(&servers, targets, &self.probe).await {
                tracing::info!("♻️ Using running server at {} (pid {})", server.url, server.pid);
                return Ok((server, ServerSource::Running));
            }
        }

        if config.no_start() {
            return Err(NotebookError::NoServer {
                reason: format!(
                    "no running server contains {} and --no-start was given",
                    describe(targets)
                ),
            });
        }

        let root = match root {
            Some(root) => root,
            None => default_root(targets, config.home_dir()).ok_or_else(|| {
                NotebookError::NoServer {
                    reason: "nothing to open".to_string(),
                }
            })?,
        };
        for target in targets {
            relative_to_root(target, &root)?;
        }

        let port = match config.port() {
            Some(port) => port,
            None => free_port(config.host())?,
        };
        let request = LaunchRequest {
            command: config.server_command(),
            host: config.host().to_string(),
            port,
            root,
        };

        if config.dry_run() {
            let server = ServerInfo {
                pid: 0,
                port,
                url: request.expected_url()?,
                root_dir: request.root.clone(),
                token: None,
                version: None,
                runtime_file: None,
            };
            return Ok((server, ServerSource::Planned(request)));
        }

        let server = self.launcher.launch(&request).await?;
        Ok((server, ServerSource::Started))
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(NotebookError::PathNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(root.canonicalize()?)
}

fn explicit_server(url: &Url, root_dir: PathBuf, token: Option<&str>) -> ServerInfo {
    // 沒給 --token 時沿用 URL 上的 `?token=`（`jupyter server list` 印出的格式）
    let token = token.map(str::to_string).or_else(|| {
        url.query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    });
    let mut url = url.clone();
    url.set_query(None);
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }
    let root_dir = root_dir.canonicalize().unwrap_or(root_dir);

    ServerInfo {
        pid: 0,
        port: url.port_or_known_default().unwrap_or(0),
        url,
        root_dir,
        token,
        version: None,
        runtime_file: None,
    }
}

fn describe(targets: &[Target]) -> String {
    match targets {
        [single] => single.path.display().to_string(),
        many => format!("{} paths", many.len()),
    }
}
