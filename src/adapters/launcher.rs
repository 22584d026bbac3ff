use crate::domain::model::{LaunchRequest, ServerInfo};
use crate::domain::ports::{ServerLauncher, ServerProbe, ServerRegistry};
use crate::utils::error::{NotebookError, Result};
use async_trait::async_trait;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime};

/// 向系統要一個目前沒人用的 port
pub fn free_port(host: &str) -> Result<u16> {
    let listener = std::net::TcpListener::bind((host, 0))?;
    Ok(listener.local_addr()?.port())
}

/// 檔案時間戳記可能落後系統時鐘一個 tick
const MTIME_SLACK: Duration = Duration::from_secs(1);

/// runtime file 是不是 `since` 之後才寫出的
fn written_since(server: &ServerInfo, since: SystemTime) -> bool {
    server
        .runtime_file
        .as_ref()
        .and_then(|path| std::fs::metadata(path).ok())
        .and_then(|meta| meta.modified().ok())
        .is_some_and(|modified| modified >= since)
}

/// 啟動 `jupyter notebook` / `jupyter lab`，等到 runtime file 出現且 HTTP 可用
pub struct JupyterLauncher<R: ServerRegistry, P: ServerProbe> {
    registry: R,
    probe: P,
    timeout: Duration,
    poll_interval: Duration,
    log_dir: Option<PathBuf>,
}

impl<R: ServerRegistry, P: ServerProbe> JupyterLauncher<R, P> {
    pub fn new(registry: R, probe: P, timeout: Duration) -> Self {
        Self {
            registry,
            probe,
            timeout,
            poll_interval: Duration::from_millis(250),
            log_dir: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// server 的 stdout/stderr 寫到此目錄下的 log 檔，否則丟棄
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }

    fn output_streams(&self, port: u16) -> (Stdio, Stdio) {
        let Some(dir) = &self.log_dir else {
            return (Stdio::null(), Stdio::null());
        };

        let path = dir.join(format!("open-notebook-server-{}.log", port));
        let opened = std::fs::create_dir_all(dir)
            .and_then(|_| File::create(&path))
            .and_then(|file| Ok((file.try_clone()?, file)));
        match opened {
            Ok((out, err)) => {
                tracing::debug!("Server output goes to {}", path.display());
                (Stdio::from(out), Stdio::from(err))
            }
            Err(e) => {
                tracing::warn!("⚠️ Cannot create server log {}: {}", path.display(), e);
                (Stdio::null(), Stdio::null())
            }
        }
    }

    fn spawn(&self, request: &LaunchRequest) -> Result<std::process::Child> {
        let program = request
            .command
            .first()
            .ok_or_else(|| NotebookError::ConfigError {
                message: "server command is empty".to_string(),
            })?;

        let (stdout, stderr) = self.output_streams(request.port);
        let mut command = Command::new(program);
        command
            .args(request.args())
            .current_dir(&request.root)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);

        // 脫離目前的 process group，終端機關閉時 server 不會跟著收到 SIGHUP
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command.spawn().map_err(|source| NotebookError::LaunchError {
            command: request.command_line(),
            source,
        })
    }
}

#[async_trait]
impl<R: ServerRegistry, P: ServerProbe> ServerLauncher for JupyterLauncher<R, P> {
    async fn launch(&self, request: &LaunchRequest) -> Result<ServerInfo> {
        if let Some(holder) = self
            .registry
            .running_servers()?
            .into_iter()
            .find(|server| server.port == request.port)
        {
            return Err(NotebookError::PortInUse {
                port: request.port,
                pid: holder.pid,
            });
        }

        tracing::info!("🚀 Starting notebook server: {}", request.command_line());
        let spawned_at = SystemTime::now()
            .checked_sub(MTIME_SLACK)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut child = self.spawn(request)?;
        let child_pid = child.id();
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(status) = child.try_wait()? {
                return Err(NotebookError::ServerExited {
                    port: request.port,
                    status: status.to_string(),
                });
            }

            let started = self
                .registry
                .running_servers()?
                .into_iter()
                .find(|server| {
                    server.port == request.port
                        && (server.pid == child_pid || written_since(server, spawned_at))
                });
            if let Some(server) = started {
                if self.probe.is_responsive(&server).await {
                    tracing::info!("✅ Notebook server ready at {} (pid {})", server.url, server.pid);
                    return Ok(server);
                }
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    "⚠️ Leaving unresponsive server process {} running on port {}",
                    child_pid,
                    request.port
                );
                return Err(NotebookError::StartupTimeout {
                    port: request.port,
                    seconds: self.timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use url::Url;

    struct FixedRegistry(Vec<ServerInfo>);

    impl ServerRegistry for FixedRegistry {
        fn running_servers(&self) -> Result<Vec<ServerInfo>> {
            Ok(self.0.clone())
        }
    }

    /// 第一次查詢時還沒有 server，之後才寫出 runtime file
    struct LateRegistry {
        calls: Mutex<u32>,
        runtime_file: PathBuf,
        server: ServerInfo,
        modified: Option<SystemTime>,
    }

    impl LateRegistry {
        fn new(dir: &Path, server: ServerInfo, modified: Option<SystemTime>) -> Self {
            Self {
                calls: Mutex::new(0),
                runtime_file: dir.join(format!("jpserver-{}.json", server.pid)),
                server,
                modified,
            }
        }
    }

    impl ServerRegistry for LateRegistry {
        fn running_servers(&self) -> Result<Vec<ServerInfo>> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                return Ok(vec![]);
            }
            if !self.runtime_file.exists() {
                let file = File::create(&self.runtime_file)?;
                if let Some(modified) = self.modified {
                    file.set_modified(modified)?;
                }
            }
            let mut server = self.server.clone();
            server.runtime_file = Some(self.runtime_file.clone());
            Ok(vec![server])
        }
    }

    struct AlwaysUp;

    #[async_trait]
    impl ServerProbe for AlwaysUp {
        async fn is_responsive(&self, _server: &ServerInfo) -> bool {
            true
        }
    }

    fn request(command: &[&str], port: u16) -> LaunchRequest {
        LaunchRequest {
            command: command.iter().map(|s| s.to_string()).collect(),
            host: "localhost".to_string(),
            port,
            root: std::env::temp_dir(),
        }
    }

    fn server_on(port: u16) -> ServerInfo {
        ServerInfo {
            pid: 99,
            port,
            url: Url::parse(&format!("http://localhost:{}/", port)).unwrap(),
            root_dir: std::env::temp_dir(),
            token: Some("tok".to_string()),
            version: None,
            runtime_file: None,
        }
    }

    #[test]
    fn test_free_port_is_bindable() {
        let port = free_port("127.0.0.1").unwrap();
        assert!(port > 0);
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let launcher = JupyterLauncher::new(FixedRegistry(vec![]), AlwaysUp, Duration::from_secs(1));
        let err = launcher
            .launch(&request(&["definitely-not-a-jupyter-binary"], 9999))
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::LaunchError { .. }));
    }

    #[tokio::test]
    async fn test_empty_command_is_config_error() {
        let launcher = JupyterLauncher::new(FixedRegistry(vec![]), AlwaysUp, Duration::from_secs(1));
        let err = launcher.launch(&request(&[], 9999)).await.unwrap_err();
        assert!(matches!(err, NotebookError::ConfigError { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_that_exits_early() {
        let launcher = JupyterLauncher::new(FixedRegistry(vec![]), AlwaysUp, Duration::from_secs(10))
            .with_poll_interval(Duration::from_millis(20));
        let err = launcher
            .launch(&request(&["sh", "-c", "exit 3"], 9998))
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::ServerExited { port: 9998, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_startup_timeout() {
        let launcher = JupyterLauncher::new(FixedRegistry(vec![]), AlwaysUp, Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(20));
        let err = launcher
            .launch(&request(&["sh", "-c", "sleep 3"], 9997))
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::StartupTimeout { port: 9997, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ready_server_is_returned() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = LateRegistry::new(dir.path(), server_on(9996), None);
        let launcher = JupyterLauncher::new(registry, AlwaysUp, Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(20));
        let server = launcher
            .launch(&request(&["sh", "-c", "sleep 2"], 9996))
            .await
            .unwrap();
        assert_eq!(server.port, 9996);
        assert_eq!(server.token.as_deref(), Some("tok"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_port_held_by_other_server_is_refused() {
        let mut other = server_on(8888);
        other.pid = 4242;
        other.root_dir = PathBuf::from("/srv/other");
        let launcher = JupyterLauncher::new(FixedRegistry(vec![other]), AlwaysUp, Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(20));

        let err = launcher
            .launch(&request(&["sh", "-c", "sleep 0.5; exit 1"], 8888))
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::PortInUse { port: 8888, pid: 4242 }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_runtime_file_is_not_taken_as_new_server() {
        let dir = tempfile::TempDir::new().unwrap();
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        let registry = LateRegistry::new(dir.path(), server_on(9994), Some(an_hour_ago));
        let launcher = JupyterLauncher::new(registry, AlwaysUp, Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(20));

        let err = launcher
            .launch(&request(&["sh", "-c", "sleep 0.5; exit 1"], 9994))
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::ServerExited { port: 9994, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_output_goes_to_log_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let launcher = JupyterLauncher::new(FixedRegistry(vec![]), AlwaysUp, Duration::from_secs(10))
            .with_poll_interval(Duration::from_millis(20))
            .with_log_dir(dir.path().to_path_buf());
        let _ = launcher
            .launch(&request(&["sh", "-c", "echo booting; exit 1"], 9995))
            .await;

        let log = std::fs::read_to_string(dir.path().join("open-notebook-server-9995.log")).unwrap();
        assert!(log.contains("booting"));
    }
}
