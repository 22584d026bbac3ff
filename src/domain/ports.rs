use crate::domain::model::{Interface, LaunchRequest, ServerInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// 已執行中的 server 來源（通常是 Jupyter runtime 目錄）
pub trait ServerRegistry: Send + Sync {
    fn running_servers(&self) -> Result<Vec<ServerInfo>>;
}

#[async_trait]
pub trait ServerProbe: Send + Sync {
    async fn is_responsive(&self, server: &ServerInfo) -> bool;
}

#[async_trait]
pub trait ServerLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<ServerInfo>;
}

pub trait Browser: Send + Sync {
    fn open(&self, url: &Url) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn paths(&self) -> &[PathBuf];
    fn root(&self) -> Option<&Path>;
    fn host(&self) -> &str;
    fn port(&self) -> Option<u16>;
    fn interface(&self) -> Interface;
    fn dir_prefix(&self) -> Option<&str>;
    fn file_prefix(&self) -> Option<&str>;
    fn server_command(&self) -> Vec<String>;
    fn startup_timeout(&self) -> Duration;
    fn home_dir(&self) -> Option<&Path>;
    fn server_url(&self) -> Option<&Url>;
    fn token(&self) -> Option<&str>;
    fn new_server(&self) -> bool;
    fn no_start(&self) -> bool;
    /// 不啟動 server、不開瀏覽器
    fn dry_run(&self) -> bool;
    /// 只輸出 URL，不開瀏覽器
    fn print_only(&self) -> bool;
}
