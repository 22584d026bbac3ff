use crate::domain::model::{ServerInfo, Target};
use crate::domain::ports::ServerProbe;

/// 根目錄包含所有目標的 server，根目錄越深者越優先
pub fn compatible_servers<'a>(servers: &'a [ServerInfo], targets: &[Target]) -> Vec<&'a ServerInfo> {
    let mut candidates: Vec<&ServerInfo> = servers
        .iter()
        .filter(|server| targets.iter().all(|t| server.contains(&t.path)))
        .collect();

    candidates.sort_by(|a, b| {
        let depth_a = a.root_dir.components().count();
        let depth_b = b.root_dir.components().count();
        depth_b.cmp(&depth_a).then(a.pid.cmp(&b.pid))
    });
    candidates
}

/// 取第一個仍能回應 HTTP 的相容 server
pub async fn select_server<P: ServerProbe + ?Sized>(
    servers: &[ServerInfo],
    targets: &[Target],
    probe: &P,
) -> Option<ServerInfo> {
    for server in compatible_servers(servers, targets) {
        if probe.is_responsive(server).await {
            tracing::debug!("Reusing server pid={} at {}", server.pid, server.url);
            return Some(server.clone());
        }
        tracing::warn!("⚠️ Server pid={} at {} is not responding, skipping", server.pid, server.url);
    }
    None
}
