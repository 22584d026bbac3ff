use crate::domain::model::{Interface, ServerInfo, Target, TargetKind};
use crate::utils::error::{NotebookError, Result};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// 將命令列參數轉成已 canonicalize 的目標
pub fn resolve_target(path: &Path) -> Result<Target> {
    if !path.exists() {
        return Err(NotebookError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    let canonical = path.canonicalize()?;
    let kind = if canonical.is_dir() {
        TargetKind::Directory
    } else {
        TargetKind::File
    };

    Ok(Target {
        path: canonical,
        kind,
    })
}

pub fn resolve_targets(paths: &[PathBuf]) -> Result<Vec<Target>> {
    paths.iter().map(|p| resolve_target(p)).collect()
}

pub fn relative_to_root<'a>(target: &'a Target, root: &Path) -> Result<&'a Path> {
    target
        .path
        .strip_prefix(root)
        .map_err(|_| NotebookError::OutsideRoot {
            path: target.path.clone(),
            root: root.to_path_buf(),
        })
}

/// URL 前綴設定；未覆蓋時依介面決定
#[derive(Debug, Clone, Copy)]
pub struct UrlPrefixes<'a> {
    pub interface: Interface,
    pub dir_prefix: Option<&'a str>,
    pub file_prefix: Option<&'a str>,
}

impl<'a> UrlPrefixes<'a> {
    pub fn new(interface: Interface) -> Self {
        Self {
            interface,
            dir_prefix: None,
            file_prefix: None,
        }
    }

    pub fn for_target(&self, target: &Target) -> &'a str {
        match target.kind {
            TargetKind::Directory => self
                .dir_prefix
                .unwrap_or_else(|| self.interface.dir_prefix()),
            TargetKind::File => self
                .file_prefix
                .unwrap_or_else(|| self.interface.file_prefix(&target.path)),
        }
    }
}

pub fn url_for(server: &ServerInfo, target: &Target, prefixes: &UrlPrefixes) -> Result<Url> {
    let relative = relative_to_root(target, &server.root_dir)?;
    let prefix = prefixes.for_target(target);

    let mut url = server.url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| NotebookError::ConfigError {
                message: format!("{} cannot be used as a base URL", server.url),
            })?;
        segments.pop_if_empty();
        for part in prefix.split('/').filter(|p| !p.is_empty()) {
            segments.push(part);
        }
        for component in relative.components() {
            if let Component::Normal(name) = component {
                segments.push(&name.to_string_lossy());
            }
        }
    }

    url.set_query(None);
    url.set_fragment(None);
    if let Some(token) = server.token.as_deref().filter(|t| !t.is_empty()) {
        url.query_pairs_mut().append_pair("token", token);
    }

    Ok(url)
}

/// 新 server 的根目錄：所有目標都在家目錄下時用家目錄，否則取共同上層目錄
pub fn default_root(targets: &[Target], home: Option<&Path>) -> Option<PathBuf> {
    let first = targets.first()?;

    if let Some(home) = home {
        let home = home.canonicalize().unwrap_or_else(|_| home.to_path_buf());
        if targets.iter().all(|t| t.directory().starts_with(&home)) {
            return Some(home);
        }
    }

    let mut ancestor = first.directory().to_path_buf();
    for target in &targets[1..] {
        while !target.directory().starts_with(&ancestor) {
            if !ancestor.pop() {
                break;
            }
        }
    }
    Some(ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn server_at(root: &Path, url: &str, token: Option<&str>) -> ServerInfo {
        ServerInfo {
            pid: 1,
            port: 8888,
            url: Url::parse(url).unwrap(),
            root_dir: root.to_path_buf(),
            token: token.map(str::to_string),
            version: None,
            runtime_file: None,
        }
    }

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("proj/data dir")).unwrap();
        std::fs::write(root.join("proj/analysis.ipynb"), "{}").unwrap();
        std::fs::write(root.join("proj/data dir/résumé.ipynb"), "{}").unwrap();
        std::fs::write(root.join("proj/helpers.py"), "").unwrap();
        (dir, root)
    }

    #[test]
    fn test_missing_path_is_error() {
        let (_dir, root) = setup();
        let err = resolve_target(&root.join("missing.ipynb")).unwrap_err();
        assert!(matches!(err, NotebookError::PathNotFound { .. }));
    }

    #[test]
    fn test_notebook_url_with_token() {
        let (_dir, root) = setup();
        let server = server_at(&root, "http://localhost:8888/", Some("abc123"));
        let target = resolve_target(&root.join("proj/analysis.ipynb")).unwrap();

        let url = url_for(&server, &target, &UrlPrefixes::new(Interface::Notebook)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/notebooks/proj/analysis.ipynb?token=abc123"
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let (_dir, root) = setup();
        let server = server_at(&root, "http://localhost:8888/", None);
        let target = resolve_target(&root.join("proj/data dir/résumé.ipynb")).unwrap();

        let url = url_for(&server, &target, &UrlPrefixes::new(Interface::Notebook)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/notebooks/proj/data%20dir/r%C3%A9sum%C3%A9.ipynb"
        );
    }

    #[test]
    fn test_directory_and_plain_file_prefixes() {
        let (_dir, root) = setup();
        let server = server_at(&root, "http://127.0.0.1:9000/user/me/", Some(""));

        let dir = resolve_target(&root.join("proj")).unwrap();
        let url = url_for(&server, &dir, &UrlPrefixes::new(Interface::Notebook)).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/user/me/tree/proj");

        let script = resolve_target(&root.join("proj/helpers.py")).unwrap();
        let url = url_for(&server, &script, &UrlPrefixes::new(Interface::Notebook)).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/user/me/edit/proj/helpers.py");

        let url = url_for(&server, &script, &UrlPrefixes::new(Interface::Lab)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/user/me/lab/tree/proj/helpers.py"
        );
    }

    #[test]
    fn test_prefix_overrides() {
        let (_dir, root) = setup();
        let server = server_at(&root, "http://localhost:8888/", None);
        let prefixes = UrlPrefixes {
            interface: Interface::Notebook,
            dir_prefix: Some("/custom/tree/"),
            file_prefix: Some("doc/tree"),
        };

        let file = resolve_target(&root.join("proj/analysis.ipynb")).unwrap();
        let url = url_for(&server, &file, &prefixes).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/doc/tree/proj/analysis.ipynb");

        let dir = resolve_target(&root.join("proj")).unwrap();
        let url = url_for(&server, &dir, &prefixes).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/custom/tree/proj");
    }

    #[test]
    fn test_outside_root() {
        let (_dir, root) = setup();
        let server = server_at(&root.join("proj/data dir"), "http://localhost:8888/", None);
        let target = resolve_target(&root.join("proj/analysis.ipynb")).unwrap();

        let err = url_for(&server, &target, &UrlPrefixes::new(Interface::Notebook)).unwrap_err();
        assert!(matches!(err, NotebookError::OutsideRoot { .. }));
    }

    #[test]
    fn test_default_root_prefers_home() {
        let (_dir, root) = setup();
        let targets = resolve_targets(&[
            root.join("proj/analysis.ipynb"),
            root.join("proj/data dir"),
        ])
        .unwrap();

        assert_eq!(default_root(&targets, Some(&root)), Some(root.clone()));
    }

    #[test]
    fn test_default_root_common_ancestor_outside_home() {
        let (_dir, root) = setup();
        let elsewhere = TempDir::new().unwrap();
        let targets = resolve_targets(&[
            root.join("proj/analysis.ipynb"),
            root.join("proj/data dir/résumé.ipynb"),
        ])
        .unwrap();

        assert_eq!(
            default_root(&targets, Some(elsewhere.path())),
            Some(root.join("proj"))
        );
        assert_eq!(default_root(&[], None), None);
    }
}
