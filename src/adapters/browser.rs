use crate::domain::ports::Browser;
use crate::utils::error::{NotebookError, Result};
use std::process::{Command, Stdio};
use url::Url;

/// 使用 `--browser` / `BROWSER` 指定的指令，未指定時用系統預設開啟方式
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    command: Option<String>,
}

impl SystemBrowser {
    pub fn new(command: Option<String>) -> Self {
        // BROWSER 可能是以路徑分隔符號串起的多個指令，只取第一個
        let separator = if cfg!(windows) { ';' } else { ':' };
        let command = command.and_then(|c| {
            c.split(separator)
                .map(str::trim)
                .find(|part| !part.is_empty())
                .map(str::to_string)
        });
        Self { command }
    }

    pub fn command_for(&self, url: &Url) -> Vec<String> {
        match &self.command {
            Some(command) => {
                let mut parts = if std::path::Path::new(command).is_file() {
                    vec![command.clone()]
                } else {
                    split_command(command)
                };
                if parts.iter().any(|p| p.contains("%s")) {
                    for part in parts.iter_mut() {
                        *part = part.replace("%s", url.as_str());
                    }
                } else {
                    parts.push(url.to_string());
                }
                parts
            }
            None => platform_opener(url),
        }
    }
}

/// 以空白切開指令，單引號或雙引號內的空白不切
fn split_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in command.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    parts.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        parts.push(current);
    }
    parts
}

fn platform_opener(url: &Url) -> Vec<String> {
    let url = url.to_string();
    if cfg!(target_os = "macos") {
        vec!["open".to_string(), url]
    } else if cfg!(windows) {
        vec![
            "cmd".to_string(),
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            url,
        ]
    } else {
        vec!["xdg-open".to_string(), url]
    }
}

impl Browser for SystemBrowser {
    fn open(&self, url: &Url) -> Result<()> {
        let argv = self.command_for(url);
        let (program, args) = argv.split_first().ok_or_else(|| NotebookError::BrowserError {
            message: "browser command is empty".to_string(),
        })?;

        tracing::debug!("Opening browser: {}", argv.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| NotebookError::BrowserError {
                message: format!("{}: {}", program, e),
            })?;
        Ok(())
    }
}
