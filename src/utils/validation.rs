use crate::utils::error::{NotebookError, Result};
use std::fmt::Display;
use std::ops::RangeInclusive;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> NotebookError {
    NotebookError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// server URL 必須是帶主機名稱的 http(s) URL
pub fn validate_server_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("not a URL ({})", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, raw, "only http and https servers are supported"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(field, raw, "the URL has no host"));
    }
    Ok(url)
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    match path {
        "" => Err(invalid(field, path, "path is empty")),
        p if p.contains('\0') => Err(invalid(field, path, "path contains a NUL byte")),
        _ => Ok(()),
    }
}

/// `--ip` 的值：不可空白，也不可帶 scheme 或 port
pub fn validate_host(field: &str, host: &str) -> Result<()> {
    if host.trim().is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid(field, host, "host must be a single non-empty word"));
    }
    if host.contains("://") {
        return Err(invalid(field, host, "give a host name, not a URL"));
    }
    Ok(())
}

pub fn validate_within<T: PartialOrd + Display>(
    field: &str,
    value: T,
    allowed: RangeInclusive<T>,
) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let reason = format!("must be between {} and {}", allowed.start(), allowed.end());
    Err(invalid(field, value, reason))
}

/// URL 前綴只能是相對路徑片段，例如 `lab/tree`
pub fn validate_url_prefix(field: &str, prefix: &str) -> Result<()> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.contains("://") || trimmed.contains(['?', '#']) {
        return Err(invalid(
            field,
            prefix,
            "prefix must be a plain path such as 'tree' or 'lab/tree'",
        ));
    }
    Ok(())
}
