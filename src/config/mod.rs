pub mod file;
pub mod settings;

use crate::domain::model::Interface;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(version)]
#[command(about = "Open notebooks in a running (or newly started) Jupyter server")]
pub struct CliConfig {
    /// Notebooks or directories to open (default: current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Root directory of the server to use or start
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Host for a newly started server
    #[arg(long)]
    pub host: Option<String>,

    /// Port for a newly started server (default: any free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(long, value_enum)]
    pub interface: Option<Interface>,

    /// URL prefix for directories, e.g. "tree"
    #[arg(long)]
    pub dir_prefix: Option<String>,

    /// URL prefix for files, e.g. "notebooks"
    #[arg(long)]
    pub file_prefix: Option<String>,

    /// Command used to start a server, e.g. "jupyter lab"
    #[arg(long)]
    pub server_command: Option<String>,

    /// Seconds to wait for a new server to become ready
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Browser command; "%s" is replaced by the URL
    #[arg(long, env = "BROWSER")]
    pub browser: Option<String>,

    /// Use this server URL instead of looking for one
    #[arg(long)]
    pub url: Option<String>,

    /// Token for the server given with --url
    #[arg(long, requires = "url")]
    pub token: Option<String>,

    /// Always start a new server
    #[arg(long)]
    pub new_server: bool,

    /// Fail instead of starting a server
    #[arg(long, conflicts_with = "new_server")]
    pub no_start: bool,

    /// Print URLs (and the launch command, if any) without starting or opening anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print URLs instead of opening a browser
    #[arg(long)]
    pub print_url: bool,

    /// List running servers and exit
    #[arg(long)]
    pub list: bool,

    /// Config file (default: nearest .open-notebook.toml or pyproject.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        CliConfig::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = CliConfig::try_parse_from([
            "nopen",
            "a.ipynb",
            "b.ipynb",
            "--interface",
            "lab",
            "-p",
            "9000",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.paths, vec![PathBuf::from("a.ipynb"), PathBuf::from("b.ipynb")]);
        assert_eq!(cli.interface, Some(Interface::Lab));
        assert_eq!(cli.port, Some(9000));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_conflicting_flags() {
        assert!(CliConfig::try_parse_from(["nopen", "--new-server", "--no-start"]).is_err());
        assert!(CliConfig::try_parse_from(["nopen", "--token", "abc"]).is_err());
    }
}
