use crate::adapters::{HttpProbe, JupyterLauncher, RuntimeDir, SystemBrowser};
use crate::config::settings::Settings;
use crate::config::CliConfig;
use crate::core::opener::{NotebookOpener, OpenOutcome, ServerSource};
use crate::domain::ports::ServerRegistry;
use crate::utils::error::Result;
use crate::utils::logger;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// `nopen` 與 `open-notebook` 共用的進入點，回傳 exit code
pub async fn start() -> i32 {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    run(config).await
}

pub async fn run(config: CliConfig) -> i32 {
    match execute(config).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("❌ {} (Category: {:?})", e, e.category());

            let message = e.user_friendly_message();
            eprintln!("❌ {}", message);
            if message != e.to_string() {
                eprintln!("   {}", e);
            }
            eprintln!("💡 {}", e.recovery_suggestion());
            e.exit_code()
        }
    }
}

async fn execute(config: CliConfig) -> Result<()> {
    let settings = Settings::load(&config)?;
    settings.validate()?;
    if let Some(path) = &settings.config_file {
        tracing::info!("📁 Loaded settings from {}", path.display());
    }

    let registry = RuntimeDir::discover()?;
    tracing::debug!("Jupyter runtime directory: {}", registry.path().display());

    if settings.list {
        return list_servers(&registry);
    }

    let probe = HttpProbe::new(PROBE_TIMEOUT)?;
    let mut launcher = JupyterLauncher::new(
        RuntimeDir::new(registry.path().to_path_buf())?,
        probe.clone(),
        settings.startup_timeout,
    );
    if let Some(dirs) = directories::ProjectDirs::from("", "", "open-notebook") {
        launcher = launcher.with_log_dir(dirs.cache_dir().to_path_buf());
    }
    let browser = SystemBrowser::new(settings.browser.clone());

    let opener = NotebookOpener::new(registry, probe, launcher, browser);
    let outcome = opener.run(&settings).await?;
    report(&outcome);
    Ok(())
}

fn list_servers(registry: &RuntimeDir) -> Result<()> {
    print!("{}", server_list(registry)?);
    Ok(())
}

/// `--list` 的輸出：每個 server 一行 pid、URL、根目錄
fn server_list<R: ServerRegistry>(registry: &R) -> Result<String> {
    let servers = registry.running_servers()?;
    if servers.is_empty() {
        return Ok("No running notebook servers\n".to_string());
    }

    let mut out = String::new();
    for server in servers {
        out.push_str(&format!(
            "{:>8}  {}  {}\n",
            server.pid,
            server.url,
            server.root_dir.display()
        ));
    }
    Ok(out)
}

fn report(outcome: &OpenOutcome) {
    match &outcome.source {
        ServerSource::Planned(request) => {
            println!("Would start: {}", request.command_line());
        }
        ServerSource::Started => {
            tracing::info!("✅ Started server pid {} at {}", outcome.server.pid, outcome.server.url);
        }
        ServerSource::Running | ServerSource::Explicit => {}
    }

    for url in &outcome.urls {
        if outcome.opened {
            println!("🌐 Opened {}", url);
        } else {
            println!("{}", url);
        }
    }
}
