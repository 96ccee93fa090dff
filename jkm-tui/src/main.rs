//! jkm - terminal mail client
//!
//! Browse, read, compose and send email over IMAP/SMTP from the terminal.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use jkm_tui::{
    app::{input::EventHandler, Router},
    error::{Result, TuiError},
    services::ServiceHandle,
    terminal::{TerminalSession, Tui},
};
use libjkm::logging::{LogTarget, LoggingConfig, DEFAULT_LOG_FILE};
use libjkm::transport::{fixture::FixtureTransport, FixtureFactory, ImapSmtpFactory};
use libjkm::{Config, TransportFactory};

/// Terminal input poll interval in milliseconds
const INPUT_POLL_MS: u64 = 50;

#[derive(Parser, Debug)]
#[command(name = "jkm")]
#[command(version)]
#[command(about = "Terminal mail client for IMAP/SMTP")]
#[command(long_about = "\
Terminal mail client for IMAP/SMTP.

Lists your inbox, reads messages and sends mail from a keyboard-driven
terminal interface. When the configuration is incomplete jkm starts in a
setup screen that asks for the missing connection details.

CONFIGURATION:
  Settings are read from ~/.config/jkm/config.toml (or $JKM_CONFIG) and
  overridden by JKM_EMAIL, JKM_IMAP_SERVER, JKM_IMAP_PORT, JKM_IMAP_PASSWORD,
  JKM_SMTP_SERVER, JKM_SMTP_PORT, JKM_SMTP_PASSWORD and JKM_REFRESH_SECS.

KEYS:
  j/k move, Enter read, c compose, r refresh, q quit, Ctrl+C quit anywhere

EXIT CODES:
  0 - Normal quit
  1 - Configuration, startup or terminal error")]
struct Cli {
    /// Path to the configuration file (overrides JKM_CONFIG)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use an in-memory mailbox instead of connecting to a server
    #[arg(long)]
    fixture: bool,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Enable debug logging (to the log file)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging(&cli);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Hint: check your config file or the JKM_* environment variables");
            process::exit(1);
        }
    };

    let factory: Arc<dyn TransportFactory> = if cli.fixture {
        Arc::new(FixtureFactory::new(Arc::new(FixtureTransport::new())))
    } else {
        Arc::new(ImapSmtpFactory)
    };

    let router = match Router::new(config, factory) {
        Ok(router) => router,
        Err(e) => {
            tracing::error!(error = %e, "router construction failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(router) {
        tracing::error!(error = %e, "jkm exited with an error");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_logging(cli: &Cli) {
    let mut logging = LoggingConfig::from_lookup(|key| std::env::var(key).ok());

    if let Some(path) = &cli.log_file {
        logging.target = LogTarget::File(path.clone());
    }
    if cli.verbose {
        logging.level = "debug".to_string();
        if logging.target == LogTarget::Disabled {
            logging.target = LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE));
        }
    }

    if let Err(e) = logging.init() {
        eprintln!("Warning: could not open log file: {}", e);
    }
}

fn load_config(cli: &Cli) -> libjkm::Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn run(mut router: Router) -> Result<()> {
    let services = ServiceHandle::new()?;

    let mut session = TerminalSession::enter()?;

    let input = EventHandler::new(INPUT_POLL_MS).spawn(services.sender());
    let result = event_loop(session.terminal_mut(), &mut router, &services);
    input.stop();

    let restored = session.restore();

    // Disconnect exactly once, whatever happened above
    if let Some(transport) = router.release_transport() {
        if let Err(e) = services.block_on(transport.disconnect()) {
            tracing::warn!(error = %e, "disconnect failed");
        }
    }

    result.and(restored)
}

fn event_loop(terminal: &mut Tui, router: &mut Router, services: &ServiceHandle) -> Result<()> {
    services.dispatch(router.init(), router.transport());

    loop {
        terminal.draw(|frame| router.render(frame))?;

        let event = services
            .recv()
            .ok_or_else(|| TuiError::Event("event inbox closed".to_string()))?;

        let command = router.update(event);
        if router.should_quit() || command.quits() {
            tracing::info!("quitting");
            return Ok(());
        }
        services.dispatch(command, router.transport());
    }
}
