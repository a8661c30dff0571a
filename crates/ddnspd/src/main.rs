// # ddnspd - DDNS Update Daemon
//
// Thin host for the update engine. All update, validation and legacy
// logic lives in ddnsp-core; the daemon only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Constructs the engine over the in-memory stores
// 4. Logs engine events until SIGTERM/SIGINT, then shuts the engine down
//
// The daemon serves no requests itself. A transport shell (an HTTP front
// end) is expected to embed ddnsp-core, build a `RequestContext` per
// request and call the `UpdateEngine` operations; this binary only hosts
// the engine lifecycle.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Credentials
// - `DDNSP_TOKENS`: Comma-separated API tokens accepted by the engine (required)
//
// ### Address detection
// - `DDNSP_TRUST_FORWARDED_FOR`: Honour the forwarded-address header (default: true)
// - `DDNSP_FORWARDED_HEADER`: Header carrying the client chain (default: x-forwarded-for)
//
// ### Auth
// - `DDNSP_API_KEY_HEADER`: Alternative header for API keys (default: x-api-key)
//
// ### Engine
// - `DDNSP_EVENT_CHANNEL_CAPACITY`: Event buffer size (default: 1000)
// - `DDNSP_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DDNSP_TOKENS=3f1c9a0e5b7d42e8a1c6f0b9d2e4a7c1
// export DDNSP_LOG_LEVEL=debug
//
// ddnspd
// ```

use anyhow::Result;
use ddnsp_core::{DdnsConfig, EngineEvent, UpdateEngine};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    tokens: Vec<String>,
    trust_forwarded_for: Option<bool>,
    forwarded_header: Option<String>,
    api_key_header: Option<String>,
    event_channel_capacity: Option<usize>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let tokens = env::var("DDNSP_TOKENS").map_err(|_| {
            anyhow::anyhow!(
                "DDNSP_TOKENS is required. \
                Set it via: export DDNSP_TOKENS=token_one,token_two"
            )
        })?;

        let trust_forwarded_for = match env::var("DDNSP_TRUST_FORWARDED_FOR") {
            Ok(value) => Some(parse_bool("DDNSP_TRUST_FORWARDED_FOR", &value)?),
            Err(_) => None,
        };

        let event_channel_capacity = match env::var("DDNSP_EVENT_CHANNEL_CAPACITY") {
            Ok(value) => Some(value.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "DDNSP_EVENT_CHANNEL_CAPACITY must be a positive integer. Got: {}",
                    value
                )
            })?),
            Err(_) => None,
        };

        Ok(Self {
            tokens: tokens
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            trust_forwarded_for,
            forwarded_header: env::var("DDNSP_FORWARDED_HEADER").ok(),
            api_key_header: env::var("DDNSP_API_KEY_HEADER").ok(),
            event_channel_capacity,
            log_level: env::var("DDNSP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks token presence and shape, numeric ranges and the log level.
    /// Engine-level rules are checked again by `DdnsConfig::validate`.
    fn validate(&self) -> Result<()> {
        if self.tokens.is_empty() {
            anyhow::bail!(
                "DDNSP_TOKENS must contain at least one token. \
                Set it via: export DDNSP_TOKENS=token_one,token_two"
            );
        }

        for token in &self.tokens {
            if token.len() < 16 {
                anyhow::bail!(
                    "Token '{}…' appears too short ({} chars). Use at least 16 characters.",
                    token.chars().take(4).collect::<String>(),
                    token.len()
                );
            }

            // Check for obvious placeholder tokens (common mistake)
            let token_lower = token.to_lowercase();
            if token_lower.contains("your_token")
                || token_lower.contains("replace_me")
                || token_lower.contains("example")
                || token_lower.contains("changeme")
            {
                anyhow::bail!(
                    "DDNSP_TOKENS contains a placeholder. \
                    Generate real tokens before starting the daemon."
                );
            }
        }

        if let Some(capacity) = self.event_channel_capacity
            && !(1..=100_000).contains(&capacity)
        {
            anyhow::bail!(
                "DDNSP_EVENT_CHANNEL_CAPACITY must be between 1 and 100000. Got: {}",
                capacity
            );
        }

        if let Some(ref header) = self.forwarded_header
            && header.trim().is_empty()
        {
            anyhow::bail!("DDNSP_FORWARDED_HEADER cannot be empty");
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNSP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the engine configuration, keeping defaults for unset variables
    fn to_engine_config(&self) -> DdnsConfig {
        let mut config = DdnsConfig::new().with_tokens(self.tokens.iter().cloned());

        if let Some(trust) = self.trust_forwarded_for {
            config.ip_resolver.trust_forwarded_for = trust;
        }
        if let Some(ref header) = self.forwarded_header {
            config.ip_resolver.forwarded_header = header.trim().to_lowercase();
        }
        if let Some(ref header) = self.api_key_header {
            config.auth.api_key_header = header.trim().to_lowercase();
        }
        if let Some(capacity) = self.event_channel_capacity {
            config.engine.event_channel_capacity = capacity;
        }

        config
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", name, value),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let engine_config = config.to_engine_config();
    if let Err(e) = engine_config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnspd daemon");
    info!("Configuration loaded: {} token(s)", config.tokens.len());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(engine_config).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    info!(
        "Address detection: trust {} = {}",
        config.ip_resolver.forwarded_header, config.ip_resolver.trust_forwarded_for
    );

    let (engine, mut events) = UpdateEngine::in_memory(config)?;

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    info!("Engine ready");

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    engine.shutdown(signal).await?;

    // Closes the event channel so the logger drains and exits.
    drop(engine);
    if let Err(e) = event_logger.await {
        warn!("Event logger task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::RecordCreated {
            hostname,
            ipv4,
            ipv6,
        } => info!("Record created: {} (ipv4: {:?}, ipv6: {:?})", hostname, ipv4, ipv6),
        EngineEvent::RecordUpdated {
            hostname,
            ipv4,
            ipv6,
            previous_ipv4,
            previous_ipv6,
        } => info!(
            "Record updated: {} ipv4 {:?} -> {:?}, ipv6 {:?} -> {:?}",
            hostname, previous_ipv4, ipv4, previous_ipv6, ipv6
        ),
        EngineEvent::RecordUnchanged { hostname } => debug!("Record unchanged: {}", hostname),
        EngineEvent::TxtAdded {
            hostname,
            record_count,
        } => info!("TXT added: {} ({} value(s))", hostname, record_count),
        EngineEvent::TxtDeleted { hostname, value } => match value {
            Some(_) => info!("TXT value deleted: {}", hostname),
            None => info!("TXT set deleted: {}", hostname),
        },
        EngineEvent::BulkCompleted {
            total,
            successful,
            failed,
        } => info!(
            "Bulk update: {} total, {} successful, {} failed",
            total, successful, failed
        ),
        EngineEvent::AuthRejected { endpoint } => warn!("Rejected credentials on {}", endpoint),
        EngineEvent::Stopped { reason } => info!("Engine stopped: {}", reason),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
