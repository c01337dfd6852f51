/*
[INPUT]:  CLI arguments, YAML configuration file, keypair files, OS shutdown signals
[OUTPUT]: Running reference server, authenticated calls, or new keypairs
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or shutdown handling
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use openkitx403::{ClientConfig, Ed25519Signer, KeypairFile, OpenKitClient};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use openkitx403_cli::{ServerConfig, serve};

#[derive(Parser, Debug)]
#[command(name = "openkitx403", version, about = "OpenKitx403 wallet authentication tools")]
struct Cli {
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reference server with protected routes
    Serve {
        #[arg(long = "config", value_name = "PATH")]
        config_path: Option<PathBuf>,
        #[arg(long = "listen", value_name = "ADDR")]
        listen: Option<String>,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Call a protected URL, answering the wallet challenge
    Call {
        url: String,
        #[arg(long = "keypair", value_name = "PATH")]
        keypair: PathBuf,
        #[arg(long = "method", short = 'X', default_value = "GET")]
        method: String,
        /// JSON request body
        #[arg(long = "data", short = 'd')]
        data: Option<String>,
    },
    /// Generate a keypair file
    Keygen {
        #[arg(long = "out", value_name = "PATH")]
        out: PathBuf,
        #[arg(long = "force")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Serve {
            config_path,
            listen,
            dry_run,
        } => run_serve(config_path, listen, dry_run).await,
        Command::Call {
            url,
            keypair,
            method,
            data,
        } => run_call(&url, &keypair, &method, data.as_deref()).await,
        Command::Keygen { out, force } => run_keygen(&out, force),
    }
}

async fn run_serve(config_path: Option<PathBuf>, listen: Option<String>, dry_run: bool) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => ServerConfig::from_file(path).context("load config")?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = listen {
        config.listen = listen;
    }

    info!(
        config_path = ?config_path,
        listen = %config.listen,
        dry_run,
        "starting openkitx403 server"
    );

    if dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    serve(config, shutdown).await.context("run server")?;
    info!("shutdown complete");
    Ok(())
}

async fn run_call(url: &str, keypair: &Path, method: &str, data: Option<&str>) -> Result<()> {
    let wallet = KeypairFile::new(keypair)
        .load()
        .with_context(|| format!("load keypair {}", keypair.display()))?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {method}"))?;
    let body = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--data must be JSON")?;

    info!(address = %wallet.public_key_base58(), %method, url, "calling protected endpoint");

    let client = OpenKitClient::with_config(ClientConfig::default()).context("build client")?;
    let response = client
        .authenticate(&wallet, method, url, body.as_ref())
        .await
        .context("authenticated request")?;

    let status = response.status();
    let text = response.text().await.context("read response body")?;
    println!("{text}");

    if !status.is_success() {
        bail!("server answered {status}");
    }
    Ok(())
}

fn run_keygen(out: &Path, force: bool) -> Result<()> {
    let file = KeypairFile::new(out);
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }

    let signer = Ed25519Signer::generate();
    file.save(&signer)
        .with_context(|| format!("write keypair {}", out.display()))?;

    info!(path = %out.display(), "keypair written");
    println!("{}", signer.public_key_base58());
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
