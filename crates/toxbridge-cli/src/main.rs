//! toxbridge entry point.
//!
//! # Usage
//!
//! ```bash
//! # First run: create an identity with two simulated friends online
//! toxbridge --create --nickname ana --peers 2 --duration 10
//!
//! # Later runs reuse the stored account
//! toxbridge --export backup.tox
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tokio::sync::mpsc;
use toxbridge_adapter::{Dispatcher, HostCommand, Runtime, SetupChoice, runtime::COMMAND_BUFFER};
use toxbridge_cli::{LogHost, SettingsFile};
use toxbridge_core::{PublicKey, StoredAccount, SystemEnv};
use toxbridge_harness::SimCore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Headless Tox account host
#[derive(Parser, Debug)]
#[command(name = "toxbridge")]
#[command(about = "Run a Tox account through the toxbridge adapter on a simulated network")]
#[command(version)]
struct Args {
    /// Settings file (CBOR), created on first save
    #[arg(short, long, default_value = "toxbridge.cbor")]
    settings: PathBuf,

    /// Create a new identity if no account is stored
    #[arg(long, conflicts_with = "import")]
    create: bool,

    /// Import account data from a file if no account is stored
    #[arg(long)]
    import: Option<PathBuf>,

    /// Write account data to this file before logging out
    #[arg(long)]
    export: Option<PathBuf>,

    /// Nickname to store before logging in
    #[arg(short, long)]
    nickname: Option<String>,

    /// Bootstrap node address
    #[arg(long)]
    bootstrap_address: Option<String>,

    /// Bootstrap node port
    #[arg(long)]
    bootstrap_port: Option<u16>,

    /// Bootstrap node public key (hex)
    #[arg(long)]
    bootstrap_key: Option<String>,

    /// Simulated friends online at login (new identities only)
    #[arg(long, default_value = "0")]
    peers: usize,

    /// Message sent to every simulated friend once connected
    #[arg(long)]
    greet: Option<String>,

    /// Accept incoming friend requests
    #[arg(long)]
    accept_requests: bool,

    /// Seed of the simulated core's identity
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Seconds to run; runs until Ctrl-C if omitted
    #[arg(short, long)]
    duration: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn setup_choice(&self) -> Option<SetupChoice> {
        match (&self.import, self.create) {
            (Some(path), _) => Some(SetupChoice::ImportFile(path.clone())),
            (None, true) => Some(SetupChoice::CreateNew),
            (None, false) => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let settings = SettingsFile::new(&args.settings);
    let mut config = settings.load()?;
    if let Some(nickname) = &args.nickname {
        config.nickname = Some(nickname.clone());
    }
    if let Some(address) = &args.bootstrap_address {
        config.bootstrap.address.clone_from(address);
    }
    if let Some(port) = args.bootstrap_port {
        config.bootstrap.port = port;
    }
    if let Some(key) = &args.bootstrap_key {
        config.bootstrap.key.clone_from(key);
    }
    settings.save(&config)?;

    let stored = config.stored_account();
    let setup = args.setup_choice();
    if matches!(stored, Ok(StoredAccount::Missing)) && setup.is_none() {
        tracing::error!(
            path = %settings.path().display(),
            "no stored account, pass --create or --import"
        );
        return Ok(());
    }

    let mut core = SimCore::new(args.seed);
    core.set_dht(true);
    let peers: Vec<PublicKey> = if matches!(stored, Ok(StoredAccount::Blob(_))) {
        if args.peers > 0 {
            tracing::warn!("stored account replaces the friend list, --peers ignored");
        }
        Vec::new()
    } else {
        (0..args.peers)
            .map(|_| {
                let key = core.new_peer().public_key();
                core.befriend(key);
                core.set_online(&key, true);
                key
            })
            .collect()
    };

    let mut host = LogHost::new(settings, config.clone());
    let mut replies = None;
    if args.accept_requests {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        host = host.accept_requests(sender);
        replies = Some(receiver);
    }

    let dispatcher = Dispatcher::new(SystemEnv, config);
    let (runtime, commands) = Runtime::new(dispatcher, host);

    if let Some(mut replies) = replies {
        let commands = commands.clone();
        tokio::spawn(async move {
            while let Some(reply) = replies.recv().await {
                if commands.send(reply).await.is_err() {
                    break;
                }
            }
        });
    }

    let driver = {
        let peers = peers.clone();
        async move {
            if let Some(choice) = setup {
                commands.send(HostCommand::Setup(choice)).await?;
            }

            tokio::time::sleep(Duration::from_secs(3)).await;
            commands.send(HostCommand::ShowAccountId).await?;
            if let Some(text) = &args.greet {
                for key in &peers {
                    let to = key.to_hex();
                    commands.send(HostCommand::SendMessage { to, text: text.clone() }).await?;
                }
            }

            match args.duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => tokio::signal::ctrl_c().await?,
            }

            if let Some(path) = args.export {
                commands.send(HostCommand::ExportAccount { path }).await?;
            }
            commands.send(HostCommand::Close).await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        }
    };
    let (result, driven) = tokio::join!(runtime.run(core, peers), driver);
    let (_, host) = result?;
    driven?;

    tracing::info!(
        nickname = host.config().nickname().unwrap_or(""),
        "logged out, settings saved"
    );
    Ok(())
}
