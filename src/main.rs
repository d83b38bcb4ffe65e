use clap::Parser;
use firestore_probe::{config::Config, probe, utils::init_logger};
use std::path::PathBuf;
use tracing::{error, info};

/// Verify Firestore connectivity: write test_connections/ping and read it back.
#[derive(Debug, Parser)]
#[command(name = "firestore-probe", version, about)]
struct Cli {
    /// Service-account key file [env: GOOGLE_APPLICATION_CREDENTIALS]
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Project id, overriding the key file's [env: FIRESTORE_PROJECT_ID]
    #[arg(long)]
    project: Option<String>,

    /// Database id [env: FIRESTORE_DATABASE]
    #[arg(long)]
    database: Option<String>,

    /// Firestore emulator host:port [env: FIRESTORE_EMULATOR_HOST]
    #[arg(long)]
    emulator_host: Option<String>,
}

impl Cli {
    fn apply(self, mut config: Config) -> anyhow::Result<Config> {
        if let Some(path) = self.credentials {
            config.credentials_path = path;
        }
        if let Some(project) = self.project {
            config.project_id = Some(project);
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(host) = self.emulator_host {
            config.emulator_host = Some(host);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = cli.apply(Config::from_env()?)?;
    info!("Configuration loaded: {:?}", config);

    match probe::run(&config).await {
        Ok(report) => {
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            error!("Probe aborted at {} stage", e.stage());
            Err(e.into())
        }
    }
}
