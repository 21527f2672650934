use clap::Parser;
use contest_rating::{
    args::{Args, Command},
    database::{db::DbClient, json_store::JsonStore, PlayerStore, StoreError},
    leaderboard::{export_leaderboard, ExportError},
    model::processor::{process_rank_file, ContestProcessor, ProcessorError},
    reconcile::{reconcile_handles, ReconcileError}
};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let result = match &args.connection_string {
        Some(connection_string) => match DbClient::connect(connection_string).await {
            Ok(mut client) => run(&mut client, &args.command).await,
            Err(e) => Err(e.into())
        },
        None => {
            info!("Using player store {}", args.db_file.display());
            run(&mut JsonStore::new(&args.db_file), &args.command).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run<S: PlayerStore>(store: &mut S, command: &Command) -> Result<(), RunError> {
    match command {
        Command::Process { rank_file } => {
            let processor = ContestProcessor::default();
            match process_rank_file(store, rank_file, &processor).await {
                Ok(_) | Err(ProcessorError::EmptyField) => Ok(()),
                Err(e) => Err(e.into())
            }
        }
        Command::Reset => {
            let count = store.reset_players().await?;
            info!("Reset {} players to default ratings", count);
            Ok(())
        }
        Command::Export { output } => {
            export_leaderboard(store, output).await?;
            Ok(())
        }
        Command::Reconcile { ranks_dir, report } => {
            reconcile_handles(store, ranks_dir, report).await?;
            Ok(())
        }
    }
}
