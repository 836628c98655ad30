use std::env;
use std::io;

use referral_ledger::csv::{read_submissions, write_ranking};
use referral_ledger::{InMemoryStore, Ledger, LedgerConfig};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .expect("usage: referral-ledger <submissions.csv>");

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let rows = match read_submissions(path.clone()) {
        Ok(rows) => rows,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let config = match LedgerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let ledger = Ledger::new(InMemoryStore::new(), config);
    let (sender, receiver) = tokio::sync::mpsc::channel(16);

    let reader = tokio::task::spawn_blocking(move || {
        for result in rows {
            match result {
                Ok(submission) => {
                    if sender.blocking_send(submission).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(receiver)).await;
    if let Err(e) = reader.await {
        error!("submission reader failed: {e}");
        std::process::exit(1);
    }

    let ranking = match ledger.ranking().await {
        Ok(ranking) => ranking,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = write_ranking(io::stdout().lock(), &ranking) {
        error!("failed to write ranking: {e}");
        std::process::exit(1);
    }
}
