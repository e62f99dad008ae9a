use chrono::Local;
use clap::Parser;
use scrollpage::config::Args;
use scrollpage::slice::run_sliced;
use scrollpage::{info_time, Error, Pager, Record, Result, SearchClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let start_time = Local::now();
    let args = Args::parse();
    let windows = args.windows()?;

    let client = SearchClient::new(args.client_config())?;
    let pager = Pager::new(&client, args.pager_config());

    let outcome = match windows {
        Some(windows) => run_sliced(&pager, &args.term, windows).await,
        None => pager.run(&args.term).await,
    };

    match outcome {
        Ok(harvest) => {
            print_records(&harvest.records, args.json)?;
            info_time!(
                start_time,
                "Collected {} records in {} fetches",
                harvest.records.len(),
                harvest.fetches
            );
            Ok(())
        }
        Err(interrupted) => {
            // Partial results are still printed before failing.
            print_records(&interrupted.records, args.json)?;
            Err(interrupted.error)
        }
    }
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    for (counter, record) in records.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(record).map_err(Error::Encode)?);
        } else {
            println!("{} {}", counter + 1, record);
        }
    }
    Ok(())
}
