use clap::Parser;
use financial_voice_summarizer::{
    FinancialVoiceSummarizer, SqliteLedger, VoiceAgentConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "voice-summary", about = "Spoken summary of this month's finances")]
struct Args {
    /// Path to the SQLite ledger
    #[arg(long, env = "LEDGER_DB_PATH", default_value = "finance.db")]
    db: PathBuf,

    /// Where to write the MP3
    #[arg(short, long, default_value = "monthly-summary.mp3")]
    out: PathBuf,

    /// Print the month's figures as JSON and exit (no external calls)
    #[arg(long)]
    summary_only: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads LEDGER_DB_PATH
    dotenv::dotenv().ok();
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,sqlx=warn,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,sqlx=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Financial voice summarizer starting");
    let ledger = SqliteLedger::new(&args.db);
    info!("📍 Ledger: {}", ledger.path().display());

    match run(args, &ledger).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    args: Args,
    ledger: &SqliteLedger,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if args.summary_only {
        let summary = financial_voice_summarizer::ledger::monthly_summary(ledger).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    let config = VoiceAgentConfig::from_env()?;
    let summarizer = FinancialVoiceSummarizer::from_config(&config)?;

    let report = summarizer.run(ledger).await;
    println!("{}", report.message);

    match report.audio {
        Some(audio) => {
            std::fs::write(&args.out, &audio.bytes)?;
            info!(
                run_id = %report.run_id,
                "✅ Wrote {} bytes to {}",
                audio.len(),
                args.out.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}
