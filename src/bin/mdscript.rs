/// mdscript command-line runner
///
/// Runs or checks a markdown program. Printed values go to stdout, logs and
/// errors to stderr; any failure exits with status 1.
use mdscript::cli;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    if let Err(err) = cli::run_cli().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
