use causerie::cli;
use causerie::logging;

#[tokio::main]
async fn main() {
    logging::init_tracing();

    if let Err(err) = cli::run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
