#[tokio::main]
async fn main() {
    if let Err(e) = pg_text_query_cli::run(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
