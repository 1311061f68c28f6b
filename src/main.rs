#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizhub_results::run().await {
        eprintln!("quizhub-results fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
