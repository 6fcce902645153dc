#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = delta_practice::run().await {
        eprintln!("delta-practice fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
