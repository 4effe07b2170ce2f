#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = gracebook::run().await {
        eprintln!("gracebook fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
