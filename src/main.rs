#[tokio::main]
async fn main() {
    if let Err(e) = carefollow_lib::run().await {
        tracing::error!("{e}");
        eprintln!("carefollow: {e}");
        std::process::exit(1);
    }
}
