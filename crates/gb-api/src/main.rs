#[tokio::main]
async fn main() {
    if let Err(err) = gb_api::run().await {
        tracing::error!(error = %err, "gb-api failed");
        std::process::exit(1);
    }
}
