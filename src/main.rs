#[tokio::main]
async fn main() -> std::io::Result<()> {
    remedia::run().await
}
