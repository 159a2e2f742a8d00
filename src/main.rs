#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ortho_portal::run().await
}
