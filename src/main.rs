#[tokio::main]
async fn main() -> anyhow::Result<()> {
    centerbook::bootstrapper::run().await
}
