#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nora_pos_lib::run().await
}
