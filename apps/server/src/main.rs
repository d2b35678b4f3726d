use anki_viewer_server::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
