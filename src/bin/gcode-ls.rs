use anyhow::Result;
use gcode_analyzer::lsp::server::serve;

#[tokio::main]
async fn main() -> Result<()> {
    serve().await
}
