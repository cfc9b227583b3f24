use std::thread;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::config::{init_logging, Config};
use crate::lsp::backend::Backend;

/// Start the LSP server on stdin/stdout
pub async fn serve() -> Result<()> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    let registry = config.build_registry()?;
    log::info!(
        "Loaded machine profiles: {}",
        registry.list_profiles().join(", ")
    );

    // Under the integration test, exit after a short delay so the test can read stdout to EOF.
    if std::env::var("GCODE_LS_TEST_EXIT").as_deref() == Ok("1") {
        thread::spawn(|| {
            thread::sleep(Duration::from_secs(1));
            std::process::exit(0);
        });
    }

    let (service, socket) =
        LspService::build(move |client| Backend::new(client, config, registry)).finish();

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
