mod common;

use std::io::BufReader;

use common::{
    create_initialize_request, read_next_response_with_id, send_lsp_message, shutdown_server,
    spawn_server,
};

#[test]
fn initialize_smoke() {
    let mut server = spawn_server();
    send_lsp_message(&mut server, &create_initialize_request());

    let stdout = server
        .stdout
        .take()
        .expect("Child stdout should be available");
    let mut reader = BufReader::new(stdout);
    let response = read_next_response_with_id(&mut reader, 1);

    assert_eq!(response["jsonrpc"], "2.0");
    let result = response
        .get("result")
        .expect("Response should contain 'result' field");

    let capabilities = &result["capabilities"];
    assert!(capabilities.is_object(), "Capabilities should be an object");
    assert_eq!(capabilities["hoverProvider"], true, "Should support hover");
    assert_eq!(
        capabilities["completionProvider"]["triggerCharacters"],
        serde_json::json!(["G", "M"])
    );
    assert_eq!(
        capabilities["documentSymbolProvider"], true,
        "Should support document symbols"
    );
    // 1 = Full text sync
    assert_eq!(capabilities["textDocumentSync"], 1);

    assert_eq!(result["serverInfo"]["name"], "gcode-ls");
    assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));

    shutdown_server(server);
}
