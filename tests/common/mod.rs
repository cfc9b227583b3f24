//! Stdio harness for driving `gcode-ls` from integration tests
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

const SERVER_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(200);

pub fn start_session() -> (Child, BufReader<ChildStdout>) {
    let mut server = spawn_server();

    send_lsp_message(&mut server, &create_initialize_request());
    let stdout = server
        .stdout
        .take()
        .expect("Child stdout should be available");
    let mut reader = BufReader::new(stdout);
    read_next_response_with_id(&mut reader, 1);

    let initialized_notification = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "initialized",
        "params": {}
    });
    send_lsp_message(&mut server, &initialized_notification);

    (server, reader)
}

pub fn spawn_server() -> Child {
    let bin_path = std::env::var("CARGO_BIN_EXE_gcode-ls")
        .unwrap_or_else(|_| "target/debug/gcode-ls".to_string());

    Command::new(bin_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("GCODE_LS_TEST_EXIT", "1")
        .spawn()
        .expect("Failed to spawn language server")
}

pub fn create_initialize_request() -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "processId": null,
            "rootUri": null,
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }
    })
}

pub fn open_document(server: &mut Child, uri: &str, text: &str) {
    let did_open = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "textDocument/didOpen",
        "params": {
            "textDocument": {
                "uri": uri,
                "languageId": "gcode",
                "version": 1,
                "text": text
            }
        }
    });
    send_lsp_message(server, &did_open);
}

pub fn send_lsp_message(child: &mut Child, message: &Value) {
    let body = message.to_string();
    let request = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

    let stdin = child
        .stdin
        .as_mut()
        .expect("Child stdin should be available");
    stdin
        .write_all(request.as_bytes())
        .expect("Failed to write request");
    stdin.flush().expect("Failed to flush stdin");
}

pub fn read_message(reader: &mut BufReader<ChildStdout>) -> Value {
    let start_time = Instant::now();
    let mut content_length = None;

    loop {
        if start_time.elapsed() > SERVER_TIMEOUT {
            panic!("Timeout waiting for response headers");
        }

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => panic!("Unexpected EOF while reading headers"),
            Ok(_) => {
                if line.trim().is_empty() {
                    break;
                }
                if let Some(length_str) = line.strip_prefix("Content-Length:") {
                    content_length = Some(
                        length_str
                            .trim()
                            .parse::<usize>()
                            .expect("Invalid Content-Length header"),
                    );
                }
            }
            Err(e) => panic!("Error reading headers: {}", e),
        }
    }

    let mut body = vec![0u8; content_length.expect("Missing Content-Length header")];
    std::io::Read::read_exact(reader, &mut body).expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Valid JSON message")
}

pub fn read_next_response_with_id(reader: &mut BufReader<ChildStdout>, expected_id: u64) -> Value {
    // Skip log messages and other notifications
    loop {
        let message = read_message(reader);
        if message.get("id").and_then(Value::as_u64) == Some(expected_id) {
            return message;
        }
    }
}

pub fn read_next_notification(reader: &mut BufReader<ChildStdout>, method: &str) -> Value {
    loop {
        let message = read_message(reader);
        if message.get("method").and_then(Value::as_str) == Some(method) {
            return message;
        }
    }
}

pub fn shutdown_server(mut child: Child) {
    drop(child.stdin.take());
    std::thread::sleep(SHUTDOWN_GRACE_PERIOD);

    match child.try_wait() {
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(e) => panic!("Error checking server status: {}", e),
    }
}
