//! Drives the server binary over stdio.

#[path = "../src/fixtures.rs"]
mod fixtures;

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::process::{ChildStdout, Command, Stdio};
use tempfile::TempDir;

fn send(stdin: &mut impl Write, message: Value) {
    writeln!(stdin, "{message}").unwrap();
    stdin.flush().unwrap();
}

/// Read stdout until the response with `id`, requiring every line to be JSON.
fn response(stdout: &mut BufReader<ChildStdout>, id: u64) -> Value {
    loop {
        let mut line = String::new();
        let n = stdout.read_line(&mut line).unwrap();
        assert!(n > 0, "server closed stdout before answering request {id}");
        let message: Value = serde_json::from_str(line.trim_end())
            .unwrap_or_else(|e| panic!("non-JSON output on stdout {line:?}: {e}"));
        if message["id"] == json!(id) {
            return message;
        }
    }
}

#[test]
fn parser_output_stays_off_the_protocol_stream() {
    let tmp = TempDir::new().unwrap();
    // A non-core font without Widths makes pdf-extract print a warning.
    std::fs::write(
        tmp.path().join("custom.pdf"),
        fixtures::pdf_with_text("CustomSans", "penalty clause"),
    )
    .unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_docfs-mcp"))
        .arg(tmp.path())
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    send(
        &mut stdin,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "stdio-test", "version": "0.0.0" }
            }
        }),
    );
    let init = response(&mut stdout, 1);
    assert_eq!(init["result"]["serverInfo"]["name"], json!("docfs-mcp"));

    send(
        &mut stdin,
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    );
    send(
        &mut stdin,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "read_file", "arguments": { "path": "custom.pdf" } }
        }),
    );
    let call = response(&mut stdout, 2);
    assert_ne!(call["result"]["isError"], json!(true));
    let text = call["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("penalty clause"));

    send(
        &mut stdin,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "search_files",
                "arguments": { "query": "PENALTY", "directory": "." }
            }
        }),
    );
    let search = response(&mut stdout, 3);
    let text = search["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("custom.pdf"));

    drop(stdin);
    child.kill().ok();
    child.wait().unwrap();
}
