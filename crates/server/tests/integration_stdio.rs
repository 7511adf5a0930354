mod common;

use common::KillOnDrop;
use serde_json::{Value, json};
use std::io::{BufRead as _, BufReader, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

fn spawn_general_server() -> Child {
    Command::new(env!("CARGO_BIN_EXE_sauce-api-mcp"))
        .arg("--allow-tty")
        .arg("--log-level")
        .arg("warn")
        .env("SAUCE_USERNAME", "u1")
        .env("SAUCE_ACCESS_KEY", "k1")
        .env("SAUCE_API_URL", "http://127.0.0.1:1")
        .env_remove("SAUCE_REGION")
        .env_remove("SAUCE_MCP_TIMEOUT_SECS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn sauce-api-mcp")
}

fn send(stdin: &mut ChildStdin, msg: &Value) {
    writeln!(stdin, "{msg}").expect("write request");
    stdin.flush().expect("flush request");
}

fn reply(lines: &Receiver<String>, id: u64) -> Value {
    let deadline = Instant::now() + REPLY_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let line = lines
            .recv_timeout(remaining)
            .unwrap_or_else(|_| panic!("no reply for request {id}"));
        let Ok(msg) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        if msg.get("id") == Some(&json!(id)) {
            return msg;
        }
    }
}

#[test]
fn speaks_mcp_over_stdio() {
    let mut server = KillOnDrop(spawn_general_server());
    let mut stdin = server.0.stdin.take().expect("stdin");
    let stdout = server.0.stdout.take().expect("stdout");

    let (tx, lines) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    send(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "stdio-test", "version": "0.0.0"}
            }
        }),
    );
    let init = reply(&lines, 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "sauce-api-mcp");
    assert!(init["result"]["capabilities"]["tools"].is_object());
    assert!(init["result"]["capabilities"]["resources"].is_object());

    send(
        &mut stdin,
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    );

    send(&mut stdin, &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
    let list = reply(&lines, 2);
    let tools = list["result"]["tools"].as_array().cloned().unwrap_or_default();
    assert_eq!(tools.len(), 35);
    assert!(tools.iter().any(|t| t["name"] == "get_account_info"));

    send(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "get_team", "arguments": {"id": "t1", "bogus": true}}
        }),
    );
    let call = reply(&lines, 3);
    assert_eq!(call["result"]["isError"], true);
    assert_eq!(
        call["result"]["structuredContent"]["error"]["kind"],
        "invalid_argument"
    );

    send(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "no_such_tool", "arguments": {}}
        }),
    );
    let unknown = reply(&lines, 4);
    assert!(unknown.get("error").is_some(), "{unknown}");

    send(&mut stdin, &json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}));
    let resources = reply(&lines, 5);
    assert_eq!(resources["result"]["resources"][0]["uri"], "sauce://account");

    drop(stdin);
    let deadline = Instant::now() + REPLY_TIMEOUT;
    let status = loop {
        if let Some(status) = server.0.try_wait().expect("try_wait") {
            break status;
        }
        assert!(Instant::now() < deadline, "server did not exit on stdin EOF");
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success(), "exit status {status}");
}
