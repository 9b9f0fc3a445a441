//! Integration tests for the sail-rpc JSON-RPC server.
//!
//! These tests start the compiled binary against a temp data root, read the
//! advertised port off stdout, and drive the HTTP surface end to end.

use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use zip::write::SimpleFileOptions;

/// Write a minimal export archive into the test environment.
fn create_fixture_zip(dir: &Path) -> PathBuf {
    let path = dir.join("app.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, xml) in [
        (
            "content/Home.xml",
            "<contentHaul><interface><uuid>_t-home</uuid><name>Home</name>\
             <definition>a!gridField(data: rule!calc())</definition>\
             </interface></contentHaul>",
        ),
        (
            "content/calc.xml",
            "<contentHaul><rule><uuid>_t-calc</uuid><name>calc</name>\
             <definition>1 + 1</definition></rule></contentHaul>",
        ),
    ] {
        writer
            .start_file(name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

struct RpcServerHandle {
    child: tokio::process::Child,
    port: u16,
}

impl RpcServerHandle {
    async fn stop(mut self) {
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Start the RPC binary and wait for it to advertise its port.
async fn start_rpc_server(data_root: &Path, preload_zip: Option<&Path>) -> RpcServerHandle {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_sail-rpc"));
    command
        .arg("--port")
        .arg("0")
        .arg("--data-root")
        .arg(data_root)
        .env_remove("APPIAN_URL")
        .env_remove("APPIAN_API_KEY")
        .env_remove("APPIAN_APP_UUID")
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    if let Some(zip) = preload_zip {
        command.arg("--preload-zip").arg(zip).arg("--preload-label").arg("app");
    }

    let mut child = command.spawn().expect("failed to spawn sail-rpc");
    let stdout = child.stdout.take().unwrap();
    let mut lines = BufReader::new(stdout).lines();

    let port = tokio::time::timeout(Duration::from_secs(30), async {
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(port) = line.strip_prefix("RPC_PORT=") {
                return port.trim().parse::<u16>().ok();
            }
        }
        None
    })
    .await
    .expect("server did not start in time")
    .expect("server exited without advertising a port");

    RpcServerHandle { child, port }
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Value {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .expect("rpc request failed");
    assert!(response.status().is_success());
    response.json().await.expect("rpc response was not json")
}

/// Make an RPC call and unwrap the result.
async fn rpc_call(port: u16, method: &str, params: Value) -> Value {
    let payload = rpc_call_raw(port, method, params).await;
    assert!(
        payload.get("error").is_none(),
        "rpc error: {}",
        payload["error"]
    );
    payload["result"].clone()
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), None).await;

    let response = reqwest::get(format!("http://127.0.0.1:{}/health", server.port))
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.stop().await;
}

#[tokio::test]
async fn test_preload_then_query() {
    let temp_dir = TempDir::new().unwrap();
    let zip_path = create_fixture_zip(temp_dir.path());
    let server = start_rpc_server(temp_dir.path(), Some(&zip_path)).await;

    let apps = rpc_call(server.port, "list_applications", json!({})).await;
    assert_eq!(apps["applications"], json!(["app"]));

    let listed = rpc_call(server.port, "list_objects", json!({"label": "app"})).await;
    assert_eq!(listed["objects"].as_array().unwrap().len(), 2);

    let users = rpc_call(
        server.port,
        "find_component_users",
        json!({"label": "app", "component": "a!gridField"}),
    )
    .await;
    assert_eq!(users["users"].as_array().unwrap().len(), 1);
    assert_eq!(users["users"][0]["id"], "_t-home");

    let source = rpc_call(
        server.port,
        "get_sail_source",
        json!({"label": "app", "id": "_t-calc"}),
    )
    .await;
    assert_eq!(source["source_text"], "1 + 1");

    server.stop().await;
}

#[tokio::test]
async fn test_load_over_rpc() {
    let temp_dir = TempDir::new().unwrap();
    let zip_path = create_fixture_zip(temp_dir.path());
    let server = start_rpc_server(temp_dir.path(), None).await;

    let report = rpc_call(
        server.port,
        "load_application",
        json!({"label": "loaded", "zip_path": zip_path.to_str().unwrap()}),
    )
    .await;
    assert_eq!(report["object_count"], 2);

    let hits = rpc_call(
        server.port,
        "search_objects",
        json!({"label": "loaded", "query": "calc"}),
    )
    .await;
    assert_eq!(hits["hits"][0]["name"], "calc");

    server.stop().await;
}

#[tokio::test]
async fn test_rpc_error_shape() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), None).await;

    let payload = rpc_call_raw(server.port, "list_objects", json!({"label": "nowhere"})).await;
    assert!(payload.get("result").is_none());
    assert_eq!(payload["error"]["code"], -32003);
    assert!(payload["error"]["message"]
        .as_str()
        .unwrap()
        .contains("nowhere"));

    let payload = rpc_call_raw(server.port, "bogus_method", json!({})).await;
    assert_eq!(payload["error"]["code"], -32602);

    server.stop().await;
}
