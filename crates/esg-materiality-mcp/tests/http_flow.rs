use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn response_header(response: &str) -> &str {
    response.split("\r\n\r\n").next().unwrap_or("")
}

fn spawn_daemon(addr: &str, db_path: &str) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_esg-materialityd"))
        .env("ESG_MATERIALITYD_TRANSPORT", "http")
        .env("ESG_MATERIALITY_HTTP_ADDR", addr)
        .env("ESG_MATERIALITY_DB", db_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn esg-materialityd");
    wait_for_http(addr);
    child
}

fn temp_db_path(tag: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::env::temp_dir()
        .join(format!("esg-materiality-{tag}-{now}.json"))
        .display()
        .to_string()
}

#[test]
fn http_health_and_mcp_call_work() {
    let db_path = temp_db_path("http");
    let addr = reserve_addr();
    let mut child = spawn_daemon(&addr, &db_path);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    let health_json: Value = serde_json::from_str(response_body(&health)).expect("health json");
    assert_eq!(health_json["status"], "ok");
    assert_eq!(health_json["catalog_size"], 24);
    assert_eq!(health_json["storage"]["backend"], "json");

    let init_body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
    let init = send_http(&addr, "POST", "/mcp", init_body);
    assert!(init.starts_with("HTTP/1.1 200"));
    let body = response_body(&init);
    assert!(body.contains("\"serverInfo\""));
    assert!(body.contains("\"esg-materiality-mcp\""));

    let export_body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"materiality_export","arguments":{"ratings":{"ghg-emissions":{"stakeholderImportance":5,"businessImpact":9}},"industry_context":{"industry":"Utilities"}}}}"#;
    let export = send_http(&addr, "POST", "/", export_body);
    assert!(export.starts_with("HTTP/1.1 200"));
    let export_json: Value = serde_json::from_str(response_body(&export)).expect("export json");
    assert_eq!(
        export_json["result"]["structuredContent"]["material_topics"][0]["id"],
        "ghg-emissions"
    );

    let notify = send_http(
        &addr,
        "POST",
        "/mcp",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    );
    assert!(notify.starts_with("HTTP/1.1 204"));

    let _ = child.kill();
    let _ = child.wait();

    let raw = std::fs::read_to_string(&db_path).expect("store file");
    let stored: Value = serde_json::from_str(&raw).expect("store json");
    assert_eq!(
        stored["entries"]["materialityAssessment"]["industryContext"]["industry"],
        "Utilities"
    );
    let _ = std::fs::remove_file(db_path);
}

#[test]
fn http_metrics_and_routing_errors_work() {
    let db_path = temp_db_path("http-metrics");
    let addr = reserve_addr();
    let mut child = spawn_daemon(&addr, &db_path);

    let tool_req = r#"{"jsonrpc":"2.0","id":12,"method":"tools/call","params":{"name":"materiality_derive_impact","arguments":{"financial":6}}}"#;
    let tool_resp = send_http(&addr, "POST", "/mcp", tool_req);
    assert!(tool_resp.starts_with("HTTP/1.1 200"));

    let bad_req = r#"{"jsonrpc":"2.0","id":13,"method":"tools/call","params":{"name":"materiality_classify","arguments":{"ratings":{"ghg-emissions":{"stakeholderImportance":0,"businessImpact":5}}}}}"#;
    let bad_resp = send_http(&addr, "POST", "/mcp", bad_req);
    assert!(bad_resp.starts_with("HTTP/1.1 200"));
    assert!(response_body(&bad_resp).contains("-32602"));

    let metrics = send_http(&addr, "GET", "/metrics", "");
    assert!(metrics.starts_with("HTTP/1.1 200"));
    assert!(response_header(&metrics).contains("text/plain"));
    let metrics_body = response_body(&metrics);
    assert!(metrics_body.contains(
        "esg_materiality_tool_calls_total{tool=\"materiality_derive_impact\",status=\"ok\"} 1"
    ));
    assert!(metrics_body.contains(
        "esg_materiality_tool_calls_total{tool=\"materiality_classify\",status=\"error\"} 1"
    ));
    assert!(metrics_body.contains("esg_materiality_catalog_topics 24"));

    let summary = send_http(&addr, "GET", "/metrics/summary", "");
    let summary_json: Value = serde_json::from_str(response_body(&summary)).expect("summary");
    assert_eq!(summary_json["total_calls"], 2);
    assert_eq!(summary_json["total_errors"], 1);

    let parse_error = send_http(&addr, "POST", "/mcp", "{not json");
    assert!(parse_error.starts_with("HTTP/1.1 400"));
    assert!(response_body(&parse_error).contains("-32700"));

    let wrong_method = send_http(&addr, "PUT", "/mcp", "{}");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));

    let wrong_path = send_http(&addr, "POST", "/rpc", "{}");
    assert!(wrong_path.starts_with("HTTP/1.1 404"));

    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_file(db_path);
}
