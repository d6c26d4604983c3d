use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::server::McpServer;

/// Largest request body accepted on either transport.
const MAX_BODY_BYTES: usize = 1 << 20;

impl McpServer {
    /// Reads requests from stdin until EOF. Each request is answered in the
    /// framing it arrived in: a bare JSON line or a `Content-Length` frame.
    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = io::BufReader::new(stdin.lock());
        let mut stdout = io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }

            let trimmed = line.trim_end_matches(['\r', '\n']).trim_start();
            if trimmed.is_empty() {
                continue;
            }

            let (payload, frame) = if is_stdio_header_line(trimmed) {
                let content_length = match read_stdio_content_length(&mut reader, trimmed) {
                    Ok(v) => v,
                    Err(err) => {
                        warn!(error = %err, "invalid stdio frame");
                        let response = JsonRpcResponse::error(
                            Value::Null,
                            PARSE_ERROR,
                            format!("invalid stdio frame: {err}"),
                        );
                        write_stdio_response(&mut stdout, &response, StdioFrame::LineDelimited)?;
                        continue;
                    }
                };

                if content_length > MAX_BODY_BYTES {
                    warn!(content_length, "stdio frame exceeds body limit");
                    let declared = u64::try_from(content_length).unwrap_or(u64::MAX);
                    io::copy(&mut (&mut reader).take(declared), &mut io::sink())?;
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("frame body exceeds {MAX_BODY_BYTES} bytes"),
                    );
                    write_stdio_response(&mut stdout, &response, StdioFrame::ContentLength)?;
                    continue;
                }

                let mut body = vec![0_u8; content_length];
                if let Err(err) = reader.read_exact(&mut body) {
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("invalid stdio frame body: {err}"),
                    );
                    write_stdio_response(&mut stdout, &response, StdioFrame::ContentLength)?;
                    continue;
                }
                (body, StdioFrame::ContentLength)
            } else {
                (trimmed.as_bytes().to_vec(), StdioFrame::LineDelimited)
            };

            let request: JsonRpcRequest = match serde_json::from_slice(&payload) {
                Ok(v) => v,
                Err(err) => {
                    let response =
                        JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {err}"));
                    write_stdio_response(&mut stdout, &response, frame)?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request) {
                write_stdio_response(&mut stdout, &response, frame)?;
            }
        }

        Ok(())
    }

    /// Serves one connection at a time until the listener fails.
    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "esg-materiality http listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        warn!(error = %err, "http request error");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let Some(req) = read_http_request(&stream)? else {
            return Ok(());
        };
        let response = self.dispatch_http_request(&req);
        write_http_response(&mut stream, response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        if req.method == "GET" && req.path == "/health" {
            return HttpResponse::json(200, &self.health());
        }

        if req.method == "GET" && req.path == "/metrics" {
            return HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.render_metrics_text(),
            );
        }

        if req.method == "GET" && req.path == "/metrics/summary" {
            return HttpResponse::json(200, &self.render_metrics_summary());
        }

        if req.method != "POST" {
            return HttpResponse::json(
                405,
                &json!({"error":"method_not_allowed","message":"supported endpoints: GET /health, GET /metrics, GET /metrics/summary, POST /mcp"}),
            );
        }

        if req.path != "/mcp" && req.path != "/" {
            return HttpResponse::json(404, &json!({"error":"not_found","message":"use POST /mcp"}));
        }

        if req.content_length > MAX_BODY_BYTES {
            return HttpResponse::json(
                413,
                &json!({"error":"payload_too_large","message": format!("request body exceeds {MAX_BODY_BYTES} bytes")}),
            );
        }

        let rpc: JsonRpcRequest = match serde_json::from_slice(&req.body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(
                    400,
                    &json!({"jsonrpc":"2.0","id": Value::Null, "error":{"code": PARSE_ERROR,"message": format!("parse error: {err}")}}),
                )
            }
        };
        match self.handle_request(rpc) {
            Some(v) => match serde_json::to_value(v) {
                Ok(payload) => HttpResponse::json(200, &payload),
                Err(_) => HttpResponse::json(
                    500,
                    &json!({"error":"internal_error","message":"failed to serialize rpc response"}),
                ),
            },
            None => HttpResponse::empty(204),
        }
    }
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    content_length: usize,
    body: Vec<u8>,
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body: body.into_bytes(),
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: Vec::new(),
        }
    }
}

fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(None);
    }

    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(target) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };
    let path = request_path(target).to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
        }
    }

    // Oversized bodies are left unread; the caller answers 413 and closes.
    let mut body = Vec::new();
    if content_length > 0 && content_length <= MAX_BODY_BYTES {
        body = vec![0_u8; content_length];
        reader.read_exact(&mut body)?;
    }
    Ok(Some(HttpRequest {
        method: method.to_string(),
        path,
        content_length,
        body,
    }))
}

fn write_http_response(stream: &mut TcpStream, response: HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

fn request_path(target: &str) -> &str {
    target.split_once('?').map_or(target, |(path, _)| path)
}

#[derive(Clone, Copy)]
enum StdioFrame {
    LineDelimited,
    ContentLength,
}

fn write_stdio_response(
    stdout: &mut io::Stdout,
    response: &JsonRpcResponse,
    frame: StdioFrame,
) -> io::Result<()> {
    match frame {
        StdioFrame::LineDelimited => {
            let serialized = serde_json::to_string(response)?;
            writeln!(stdout, "{serialized}")?;
        }
        StdioFrame::ContentLength => {
            let serialized = serde_json::to_vec(response)?;
            write!(stdout, "Content-Length: {}\r\n\r\n", serialized.len())?;
            stdout.write_all(&serialized)?;
        }
    }
    stdout.flush()
}

fn is_stdio_header_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("content-length:") || lower.starts_with("content-type:")
}

fn read_stdio_content_length<R: BufRead>(reader: &mut R, first_line: &str) -> io::Result<usize> {
    let mut content_length = parse_content_length(first_line);
    let mut header_line = String::new();
    loop {
        header_line.clear();
        if reader.read_line(&mut header_line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected eof while reading frame headers",
            ));
        }
        let trimmed = header_line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(v) = parse_content_length(trimmed) {
            content_length = Some(v);
        }
    }
    content_length
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing content-length header"))
}

fn parse_content_length(line: &str) -> Option<usize> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn content_length_headers_are_parsed() {
        let mut reader = Cursor::new(b"Content-Type: application/json\r\n\r\n{}".to_vec());
        let len = read_stdio_content_length(&mut reader, "Content-Length: 2").expect("length");
        assert_eq!(len, 2);
    }

    #[test]
    fn missing_content_length_is_an_error() {
        let mut reader = Cursor::new(b"\r\n".to_vec());
        let err = read_stdio_content_length(&mut reader, "Content-Type: application/json")
            .expect_err("missing length");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn query_string_is_ignored_for_routing() {
        assert_eq!(request_path("/mcp?trace=1&flag"), "/mcp");
        assert_eq!(request_path("/health"), "/health");
    }

    #[test]
    fn non_post_requests_get_405_and_unknown_paths_404() {
        let server = McpServer::in_memory().expect("server");
        let get = HttpRequest {
            method: "GET".to_string(),
            path: "/mcp".to_string(),
            content_length: 0,
            body: Vec::new(),
        };
        assert_eq!(server.dispatch_http_request(&get).status, 405);

        let post = HttpRequest {
            method: "POST".to_string(),
            path: "/elsewhere".to_string(),
            content_length: 2,
            body: b"{}".to_vec(),
        };
        assert_eq!(server.dispatch_http_request(&post).status, 404);
    }

    #[test]
    fn notification_over_http_is_204() {
        let server = McpServer::in_memory().expect("server");
        let body = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_vec();
        let req = HttpRequest {
            method: "POST".to_string(),
            path: "/mcp".to_string(),
            content_length: body.len(),
            body,
        };
        let response = server.dispatch_http_request(&req);
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn oversized_http_body_is_refused() {
        let server = McpServer::in_memory().expect("server");
        let req = HttpRequest {
            method: "POST".to_string(),
            path: "/mcp".to_string(),
            content_length: MAX_BODY_BYTES + 1,
            body: Vec::new(),
        };
        let response = server.dispatch_http_request(&req);
        assert_eq!(response.status, 413);
        assert_eq!(http_reason_phrase(413), "Payload Too Large");
    }
}
