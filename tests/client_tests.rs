//! HTTP Gateway 客户端测试

#[cfg(feature = "client")]
mod tests {
    use agent_dashboard_core::protocol::unwrap_envelope;
    use agent_dashboard_core::*;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// 捕获到的请求
    struct Captured {
        head: String,
        body: Value,
    }

    /// 启动一次性 HTTP 服务，返回 base url 和请求捕获
    async fn serve_once(status: &'static str, body: String) -> (String, oneshot::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            // 读完 header + Content-Length 指定的 body
            let (head, req_body) = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let head = text[..pos].to_string();
                    let len = head
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= pos + 4 + len {
                        let req_body = String::from_utf8_lossy(&buf[pos + 4..pos + 4 + len]).to_string();
                        break (head, req_body);
                    }
                }
                if n == 0 {
                    panic!("connection closed before request completed");
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let _ = tx.send(Captured {
                head,
                body: serde_json::from_str(&req_body).unwrap_or(Value::Null),
            });
        });

        (format!("http://{}", addr), rx)
    }

    // ==================== 配置测试 ====================

    #[test]
    fn test_config_defaults() {
        let config = GatewayConfig::new("http://localhost:18789/");
        assert_eq!(config.url, "http://localhost:18789");
        assert_eq!(config.invoke_url(), "http://localhost:18789/tools/invoke");
        assert_eq!(config.session_key, "main");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.poll_interval().as_millis(), 3000);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = GatewayConfig::new("http://localhost:1");
        config.url = String::new();
        assert!(matches!(HttpGateway::new(&config), Err(Error::Config(_))));
    }

    // ==================== 信封测试 ====================

    #[test]
    fn test_envelope_unwrapping() {
        let details = json!({"ok": true, "result": {"details": {"agents": []}}});
        assert_eq!(unwrap_envelope("agents_list", details).unwrap(), json!({"agents": []}));

        let text = json!({"ok": true, "result": {"content": [{"type": "text", "text": "[1,2]"}]}});
        assert_eq!(unwrap_envelope("agents_list", text).unwrap(), json!([1, 2]));

        let plain = json!({"ok": true, "result": {"content": [{"type": "text", "text": "hello"}]}});
        assert_eq!(unwrap_envelope("read_file", plain).unwrap(), json!("hello"));

        // 没有信封的响应原样透传
        assert_eq!(unwrap_envelope("sessions_send", json!({"ok": true})).unwrap(), json!({"ok": true}));

        let failed = json!({"ok": false, "error": {"message": "no such tool"}});
        match unwrap_envelope("missing", failed) {
            Err(Error::Gateway { tool, message }) => {
                assert_eq!(tool, "missing");
                assert_eq!(message, "no such tool");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    // ==================== HTTP 测试 ====================

    #[tokio::test]
    async fn test_invoke_posts_tool_and_args() {
        let (url, captured) =
            serve_once("200 OK", json!({"ok": true, "result": {"details": [{"id": "main"}]}}).to_string()).await;
        let gateway = HttpGateway::new(&GatewayConfig::new(&url).with_token("secret")).unwrap();

        let payload = gateway.request(&Request::AgentsList {}).await.unwrap();
        assert_eq!(payload, json!([{"id": "main"}]));

        let captured = captured.await.unwrap();
        assert!(captured.head.starts_with("POST /tools/invoke "));
        assert!(captured
            .head
            .lines()
            .any(|l| l.eq_ignore_ascii_case("authorization: Bearer secret")));
        assert_eq!(captured.body, json!({"tool": "agents_list", "args": {}}));
    }

    #[tokio::test]
    async fn test_invoke_without_token() {
        let (url, captured) = serve_once("200 OK", json!({"ok": true}).to_string()).await;
        let gateway = HttpGateway::new(&GatewayConfig::new(&url)).unwrap();

        let request = Request::SessionsSend {
            session_key: "main".to_string(),
            message: "hi".to_string(),
        };
        assert_eq!(gateway.request(&request).await.unwrap(), json!({"ok": true}));

        let captured = captured.await.unwrap();
        assert!(!captured.head.to_ascii_lowercase().contains("authorization"));
        assert_eq!(
            captured.body,
            json!({"tool": "sessions_send", "args": {"sessionKey": "main", "message": "hi"}})
        );
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (url, _captured) = serve_once("500 Internal Server Error", "boom".to_string()).await;
        let gateway = HttpGateway::new(&GatewayConfig::new(&url)).unwrap();

        match gateway.invoke("agents_list", json!({})).await {
            Err(Error::Gateway { tool, message }) => {
                assert_eq!(tool, "agents_list");
                assert!(message.contains("500"));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_envelope_on_error_status() {
        let body = json!({"ok": false, "error": "unauthorized"}).to_string();
        let (url, _captured) = serve_once("401 Unauthorized", body).await;
        let gateway = HttpGateway::new(&GatewayConfig::new(&url)).unwrap();

        match gateway.invoke("agents_list", json!({})).await {
            Err(Error::Gateway { message, .. }) => assert_eq!(message, "unauthorized"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // 绑定后立即释放端口
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = HttpGateway::new(&GatewayConfig::new(&format!("http://{}", addr))).unwrap();
        assert!(matches!(
            gateway.invoke("agents_list", json!({})).await,
            Err(Error::Http(_))
        ));
    }
}
