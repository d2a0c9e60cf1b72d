//! Integration tests for the reqwest-backed transport.
//!
//! These tests use a local `httptest` mock server and never touch the real
//! network. The mock server listens on loopback, which the URL normalizer
//! rejects, so they drive `ReqwestTransport` directly.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httptest::{matchers::*, responders::*, Expectation, Server};
    use site_status::{BatchConfig, ErrorCategory, ReqwestTransport, Transport, TransportError};

    fn transport(timeout_secs: u64) -> ReqwestTransport {
        let config = BatchConfig {
            timeout_secs,
            ..Default::default()
        };
        ReqwestTransport::from_config(&config).expect("client should build")
    }

    #[tokio::test]
    async fn test_probe_reports_ok_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .respond_with(status_code(200).body("Hello, World!")),
        );

        let url = format!("http://{}/", server.addr());
        let probe = transport(5).probe(&url).await.expect("request should succeed");

        assert_eq!(probe.status_code, 200);
        assert_eq!(probe.final_url, url);
    }

    #[tokio::test]
    async fn test_probe_reports_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/missing"))
                .respond_with(status_code(404)),
        );

        let url = format!("http://{}/missing", server.addr());
        let probe = transport(5).probe(&url).await.expect("request should succeed");
        assert_eq!(probe.status_code, 404);
    }

    #[tokio::test]
    async fn test_probe_follows_redirects() {
        let server = Server::run();
        let final_url = format!("http://{}/final", server.addr());

        server.expect(
            Expectation::matching(request::method_path("GET", "/redirect"))
                .respond_with(status_code(301).append_header("Location", final_url.as_str())),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/final"))
                .respond_with(status_code(200)),
        );

        let url = format!("http://{}/redirect", server.addr());
        let probe = transport(5).probe(&url).await.expect("request should succeed");

        assert_eq!(probe.status_code, 200);
        assert_eq!(probe.final_url, final_url);
    }

    #[tokio::test]
    async fn test_probe_sends_browser_headers() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/"),
                request::headers(contains(key("user-agent"))),
                request::headers(contains(key("accept-language"))),
            ])
            .respond_with(status_code(200)),
        );

        let url = format!("http://{}/", server.addr());
        transport(5).probe(&url).await.expect("request should succeed");
    }

    #[tokio::test]
    async fn test_probe_times_out() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/slow")).respond_with(
                delay_and_then(Duration::from_secs(3), status_code(200)),
            ),
        );

        let url = format!("http://{}/slow", server.addr());
        let err = transport(1).probe(&url).await.expect_err("request should time out");

        assert_eq!(err, TransportError::Timeout);
        assert_eq!(err.category(), ErrorCategory::Timeout);
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        // Grab a free port, then close it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let url = format!("http://127.0.0.1:{port}/");
        let err = transport(2).probe(&url).await.expect_err("nothing is listening");
        assert_eq!(err.category(), ErrorCategory::Connection);
    }
}
