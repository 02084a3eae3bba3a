use super::protocol::{decode_result, Params, RpcRequest};
use super::state::ConnectionStateMachine;
use crate::error::{Result, SdkError};
use tracing::{debug, trace};

/// HTTP+JSON request/response channel to the daemon's loopback endpoint.
///
/// No retries happen here; a failed round-trip marks the connection as lost
/// and is reported to the caller.
#[derive(Clone)]
pub struct RpcTransport {
    client: reqwest::Client,
    endpoint: String,
    state: ConnectionStateMachine,
}

impl RpcTransport {
    pub fn new(host: &str, port: u16, state: ConnectionStateMachine) -> Result<Self> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            endpoint: format!("http://{}:{}/", host, port),
            state,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn request(&self, method: &str, params: Params) -> Result<Params> {
        let envelope = RpcRequest::new(method, &params);
        trace!(method = %method, params = ?params, "Sending RPC request");

        let response = match self.client.post(&self.endpoint).json(&envelope).send().await {
            Ok(response) => response,
            Err(e) => return Err(self.not_launched(method, e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(self.not_launched(method, format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.not_launched(method, e.to_string()))?;

        let result = decode_result(&body)?;
        trace!(method = %method, "RPC request succeeded");
        Ok(result)
    }

    fn not_launched(&self, method: &str, reason: String) -> SdkError {
        debug!(method = %method, reason = %reason, "Daemon did not answer");
        self.state.lose_connection();
        SdkError::DaemonNotLaunched {
            endpoint: self.endpoint.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::state::ConnectionState;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connected_state() -> ConnectionStateMachine {
        let state = ConnectionStateMachine::new();
        state.begin_launch();
        state.transition(&[ConnectionState::Connecting], ConnectionState::Connected);
        state
    }

    fn transport_for(server: &MockServer, state: ConnectionStateMachine) -> RpcTransport {
        RpcTransport::new("127.0.0.1", server.address().port(), state).unwrap()
    }

    #[test]
    fn test_endpoint_has_no_path() {
        let transport =
            RpcTransport::new("localhost", 5279, ConnectionStateMachine::new()).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:5279/");
    }

    #[tokio::test]
    async fn test_posts_envelope_and_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_json(json!({"method": "version", "params": {}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"version": "0.87.0"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, connected_state());
        let result = transport.request("version", Params::new()).await.unwrap();
        assert_eq!(result.get("version"), Some(&json!("0.87.0")));
    }

    #[tokio::test]
    async fn test_non_success_status_disconnects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let state = connected_state();
        let transport = transport_for(&server, state.clone());
        let err = transport.request("status", Params::new()).await.unwrap_err();

        assert!(matches!(err, SdkError::DaemonNotLaunched { .. }));
        assert_eq!(state.current(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_disconnects() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let state = connected_state();
        let transport = RpcTransport::new("127.0.0.1", port, state.clone()).unwrap();
        let err = transport.request("status", Params::new()).await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(state.current(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_malformed_body_is_mismatch_not_disconnect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
            .mount(&server)
            .await;

        let state = connected_state();
        let transport = transport_for(&server, state.clone());
        let err = transport.request("status", Params::new()).await.unwrap_err();

        assert!(matches!(&err, SdkError::ResponseMismatch(f) if f == "result"));
        assert_eq!(state.current(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_failure_while_connecting_keeps_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = ConnectionStateMachine::new();
        state.begin_launch();
        let transport = transport_for(&server, state.clone());
        assert!(transport.request("status", Params::new()).await.is_err());
        assert_eq!(state.current(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_failure_does_not_override_terminated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = ConnectionStateMachine::new();
        state.terminate();
        let transport = transport_for(&server, state.clone());
        assert!(transport.request("status", Params::new()).await.is_err());
        assert_eq!(state.current(), ConnectionState::Terminated);
    }
}
