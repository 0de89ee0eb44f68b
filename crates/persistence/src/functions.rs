//! Function gateway backed by the backend's functions API.

use async_trait::async_trait;
use domain::services::{FunctionGateway, GatewayResponse, StoreError};
use serde_json::{json, Value};

use crate::client::BackendClient;

/// Synchronous executions of remote functions.
#[derive(Debug, Clone)]
pub struct RemoteFunctionGateway {
    client: BackendClient,
}

impl RemoteFunctionGateway {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

/// Execution request; the function body travels as a JSON string.
pub fn execution_body(body: &Value) -> Value {
    json!({ "body": body.to_string(), "async": false })
}

#[async_trait]
impl FunctionGateway for RemoteFunctionGateway {
    async fn execute(&self, function_id: &str, body: Value) -> Result<GatewayResponse, StoreError> {
        let url = self.client.url(&["functions", function_id, "executions"])?;
        let request = self.client.http().post(url).json(&execution_body(&body));

        let (status, payload) = self.client.dispatch(request, "execute_function").await?;

        let execution_status = payload.get("status").and_then(Value::as_str);
        tracing::info!(
            function_id = %function_id,
            status = status.as_u16(),
            execution_status = ?execution_status,
            "Function executed"
        );

        Ok(GatewayResponse {
            ok: status.is_success(),
            payload,
        })
    }
}
