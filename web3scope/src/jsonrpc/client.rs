use crate::jsonrpc::error::ClientError;
use crate::jsonrpc::request::Request;
use crate::jsonrpc::response::Response;
use awc::http::header;
use awc::Client;
use serde::{Deserialize, Serialize};
use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpClient {
    id_counter: Arc<AtomicU64>,
    url: String,
    client: Client,
    body_limit: usize,
}

impl HttpClient {
    pub fn new(url: &str, body_limit: usize) -> Self {
        Self {
            id_counter: Arc::new(AtomicU64::new(0)),
            url: url.to_string(),
            client: Client::default(),
            body_limit,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.id_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn request_method<T, R>(
        &self,
        method: &str,
        params: T,
        timeout: Duration,
    ) -> Result<R, ClientError>
    where
        R: 'static,
        for<'de> R: Deserialize<'de>,
        T: Serialize,
        T: std::fmt::Debug,
        R: std::fmt::Debug,
    {
        trace!("Making request {} {:?}", method, params);
        let payload = Request::new(self.next_id(), method, params);
        let res = self
            .client
            .post(&self.url)
            .append_header((header::CONTENT_TYPE, "application/json"))
            .timeout(timeout)
            .send_json(&payload)
            .await;
        let mut res = match res {
            Ok(val) => val,
            Err(e) => return Err(ClientError::FailedToSend(e)),
        };

        trace!("response headers {:?}", res.headers());

        let body_bytes = match res.body().limit(self.body_limit).await {
            Ok(val) => val,
            Err(e) => {
                return Err(ClientError::BadResponse(format!(
                    "Size Limit {} Error {e}",
                    self.body_limit
                )))
            }
        };

        // generic JSON first so a shape mismatch can show what came back
        let json_value: serde_json::Value = match serde_json::from_slice(&body_bytes) {
            Ok(val) => val,
            Err(e) => {
                let body_str = String::from_utf8_lossy(&body_bytes);
                return Err(ClientError::BadResponse(format!(
                    "Failed to parse response as JSON: {e}\nRaw response: {body_str}"
                )));
            }
        };

        let decoded: Response<R> = match serde_json::from_value(json_value.clone()) {
            Ok(val) => val,
            Err(e) => {
                return Err(ClientError::BadResponse(format!(
                    "Failed to deserialize {method} response: {e}\nJSON response: {json_value}"
                )))
            }
        };
        trace!("got response {:#?}", decoded);
        match decoded.data.into_result() {
            Ok(r) => Ok(r),
            Err(e) => Err(ClientError::JsonRpcError {
                code: e.code,
                message: e.message,
                data: format!("{:?}", e.data),
            }),
        }
    }
}

#[test]
fn ids_increase() {
    actix_rt::System::new().block_on(async {
        let client = HttpClient::new("http://localhost:8545", 1024);
        let copy = client.clone();
        assert_eq!(client.next_id(), 1);
        assert_eq!(copy.next_id(), 2);
        assert_eq!(client.url(), "http://localhost:8545");
    });
}
