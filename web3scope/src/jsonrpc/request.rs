#[derive(Serialize, Deserialize, Debug)]
pub struct Request<T> {
    id: u64,
    jsonrpc: String,
    method: String,
    params: T,
}

impl<T> Request<T> {
    pub fn new(id: u64, method: &str, params: T) -> Self {
        Self {
            id,
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

#[test]
fn request_shape() {
    let req = Request::new(7, "eth_call", (serde_json::json!({"to": "0x00"}), "latest"));
    assert_eq!(
        serde_json::to_value(&req).unwrap(),
        serde_json::json!({
            "id": 7,
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{"to": "0x00"}, "latest"]
        })
    );
}
