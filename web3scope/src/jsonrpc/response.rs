use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JsonRpcError<E> {
    pub code: i64,
    pub message: String,
    pub data: Option<E>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ResponseData<R, E> {
    Error { error: JsonRpcError<E> },
    Success { result: R },
}

impl<R, E> ResponseData<R, E> {
    /// Consume response and return value
    pub fn into_result(self) -> Result<R, JsonRpcError<E>> {
        match self {
            ResponseData::Success { result } => Ok(result),
            ResponseData::Error { error } => Err(error),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Response<R, E = Value> {
    pub id: Value,
    pub jsonrpc: String,
    #[serde(flatten)]
    pub data: ResponseData<R, E>,
}

#[test]
fn null_result_is_success() {
    // a pending transaction has no receipt yet
    let response: Response<Option<Value>> =
        serde_json::from_str(r#"{"jsonrpc": "2.0", "result": null, "id": 3}"#).unwrap();
    assert_eq!(response.data.into_result().unwrap(), None);
}

#[test]
fn revert_error() {
    let response: Response<String> = serde_json::from_str(
        r#"{"jsonrpc": "2.0", "error": {"code": 3, "message": "execution reverted", "data": "0x08c379a0"}, "id": 1}"#,
    )
    .unwrap();
    let err = response.data.into_result().unwrap_err();
    assert_eq!(err.code, 3);
    assert_eq!(err.message, "execution reverted");
    assert_eq!(err.data, Some(Value::String("0x08c379a0".to_string())));
}
