use serde::Deserialize;

/// Envelope every RPC response is wrapped in.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum RpcResponse<T> {
    Ok(T),
    Err(String),
}
