/// ENS text record resolution over Ethereum JSON-RPC
///
/// Looks up the name's resolver in the ENS registry, then calls
/// `text(bytes32,string)` on that resolver. Only the direct registry path is
/// supported; wildcard and off-chain resolvers are not followed.
use crate::{
    config::AppConfig,
    error::{AttestError, AttestResult},
    registry::{TextKey, TextResolver},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tracing::debug;

/// `resolver(bytes32)`
const RESOLVER_SELECTOR: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
/// `text(bytes32,string)`
const TEXT_SELECTOR: [u8; 4] = [0x59, 0xd1, 0xd4, 0x3c];

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// EIP-137 namehash of a canonical name
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
        node = keccak256(&buf);
    }

    node
}

/// Calldata for `resolver(node)`
fn encode_resolver_call(node: &[u8; 32]) -> String {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&RESOLVER_SELECTOR);
    data.extend_from_slice(node);
    format!("0x{}", hex::encode(data))
}

/// Calldata for `text(node, key)` with the key ABI-encoded as a dynamic string
fn encode_text_call(node: &[u8; 32], key: &str) -> String {
    let key = key.as_bytes();
    let padded_len = key.len().div_ceil(32) * 32;

    let mut data = Vec::with_capacity(4 + 96 + padded_len);
    data.extend_from_slice(&TEXT_SELECTOR);
    data.extend_from_slice(node);
    data.extend_from_slice(&abi_word(0x40));
    data.extend_from_slice(&abi_word(key.len() as u64));
    data.extend_from_slice(key);
    data.resize(4 + 96 + padded_len, 0);
    format!("0x{}", hex::encode(data))
}

fn abi_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn read_word(bytes: &[u8], at: usize) -> AttestResult<usize> {
    let end = at
        .checked_add(32)
        .ok_or_else(|| AttestError::Parse(format!("ABI offset {} out of range", at)))?;
    let word = bytes
        .get(at..end)
        .ok_or_else(|| AttestError::Parse(format!("ABI payload truncated at offset {}", at)))?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AttestError::Parse("ABI word out of range".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(tail))
        .map_err(|_| AttestError::Parse("ABI word out of range".to_string()))
}

fn decode_hex(payload: &str) -> AttestResult<Vec<u8>> {
    let stripped = payload
        .strip_prefix("0x")
        .ok_or_else(|| AttestError::Parse(format!("Expected 0x-prefixed hex, got '{}'", payload)))?;
    hex::decode(stripped).map_err(|e| AttestError::Parse(format!("Invalid hex payload: {}", e)))
}

/// Decode an `address` return value; the zero address is absent
fn decode_address(payload: &str) -> AttestResult<Option<String>> {
    let bytes = decode_hex(payload)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() < 32 {
        return Err(AttestError::Parse(format!("Address payload too short: {} bytes", bytes.len())));
    }

    let address = &bytes[12..32];
    if address.iter().all(|b| *b == 0) {
        return Ok(None);
    }
    Ok(Some(format!("0x{}", hex::encode(address))))
}

/// Decode a `string` return value; an empty string is absent
fn decode_string(payload: &str) -> AttestResult<Option<String>> {
    let bytes = decode_hex(payload)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let offset = read_word(&bytes, 0)?;
    let len = read_word(&bytes, offset)?;
    let (start, end) = offset
        .checked_add(32)
        .and_then(|start| start.checked_add(len).map(|end| (start, end)))
        .ok_or_else(|| AttestError::Parse("String length out of range".to_string()))?;
    let raw = bytes
        .get(start..end)
        .ok_or_else(|| AttestError::Parse("String payload truncated".to_string()))?;

    let text = String::from_utf8(raw.to_vec())
        .map_err(|e| AttestError::Parse(format!("Text record is not UTF-8: {}", e)))?;
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (CallParams<'a>, &'static str),
}

#[derive(Serialize)]
struct CallParams<'a> {
    to: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Text resolver backed by the ENS registry contract
#[derive(Clone)]
pub struct EnsTextResolver {
    http_client: reqwest::Client,
    rpc_url: String,
    registry: String,
}

impl EnsTextResolver {
    /// Create a new ENS resolver from configuration
    pub fn new(config: &AppConfig) -> AttestResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http.call_timeout)
            .build()
            .map_err(|e| AttestError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rpc_url: config.registry.rpc_url.clone(),
            registry: config.registry.ens_registry.clone(),
        })
    }

    /// Resolver contract currently set for a node
    async fn resolver_address(&self, node: &[u8; 32]) -> AttestResult<Option<String>> {
        let result = self.eth_call(&self.registry, encode_resolver_call(node)).await?;
        decode_address(&result)
    }

    async fn eth_call(&self, to: &str, data: String) -> AttestResult<String> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (CallParams { to, data }, "latest"),
        };

        let response = self.http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttestError::Network(format!("JSON-RPC request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AttestError::Network(format!(
                "JSON-RPC endpoint returned error: {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| AttestError::Parse(format!("Invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(AttestError::Network(format!(
                "eth_call failed ({}): {}",
                error.code, error.message
            )));
        }

        body.result
            .ok_or_else(|| AttestError::Parse("JSON-RPC response has no result".to_string()))
    }
}

#[async_trait]
impl TextResolver for EnsTextResolver {
    async fn resolve_text(&self, name: &str, key: TextKey) -> AttestResult<Option<String>> {
        let node = namehash(name);

        let Some(resolver) = self.resolver_address(&node).await? else {
            debug!("No resolver set for {}", name);
            return Ok(None);
        };

        let result = self.eth_call(&resolver, encode_text_call(&node, key.as_str())).await?;
        decode_string(&result)
    }
}
