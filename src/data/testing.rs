//! Scripted in-memory wallet used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Bytes, U256};
use async_trait::async_trait;
use serde_json::Value;

use crate::data::wallet::{Eip1193, Wallet, WalletError};

type Reply = Result<Value, WalletError>;

#[derive(Default)]
struct Script {
    /// Per-method replies. The last reply of a queue is sticky.
    replies: HashMap<String, VecDeque<Reply>>,
    /// `eth_call` replies keyed by function selector.
    calls: HashMap<[u8; 4], Reply>,
    log: Vec<(String, Value)>,
}

#[derive(Clone, Default)]
pub struct MockWallet {
    script: Arc<Mutex<Script>>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(&self) -> Wallet {
        Wallet::new(Arc::new(self.clone()))
    }

    /// Replace every scripted reply for `method` with `value`.
    pub fn respond(&self, method: &str, value: Value) {
        let mut script = self.script.lock().unwrap();
        script
            .replies
            .insert(method.to_string(), VecDeque::from([Ok(value)]));
    }

    /// Queue a reply for `method` after the ones already scripted.
    pub fn then_respond(&self, method: &str, value: Value) {
        let mut script = self.script.lock().unwrap();
        script
            .replies
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
    }

    pub fn fail(&self, method: &str, code: i64, message: &str) {
        let mut script = self.script.lock().unwrap();
        script.replies.insert(
            method.to_string(),
            VecDeque::from([Err(WalletError::Rpc {
                code,
                message: message.to_string(),
            })]),
        );
    }

    /// Answer `eth_call`s to `selector` with ABI words.
    pub fn respond_call(&self, selector: [u8; 4], words: &[U256]) {
        let mut data = Vec::with_capacity(words.len() * 32);
        for word in words {
            data.extend_from_slice(&word.to_be_bytes::<32>());
        }
        let mut script = self.script.lock().unwrap();
        script
            .calls
            .insert(selector, Ok(serde_json::to_value(Bytes::from(data)).unwrap()));
    }

    pub fn fail_call(&self, selector: [u8; 4], message: &str) {
        let mut script = self.script.lock().unwrap();
        script.calls.insert(
            selector,
            Err(WalletError::Rpc {
                code: 3,
                message: message.to_string(),
            }),
        );
    }

    /// Params of every request made to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        let script = self.script.lock().unwrap();
        script
            .log
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// `eth_call` transactions whose calldata starts with `selector`.
    pub fn eth_calls_with(&self, selector: [u8; 4]) -> Vec<Value> {
        self.calls_to("eth_call")
            .into_iter()
            .filter(|params| call_selector(params) == Some(selector))
            .map(|params| params[0].clone())
            .collect()
    }
}

fn call_selector(params: &Value) -> Option<[u8; 4]> {
    let tx = params.get(0)?;
    let input = tx.get("input").or_else(|| tx.get("data"))?;
    let bytes: Bytes = serde_json::from_value(input.clone()).ok()?;
    bytes.get(..4)?.try_into().ok()
}

#[async_trait]
impl Eip1193 for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let mut script = self.script.lock().unwrap();
        script.log.push((method.to_string(), params.clone()));

        if method == "eth_call" {
            let selector = call_selector(&params);
            return match selector.and_then(|s| script.calls.get(&s)) {
                Some(reply) => reply.clone(),
                None => Err(WalletError::Rpc {
                    code: 3,
                    message: "execution reverted".to_string(),
                }),
            };
        }

        match script.replies.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Err(WalletError::Rpc {
                code: -32601,
                message: format!("method {method} not scripted"),
            }),
        }
    }
}
