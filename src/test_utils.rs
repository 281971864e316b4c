//! Recording transport for unit tests.

use crate::client::{Client, Params, Transport};
use crate::errors::EnomError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays queued bodies in order and records every request it receives.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Params>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a body whose `interface_response` is `interface`.
    pub fn respond(&self, interface: Value) -> &Self {
        self.respond_raw(json!({ "interface_response": interface }))
    }

    pub fn respond_raw(&self, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(body);
        self
    }

    pub fn requests(&self) -> Vec<Params> {
        self.requests.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|p| p.get("Command").unwrap_or_default().to_string())
            .collect()
    }

    pub fn client(self: &Arc<Self>) -> Client {
        Client::with_transport(self.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, params: &Params) -> Result<Value, EnomError> {
        self.requests.lock().unwrap().push(params.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EnomError::InterfaceError("no mock response queued".to_string()))
    }
}

/// A `GetDomainInfo` interface body for `name`.
pub fn domain_info(name: &str, expiration: &str, status: &str) -> Value {
    json!({
        "GetDomainInfo": {
            "domainname": {"__content__": name},
            "status": {"expiration": expiration, "registrationstatus": status},
            "services": {"entry": [
                {"name": "dnsserver", "configuration": {"dns": ["ns1.example.net", "ns2.example.net"]}}
            ]}
        },
        "ErrCount": "0"
    })
}
