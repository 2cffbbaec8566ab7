#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use orgscan_exec::{ExecError, QueryExecutor, QueryResult};
use serde_json::{Value, json};

/// Scripted reply for every query against one object
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return these records
    Records(Vec<Value>),
    /// Fail every time
    Fail(ExecError),
    /// Fail the first `failures` calls, then return the records
    Flaky { failures: u32, records: Vec<Value> },
}

/// Query executor that answers by object name
///
/// Objects without a scripted reply fail with `INVALID_TYPE`, the way the
/// platform rejects objects that do not exist on an account.
#[derive(Default)]
pub struct MockExecutor {
    replies: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, object: &str, reply: Reply) -> Self {
        self.replies.insert(object.to_string(), reply);
        self
    }

    pub fn records(self, object: &str, records: Vec<Value>) -> Self {
        self.reply(object, Reply::Records(records))
    }

    pub fn fail(self, object: &str) -> Self {
        self.reply(
            object,
            Reply::Fail(ExecError::Api {
                status: 503,
                code: "SERVER_UNAVAILABLE".to_string(),
                message: format!("{object} unavailable"),
            }),
        )
    }

    pub fn delay(mut self, object: &str, delay: Duration) -> Self {
        self.delays.insert(object.to_string(), delay);
        self
    }

    /// Number of queries issued against `object`
    pub fn calls(&self, object: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(object)
            .copied()
            .unwrap_or(0)
    }
}

/// Object name following `FROM`
pub fn object_of(soql: &str) -> String {
    soql.split_whitespace()
        .skip_while(|word| !word.eq_ignore_ascii_case("FROM"))
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn query(&self, soql: &str) -> Result<QueryResult, ExecError> {
        let object = object_of(soql);
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(object.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(delay) = self.delays.get(&object) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(&object) {
            Some(Reply::Records(records)) => Ok(QueryResult::from_records(records.clone())),
            Some(Reply::Fail(e)) => Err(e.clone()),
            Some(Reply::Flaky { failures, records }) => {
                if call <= *failures {
                    Err(ExecError::ConnectionFailed(format!("blip {call}")))
                } else {
                    Ok(QueryResult::from_records(records.clone()))
                }
            }
            None => Err(ExecError::Api {
                status: 400,
                code: "INVALID_TYPE".to_string(),
                message: format!("sObject type '{object}' is not supported."),
            }),
        }
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

pub fn organization() -> Value {
    json!({
        "attributes": {"type": "Organization"},
        "Id": "00D000000000001",
        "Name": "Acme Corp",
        "OrganizationType": "Enterprise Edition",
        "IsSandbox": false,
        "InstanceName": "NA135"
    })
}

pub fn package(namespace: &str) -> Value {
    json!({
        "attributes": {"type": "PackageLicense"},
        "Id": format!("050{namespace}"),
        "NamespacePrefix": namespace,
        "Status": "Active",
        "AllowedLicenses": -1,
        "UsedLicenses": 0,
        "CreatedDate": "2024-01-15T09:30:00.000+0000",
        "ExpirationDate": null
    })
}

pub fn row(id: &str) -> Value {
    json!({"attributes": {"type": "Row"}, "Id": id})
}
