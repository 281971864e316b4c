//! Per-command views over the registrar's parsed XML.
//!
//! Enom puts the same logical field under different keys and nesting
//! depending on the command, and encodes numbers, booleans and dates as
//! strings. Everything that knows about those shapes lives here so the
//! domain model only sees typed values.

use crate::errors::EnomError;
use crate::parser::CONTENT_KEY;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// The registrar's code for "domain available" in `Check` responses.
pub const AVAILABLE_CODE: &str = "210";

// Trailing digits of keys such as `RRPCode7`
static KEY_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d*)$").expect("valid key index regex"));

static EMPTY: Lazy<Map<String, Value>> = Lazy::new(Map::new);

/// A parsed response whose top level carries `interface_response`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    body: Value,
}

impl Response {
    pub fn new(body: Value) -> Result<Self, EnomError> {
        match body.get("interface_response") {
            Some(Value::Object(_)) => Ok(Self { body }),
            _ => Err(EnomError::InterfaceError(format!(
                "response has no interface_response: {}",
                body
            ))),
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn interface(&self) -> &Map<String, Value> {
        self.body
            .get("interface_response")
            .and_then(Value::as_object)
            .unwrap_or(&*EMPTY)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.interface().get(key)
    }

    /// A string field directly under `interface_response`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(text)
    }

    pub fn err_count(&self) -> Option<i64> {
        self.field("ErrCount").and_then(|count| count.trim().parse().ok())
    }

    /// Error messages from the `errors` block, in document order.
    pub fn errors(&self) -> Vec<String> {
        match self.get("errors") {
            Some(Value::Object(map)) => map.values().filter_map(text).map(str::to_string).collect(),
            Some(other) => text(other).map(|t| vec![t.to_string()]).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// The error for a field that should have been present. When the
    /// registrar reported errors, those are the message.
    pub fn missing(&self, what: &str) -> EnomError {
        let errors = self.errors();
        if errors.is_empty() {
            EnomError::InterfaceError(format!("response is missing {}", what))
        } else {
            EnomError::InterfaceError(errors.join(", "))
        }
    }
}

/// Walk nested maps by key.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// The text of a leaf, or of an element that also carried attributes.
pub fn text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(CONTENT_KEY).and_then(Value::as_str),
        _ => None,
    }
}

/// One element parses to a value, several to an array; treat both as a list.
pub fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Parse the date part of `"MM/DD/YYYY hh:mm:ss AM"`.
pub fn parse_us_date(raw: &str) -> Result<NaiveDate, EnomError> {
    parse_date_token(raw, "%m/%d/%Y")
}

/// Parse the date part of `"YYYY-MM-DD hh:mm:ss"`.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, EnomError> {
    parse_date_token(raw, "%Y-%m-%d")
}

fn parse_date_token(raw: &str, format: &str) -> Result<NaiveDate, EnomError> {
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| EnomError::InvalidDate(format!("empty date string {:?}", raw)))?;
    NaiveDate::parse_from_str(token, format)
        .map_err(|e| EnomError::InvalidDate(format!("{:?}: {}", raw, e)))
}

/// Attributes a `Domain` is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAttributes {
    pub name: String,
    pub expiration_date: NaiveDate,
    pub extended: Option<ExtendedAttributes>,
}

/// Attributes only `GetDomainInfo` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedAttributes {
    pub nameservers: Vec<String>,
    pub registration_status: String,
}

/// Read a domain entry from `GetDomainInfo` or a `GetAllDomains` detail.
///
/// The name is `domainname` (text or element content) or `DomainName`; the
/// expiration is `expiration_date` or `status.expiration`. Extended
/// attributes are picked up when both `services` and `status` are present
/// and well-formed.
pub fn domain_attributes(raw: &Value) -> Result<DomainAttributes, EnomError> {
    let name = raw
        .get("domainname")
        .and_then(text)
        .or_else(|| raw.get("DomainName").and_then(text))
        .ok_or_else(|| EnomError::InterfaceError("domain entry has no name".to_string()))?
        .to_string();

    let expiration = raw
        .get("expiration_date")
        .and_then(text)
        .or_else(|| lookup(raw, &["status", "expiration"]).and_then(text))
        .ok_or_else(|| EnomError::InvalidDate(format!("no expiration date for {}", name)))?;
    let expiration_date = parse_us_date(expiration)?;

    let extended = if raw.get("services").is_some() && raw.get("status").is_some() {
        match extended_attributes(raw) {
            Ok(extended) => Some(extended),
            Err(e) => {
                debug!("Skipping extended attributes for {}: {}", name, e);
                None
            }
        }
    } else {
        None
    };

    Ok(DomainAttributes { name, expiration_date, extended })
}

/// Nameservers from `services.entry[0].configuration.dns` and status from
/// `status.registrationstatus`.
pub fn extended_attributes(raw: &Value) -> Result<ExtendedAttributes, EnomError> {
    let entry = raw
        .get("services")
        .and_then(|services| services.get("entry"))
        .and_then(|entry| as_list(entry).into_iter().next())
        .ok_or_else(|| EnomError::InterfaceError("missing services.entry".to_string()))?;

    let dns = lookup(entry, &["configuration", "dns"])
        .ok_or_else(|| EnomError::InterfaceError("missing services.entry.configuration.dns".to_string()))?;
    let nameservers = as_list(dns)
        .into_iter()
        .filter_map(text)
        .map(str::to_string)
        .collect();

    let registration_status = lookup(raw, &["status", "registrationstatus"])
        .and_then(text)
        .ok_or_else(|| EnomError::InterfaceError("missing status.registrationstatus".to_string()))?
        .to_string();

    Ok(ExtendedAttributes { nameservers, registration_status })
}

/// `GetDomainInfo` payload.
pub fn domain_info(response: &Response) -> Result<&Value, EnomError> {
    response.get("GetDomainInfo").ok_or_else(|| response.missing("GetDomainInfo"))
}

/// `GetAllDomains.DomainDetail` entries in response order.
pub fn domain_details(response: &Response) -> Result<Vec<&Value>, EnomError> {
    let all = response.get("GetAllDomains").ok_or_else(|| response.missing("GetAllDomains"))?;
    Ok(all.get("DomainDetail").map(as_list).unwrap_or_default())
}

/// `Check` for a single name: the `RRPCode`.
pub fn check_code(response: &Response) -> Result<&str, EnomError> {
    response.field("RRPCode").ok_or_else(|| response.missing("RRPCode"))
}

/// `Check` against a TLD list. Every `"210"` value is paired with the
/// `Domain` key carrying the same numeric suffix, in response order.
///
/// This depends on Enom numbering `RRPCodeN` and `DomainN` consistently;
/// the pairing is not a documented contract.
pub fn available_domains(response: &Response) -> Vec<String> {
    let interface = response.interface();
    interface
        .iter()
        .filter(|(_, value)| text(value) == Some(AVAILABLE_CODE))
        .filter_map(|(key, _)| {
            let index = KEY_INDEX.captures(key).and_then(|c| c.get(1)).map_or("", |m| m.as_str());
            interface.get(&format!("Domain{}", index)).and_then(text)
        })
        .map(str::to_string)
        .collect()
}

/// `Extend`: the new registry expiration.
pub fn registry_expiration(response: &Response) -> Result<NaiveDate, EnomError> {
    let raw = response
        .get("DomainInfo")
        .and_then(|info| info.get("RegistryExpDate"))
        .and_then(text)
        .ok_or_else(|| response.missing("DomainInfo.RegistryExpDate"))?;
    parse_iso_date(raw)
}

/// `GetRegLock`: `"1"` means locked.
pub fn reg_lock(response: &Response) -> bool {
    response.field("reg_lock") == Some("1")
}

/// `GetRenew`: numeric `auto_renew` flag.
pub fn auto_renew_flag(response: &Response) -> Result<bool, EnomError> {
    let raw = response.field("auto_renew").ok_or_else(|| response.missing("auto_renew"))?;
    let flag: i64 = raw
        .trim()
        .parse()
        .map_err(|_| EnomError::InterfaceError(format!("auto_renew is not numeric: {:?}", raw)))?;
    Ok(flag != 0)
}

/// `namespinner`: `name.tld` for every candidate/TLD pair marked `"y"`.
pub fn spun_names(response: &Response, tlds: &[String]) -> Result<Vec<String>, EnomError> {
    let domains = response
        .get("namespin")
        .and_then(|spin| lookup(spin, &["domains", "domain"]))
        .ok_or_else(|| response.missing("namespin.domains.domain"))?;

    let mut suggestions = Vec::new();
    for candidate in as_list(domains) {
        let Some(name) = candidate.get("name").and_then(text) else {
            continue;
        };
        for tld in tlds {
            if candidate.get(tld.as_str()).and_then(text) == Some("y") {
                suggestions.push(format!("{}.{}", name.to_lowercase(), tld));
            }
        }
    }
    Ok(suggestions)
}
