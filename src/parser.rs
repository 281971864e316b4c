use crate::errors::EnomError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::debug;

/// Key under which an element's text is kept when it also has attributes.
pub const CONTENT_KEY: &str = "__content__";

/// Converts registrar XML into a nested key/value tree.
///
/// The tree keeps document order. Element and attribute names have `-`
/// replaced with `_`, repeated siblings collapse into an array, and an
/// empty element becomes `null`.
pub struct XmlParser;

struct Frame {
    name: String,
    map: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self { name, map: Map::new(), text: String::new() }
    }

    fn into_value(mut self) -> Value {
        let text = self.text.trim().to_string();
        if self.map.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            if !text.is_empty() {
                self.map.insert(CONTENT_KEY.to_string(), Value::String(text));
            }
            Value::Object(self.map)
        }
    }
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &str) -> Result<Value, EnomError> {
        let mut reader = Reader::from_str(data);
        reader.trim_text(true);

        let mut stack: Vec<Frame> = vec![Frame::new(String::new())];

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(self.open(&start)?);
                }
                Event::Empty(start) => {
                    let frame = self.open(&start)?;
                    let parent = stack.last_mut().ok_or_else(Self::unbalanced)?;
                    let name = frame.name.clone();
                    insert_child(&mut parent.map, name, frame.into_value());
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(cdata) => {
                    let raw = cdata.into_inner();
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&raw));
                    }
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(Self::unbalanced());
                    }
                    let frame = stack.pop().ok_or_else(Self::unbalanced)?;
                    let parent = stack.last_mut().ok_or_else(Self::unbalanced)?;
                    let name = frame.name.clone();
                    insert_child(&mut parent.map, name, frame.into_value());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(Self::unbalanced());
        }
        let root = stack.pop().ok_or_else(Self::unbalanced)?;
        debug!("Parsed XML document with {} top-level element(s)", root.map.len());
        Ok(Value::Object(root.map))
    }

    fn open(&self, start: &BytesStart<'_>) -> Result<Frame, EnomError> {
        let mut frame = Frame::new(normalize_name(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| EnomError::Xml(e.to_string()))?;
            let key = normalize_name(attr.key.as_ref());
            let value = attr.unescape_value()?.into_owned();
            insert_child(&mut frame.map, key, Value::String(value));
        }
        Ok(frame)
    }

    fn unbalanced() -> EnomError {
        EnomError::Xml("unbalanced element tags".to_string())
    }
}

fn normalize_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace('-', "_")
}

fn insert_child(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dashes_become_underscores() {
        let parsed = XmlParser::new()
            .parse("<?xml version=\"1.0\"?><interface-response><ErrCount>0</ErrCount></interface-response>")
            .unwrap();
        assert_eq!(parsed, json!({"interface_response": {"ErrCount": "0"}}));
    }

    #[test]
    fn test_attributes_and_content() {
        let xml = r#"<interface-response><GetDomainInfo>
            <domainname sld="example" tld="com" id="1">example.com</domainname>
            <status><expiration>11/9/2030 12:00:00 AM</expiration><escrowliftdate/></status>
        </GetDomainInfo></interface-response>"#;
        let parsed = XmlParser::new().parse(xml).unwrap();
        let info = &parsed["interface_response"]["GetDomainInfo"];
        assert_eq!(info["domainname"]["__content__"], "example.com");
        assert_eq!(info["domainname"]["sld"], "example");
        assert_eq!(info["status"]["expiration"], "11/9/2030 12:00:00 AM");
        assert!(info["status"]["escrowliftdate"].is_null());
    }

    #[test]
    fn test_repeated_elements_become_arrays() {
        let xml = "<r><dns>ns1.example.net</dns><dns>ns2.example.net</dns><one>x</one></r>";
        let parsed = XmlParser::new().parse(xml).unwrap();
        assert_eq!(parsed["r"]["dns"], json!(["ns1.example.net", "ns2.example.net"]));
        assert_eq!(parsed["r"]["one"], "x");
    }

    #[test]
    fn test_document_order_is_kept() {
        let xml = "<r><Domain2>b.net</Domain2><RRPCode2>210</RRPCode2><Domain1>a.com</Domain1></r>";
        let parsed = XmlParser::new().parse(xml).unwrap();
        let keys: Vec<&String> = parsed["r"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Domain2", "RRPCode2", "Domain1"]);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let parsed = XmlParser::new().parse("<r><msg>a &amp; b</msg></r>").unwrap();
        assert_eq!(parsed["r"]["msg"], "a & b");
    }

    #[test]
    fn test_unbalanced_document_fails() {
        assert!(XmlParser::new().parse("<r><a>1</a>").is_err());
    }
}
