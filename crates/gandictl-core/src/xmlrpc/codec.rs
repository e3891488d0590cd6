//! Encoding of `<methodCall>` documents and decoding of `<methodResponse>` documents
//!
//! Responses are first read into a small element tree with `quick-xml`, then
//! interpreted. Whitespace-only text between elements is ignored; text inside
//! a string value is kept as-is.

use std::collections::BTreeMap;
use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use super::error::{Result, RpcError};
use super::value::Value;

/// Build a `<methodCall>` document
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) if i32::try_from(*i).is_ok() => {
            let _ = write!(out, "<int>{i}</int>");
        }
        Value::Int(i) => {
            let _ = write!(out, "<i8>{i}</i8>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Double(d) => {
            let _ = write!(out, "<double>{d}</double>");
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</dateTime.iso8601>");
        }
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Decode a `<methodResponse>` document into its single return value.
///
/// A `<fault>` response is returned as [`RpcError::Fault`].
pub fn decode_response(body: &str) -> Result<Value> {
    let root = parse_document(body)?;
    if root.name != "methodResponse" {
        return Err(RpcError::malformed(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.find("fault") {
        return Err(decode_fault(fault));
    }

    let value = root
        .find("params")
        .and_then(|p| p.find("param"))
        .and_then(|p| p.find("value"))
        .ok_or_else(|| RpcError::malformed("response has no <params><param><value>"))?;
    parse_value(value)
}

fn decode_fault(fault: &Element) -> RpcError {
    let value = match fault.find("value").map(parse_value) {
        Some(Ok(value)) => value,
        Some(Err(e)) => return e,
        None => return RpcError::malformed("<fault> without <value>"),
    };
    RpcError::Fault {
        code: value
            .get("faultCode")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
        message: value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn parse_value(element: &Element) -> Result<Value> {
    let Some(typed) = element.elements().next() else {
        // A <value> without a type element is an implicit string
        return Ok(Value::String(element.text()));
    };

    let text = typed.text();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| RpcError::malformed(format!("invalid integer '{}'", text.trim()))),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(RpcError::malformed(format!("invalid boolean '{other}'"))),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| RpcError::malformed(format!("invalid double '{}'", text.trim()))),
        "string" => Ok(Value::String(text)),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => {
            let compact: String = text.split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|e| RpcError::malformed(format!("invalid base64: {e}")))
        }
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = typed
                .find("data")
                .ok_or_else(|| RpcError::malformed("<array> without <data>"))?;
            data.elements()
                .filter(|e| e.name == "value")
                .map(parse_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.elements().filter(|e| e.name == "member") {
                let name = member
                    .find("name")
                    .ok_or_else(|| RpcError::malformed("<member> without <name>"))?
                    .text();
                let value = member
                    .find("value")
                    .ok_or_else(|| RpcError::malformed(format!("member '{name}' has no <value>")))?;
                members.insert(name, parse_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(RpcError::malformed(format!("unsupported value type <{other}>"))),
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            children: Vec::new(),
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Element::new(e.local_name().as_ref())),
            Event::Empty(e) => attach(&mut stack, &mut root, Element::new(e.local_name().as_ref()))?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| RpcError::malformed("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(t.unescape()?.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RpcError::malformed("unexpected end of document"));
    }
    root.ok_or_else(|| RpcError::malformed("empty document"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(RpcError::malformed("multiple root elements")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(value: &str) -> String {
        format!(
            "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n<value>{value}</value>\n</param>\n</params>\n</methodResponse>\n"
        )
    }

    #[test]
    fn test_encode_call_with_scalar_params() {
        let xml = encode_call(
            "hosting.vm.info",
            &[Value::from("key"), Value::Int(42), Value::Bool(true)],
        );
        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?>\n<methodCall><methodName>hosting.vm.info</methodName><params>\
             <param><value><string>key</string></value></param>\
             <param><value><int>42</int></value></param>\
             <param><value><boolean>1</boolean></value></param>\
             </params></methodCall>"
        );
    }

    #[test]
    fn test_encode_escapes_markup_in_strings() {
        let xml = encode_call("x", &[Value::from("apt-get install -y sudo && echo <ok>")]);
        assert!(xml.contains("apt-get install -y sudo &amp;&amp; echo &lt;ok&gt;"));
    }

    #[test]
    fn test_encode_large_integers_use_i8() {
        let xml = encode_call("x", &[Value::Int(i64::from(i32::MAX) + 1)]);
        assert!(xml.contains("<i8>2147483648</i8>"));
    }

    #[test]
    fn test_encode_struct_and_array() {
        let mut members = BTreeMap::new();
        members.insert("hostname".to_string(), Value::from("web-1"));
        let xml = encode_call("x", &[Value::Array(vec![Value::Struct(members), Value::Nil])]);
        assert!(xml.contains(
            "<array><data><value><struct><member><name>hostname</name>\
             <value><string>web-1</string></value></member></struct></value>\
             <value><nil/></value></data></array>"
        ));
    }

    #[test]
    fn test_decode_struct_with_nested_array() {
        let body = response(
            "<struct>
               <member><name>id</name><value><int>1234</int></value></member>
               <member><name>hostname</name><value><string>web-1</string></value></member>
               <member><name>ifaces</name><value><array><data>
                 <value><struct><member><name>ips</name><value><array><data>
                   <value><struct><member><name>ip</name><value><string>192.0.2.10</string></value></member></struct></value>
                 </data></array></value></member></struct></value>
               </data></array></value></member>
             </struct>",
        );
        let value = decode_response(&body).unwrap();

        assert_eq!(value.get("id"), Some(&Value::Int(1234)));
        assert_eq!(value.get("hostname").and_then(Value::as_str), Some("web-1"));
        let ip = match value.get("ifaces") {
            Some(Value::Array(ifaces)) => match ifaces[0].get("ips") {
                Some(Value::Array(ips)) => ips[0].get("ip").and_then(Value::as_str),
                _ => None,
            },
            _ => None,
        };
        assert_eq!(ip, Some("192.0.2.10"));
    }

    #[test]
    fn test_decode_implicit_string_keeps_whitespace() {
        let value = decode_response(&response("  padded  ")).unwrap();
        assert_eq!(value, Value::String("  padded  ".into()));
    }

    #[test]
    fn test_decode_empty_string_forms() {
        assert_eq!(
            decode_response(&response("<string/>")).unwrap(),
            Value::String(String::new())
        );
        assert_eq!(
            decode_response(&response("")).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(
            decode_response(&response("<i4>-7</i4>")).unwrap(),
            Value::Int(-7)
        );
        assert_eq!(
            decode_response(&response("<boolean>0</boolean>")).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            decode_response(&response("<double>1.5</double>")).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            decode_response(&response("<base64>aGVs\nbG8=</base64>")).unwrap(),
            Value::Base64(b"hello".to_vec())
        );
        assert_eq!(
            decode_response(&response("<nil/>")).unwrap(),
            Value::Nil
        );
        assert_eq!(
            decode_response(&response("<string>a &amp; b</string>")).unwrap(),
            Value::String("a & b".into())
        );
    }

    #[test]
    fn test_decode_fault() {
        let body = "<?xml version='1.0'?>
<methodResponse><fault><value><struct>
  <member><name>faultCode</name><value><int>510042</int></value></member>
  <member><name>faultString</name><value><string>Error on object : OBJECT_VM (CAUSE_NOTFOUND)</string></value></member>
</struct></value></fault></methodResponse>";

        match decode_response(body) {
            Err(RpcError::Fault { code, message }) => {
                assert_eq!(code, 510042);
                assert!(message.contains("CAUSE_NOTFOUND"));
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_wrong_root() {
        let err = decode_response("<methodCall></methodCall>").unwrap_err();
        assert!(matches!(err, RpcError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_integer() {
        let err = decode_response(&response("<int>twelve</int>")).unwrap_err();
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn test_decode_rejects_truncated_document() {
        assert!(decode_response("<methodResponse><params>").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_params() {
        let err = decode_response("<methodResponse></methodResponse>").unwrap_err();
        assert!(matches!(err, RpcError::Malformed(_)));
    }
}
