use quick_xml::Reader;
use quick_xml::events::Event;

use super::coercion::{MalformedTimestamp, coerce};
use crate::domain::{DecodedResponse, Value};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("ill-formed XML document: {0}")]
    IllFormed(&'static str),

    #[error(transparent)]
    Timestamp(#[from] MalformedTimestamp),
}

#[derive(Debug)]
enum ResponseNode {
    Element(Element),
    Text(String),
    /// Comments and processing instructions.
    Other,
}

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<ResponseNode>,
}

/// Decode an XML response body into a nested mapping keyed by element name.
///
/// The result holds a single entry for the document's root element.
pub fn decode_xml_response(xml: &str) -> Result<DecodedResponse, DecodeError> {
    let root = parse_document(xml)?;
    let value = decode_element(&root)?;
    let mut response = DecodedResponse::new();
    response.insert(root.name, value);
    Ok(response)
}

/// Like [`decode_xml_response`], for a raw body that must be valid UTF-8.
pub fn decode_xml_bytes(body: &[u8]) -> Result<DecodedResponse, DecodeError> {
    decode_xml_response(std::str::from_utf8(body)?)
}

fn decode_element(element: &Element) -> Result<Value, DecodeError> {
    match element.children.as_slice() {
        [ResponseNode::Text(text)] => Ok(coerce(&element.name, text)?),
        _ => decode_children(element).map(Value::Map),
    }
}

fn decode_children(element: &Element) -> Result<DecodedResponse, DecodeError> {
    let mut map = DecodedResponse::new();
    for child in &element.children {
        if let ResponseNode::Element(child) = child {
            // Later siblings with the same name replace earlier ones.
            map.insert(child.name.clone(), decode_element(child)?);
        }
    }
    Ok(map)
}

fn parse_document(xml: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut started = false;

    loop {
        let event = reader.read_event()?;
        if started && matches!(event, Event::Decl(_)) {
            return Err(DecodeError::IllFormed("XML declaration after document start"));
        }
        started = true;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(DecodeError::IllFormed("multiple root elements"));
                }
                let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
                stack.push(Element {
                    name,
                    children: Vec::new(),
                });
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or(DecodeError::IllFormed("closing tag without opening tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(ResponseNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => match stack.last_mut() {
                Some(parent) => {
                    let value = text.unescape()?;
                    if !value.is_empty() {
                        parent.children.push(ResponseNode::Text(value.into_owned()));
                    }
                }
                None if text.iter().all(u8::is_ascii_whitespace) => {}
                None => return Err(DecodeError::IllFormed("text outside the root element")),
            },
            Event::CData(cdata) => match stack.last_mut() {
                Some(parent) => {
                    let value = std::str::from_utf8(&cdata)?.to_owned();
                    parent.children.push(ResponseNode::Text(value));
                }
                None => return Err(DecodeError::IllFormed("CDATA outside the root element")),
            },
            Event::Comment(_) | Event::PI(_) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(ResponseNode::Other);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::IllFormed("unclosed element"));
    }
    root.ok_or(DecodeError::IllFormed("no root element"))
}
