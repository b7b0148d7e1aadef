//! XML response parsing.
//!
//! CAS XML answers are small, so the body is read into a tiny element tree
//! first and interpreted afterwards. Namespace prefixes are ignored: only
//! local names are compared.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{CasError, CasResult};
use crate::types::{error_codes, ValidationResult};

/// Maximum accepted body size.
const MAX_BODY_LEN: usize = 1024 * 1024;

/// An XML element with its text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> CasResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Text values carried by this element: its own text when it is a leaf,
    /// otherwise the values of its children, in document order.
    pub fn values(&self) -> Vec<String> {
        if self.children.is_empty() {
            let text = self.text.trim();
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            };
        }
        self.children.iter().flat_map(Element::values).collect()
    }
}

/// Reads a document into its root element.
pub(crate) fn parse_document(xml: &str) -> CasResult<Element> {
    if xml.len() > MAX_BODY_LEN {
        return Err(CasError::MalformedResponse("response body too large".into()));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => stack.push(Element::from_start(e)?),
            Event::Empty(ref e) => {
                let element = Element::from_start(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CasError::MalformedResponse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(CasError::MalformedResponse("unexpected end of document".into()));
    }
    root.ok_or_else(|| CasError::MalformedResponse("empty document".into()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> CasResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(CasError::MalformedResponse("multiple root elements".into()));
    }
    *root = Some(element);
    Ok(())
}

/// Returns the single outcome element under `serviceResponse`.
fn outcome(xml: &str) -> CasResult<Element> {
    let root = parse_document(xml)?;
    if root.name != "serviceResponse" {
        return Err(CasError::MalformedResponse(format!(
            "expected serviceResponse, found {}",
            root.name
        )));
    }
    root.children
        .into_iter()
        .next()
        .ok_or_else(|| CasError::MalformedResponse("empty serviceResponse".into()))
}

fn failure(element: &Element) -> (String, String) {
    let code = element
        .attribute("code")
        .unwrap_or(error_codes::INTERNAL_ERROR)
        .to_string();
    (code, element.text.trim().to_string())
}

/// Parses a `serviceValidate` / `proxyValidate` XML body.
pub fn parse_validation(xml: &str) -> CasResult<ValidationResult> {
    let outcome = outcome(xml)?;
    match outcome.name.as_str() {
        "authenticationSuccess" => success(&outcome),
        "authenticationFailure" => {
            let (code, description) = failure(&outcome);
            Err(CasError::AuthenticationFailed { code, description })
        }
        other => Err(CasError::MalformedResponse(format!(
            "unexpected validation outcome {other}"
        ))),
    }
}

fn success(element: &Element) -> CasResult<ValidationResult> {
    let user = element
        .child_text("user")
        .ok_or_else(|| CasError::MalformedResponse("authenticationSuccess without user".into()))?;
    let mut result = ValidationResult::new(user);

    for child in &element.children {
        match child.name.as_str() {
            "user" => {}
            "proxyGrantingTicket" => {
                let iou = child.text.trim();
                if !iou.is_empty() {
                    result.proxy_granting_ticket_iou = Some(iou.to_string());
                }
            }
            "proxies" => {
                result.proxies = child
                    .children
                    .iter()
                    .filter(|p| p.name == "proxy")
                    .map(|p| p.text.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
            }
            "attributes" => {
                for attribute in &child.children {
                    add_attribute(&mut result, attribute);
                }
            }
            // ECAS and other extended servers put extra details directly
            // under authenticationSuccess.
            _ => add_attribute(&mut result, child),
        }
    }

    Ok(result)
}

fn add_attribute(result: &mut ValidationResult, element: &Element) {
    // <cas:attribute name="mail" value="jdoe@example.com"/>
    if element.name == "attribute" {
        if let (Some(name), Some(value)) = (element.attribute("name"), element.attribute("value")) {
            result.add_attribute(name, value.to_string());
            return;
        }
    }
    result.add_attribute_values(&element.name, element.values());
}

/// Parses a `proxy` XML body into the issued proxy ticket.
pub fn parse_proxy(xml: &str) -> CasResult<String> {
    let outcome = outcome(xml)?;
    match outcome.name.as_str() {
        "proxySuccess" => outcome
            .child_text("proxyTicket")
            .map(str::to_string)
            .ok_or_else(|| CasError::MalformedResponse("proxySuccess without proxyTicket".into())),
        "proxyFailure" => {
            let (code, description) = failure(&outcome);
            Err(CasError::Proxy(format!("{code}: {description}")))
        }
        other => Err(CasError::MalformedResponse(format!(
            "unexpected proxy outcome {other}"
        ))),
    }
}
