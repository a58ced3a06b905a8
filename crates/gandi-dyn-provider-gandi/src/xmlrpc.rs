//! Minimal XML-RPC codec
//!
//! Covers what the registrar speaks: method calls with positional
//! parameters, and responses carrying either one value or a fault.
//!
//! ```text
//! <methodCall>                         <methodResponse>
//!   <methodName>m</methodName>           <params><param><value>..</value></param></params>
//!   <params>                           </methodResponse>
//!     <param><value>..</value></param>
//!   </params>                          <methodResponse>
//! </methodCall>                          <fault><value><struct>..</struct></value></fault>
//!                                      </methodResponse>
//! ```

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt::Write;

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>`, `<i4>` or `<i8>`
    Int(i64),
    /// `<boolean>`
    Bool(bool),
    /// `<string>` or untyped `<value>` text
    String(String),
    /// `<double>`
    Double(f64),
    /// `<dateTime.iso8601>`, kept verbatim
    DateTime(String),
    /// `<base64>`, kept verbatim
    Base64(String),
    /// `<struct>`
    Struct(BTreeMap<String, Value>),
    /// `<array>`
    Array(Vec<Value>),
    /// `<nil/>`
    Nil,
}

impl Value {
    /// Short name of the value's type, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }

    /// Build a struct value from `(name, value)` pairs
    pub fn structure<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Body of a `<methodResponse>`
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The single returned value
    Success(Value),
    /// The call failed on the remote side
    Fault {
        /// `faultCode`
        code: i64,
        /// `faultString`
        message: String,
    },
}

/// A response body that is not well-formed XML-RPC
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Encode a method call
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
    // Writing into a String cannot fail
    let _ = match value {
        Value::Int(v) => write!(out, "<int>{}</int>", v),
        Value::Bool(v) => write!(out, "<boolean>{}</boolean>", u8::from(*v)),
        Value::String(v) => write!(out, "<string>{}</string>", escape(v.as_str())),
        Value::Double(v) => write!(out, "<double>{}</double>", v),
        Value::DateTime(v) => write!(
            out,
            "<dateTime.iso8601>{}</dateTime.iso8601>",
            escape(v.as_str())
        ),
        Value::Base64(v) => write!(out, "<base64>{}</base64>", escape(v.as_str())),
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
            Ok(())
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
            Ok(())
        }
        Value::Nil => {
            out.push_str("<nil/>");
            Ok(())
        }
    };
    out.push_str("</value>");
}

/// Decode a method response
pub fn decode_response(body: &str) -> Result<Response, DecodeError> {
    let mut cursor = Cursor::new(tokenize(body)?);

    cursor.open("methodResponse")?;
    cursor.skip_space();
    let response = match cursor.next() {
        Some(Token::Open(name)) if name == "params" => {
            cursor.open("param")?;
            let value = cursor.value()?;
            cursor.close("param")?;
            cursor.close("params")?;
            Response::Success(value)
        }
        Some(Token::Open(name)) if name == "fault" => {
            let value = cursor.value()?;
            cursor.close("fault")?;
            fault(value)?
        }
        other => return Err(unexpected("<params> or <fault>", other.as_ref())),
    };
    cursor.close("methodResponse")?;

    cursor.skip_space();
    if let Some(token) = cursor.peek() {
        return Err(unexpected("end of document", Some(token)));
    }

    Ok(response)
}

fn fault(value: Value) -> Result<Response, DecodeError> {
    let mut members = match value {
        Value::Struct(members) => members,
        other => {
            return Err(DecodeError::new(format!(
                "fault is a {}, expected struct",
                other.kind()
            )));
        }
    };

    let code = match members.remove("faultCode") {
        Some(Value::Int(code)) => code,
        other => {
            return Err(DecodeError::new(format!(
                "fault has no integer faultCode: {:?}",
                other
            )));
        }
    };
    let message = match members.remove("faultString") {
        Some(Value::String(message)) => message,
        Some(other) => format!("{:?}", other),
        None => String::new(),
    };

    Ok(Response::Fault { code, message })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Empty(String),
    Text(String),
}

fn tokenize(body: &str) -> Result<Vec<Token>, DecodeError> {
    let mut reader = Reader::from_str(body);
    let mut tokens = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => tokens.push(Token::Open(tag_name(e.name().as_ref()))),
            Ok(Event::End(e)) => tokens.push(Token::Close(tag_name(e.name().as_ref()))),
            Ok(Event::Empty(e)) => tokens.push(Token::Empty(tag_name(e.name().as_ref()))),
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| DecodeError::new(format!("bad text content: {}", e)))?;
                push_text(&mut tokens, &text);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                push_text(&mut tokens, &text);
            }
            Ok(Event::Eof) => break,
            // Declaration, comments, processing instructions
            Ok(_) => {}
            Err(e) => {
                return Err(DecodeError::new(format!(
                    "malformed XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    Ok(tokens)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Text(last)) = tokens.last_mut() {
        last.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

fn unexpected(expected: &str, found: Option<&Token>) -> DecodeError {
    let found = match found {
        Some(Token::Open(name)) => format!("<{}>", name),
        Some(Token::Close(name)) => format!("</{}>", name),
        Some(Token::Empty(name)) => format!("<{}/>", name),
        Some(Token::Text(text)) => format!("text {:?}", text),
        None => "end of document".to_string(),
    };
    DecodeError::new(format!("expected {}, found {}", expected, found))
}

/// Recursive-descent reader over the token list
struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_space(&mut self) {
        while let Some(Token::Text(text)) = self.peek() {
            if !text.trim().is_empty() {
                break;
            }
            self.pos += 1;
        }
    }

    /// Consume text at the cursor, if any
    fn text(&mut self) -> String {
        if let Some(Token::Text(text)) = self.peek() {
            let text = text.clone();
            self.pos += 1;
            text
        } else {
            String::new()
        }
    }

    fn at_close(&mut self, name: &str) -> bool {
        self.skip_space();
        matches!(self.peek(), Some(Token::Close(n)) if n == name)
    }

    fn open(&mut self, name: &str) -> Result<(), DecodeError> {
        if self.open_or_empty(name)? {
            Ok(())
        } else {
            Err(DecodeError::new(format!("<{}/> must not be empty", name)))
        }
    }

    /// Consume `<name>` (returns true) or `<name/>` (returns false)
    fn open_or_empty(&mut self, name: &str) -> Result<bool, DecodeError> {
        self.skip_space();
        match self.peek() {
            Some(Token::Open(n)) if n == name => {
                self.pos += 1;
                Ok(true)
            }
            Some(Token::Empty(n)) if n == name => {
                self.pos += 1;
                Ok(false)
            }
            other => Err(unexpected(&format!("<{}>", name), other)),
        }
    }

    fn close(&mut self, name: &str) -> Result<(), DecodeError> {
        if self.at_close(name) {
            self.pos += 1;
            Ok(())
        } else {
            Err(unexpected(&format!("</{}>", name), self.peek()))
        }
    }

    fn value(&mut self) -> Result<Value, DecodeError> {
        if !self.open_or_empty("value")? {
            return Ok(Value::String(String::new()));
        }

        // Untyped content is a string
        let text = self.text();
        if matches!(self.peek(), Some(Token::Close(n)) if n == "value") {
            self.pos += 1;
            return Ok(Value::String(text));
        }
        if !text.trim().is_empty() {
            return Err(DecodeError::new(format!(
                "text {:?} mixed with a typed value",
                text
            )));
        }

        let value = self.typed()?;
        self.close("value")?;
        Ok(value)
    }

    fn typed(&mut self) -> Result<Value, DecodeError> {
        self.skip_space();
        let (name, has_content) = match self.next() {
            Some(Token::Open(name)) => (name, true),
            Some(Token::Empty(name)) => (name, false),
            other => return Err(unexpected("a typed value", other.as_ref())),
        };

        let value = match name.as_str() {
            "struct" => {
                let mut members = BTreeMap::new();
                while has_content && !self.at_close("struct") {
                    self.open("member")?;
                    let key = if self.open_or_empty("name")? {
                        let key = self.text();
                        self.close("name")?;
                        key
                    } else {
                        String::new()
                    };
                    let member = self.value()?;
                    self.close("member")?;
                    members.insert(key, member);
                }
                Value::Struct(members)
            }
            "array" => {
                let mut items = Vec::new();
                if has_content && self.open_or_empty("data")? {
                    while !self.at_close("data") {
                        items.push(self.value()?);
                    }
                    self.close("data")?;
                }
                Value::Array(items)
            }
            "nil" => Value::Nil,
            scalar => {
                let text = if has_content { self.text() } else { String::new() };
                parse_scalar(scalar, text)?
            }
        };

        if has_content {
            self.close(&name)?;
        }
        Ok(value)
    }
}

fn parse_scalar(kind: &str, text: String) -> Result<Value, DecodeError> {
    let trimmed = text.trim();
    match kind {
        "int" | "i4" | "i8" => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| DecodeError::new(format!("bad <{}> {:?}: {}", kind, trimmed, e))),
        "boolean" => match trimmed {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(DecodeError::new(format!("bad <boolean> {:?}", trimmed))),
        },
        "double" => trimmed
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| DecodeError::new(format!("bad <double> {:?}: {}", trimmed, e))),
        "string" => Ok(Value::String(text)),
        "dateTime.iso8601" => Ok(Value::DateTime(trimmed.to_string())),
        "base64" => Ok(Value::Base64(trimmed.to_string())),
        other => Err(DecodeError::new(format!("unknown value type <{}>", other))),
    }
}
