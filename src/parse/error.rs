use super::event_summary::EventSummary;

use derive_more::{Constructor, Display, From};
use quick_xml::name::QName;

#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    InvalidNumber(InvalidNumber),
    #[error("{0}")]
    ArrayLength(ArrayLength),
    #[error("{0}")]
    InlineBinary(InlineBinary),
    #[error("{0}")]
    MissingArray(MissingArray),
    #[error("{0}")]
    AppendedData(AppendedData),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "unexpected attribute value for {attribute_name} in {element_name} element: expected {expected_value}, got {actual_value}"
)]
pub struct UnexpectedAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected_value: String,
    pub(crate) actual_value: ParsedNameOrBytes,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "`{token}` in {context} is not a valid number")]
pub struct InvalidNumber {
    context: String,
    token: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "array `{array_name}` holds {actual} values, expected {expected}")]
pub struct ArrayLength {
    array_name: String,
    expected: usize,
    actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "inline binary data of array `{array_name}` is malformed: {reason}")]
pub struct InlineBinary {
    array_name: String,
    reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "the file has no `{array_name}` array")]
pub struct MissingArray {
    array_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppendedData {
    #[error("no `_` marker at the start of the appended section")]
    MissingMarker,
    #[error("array `{0}` refers to appended data, but the file has no appended section")]
    MissingSection(String),
    #[error("array `{name}` is declared at offset {declared}, but the previous block ends at {actual}")]
    OffsetMismatch {
        name: String,
        declared: u64,
        actual: u64,
    },
    #[error("the appended block of array `{0}` runs past the end of the file")]
    Truncated(String),
    #[error("unexpected bytes after the last appended block")]
    TrailingBytes,
}

#[derive(Display, Debug)]
pub enum ParsedNameOrBytes {
    #[display(fmt = "{_0}")]
    Utf8(String),
    #[display(fmt = "{_0:?} (cannot convert to UTF8 string)")]
    Bytes(Vec<u8>),
}

impl ParsedNameOrBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let vec = Vec::from(bytes);
        match String::from_utf8(vec) {
            Ok(string) => Self::Utf8(string),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

impl<'a> From<QName<'a>> for ParsedNameOrBytes {
    fn from(x: QName) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<std::borrow::Cow<'a, [u8]>> for ParsedNameOrBytes {
    fn from(x: std::borrow::Cow<'a, [u8]>) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<&'a str> for ParsedNameOrBytes {
    fn from(x: &str) -> Self {
        Self::Utf8(x.into())
    }
}
