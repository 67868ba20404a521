//! Modular input event record and its wire encoding.
use std::io;

use serde::{Deserialize, Serialize};

use crate::xml::{Element, XmlError};

#[derive(Debug)]
pub enum EventError {
    /// `data` was unset at encode time.
    MissingData,
    Xml(XmlError),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingData => {
                write!(f, "events must have at least the data field set to be encoded")
            }
            Self::Xml(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for EventError {}

impl From<XmlError> for EventError {
    fn from(value: XmlError) -> Self {
        EventError::Xml(value)
    }
}

/// A single event to be streamed to the host process.
///
/// Only `data` is mandatory; every other field is independently optional.
/// `time` is a pre-formatted seconds-since-epoch string with millisecond
/// precision, formatted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub data: Option<String>,
    pub stanza: Option<String>,
    pub time: Option<String>,
    pub host: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "sourceType")]
    pub source_type: Option<String>,
    pub index: Option<String>,
    pub done: bool,
    pub unbroken: bool,
}

impl Event {
    /// Project the event into its `event` wire fragment.
    ///
    /// Child elements are emitted in the fixed protocol order, skipping unset
    /// fields; interop fixtures on the host side assume this order.
    pub fn to_xml(&self) -> Result<Element, EventError> {
        let data = self.data.as_deref().ok_or(EventError::MissingData)?;

        let mut event = Element::new("event");

        if let Some(stanza) = &self.stanza {
            event.set_attribute("stanza", stanza);
        }

        if self.unbroken {
            event.set_attribute("unbroken", "1");
        }

        let fields: [(&str, Option<&str>); 6] = [
            ("time", self.time.as_deref()),
            ("data", Some(data)),
            ("host", self.host.as_deref()),
            ("source", self.source.as_deref()),
            ("sourceType", self.source_type.as_deref()),
            ("index", self.index.as_deref()),
        ];

        for (name, value) in fields {
            if let Some(value) = value {
                event.push_element(Element::with_text(name, value));
            }
        }

        if self.done {
            event.push_element(Element::new("done"));
        }

        Ok(event)
    }

    /// Encode and serialize the event fragment to `output` in one step.
    pub fn write_to<W: io::Write>(&self, output: &mut W) -> Result<(), EventError> {
        self.to_xml()?.write_to(output)?;

        Ok(())
    }
}
