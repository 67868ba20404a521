//! Streaming document lifecycle around event encoding.
//!
//! The host consumes the output incrementally, so every fragment is flushed
//! as soon as it is written; diagnostics go to a separate error sink as
//! newline-terminated `"<LEVEL> <message>"` lines.
use std::io::Write;

use crate::{
    event::{Event, EventError},
    xml::{Element, XmlError},
};

const STREAM_HEADER: &str = "<stream>";
const STREAM_FOOTER: &str = "</stream>";

/// Diagnostic level, rendered as its wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Severity::Debug => "DEBUG",
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERROR",
                Severity::Fatal => "FATAL",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StreamState {
    #[default]
    Unopened,
    Open,
    Closed,
}

#[derive(Debug)]
pub enum EventWriterError {
    Event(EventError),
    Xml(XmlError),
    Io(std::io::Error),
    /// The stream was already closed; `Closed` is terminal.
    StreamClosed,
}

impl std::fmt::Display for EventWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for EventWriterError {}

impl From<EventError> for EventWriterError {
    fn from(value: EventError) -> Self {
        EventWriterError::Event(value)
    }
}

impl From<XmlError> for EventWriterError {
    fn from(value: XmlError) -> Self {
        EventWriterError::Xml(value)
    }
}

impl From<std::io::Error> for EventWriterError {
    fn from(value: std::io::Error) -> Self {
        EventWriterError::Io(value)
    }
}

/// Writes a `stream` document of events to an output sink, one flushed
/// fragment per event.
///
/// Both sinks stay owned by the caller (pass `&mut` borrows); the writer
/// never opens or closes the underlying resources. Not reentrant; concurrent
/// use needs external serialization.
pub struct EventWriter<W: Write, E: Write> {
    out: W,
    err: E,
    state: StreamState,
}

impl<W: Write, E: Write> EventWriter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            state: StreamState::Unopened,
        }
    }

    /// Write the opening root tag once, on the first write.
    fn ensure_open(&mut self) -> Result<(), EventWriterError> {
        match self.state {
            StreamState::Unopened => {
                tracing::debug!("Opening event stream");

                self.out.write_all(STREAM_HEADER.as_bytes())?;
                self.state = StreamState::Open;

                Ok(())
            }
            StreamState::Open => Ok(()),
            StreamState::Closed => Err(EventWriterError::StreamClosed),
        }
    }

    /// Encode `event` and flush its fragment to the output sink.
    ///
    /// On validation failure a warning diagnostic is written to the error
    /// sink first (best effort), then the failure propagates; no partial
    /// fragment reaches the output sink.
    pub fn write_event(&mut self, event: &Event) -> Result<(), EventWriterError> {
        self.ensure_open()?;

        let fragment = match event.to_xml() {
            Ok(fragment) => fragment,
            Err(error) => {
                tracing::warn!("Discarding event: {error}");

                // A failing diagnostic write must not mask the encode error.
                let _ = self.log(Severity::Warn, &error.to_string());

                return Err(error.into());
            }
        };

        fragment.write_to(&mut self.out)?;
        self.out.flush()?;

        Ok(())
    }

    /// Write `"<SEVERITY> <message>\n"` to the error sink, unbuffered.
    pub fn log(&mut self, severity: Severity, message: &str) -> Result<(), EventWriterError> {
        self.err.write_all(format!("{severity} {message}\n").as_bytes())?;
        self.err.flush()?;

        Ok(())
    }

    /// Serialize an arbitrary pre-built tree verbatim to the output sink.
    ///
    /// Used for structured non-event payloads; does not touch the stream
    /// header, the document is written standalone.
    pub fn write_xml_document(&mut self, document: &Element) -> Result<(), EventWriterError> {
        if self.state == StreamState::Closed {
            return Err(EventWriterError::StreamClosed);
        }

        document.write_to(&mut self.out)?;
        self.out.flush()?;

        Ok(())
    }

    /// Write the closing root tag and seal the stream.
    ///
    /// Closing an unopened writer still produces a minimal empty document.
    pub fn close(&mut self) -> Result<(), EventWriterError> {
        self.ensure_open()?;

        tracing::debug!("Closing event stream");

        self.out.write_all(STREAM_FOOTER.as_bytes())?;
        self.out.flush()?;
        self.state = StreamState::Closed;

        Ok(())
    }
}
