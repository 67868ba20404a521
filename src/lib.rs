//! Modular input event streaming library.
pub mod event;
pub mod event_writer;
pub mod xml;
