//! Test utilities for Galley development.
//!
//! Provides the reference kitchen config, in-memory sinks for capturing
//! replay output ([`SharedBuffer`], [`FailingWriter`]) and scripted
//! action sequences in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use galley_engine::KitchenConfig;

/// Text of `configs/kitchen.toml`.
pub const REFERENCE_KITCHEN: &str = include_str!("../../../configs/kitchen.toml");

/// The reference kitchen: six stations, two recipes, seed 0.
pub fn reference_config() -> KitchenConfig {
    KitchenConfig::from_toml_str(REFERENCE_KITCHEN).expect("reference kitchen parses")
}

/// The reference kitchen with random order spawning switched off.
///
/// Each episode still starts with one order.
pub fn quiet_config() -> KitchenConfig {
    let mut cfg = reference_config();
    cfg.simulation.order_spawn_probability = 0.0;
    cfg
}

/// The quiet kitchen where every order asks for sliced tomato (item 4).
pub fn tomato_config() -> KitchenConfig {
    let mut cfg = quiet_config();
    cfg.simulation.order_menu = vec![galley_core::ItemTypeId(4)];
    cfg
}

/// A cloneable in-memory `Write` sink.
///
/// Every clone appends to the same buffer, so a test can hand one clone
/// to a recorder and read the bytes back through another.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Non-empty lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.text()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A `Write` sink that fails deterministically once a byte budget is
/// spent.
///
/// Writes that fit in the remaining budget succeed in full; the first
/// write that would exceed it, and every write after, returns an error.
#[derive(Debug)]
pub struct FailingWriter {
    remaining: usize,
    failed: bool,
    written: Vec<u8>,
}

impl FailingWriter {
    /// Accept up to `budget` bytes, then fail.
    pub fn after(budget: usize) -> Self {
        Self {
            remaining: budget,
            failed: false,
            written: Vec::new(),
        }
    }

    /// Bytes accepted before failing.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Whether a write has failed.
    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed || buf.len() > self.remaining {
            self.failed = true;
            return Err(io::Error::other("injected write failure"));
        }
        self.remaining -= buf.len();
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failed {
            return Err(io::Error::other("injected write failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configs_validate() {
        reference_config().validate().unwrap();
        quiet_config().validate().unwrap();
        tomato_config().validate().unwrap();
    }

    #[test]
    fn shared_buffer_clones_share_bytes() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();
        writer.write_all(b"one\n\ntwo\n").unwrap();
        assert_eq!(buf.lines(), vec!["one", "two"]);
        buf.clear();
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn failing_writer_budget() {
        let mut w = FailingWriter::after(4);
        w.write_all(b"abc").unwrap();
        assert!(w.write_all(b"de").is_err());
        assert!(w.has_failed());
        assert!(w.write(b"x").is_err());
        assert_eq!(w.written(), b"abc");
    }
}
