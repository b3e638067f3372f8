//! The administrative surface: a directory with an `enable` entry (read/write) and
//! a `stats` entry (read-only).
//!
//! The transport that exposes these entries belongs to the host and is abstracted
//! by [`ControlSurface`]. This module owns the payload formats.

use std::{fmt, io};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{StatSet, Summary};

/// Default root directory name for the control entries.
pub const DEFAULT_CONTROL_ROOT: &str = "smsc95xx";
/// Default upper bound for a write to the `enable` entry, in bytes.
pub const DEFAULT_WRITE_LIMIT: usize = 32;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Entry is read-only: {0}")]
    ReadOnly(Entry),
}

/// A control entry under the root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    Enable,
    Stats,
}

impl Entry {
    pub const ALL: [Entry; 2] = [Entry::Enable, Entry::Stats];

    pub fn name(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Stats => "stats",
        }
    }

    /// Unix-style permission bits for the entry.
    pub fn mode(self) -> u32 {
        match self {
            Self::Enable => 0o644,
            Self::Stats => 0o444,
        }
    }

    pub fn is_writable(self) -> bool {
        self == Self::Enable
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    Entry { mode: u32 },
}

/// The host-provided surface control entries are published on.
pub trait ControlSurface: Send + Sync + 'static {
    /// Creates a directory or entry at `path` (`/`-separated, relative to the
    /// surface root).
    fn create(&self, path: &str, kind: NodeKind) -> io::Result<()>;

    /// Removes a node created by [`create`](ControlSurface::create).
    fn remove(&self, path: &str);
}

/// A surface that accepts every node and publishes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSurface;

impl ControlSurface for NoopSurface {
    fn create(&self, _path: &str, _kind: NodeKind) -> io::Result<()> {
        Ok(())
    }

    fn remove(&self, _path: &str) {}
}

/// The set of nodes published on a surface. Removing happens in reverse
/// creation order.
pub(crate) struct Registration {
    paths: Vec<String>,
}

impl Registration {
    /// Creates the root directory and every [`Entry`]. If any node fails, the ones
    /// already created are removed before the error is returned.
    pub(crate) fn create(
        surface: &dyn ControlSurface,
        root: &str,
    ) -> Result<Self, (String, io::Error)> {
        let mut plan = vec![(root.to_string(), NodeKind::Dir)];
        plan.extend(
            Entry::ALL
                .iter()
                .map(|e| (format!("{root}/{}", e.name()), NodeKind::Entry { mode: e.mode() })),
        );

        let mut registration = Self { paths: Vec::with_capacity(plan.len()) };
        for (path, kind) in plan {
            if let Err(e) = surface.create(&path, kind) {
                warn!(path = %path, err = %e, "failed to create control node, unwinding");
                registration.remove(surface);
                return Err((path, e));
            }

            debug!(path = %path, ?kind, "created control node");
            registration.paths.push(path);
        }

        Ok(registration)
    }

    pub(crate) fn remove(&mut self, surface: &dyn ControlSurface) {
        while let Some(path) = self.paths.pop() {
            surface.remove(&path);
        }
    }
}

/// Decodes a write to the `enable` entry: `0` or `1`, optionally followed by
/// ASCII whitespace, at most `limit` bytes long.
pub fn parse_enable(input: &[u8], limit: usize) -> Result<bool, ControlError> {
    if input.len() > limit {
        return Err(ControlError::InvalidInput(format!(
            "write of {} bytes exceeds the {limit} byte limit",
            input.len()
        )));
    }

    match input.trim_ascii_end() {
        b"0" => Ok(false),
        b"1" => Ok(true),
        other => Err(ControlError::InvalidInput(format!(
            "expected 0 or 1, got {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Renders the `enable` entry.
pub fn render_enable(enabled: bool) -> String {
    format!("{}\n", u8::from(enabled))
}

/// The `stats` entry: transmit block first, then receive.
#[derive(Debug, Clone, Copy)]
pub struct Report(pub Summary);

impl Report {
    fn block(f: &mut fmt::Formatter<'_>, title: &str, set: &StatSet) -> fmt::Result {
        writeln!(f, ".-* {title}")?;
        writeln!(f, "|  ARP packets  : ({})", set.l2_arp)?;
        writeln!(f, "|")?;
        writeln!(f, "|  L3 Unicasts  : ({})", set.l3_unicast)?;
        writeln!(f, "|  L3 Broadcasts: ({})", set.l3_broadcast)?;
        writeln!(f, "|  L3 Multicasts: ({})", set.l3_multicast)?;
        writeln!(f, ":")?;
        writeln!(f, "'")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::block(f, "Transmit", &self.0.tx)?;
        writeln!(f)?;
        Self::block(f, "Receive", &self.0.rx)
    }
}
