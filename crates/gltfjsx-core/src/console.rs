//! Engine console
//!
//! The engine reports progress and diagnostics on a fixed set of named
//! channels, the way a JavaScript tool would use `console.*` and the two
//! process streams. Every channel writes through a replaceable [`Sink`], so a
//! host can silence or capture engine output without touching the real
//! process streams.
//!
//! By default `log`, `info` and `stdout` go to standard output and every other
//! channel goes to standard error.

use std::io::Write;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

/// A destination for console text
pub type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// Every output channel the engine writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
    Stdout,
    Stderr,
}

impl Channel {
    /// All channels, in table order
    pub const ALL: [Channel; 8] = [
        Channel::Log,
        Channel::Info,
        Channel::Warn,
        Channel::Error,
        Channel::Debug,
        Channel::Trace,
        Channel::Stdout,
        Channel::Stderr,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    fn default_sink(self) -> Sink {
        match self {
            Channel::Log | Channel::Info | Channel::Stdout => Arc::new(|text: &str| {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{text}");
            }),
            Channel::Warn
            | Channel::Error
            | Channel::Debug
            | Channel::Trace
            | Channel::Stderr => Arc::new(|text: &str| {
                let mut err = std::io::stderr().lock();
                let _ = writeln!(err, "{text}");
            }),
        }
    }
}

/// Snapshot of every channel's sink
#[derive(Clone)]
pub struct SinkSet {
    sinks: [Sink; 8],
}

impl SinkSet {
    /// Capture the sinks currently installed
    pub fn current() -> Self {
        TABLE.read().clone()
    }

    /// A set where every channel discards its input
    pub fn silent() -> Self {
        let noop: Sink = Arc::new(|_: &str| {});
        Self {
            sinks: std::array::from_fn(|_| Arc::clone(&noop)),
        }
    }

    /// The sink for one channel
    pub fn get(&self, channel: Channel) -> &Sink {
        &self.sinks[channel.slot()]
    }

    /// Whether every channel points at the same sink as `other`
    pub fn same_as(&self, other: &SinkSet) -> bool {
        self.sinks
            .iter()
            .zip(other.sinks.iter())
            .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet").finish_non_exhaustive()
    }
}

static TABLE: LazyLock<RwLock<SinkSet>> = LazyLock::new(|| {
    RwLock::new(SinkSet {
        sinks: Channel::ALL.map(Channel::default_sink),
    })
});

/// Install a complete sink set, returning the one it replaced
pub fn swap(sinks: SinkSet) -> SinkSet {
    std::mem::replace(&mut *TABLE.write(), sinks)
}

/// Replace the sink of a single channel, returning the previous one
pub fn set_sink(channel: Channel, sink: Sink) -> Sink {
    std::mem::replace(&mut TABLE.write().sinks[channel.slot()], sink)
}

/// The sink currently installed for a channel
pub fn sink(channel: Channel) -> Sink {
    Arc::clone(TABLE.read().get(channel))
}

/// Write one line of text to a channel
pub fn write(channel: Channel, text: &str) {
    // Clone out of the lock so a sink may itself touch the table
    let sink = sink(channel);
    sink(text);
}

pub fn log(text: &str) {
    write(Channel::Log, text);
}

pub fn info(text: &str) {
    write(Channel::Info, text);
}

pub fn warn(text: &str) {
    write(Channel::Warn, text);
}

pub fn debug(text: &str) {
    write(Channel::Debug, text);
}
