//! Output channel suppression
//!
//! On stdio transport stdout carries the protocol, so engine chatter must not
//! reach it while the engine runs. [`acquire`] silences every engine console
//! channel (and, through the subscriber filter installed by the binary, every
//! `tracing` event) until the returned guard drops.
//!
//! Scopes nest and may overlap across threads: the first acquisition captures
//! the installed sinks, later ones only deepen the count, and the sinks come
//! back when the last guard is released.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gltfjsx_core::console::{self, Channel, SinkSet};
use parking_lot::Mutex;

struct Scope {
    depth: usize,
    saved: Option<SinkSet>,
}

static SCOPE: Mutex<Scope> = Mutex::new(Scope {
    depth: 0,
    saved: None,
});

// Mirrors `Scope::depth` for lock-free reads from the log filter
static DEPTH: AtomicUsize = AtomicUsize::new(0);

/// Keeps the engine console silent while alive
#[must_use = "suppression ends when the guard is dropped"]
#[derive(Debug)]
pub struct SuppressionGuard {
    _private: (),
}

/// Enter a suppression scope
pub fn acquire() -> SuppressionGuard {
    let mut scope = SCOPE.lock();
    if scope.depth == 0 {
        scope.saved = Some(console::swap(SinkSet::silent()));
    }
    scope.depth += 1;
    DEPTH.store(scope.depth, Ordering::SeqCst);
    SuppressionGuard { _private: () }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        let mut scope = SCOPE.lock();
        scope.depth = scope.depth.saturating_sub(1);
        if scope.depth == 0 {
            if let Some(saved) = scope.saved.take() {
                console::swap(saved);
            }
        }
        DEPTH.store(scope.depth, Ordering::SeqCst);
    }
}

/// Whether any suppression scope is open
pub fn is_active() -> bool {
    depth() > 0
}

/// Number of open suppression scopes
pub fn depth() -> usize {
    DEPTH.load(Ordering::SeqCst)
}

/// Run `operation` with the engine console silenced
pub fn run_suppressed<T>(operation: impl FnOnce() -> T) -> T {
    let _guard = acquire();
    operation()
}

/// Send the engine's stdout-bound channels to the log instead.
///
/// Call before serving; an open scope would restore the old sinks on exit.
pub fn route_console_to_log() {
    let _scope = SCOPE.lock();
    for channel in [Channel::Log, Channel::Info, Channel::Stdout] {
        console::set_sink(
            channel,
            Arc::new(|text: &str| tracing::info!(target: "gltfjsx_core", "{}", text)),
        );
    }
}

#[cfg(test)]
pub(crate) static SERIAL: Mutex<()> = Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restores_after_return() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        let value = run_suppressed(|| {
            assert!(is_active());
            assert!(!SinkSet::current().same_as(&before));
            42
        });

        assert_eq!(value, 42);
        assert!(!is_active());
        assert!(SinkSet::current().same_as(&before));
    }

    #[test]
    fn test_restores_after_failure() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        let result: Result<(), &str> = run_suppressed(|| Err("engine failed"));
        assert!(result.is_err());
        assert!(SinkSet::current().same_as(&before));

        let panicked = std::panic::catch_unwind(|| run_suppressed(|| panic!("engine panicked")));
        assert!(panicked.is_err());
        assert!(!is_active());
        assert!(SinkSet::current().same_as(&before));
    }

    #[test]
    fn test_nested_scopes() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        let outer = acquire();
        let silenced = console::sink(Channel::Log);
        let inner = acquire();
        assert_eq!(depth(), 2);
        assert!(Arc::ptr_eq(&console::sink(Channel::Log), &silenced));

        drop(inner);
        assert!(is_active());
        assert!(!SinkSet::current().same_as(&before));

        drop(outer);
        assert!(!is_active());
        assert!(SinkSet::current().same_as(&before));
    }

    #[test]
    fn test_concurrent_scopes() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    for _ in 0..50 {
                        run_suppressed(|| console::info("hidden"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker finished");
        }

        assert!(!is_active());
        assert!(SinkSet::current().same_as(&before));
    }

    #[test]
    fn test_cancelled_future_releases() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let timed_out = runtime.block_on(async {
            let pending = async {
                let _guard = acquire();
                std::future::pending::<()>().await;
            };
            tokio::time::timeout(std::time::Duration::from_millis(10), pending).await
        });

        assert!(timed_out.is_err());
        assert!(!is_active());
        assert!(SinkSet::current().same_as(&before));
    }

    #[test]
    fn test_route_console_to_log() {
        let _serial = SERIAL.lock();
        let before = SinkSet::current();

        route_console_to_log();
        let routed = console::sink(Channel::Info);
        assert!(!Arc::ptr_eq(&routed, before.get(Channel::Info)));
        assert!(Arc::ptr_eq(&console::sink(Channel::Warn), before.get(Channel::Warn)));

        run_suppressed(|| console::info("hidden"));
        assert!(Arc::ptr_eq(&console::sink(Channel::Info), &routed));

        console::swap(before);
    }
}
