//! Debounced, crash-safe persistence of the resource-tree snapshot.
//!
//! Mutating requests trigger a save cycle: the tree snapshot is
//! serialised, gzip-compressed into a temporary file, and the temporary
//! file is renamed over the previous snapshot so the final path is never
//! observed half-written. Requests arriving while a cycle is in flight are
//! coalesced into at most one follow-up cycle, which captures the tree
//! state at the time it runs rather than at request arrival. At most one
//! cycle's filesystem operations are ever in flight.
//!
//! Persistence is best-effort: failures are routed to the configured
//! error sink and never propagate into the request that triggered them.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, warn};

use davenport_config::AutoSaveOptions;
use davenport_types::Method;

use crate::dispatch::{RequestContext, RequestHook};

pub(crate) const PERSIST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::persist");

/// Produces the serialisable snapshot of the resource tree.
///
/// Called once per save cycle; the returned value is what lands on disk.
pub trait TreeSource: Send + Sync {
    /// Serialises the current tree state.
    ///
    /// # Errors
    ///
    /// Any error aborts the cycle and reaches the error sink as
    /// [`PersistError::Snapshot`].
    fn save(&self) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// Wraps the temporary-file writer the compressed snapshot is piped into,
/// allowing the output to be substituted or teed. The default provider
/// passes the writer through unmodified.
pub type StreamProvider = Box<dyn Fn(Box<dyn Write + Send>) -> Box<dyn Write + Send> + Send + Sync>;

/// Receives persistence failures. The default sink discards them; the
/// coordinator additionally logs every failure at `warn`.
pub type ErrorSink = Box<dyn Fn(&PersistError) + Send + Sync>;

/// Errors surfaced during a save cycle, routed to the error sink.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The tree collaborator failed to produce a snapshot.
    #[error("failed to serialise tree snapshot: {source}")]
    Snapshot {
        /// Collaborator error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The temporary file could not be created.
    #[error("failed to create temporary snapshot {path}: {source}")]
    CreateTemp {
        /// Temporary file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Snapshot encoding failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    /// The compressed stream could not be finished or flushed.
    #[error("failed to finish compressed snapshot {path}: {source}")]
    Compress {
        /// Temporary file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The previous snapshot could not be removed (for a reason other than
    /// it not existing, which is tolerated).
    #[error("failed to remove previous snapshot {path}: {source}")]
    RemovePrevious {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The temporary file could not be renamed over the snapshot.
    #[error("failed to replace snapshot {path}: {source}")]
    Replace {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Save-coalescing states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveState {
    /// No cycle in flight.
    Idle,
    /// A cycle is in flight, nothing queued behind it.
    Saving,
    /// A cycle is in flight and at least one request arrived meanwhile;
    /// exactly one follow-up cycle will run.
    SavingWithPending,
}

struct SaveInner {
    tree: Arc<dyn TreeSource>,
    tree_file: Utf8PathBuf,
    temp_file: Utf8PathBuf,
    stream_provider: StreamProvider,
    error_sink: ErrorSink,
    state: Mutex<SaveState>,
}

/// The auto-persistence coordinator, registered as an after-request hook.
#[derive(Clone)]
pub struct AutoSave {
    inner: Arc<SaveInner>,
}

impl AutoSave {
    /// Creates a coordinator with the default identity stream provider and
    /// discarding error sink.
    pub fn new(tree: Arc<dyn TreeSource>, options: AutoSaveOptions) -> Self {
        Self {
            inner: Arc::new(SaveInner {
                tree,
                tree_file: options.tree_file,
                temp_file: options.temp_tree_file,
                stream_provider: Box::new(|writer| writer),
                error_sink: Box::new(|_| {}),
                state: Mutex::new(SaveState::Idle),
            }),
        }
    }

    /// Replaces the stream provider. Must be called before the coordinator
    /// is shared.
    #[must_use]
    pub fn with_stream_provider(mut self, provider: StreamProvider) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.stream_provider = provider;
        }
        self
    }

    /// Replaces the error sink. Must be called before the coordinator is
    /// shared.
    #[must_use]
    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.error_sink = sink;
        }
        self
    }

    /// Requests a save, coalescing with any cycle already in flight.
    ///
    /// Returns immediately in every case; the caller is never blocked on
    /// persistence.
    pub fn request_save(&self) {
        let mut state = lock(&self.inner.state);
        match *state {
            SaveState::Idle => {
                *state = SaveState::Saving;
                drop(state);
                spawn_cycles(Arc::clone(&self.inner));
            }
            SaveState::Saving | SaveState::SavingWithPending => {
                *state = SaveState::SavingWithPending;
            }
        }
    }

    /// True when no save cycle is in flight.
    pub fn is_idle(&self) -> bool {
        *lock(&self.inner.state) == SaveState::Idle
    }
}

impl RequestHook for AutoSave {
    fn run(&self, ctx: &mut RequestContext) {
        if triggers_save(ctx.method()) {
            debug!(
                target: PERSIST_TARGET,
                method = %ctx.method(),
                "mutating request, scheduling snapshot save"
            );
            self.request_save();
        }
    }
}

/// Returns true when `method` belongs to the persistence trigger set.
/// Kept as a free function so callers can mirror the hook's decision.
pub(crate) fn triggers_save(method: &Method) -> bool {
    method.is_mutating()
}

fn lock(state: &Mutex<SaveState>) -> std::sync::MutexGuard<'_, SaveState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs cycles on a dedicated thread until no follow-up is pending.
fn spawn_cycles(inner: Arc<SaveInner>) {
    thread::spawn(move || {
        loop {
            match run_cycle(&inner) {
                Ok(()) => {
                    debug!(target: PERSIST_TARGET, path = %inner.tree_file, "snapshot saved");
                }
                Err(error) => {
                    warn!(target: PERSIST_TARGET, %error, "snapshot save failed");
                    (inner.error_sink)(&error);
                }
            }

            let mut state = lock(&inner.state);
            match *state {
                SaveState::SavingWithPending => {
                    // Re-enter with the tree state as of now, not as of the
                    // request that queued the follow-up.
                    *state = SaveState::Saving;
                }
                _ => {
                    *state = SaveState::Idle;
                    break;
                }
            }
        }
    });
}

fn run_cycle(inner: &SaveInner) -> Result<(), PersistError> {
    let snapshot = inner
        .tree
        .save()
        .map_err(|source| PersistError::Snapshot { source })?;

    let file = File::create(inner.temp_file.as_std_path()).map_err(|source| {
        PersistError::CreateTemp {
            path: inner.temp_file.clone(),
            source,
        }
    })?;
    let sink = (inner.stream_provider)(Box::new(BufWriter::new(file)));
    let mut encoder = GzEncoder::new(sink, Compression::default());
    serde_json::to_writer(&mut encoder, &snapshot)?;
    let mut sink = encoder.finish().map_err(|source| PersistError::Compress {
        path: inner.temp_file.clone(),
        source,
    })?;
    sink.flush().map_err(|source| PersistError::Compress {
        path: inner.temp_file.clone(),
        source,
    })?;
    drop(sink);

    if let Err(source) = fs::remove_file(inner.tree_file.as_std_path())
        && source.kind() != io::ErrorKind::NotFound
    {
        return Err(PersistError::RemovePrevious {
            path: inner.tree_file.clone(),
            source,
        });
    }

    fs::rename(
        inner.temp_file.as_std_path(),
        inner.tree_file.as_std_path(),
    )
    .map_err(|source| PersistError::Replace {
        path: inner.tree_file.clone(),
        source,
    })
}
