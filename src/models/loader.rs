//! ONNX model loader

use crate::error::{InferenceError, ModelLoadError};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};
use tracing::{debug, info, warn};

/// Declared input of a loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub name: String,
    /// Element type when the input is a tensor
    pub element: Option<TensorElementType>,
}

/// A fixed set of sessions over one artifact.
///
/// A session handle is needed mutably to run, so concurrent callers are
/// spread across the pool; the model weights behind every session are the
/// same and never change.
pub struct SessionPool<S = Session> {
    sessions: Vec<Mutex<S>>,
    next: AtomicUsize,
}

impl<S> SessionPool<S> {
    fn new(sessions: Vec<S>) -> Self {
        Self {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Run `f` on a free session, waiting on one if all are busy.
    ///
    /// A lock poisoned by a panicking call is taken over and cleared.
    pub fn with_session<R, F>(&self, model: &str, f: F) -> Result<R, InferenceError>
    where
        F: FnOnce(&mut S) -> Result<R, InferenceError>,
    {
        if self.sessions.is_empty() {
            return Err(InferenceError::Unavailable {
                model: model.to_string(),
            });
        }

        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        for offset in 0..self.sessions.len() {
            let idx = (start + offset) % self.sessions.len();
            match self.sessions[idx].try_lock() {
                Ok(mut session) => return f(&mut session),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(poisoned)) => {
                    let mut session = poisoned.into_inner();
                    self.recover(model, idx);
                    return f(&mut session);
                }
            }
        }

        debug!(model = %model, "All sessions busy, waiting");
        let mut session = self.sessions[start].lock().unwrap_or_else(|poisoned| {
            self.recover(model, start);
            poisoned.into_inner()
        });
        f(&mut session)
    }

    fn recover(&self, model: &str, idx: usize) {
        warn!(model = %model, session = idx, "Session lock poisoned by a panicked call, recovering");
        self.sessions[idx].clear_poison();
    }
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    pub pool: SessionPool,
    pub inputs: Vec<InputSpec>,
    /// Output name for probabilities
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of intra-op threads per session
    onnx_threads: usize,
    /// Sessions opened per artifact
    pool_size: usize,
}

impl ModelLoader {
    /// Create a loader and initialize ONNX Runtime.
    pub fn new(onnx_threads: usize, pool_size: usize) -> Result<Self, ModelLoadError> {
        ort::init().commit().map_err(|e| ModelLoadError::Session {
            model: "onnxruntime".to_string(),
            reason: e.to_string(),
        })?;
        info!(onnx_threads = onnx_threads, pool_size = pool_size, "ONNX Runtime initialized");
        Ok(Self {
            onnx_threads: onnx_threads.max(1),
            pool_size: pool_size.max(1),
        })
    }

    /// Load a model artifact. A missing file is reported as such so startup
    /// can fail with a clear message.
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel, ModelLoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ModelLoadError::NotFound {
                model: name.to_string(),
                path: path.to_path_buf(),
            });
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let sessions = (0..self.pool_size)
            .map(|_| self.open_session(path, name))
            .collect::<Result<Vec<_>, _>>()?;

        let first = &sessions[0];
        let inputs: Vec<InputSpec> = first
            .inputs
            .iter()
            .map(|i| InputSpec {
                name: i.name.clone(),
                element: i.input_type.tensor_type(),
            })
            .collect();

        let output_name = first
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| first.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelLoadError::Schema {
                model: name.to_string(),
                reason: "model declares no probability output".to_string(),
            })?;

        info!(
            model = %name,
            inputs = ?inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            output = %output_name,
            sessions = sessions.len(),
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            pool: SessionPool::new(sessions),
            inputs,
            output_name,
        })
    }

    fn open_session(&self, path: &Path, name: &str) -> Result<Session, ModelLoadError> {
        Session::builder()
            .map_err(|e| session_error(name, path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| session_error(name, path, e))?
            .with_intra_threads(self.onnx_threads)
            .map_err(|e| session_error(name, path, e))?
            .commit_from_file(path)
            .map_err(|e| session_error(name, path, e))
    }
}

fn session_error(name: &str, path: &Path, e: impl std::fmt::Display) -> ModelLoadError {
    ModelLoadError::Session {
        model: name.to_string(),
        reason: format!("{} ({})", e, path.display()),
    }
}
