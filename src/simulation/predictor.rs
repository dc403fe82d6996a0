use std::{
    collections::HashMap,
    fmt,
    path::PathBuf,
    process::Command,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Duration,
};

use log::{debug, info};

use crate::PitwallError;

/// Argument passed across the prediction module boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictorArg {
    Int(i64),
    Bool(bool),
}

impl PredictorArg {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PredictorArg::Int(value) => Some(*value),
            PredictorArg::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PredictorArg::Bool(value) => Some(*value),
            PredictorArg::Int(_) => None,
        }
    }
}

/// Rendered as Python literals
impl fmt::Display for PredictorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorArg::Int(value) => write!(f, "{}", value),
            PredictorArg::Bool(true) => write!(f, "True"),
            PredictorArg::Bool(false) => write!(f, "False"),
        }
    }
}

/// Capability to run a prediction module function and return its textual output.
///
/// Implementations are blocking; callers are expected to run them off the interactive thread.
pub trait Predictor: Send + Sync {
    /// Bring up the runtime hosting the prediction modules.
    ///
    /// Called once before the first `call`. Implementations don't need to guard against
    /// repeated calls themselves, the invoker does that.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeInit` if the runtime is not available.
    fn start(&self) -> Result<(), PitwallError>;

    /// Call `function` in `module` with `args` and return whatever text it produced.
    ///
    /// # Errors
    ///
    /// Returns `Invocation` if the function raised or the runtime failed mid-call.
    fn call(
        &self,
        module: &str,
        function: &str,
        args: &[PredictorArg],
    ) -> Result<String, PitwallError>;
}

// Imports the module from the working directory, calls the function with literal arguments and
// writes the returned value to stdout. Anything the module prints goes to stderr.
const BOOTSTRAP: &str = r#"
import ast, contextlib, importlib, sys
sys.path.insert(0, ".")
module = importlib.import_module(sys.argv[1])
args = [ast.literal_eval(a) for a in sys.argv[3:]]
with contextlib.redirect_stdout(sys.stderr):
    result = getattr(module, sys.argv[2])(*args)
sys.stdout.write(str(result))
"#;

/// Runs prediction modules in a Python interpreter subprocess, one process per call.
pub struct PythonPredictor {
    python: String,
    module_dir: PathBuf,
}

impl PythonPredictor {
    pub fn new(python: impl Into<String>, module_dir: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            module_dir: module_dir.into(),
        }
    }
}

impl Predictor for PythonPredictor {
    fn start(&self) -> Result<(), PitwallError> {
        if !self.module_dir.is_dir() {
            return Err(PitwallError::RuntimeInit {
                reason: format!("module directory {:?} does not exist", self.module_dir),
            });
        }

        let status = Command::new(&self.python)
            .arg("-c")
            .arg("import sys")
            .status()
            .map_err(|e| PitwallError::RuntimeInit {
                reason: format!("could not run {}: {}", self.python, e),
            })?;
        if !status.success() {
            return Err(PitwallError::RuntimeInit {
                reason: format!("{} exited with {}", self.python, status),
            });
        }

        info!(
            "Python runtime ready ({}, modules in {:?})",
            self.python, self.module_dir
        );
        Ok(())
    }

    fn call(
        &self,
        module: &str,
        function: &str,
        args: &[PredictorArg],
    ) -> Result<String, PitwallError> {
        debug!("python: {}.{}({:?})", module, function, args);
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(module)
            .arg(function)
            .args(args.iter().map(PredictorArg::to_string))
            .current_dir(&self.module_dir)
            .output()
            .map_err(|e| PitwallError::Invocation {
                module: module.to_string(),
                reason: format!("could not run {}: {}", self.python, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output")
                .to_string();
            return Err(PitwallError::Invocation {
                module: module.to_string(),
                reason: format!("{} ({})", reason, output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

type Responder = Box<dyn Fn(&[PredictorArg]) -> Result<String, String> + Send + Sync>;

/// A scripted predictor for tests and offline runs.
///
/// Each module gets a responder closure that receives the call arguments and returns either the
/// module output or an error message. Calls and starts are counted.
pub struct MockPredictor {
    responders: HashMap<String, Responder>,
    call_delay: Duration,
    start_delay: Duration,
    start_failure: Option<String>,
    starts: AtomicUsize,
    calls: AtomicUsize,
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self {
            responders: HashMap::new(),
            call_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            start_failure: None,
            starts: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<F>(mut self, module: &str, responder: F) -> Self
    where
        F: Fn(&[PredictorArg]) -> Result<String, String> + Send + Sync + 'static,
    {
        self.responders
            .insert(module.to_string(), Box::new(responder));
        self
    }

    /// Every call blocks for `delay` before answering
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn failing_start(mut self, reason: &str) -> Self {
        self.start_failure = Some(reason.to_string());
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Predictor for MockPredictor {
    fn start(&self) -> Result<(), PitwallError> {
        thread::sleep(self.start_delay);
        self.starts.fetch_add(1, Ordering::SeqCst);
        match &self.start_failure {
            Some(reason) => Err(PitwallError::RuntimeInit {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn call(
        &self,
        module: &str,
        _function: &str,
        args: &[PredictorArg],
    ) -> Result<String, PitwallError> {
        thread::sleep(self.call_delay);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let responder = self
            .responders
            .get(module)
            .ok_or_else(|| PitwallError::Invocation {
                module: module.to_string(),
                reason: format!("No module named '{}'", module),
            })?;
        responder(args).map_err(|reason| PitwallError::Invocation {
            module: module.to_string(),
            reason,
        })
    }
}
