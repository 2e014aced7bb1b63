//! Sandbox backed by a local Python interpreter process.
//!
//! Every run is a fresh process; learner code arrives on stdin and the harness
//! replies with a single JSON envelope on stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{CallOutcome, ExecutionOutput, Sandbox, SandboxError, SandboxLoader};
use crate::config::SandboxConfig;

// Both harnesses move fd 1 onto a temp file before learner code runs, so raw
// writes (sys.__stdout__, os.write, subprocesses) are captured as output and
// only the saved descriptor carries the reply.
const RUN_HARNESS: &str = r#"
import io, json, os, sys, tempfile, traceback
_src = sys.stdin.read()
_reply = os.fdopen(os.dup(1), "w", encoding="utf-8")
_raw = tempfile.TemporaryFile()
os.dup2(_raw.fileno(), 1)
_buf = io.StringIO()
_real = sys.stdout
_err = None
sys.stdout = _buf
try:
    exec(compile(_src, "<learner>", "exec"), {"__name__": "__main__"})
except BaseException:
    _err = traceback.format_exc()
finally:
    sys.stdout = _real
    try:
        sys.__stdout__.flush()
    except Exception:
        pass
_raw.seek(0)
_out = _buf.getvalue() + _raw.read().decode("utf-8", "replace")
_reply.write(json.dumps({"stdout": _out, "error": _err}))
_reply.flush()
"#;

const CALL_HARNESS: &str = r#"
import io, json, os, sys, tempfile, traceback
_req = json.loads(sys.stdin.read())
_reply = os.fdopen(os.dup(1), "w", encoding="utf-8")
_raw = tempfile.TemporaryFile()
os.dup2(_raw.fileno(), 1)
_buf = io.StringIO()
_real = sys.stdout
_resp = {"value": None, "error": None}
sys.stdout = _buf
try:
    _ns = {"__name__": "__learner__"}
    exec(compile(_req["source"], "<learner>", "exec"), _ns)
    _fn = _ns.get(_req["function"])
    if not callable(_fn):
        raise NameError("function '%s' is not defined" % _req["function"])
    _resp["value"] = _fn(*_req["args"])
except BaseException:
    _resp["error"] = traceback.format_exc()
finally:
    sys.stdout = _real
    try:
        sys.__stdout__.flush()
    except Exception:
        pass
_raw.seek(0)
_resp["stdout"] = _buf.getvalue() + _raw.read().decode("utf-8", "replace")
try:
    _out = json.dumps(_resp, allow_nan=False)
except (TypeError, ValueError):
    _resp["error"] = "return value is not JSON serializable: %r" % (_resp["value"],)
    _resp["value"] = None
    _out = json.dumps(_resp)
_reply.write(_out)
_reply.flush()
"#;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    stdout: String,
    error: Option<String>,
    #[serde(default)]
    value: Value,
}

/// Verifies the interpreter once and hands out a [`PythonSandbox`].
#[derive(Debug, Clone)]
pub struct PythonLoader {
    python_bin: String,
    timeout: Duration,
}

impl PythonLoader {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(config.python_bin.clone(), config.timeout)
    }
}

#[async_trait]
impl SandboxLoader for PythonLoader {
    type Output = PythonSandbox;

    async fn load(&self) -> Result<PythonSandbox, SandboxError> {
        let version_check = Command::new(&self.python_bin)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, version_check)
            .await
            .map_err(|_| SandboxError::Timeout(self.timeout))?
            .map_err(|e| SandboxError::Unavailable(format!("{}: {e}", self.python_bin)))?;

        if !output.status.success() {
            return Err(SandboxError::Unavailable(format!(
                "{} --version exited with {}",
                self.python_bin, output.status
            )));
        }

        // Older interpreters print the version on stderr.
        let raw = if output.stdout.is_empty() { &output.stderr } else { &output.stdout };
        let version = String::from_utf8_lossy(raw).trim().to_string();
        if !version.starts_with("Python 3") {
            return Err(SandboxError::Unavailable(format!(
                "{} reports {version:?}, expected Python 3",
                self.python_bin
            )));
        }

        info!(python_bin = %self.python_bin, %version, "python interpreter verified");
        Ok(PythonSandbox {
            python_bin: self.python_bin.clone(),
            timeout: self.timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PythonSandbox {
    python_bin: String,
    timeout: Duration,
}

impl PythonSandbox {
    async fn execute(&self, harness: &str, stdin: &[u8]) -> Result<Envelope, SandboxError> {
        let mut child = Command::new(&self.python_bin)
            .arg("-I")
            .arg("-c")
            .arg(harness)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin).await?;
            pipe.shutdown().await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| SandboxError::Timeout(self.timeout))??;

        debug!(status = %output.status, stdout_bytes = output.stdout.len(), "sandbox process finished");

        serde_json::from_slice(&output.stdout).map_err(|e| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            SandboxError::Decode(format!("{e}; stderr: {}", stderr.trim()))
        })
    }
}

#[async_trait]
impl Sandbox for PythonSandbox {
    async fn run(&self, code: &str) -> Result<ExecutionOutput, SandboxError> {
        let envelope = self.execute(RUN_HARNESS, code.as_bytes()).await?;
        Ok(ExecutionOutput {
            stdout: envelope.stdout,
            error: envelope.error,
        })
    }

    async fn call(&self, source: &str, function: &str, args: &[Value]) -> Result<CallOutcome, SandboxError> {
        let request = serde_json::json!({
            "source": source,
            "function": function,
            "args": args,
        });
        let payload =
            serde_json::to_vec(&request).map_err(|e| SandboxError::Decode(e.to_string()))?;
        let envelope = self.execute(CALL_HARNESS, &payload).await?;

        match envelope.error {
            Some(message) => Err(SandboxError::Exception {
                message,
                stdout: envelope.stdout,
            }),
            None => Ok(CallOutcome {
                value: envelope.value,
                stdout: envelope.stdout,
            }),
        }
    }
}
