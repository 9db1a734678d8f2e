//! Subprocess transport
//!
//! Owns a child process's stdin/stdout as a newline-delimited duplex channel.
//! The child's stderr is passed through to ours so engine diagnostics stay
//! visible. One envelope per line, flushed immediately; the design allows a
//! single in-flight request at a time, so there is exactly one writer.

use std::process::Stdio;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::protocol::{EngineError, EngineResult};

pub struct EngineTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
}

impl EngineTransport {
    /// Launch the engine process with its stdin/stdout captured as pipes.
    pub fn spawn(command: &str, args: &[String]) -> EngineResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Transport(format!("Failed to spawn engine: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Transport("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Transport("Failed to capture stdout".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Serialize one envelope as a single line and flush it.
    pub async fn write_line<T: Serialize>(&mut self, payload: &T) -> EngineResult<()> {
        let mut line = serde_json::to_string(payload)
            .map_err(|e| EngineError::Protocol(format!("Failed to serialize request: {}", e)))?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| EngineError::Transport(format!("Failed to write to engine: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Transport(format!("Failed to flush engine stdin: {}", e)))
    }

    /// Read the next full line from the child, or `ConnectionClosed` on EOF.
    ///
    /// Callers must not retry after `ConnectionClosed`.
    pub async fn read_line(&mut self) -> EngineResult<String> {
        match self.stdout.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(EngineError::ConnectionClosed),
            Err(e) => Err(EngineError::Transport(format!("Read error: {}", e))),
        }
    }

    /// Kill the child process. Safe to call more than once.
    pub async fn terminate(&mut self) {
        let _ = self.child.kill().await;
    }
}
