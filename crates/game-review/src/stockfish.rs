//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::error::EvaluatorError;
use crate::evaluator::{side_to_move, Evaluates, Score};

/// How to launch and drive the engine process
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub path: String,
    pub args: Vec<String>,
    pub threads: u32,
    pub hash_mb: u32,
    /// Budget for the UCI handshake and for each `go` query
    pub query_timeout: Duration,
}

impl EngineOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            threads: 1,
            hash_mb: 256,
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    query_timeout: Duration,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn spawn(options: &EngineOptions) -> Result<Self, EvaluatorError> {
        let mut process = Command::new(&options.path)
            .args(&options.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| {
                EvaluatorError::Unavailable(format!("Failed to spawn {}: {e}", options.path))
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EvaluatorError::Unavailable("Engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EvaluatorError::Unavailable("Engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            query_timeout: options.query_timeout,
        };

        let timeout = options.query_timeout;
        tokio::time::timeout(timeout, engine.handshake(options))
            .await
            .map_err(|_| EvaluatorError::Timeout(timeout))??;

        Ok(engine)
    }

    async fn handshake(&mut self, options: &EngineOptions) -> Result<(), EvaluatorError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        // Configure for analysis
        self.send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        self.send("setoption name UCI_AnalyseMode value true").await?;
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EvaluatorError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EvaluatorError::Unavailable(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EvaluatorError::Unavailable(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line, treating end of output as a dead engine
    async fn read_line(&mut self, line: &mut String) -> Result<(), EvaluatorError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| EvaluatorError::Unavailable(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(EvaluatorError::Unavailable("Stockfish closed its output".into()));
        }
        debug!(line = line.trim(), "SF >");
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EvaluatorError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Run a fixed-depth search and return the last reported (cp, mate)
    async fn search(&mut self, fen: &str, depth: u32) -> Result<(Option<i32>, Option<i32>), EvaluatorError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut cp = None;
        let mut mate = None;

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            // Checkmated/stalemated positions report depth 0 without a pv
            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if let Some(c) = parse_cp(trimmed) {
                    cp = Some(c);
                    mate = None;
                }
                if let Some(m) = parse_mate(trimmed) {
                    mate = Some(m);
                    cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        Ok((cp, mate))
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if tokio::time::timeout(self.query_timeout, self.process.wait())
            .await
            .is_err()
        {
            let _ = self.process.start_kill();
        }
    }
}

impl Evaluates for StockfishEngine {
    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<Score, EvaluatorError> {
        let side = side_to_move(fen)
            .ok_or_else(|| EvaluatorError::Unavailable(format!("No side to move in FEN: {fen}")))?;

        let timeout = self.query_timeout;
        let (cp, mate) = tokio::time::timeout(timeout, self.search(fen, depth))
            .await
            .map_err(|_| EvaluatorError::Timeout(timeout))??;

        Score::from_uci(cp, mate, side)
            .ok_or_else(|| EvaluatorError::Unavailable(format!("No score reported for {fen}")))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_after(line, "mate")
}

fn parse_after(line: &str, keyword: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == keyword && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// A UCI engine written in shell: answers the handshake, runs `on_go` for
/// every search request and `on_quit` when told to quit.
#[cfg(test)]
pub(crate) fn fake_engine(on_go: &str, on_quit: &str) -> EngineOptions {
    let script = format!(
        r#"while read -r line; do
  case "$line" in
    uci) echo "id name fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {on_go} ;;
    quit) {on_quit} ;;
  esac
done"#
    );
    EngineOptions {
        args: vec!["-c".into(), script],
        query_timeout: Duration::from_millis(500),
        ..EngineOptions::new("/bin/sh")
    }
}
