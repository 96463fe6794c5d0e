//! UCI process adapter.
//!
//! A [`UciEngine`] owns exactly one engine subprocess and talks to it over
//! stdin/stdout. The protocol has no request identifiers, so requests on one
//! adapter must be strictly sequential; the adapter takes `&mut self` for
//! every request and leaves mutual exclusion to its owner.
//!
//! Every interaction is bounded by a timeout. A timed-out or abandoned search
//! leaves the engine "desynced": before the next request the adapter sends
//! `stop` and drains output up to a fresh `readyok`, so a late `bestmove` is
//! never attributed to the wrong request. There is no way to cancel a search
//! other than that best-effort `stop`.

use crate::analysis::{AnalysisLine, SearchLimit};
use crate::config::TimeoutConfig;
use crate::{EngineError, EngineKind, Position};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use uci::{EngineInfo, EngineMessage, GoOptions, GuiCommand, OptionDecl};

/// Program and arguments used to launch an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Playing strength currently configured on an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strength {
    #[default]
    Full,
    /// `UCI_LimitStrength` on, targeting this rating.
    Limited(u32),
}

/// What one `go` produced: the last exact info per multi-PV index and the
/// final `bestmove`.
struct SearchOutcome {
    lines: BTreeMap<u32, EngineInfo>,
    best_move: Option<String>,
}

/// A live UCI engine subprocess.
pub struct UciEngine {
    kind: EngineKind,
    program: PathBuf,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// Name reported via `id name`.
    name: String,
    /// Declared options, keyed by lowercase name (UCI names are case-insensitive).
    options: HashMap<String, OptionDecl>,
    /// Option values this adapter has set.
    applied: HashMap<String, String>,
    /// `None` while a strength change is partly applied or was refused.
    strength: Option<Strength>,
    desynced: bool,
    stopped: bool,
    timeouts: TimeoutConfig,
}

impl UciEngine {
    /// Launch the engine and complete the UCI handshake.
    ///
    /// # Errors
    ///
    /// [`EngineError::Launch`] if the executable is missing or cannot be
    /// spawned, or if `uciok`/`readyok` do not arrive within the handshake
    /// timeout.
    pub async fn start(
        kind: EngineKind,
        command: &EngineCommand,
        timeouts: TimeoutConfig,
    ) -> Result<Self, EngineError> {
        let launch_error = |reason: String| EngineError::Launch {
            path: command.program.clone(),
            reason,
        };

        if !command.program.exists() {
            return Err(launch_error("executable not found".to_string()));
        }

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| launch_error(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| launch_error("stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| launch_error("stdout unavailable".to_string()))?;

        let mut engine = Self {
            kind,
            program: command.program.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            name: String::new(),
            options: HashMap::new(),
            applied: HashMap::new(),
            strength: Some(Strength::Full),
            desynced: false,
            stopped: false,
            timeouts,
        };

        let limit = engine.timeouts.handshake();
        let failure = match timeout(limit, engine.handshake()).await {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(format!("handshake failed: {}", err)),
            Err(_) => Some(format!("no handshake within {:?}", limit)),
        };
        if let Some(reason) = failure {
            engine.kill().await;
            return Err(launch_error(reason));
        }

        if engine.name.is_empty() {
            engine.name = "Unknown Engine".to_string();
        }
        tracing::info!(
            "{} engine '{}' started from {}",
            kind,
            engine.name,
            engine.program.display()
        );
        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(&GuiCommand::Uci).await?;
        loop {
            match self.read_message().await? {
                EngineMessage::IdName(name) => self.name = name,
                EngineMessage::Option(decl) => {
                    self.options.insert(decl.name.to_ascii_lowercase(), decl);
                }
                EngineMessage::UciOk => break,
                _ => {}
            }
        }
        self.send(&GuiCommand::UciNewGame).await?;
        self.wait_ready().await.map(|_| ())
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Engine name as reported during the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The option as declared by the engine, if it has one by that name.
    pub fn option(&self, name: &str) -> Option<&OptionDecl> {
        self.options.get(&name.to_ascii_lowercase())
    }

    /// Strength in effect, or `None` if the last change did not complete.
    pub fn strength(&self) -> Option<Strength> {
        self.strength
    }

    /// Set engine options.
    ///
    /// # Errors
    ///
    /// [`EngineError::Protocol`] if the engine did not declare one of the
    /// options or complains about a value before acknowledging `isready`.
    pub async fn configure(&mut self, options: &[(&str, String)]) -> Result<(), EngineError> {
        self.check_declared(options)?;

        if self.desynced {
            self.resync().await?;
        }
        self.desynced = true;
        for (name, value) in options {
            self.send(&GuiCommand::set_option(name, value)).await?;
        }

        let diagnostics = self.sync("option update").await?;
        self.desynced = false;
        if let Some(complaint) = diagnostics.iter().find(|line| is_rejection(line)) {
            return Err(EngineError::Protocol(complaint.clone()));
        }

        for (name, value) in options {
            self.applied.insert((*name).to_string(), value.clone());
        }
        tracing::debug!("{} engine configured: {:?}", self.kind, options);
        Ok(())
    }

    fn check_declared(&self, options: &[(&str, String)]) -> Result<(), EngineError> {
        match options.iter().find(|(name, _)| self.option(name).is_none()) {
            Some((name, _)) => Err(EngineError::Protocol(format!(
                "{} does not support option {}",
                self.name, name
            ))),
            None => Ok(()),
        }
    }

    /// Apply a strength setting unless it is already in effect. The target
    /// rating is clamped into the engine's declared `UCI_Elo` range.
    ///
    /// On failure the engine may hold any mix of the old and new settings,
    /// so the next call re-sends everything.
    pub async fn set_strength(&mut self, strength: Strength) -> Result<(), EngineError> {
        if self.strength == Some(strength) {
            return Ok(());
        }

        let options = match strength {
            Strength::Full => vec![("UCI_LimitStrength", "false".to_string())],
            Strength::Limited(elo) => {
                let elo = self
                    .option("UCI_Elo")
                    .map_or(i64::from(elo), |decl| decl.clamp(i64::from(elo)));
                vec![
                    ("UCI_LimitStrength", "true".to_string()),
                    ("UCI_Elo", elo.to_string()),
                ]
            }
        };
        // Nothing is sent if an option is missing, so the old strength holds.
        self.check_declared(&options)?;

        self.strength = None;
        self.configure(&options).await?;
        self.strength = Some(strength);
        Ok(())
    }

    /// Depth-bounded search returning up to `line_count` lines, best first.
    ///
    /// A position without legal moves yields the engine's terminal score as
    /// a single line with no move, or no lines at all if the engine reports
    /// none.
    pub async fn analyze(
        &mut self,
        position: &Position,
        depth: u32,
        line_count: u32,
        pv_length: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        self.ensure_multipv(line_count).await?;

        let ceiling = self.timeouts.analysis();
        let outcome = self
            .search(position, GoOptions::depth(depth), ceiling, "analysis")
            .await?;

        let mut lines: Vec<AnalysisLine> = outcome
            .lines
            .into_values()
            .take(line_count as usize)
            .map(|info| AnalysisLine::from_info(info, pv_length))
            .collect();
        if lines.is_empty() {
            if let Some(mv) = outcome.best_move {
                lines.push(AnalysisLine::unscored(mv));
            }
        }
        Ok(lines)
    }

    /// Search under one limit and return the top move.
    pub async fn best_move(
        &mut self,
        position: &Position,
        limit: SearchLimit,
    ) -> Result<String, EngineError> {
        let (go, ceiling) = match limit {
            SearchLimit::Depth(depth) => (GoOptions::depth(depth), self.timeouts.analysis()),
            SearchLimit::Time(time) => {
                let ms = u64::try_from(time.as_millis()).unwrap_or(u64::MAX).max(1);
                (GoOptions::movetime(ms), time + self.timeouts.move_grace())
            }
        };

        let outcome = self.search(position, go, ceiling, "best-move search").await?;
        outcome
            .best_move
            .ok_or_else(|| EngineError::Protocol(format!("no legal moves in {}", position)))
    }

    /// Send `quit`, wait up to the shutdown timeout, then kill. Idempotent.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let _ = self.send(&GuiCommand::Quit).await;
        let grace = self.timeouts.shutdown();
        match timeout(grace, self.child.wait()).await {
            Ok(_) => tracing::info!("{} engine '{}' stopped", self.kind, self.name),
            Err(_) => {
                tracing::warn!(
                    "{} engine '{}' ignored quit for {:?}; killing it",
                    self.kind,
                    self.name,
                    grace
                );
                let _ = self.child.kill().await;
            }
        }
    }

    async fn kill(&mut self) {
        self.stopped = true;
        let _ = self.child.kill().await;
    }

    async fn ensure_multipv(&mut self, line_count: u32) -> Result<(), EngineError> {
        let wanted = line_count.max(1).to_string();
        let current = self.applied.get("MultiPV").map_or("1", String::as_str);
        if current == wanted {
            return Ok(());
        }
        self.configure(&[("MultiPV", wanted)]).await
    }

    async fn search(
        &mut self,
        position: &Position,
        go: GoOptions,
        ceiling: Duration,
        operation: &'static str,
    ) -> Result<SearchOutcome, EngineError> {
        if self.desynced {
            self.resync().await?;
        }

        // Cleared only once the matching bestmove has been read.
        self.desynced = true;
        self.send(&position.to_command()).await?;
        self.send(&GuiCommand::Go(go)).await?;

        match timeout(ceiling, self.collect_search()).await {
            Ok(outcome) => {
                let outcome = outcome?;
                self.desynced = false;
                Ok(outcome)
            }
            Err(_) => {
                tracing::warn!(
                    "{} engine did not finish {} within {:?}",
                    self.kind,
                    operation,
                    ceiling
                );
                Err(EngineError::Timeout {
                    operation,
                    after: ceiling,
                })
            }
        }
    }

    async fn collect_search(&mut self) -> Result<SearchOutcome, EngineError> {
        let mut lines = BTreeMap::new();
        loop {
            match self.read_message().await? {
                EngineMessage::Info(info) if info.is_line() => {
                    // Deeper iterations replace shallower ones.
                    lines.insert(info.multipv.unwrap_or(1), info);
                }
                EngineMessage::BestMove { mv, .. } => {
                    return Ok(SearchOutcome {
                        lines,
                        best_move: mv,
                    })
                }
                _ => {}
            }
        }
    }

    /// Abandon whatever the engine is doing and wait for a fresh `readyok`.
    async fn resync(&mut self) -> Result<(), EngineError> {
        tracing::debug!("{} engine resyncing after an unfinished request", self.kind);
        self.send(&GuiCommand::Stop).await?;
        self.sync("resync").await?;
        self.desynced = false;
        Ok(())
    }

    /// `isready` round trip bounded by the handshake timeout.
    async fn sync(&mut self, operation: &'static str) -> Result<Vec<String>, EngineError> {
        let limit = self.timeouts.handshake();
        match timeout(limit, self.wait_ready()).await {
            Ok(result) => result,
            Err(_) => {
                self.desynced = true;
                Err(EngineError::Timeout {
                    operation,
                    after: limit,
                })
            }
        }
    }

    /// Sends `isready` and reads up to `readyok`, returning the diagnostics
    /// (unparsed lines and `info string` text) seen on the way.
    async fn wait_ready(&mut self) -> Result<Vec<String>, EngineError> {
        self.send(&GuiCommand::IsReady).await?;
        let mut diagnostics = Vec::new();
        loop {
            match self.read_message().await? {
                EngineMessage::ReadyOk => return Ok(diagnostics),
                EngineMessage::Other(line) => diagnostics.push(line),
                EngineMessage::Info(EngineInfo {
                    string: Some(text), ..
                }) => diagnostics.push(text),
                _ => {}
            }
        }
    }

    async fn send(&mut self, command: &GuiCommand) -> Result<(), EngineError> {
        let line = command.to_uci();
        tracing::trace!("{} > {}", self.kind, line);

        let write = async {
            self.stdin.write_all(line.as_bytes()).await?;
            self.stdin.write_all(b"\n").await?;
            self.stdin.flush().await
        };
        write
            .await
            .map_err(|e| EngineError::Crash(format!("failed writing to engine: {}", e)))
    }

    async fn read_message(&mut self) -> Result<EngineMessage, EngineError> {
        match self.stdout.next_line().await {
            Ok(Some(line)) => {
                tracing::trace!("{} < {}", self.kind, line);
                Ok(EngineMessage::parse(&line))
            }
            Ok(None) => Err(EngineError::Crash(self.exit_reason())),
            Err(e) => Err(EngineError::Crash(format!(
                "failed reading engine output: {}",
                e
            ))),
        }
    }

    fn exit_reason(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("{} exited ({})", self.program.display(), status),
            _ => format!("{} closed its output", self.program.display()),
        }
    }
}

/// Lines engines print when they refuse a `setoption`.
fn is_rejection(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("no such option")
        || lower.contains("unknown option")
        || lower.contains("invalid value")
}
