//! Scripted stand-in engines for integration tests.
//!
//! The fake engines are POSIX shell scripts run as `/bin/sh <script> <log>
//! [name]`. Every line the script receives is appended to `<log>` so tests
//! can assert on the protocol traffic.

#![allow(dead_code)]

use engine_session::config::{CoachConfig, EngineConfig};
use engine_session::{EngineCommand, EngineManager, Locator};
use std::path::PathBuf;
use tempfile::TempDir;

/// Black to move after 1.e4.
pub const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
/// White is checkmated (fool's mate).
pub const MATED_FEN: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
/// The fake engine exits as soon as it is asked to search this position.
pub const CRASH_FEN: &str = "7k/8/8/8/8/8/8/K7 w - - 0 1";
/// The fake engine never finishes searching this position until told to stop.
pub const HANG_FEN: &str = "k7/8/8/8/8/8/8/7K w - - 0 1";

const FAKE_ENGINE: &str = r##"
log="$1"
name="${2:-FakeFish}"
limited=false
multipv=1
pos=""
hanging=0
STARTPOS="position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"

search() {
    sleep 0.05
    case "$pos" in
        *"7k/8/8/8/8/8/8/K7 w"*)
            exit 3 ;;
        *"k7/8/8/8/8/8/8/7K w"*)
            hanging=1 ;;
        "$STARTPOS")
            if [ "$name" = FakeMaia ]; then
                echo "info depth 1 score cp 10 nodes 1 pv d2d4"
                echo "bestmove d2d4"
                return
            fi
            echo "info depth 5 multipv 1 score cp 10 pv d2d4"
            echo "info depth 10 multipv 1 score cp 35 nodes 12000 nps 600000 time 20 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6"
            if [ "$multipv" -ge 2 ]; then echo "info depth 10 multipv 2 score cp 30 pv d2d4 d7d5"; fi
            if [ "$multipv" -ge 3 ]; then echo "info depth 10 multipv 3 score cp 25 pv g1f3 g8f6"; fi
            echo "info depth 11 multipv 1 score cp 80 lowerbound pv a2a3"
            if [ "$limited" = true ]; then
                echo "bestmove h2h3"
            else
                echo "bestmove e2e4 ponder e7e5"
            fi ;;
        "$STARTPOS moves e2e4")
            echo "info depth 10 score cp -35 pv c7c5 g1f3"
            echo "bestmove c7c5" ;;
        "$STARTPOS moves d2d4")
            echo "info depth 10 score cp -200 pv d7d5"
            echo "bestmove d7d5" ;;
        "$STARTPOS moves f2f3")
            echo "info depth 10 score cp 60 pv e7e5"
            echo "bestmove e7e5" ;;
        "$STARTPOS moves g2g4")
            echo "info depth 10 score mate 1 pv d8h4"
            echo "bestmove d8h4" ;;
        "$STARTPOS moves h2h4")
            exit 3 ;;
        *"4P3/8/PPPP1PPP/RNBQKBNR b"*)
            # Answers late while still reading input, like a real search.
            (
                sleep 0.3
                echo "info depth 10 score cp 20 pv c7c5 g1f3"
                echo "bestmove c7c5"
            ) & ;;
        *"5P2/PPPPP2P/RNBQKBNR w"*)
            echo "info depth 0 score mate 0"
            echo "bestmove (none)" ;;
        *)
            echo "info depth 1 score cp 0 pv a2a3"
            echo "bestmove a2a3" ;;
    esac
}

while IFS= read -r line; do
    if [ -n "$log" ]; then echo "$line" >> "$log"; fi
    case "$line" in
        uci)
            echo "id name $name"
            echo "id author Test Suite"
            echo "option name Hash type spin default 16 min 1 max 33554432"
            echo "option name MultiPV type spin default 1 min 1 max 5"
            echo "option name UCI_LimitStrength type check default false"
            echo "option name UCI_Elo type spin default 1320 min 1320 max 3190"
            echo "uciok" ;;
        isready)
            echo "readyok" ;;
        "setoption name MultiPV value "*)
            value="${line##* }"
            if [ "$value" -gt 5 ]; then
                echo "Invalid value for MultiPV: $value"
            else
                multipv="$value"
            fi ;;
        "setoption name UCI_LimitStrength value "*)
            limited="${line##* }" ;;
        "setoption name UCI_Elo value "*)
            value="${line##* }"
            if [ "$name" = PickyFish ] && [ "$value" -lt 1400 ]; then
                echo "Invalid value for UCI_Elo: $value"
            fi ;;
        "setoption name "*)
            ;;
        "position "*)
            pos="$line" ;;
        go*)
            search ;;
        stop)
            if [ "$hanging" = 1 ]; then
                echo "bestmove a8b8"
                hanging=0
            fi ;;
        quit)
            exit 0 ;;
    esac
done
"##;

/// Prints part of the handshake and then goes quiet.
const MUTE_ENGINE: &str = r#"
while IFS= read -r line; do
    case "$line" in
        uci) echo "id name Mute" ;;
    esac
done
"#;

/// Completes the handshake and then ignores `quit`.
const STUBBORN_ENGINE: &str = r#"
while IFS= read -r line; do
    case "$line" in
        uci)
            echo "id name Stubborn"
            echo "uciok" ;;
        isready)
            echo "readyok" ;;
    esac
done
"#;

/// Exits before saying anything.
const DEAD_ENGINE: &str = "exit 1\n";

pub struct FakeEngines {
    dir: TempDir,
}

impl FakeEngines {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (file, script) in [
            ("fake.sh", FAKE_ENGINE),
            ("mute.sh", MUTE_ENGINE),
            ("stubborn.sh", STUBBORN_ENGINE),
            ("dead.sh", DEAD_ENGINE),
        ] {
            std::fs::write(dir.path().join(file), script).unwrap();
        }
        Self { dir }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.path(&format!("{}.log", name))
    }

    /// Launch command for the scripted engine reporting `name`.
    pub fn command(&self, name: &str) -> EngineCommand {
        EngineCommand::new("/bin/sh")
            .arg(self.path("fake.sh").display().to_string())
            .arg(self.log_path(name).display().to_string())
            .arg(name)
    }

    pub fn mute_command(&self) -> EngineCommand {
        EngineCommand::new("/bin/sh").arg(self.path("mute.sh").display().to_string())
    }

    pub fn stubborn_command(&self) -> EngineCommand {
        EngineCommand::new("/bin/sh").arg(self.path("stubborn.sh").display().to_string())
    }

    pub fn dead_command(&self) -> EngineCommand {
        EngineCommand::new("/bin/sh").arg(self.path("dead.sh").display().to_string())
    }

    /// Every line the engine called `name` has received so far.
    pub fn traffic(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.log_path(name))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Configuration with only the strong engine ("FakeFish").
    pub fn strong_only(&self) -> CoachConfig {
        let mut config = test_config();
        config.engines.strong = engine_config(self.command("FakeFish"));
        config
    }

    /// Only a strong engine ("PickyFish") that refuses ratings below 1400.
    pub fn picky_only(&self) -> CoachConfig {
        let mut config = test_config();
        config.engines.strong = engine_config(self.command("PickyFish"));
        config
    }

    /// Two engines that never exit on `quit`.
    pub fn stubborn_pair(&self) -> CoachConfig {
        let mut config = test_config();
        config.engines.strong = engine_config(self.stubborn_command());
        config.engines.human_like = engine_config(self.stubborn_command());
        config
    }

    /// Strong "FakeFish" plus human-like "FakeMaia".
    pub fn both(&self) -> CoachConfig {
        let mut config = self.strong_only();
        config.engines.human_like = engine_config(self.command("FakeMaia"));
        config
    }
}

/// Short timeouts so failure paths finish quickly.
pub fn test_config() -> CoachConfig {
    let mut config = CoachConfig::default();
    config.timeouts.handshake_ms = 2_000;
    config.timeouts.analysis_ms = 2_000;
    config.timeouts.move_grace_ms = 2_000;
    config.timeouts.shutdown_ms = 500;
    config
}

fn engine_config(command: EngineCommand) -> EngineConfig {
    EngineConfig {
        path: Some(command.program),
        args: command.args,
    }
}

/// A manager that only sees the engines named in `config`.
pub fn manager(config: CoachConfig) -> EngineManager {
    EngineManager::with_locator(config, Locator::default())
}

/// Whether `needles` appear in `haystack` in this order, not necessarily
/// adjacent.
pub fn is_subsequence(haystack: &[String], needles: &[&str]) -> bool {
    let mut rest = haystack.iter();
    needles
        .iter()
        .all(|needle| rest.any(|line| line.as_str() == *needle))
}

