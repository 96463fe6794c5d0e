//! UCI info command types.

/// Score in centipawns or mate distance, from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = side to move is mated).
    Mate(i32),
}

/// Marks a score that is only a bound from an aspiration window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Search information from engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// 1-based index of the line when several are searched.
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Set when the score is a lowerbound/upperbound.
    pub bound: Option<Bound>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
    /// Arbitrary string info.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Create a new empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this info carries an exact scored result. The principal
    /// variation may be empty when the side to move has no legal moves.
    pub fn is_line(&self) -> bool {
        self.depth.is_some() && self.score.is_some() && self.bound.is_none()
    }

    /// Parse an `info` line. Unknown keywords and malformed values are
    /// skipped; `None` only if the line is not an `info` line at all.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = number(tokens.next()),
                "seldepth" => info.seldepth = number(tokens.next()),
                "multipv" => info.multipv = number(tokens.next()),
                "nodes" => info.nodes = number(tokens.next()),
                "nps" => info.nps = number(tokens.next()),
                "time" => info.time = number(tokens.next()),
                "score" => {
                    let kind = tokens.next();
                    let value = number(tokens.next());
                    info.score = match kind {
                        Some("cp") => value.map(Score::Cp),
                        Some("mate") => value.map(Score::Mate),
                        _ => info.score,
                    };
                }
                "lowerbound" => info.bound = Some(Bound::Lower),
                "upperbound" => info.bound = Some(Bound::Upper),
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !is_info_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                "string" => {
                    info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" "));
                }
                _ => {}
            }
        }

        Some(info)
    }
}

fn number<T: std::str::FromStr>(token: Option<&str>) -> Option<T> {
    token.and_then(|t| t.parse().ok())
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "string"
    )
}
