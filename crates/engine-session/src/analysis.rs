//! Results returned to callers.

use crate::quality::{classify_transition, MoveQuality};
use crate::Score;
use serde::Serialize;
use std::time::Duration;

/// One principal variation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisLine {
    /// First move of the line; `None` when the side to move has no legal moves.
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub score: Score,
    /// Depth reached for this line.
    pub depth: u32,
    /// Leading moves of the variation, starting with `mv`.
    pub pv: Vec<String>,
}

impl AnalysisLine {
    pub(crate) fn from_info(info: uci::EngineInfo, pv_length: usize) -> Self {
        let mut pv = info.pv;
        pv.truncate(pv_length);
        Self {
            mv: pv.first().cloned(),
            score: Score::normalize(info.score),
            depth: info.depth.unwrap_or(0),
            pv,
        }
    }

    /// Line for an engine that answered `bestmove` without any scored info.
    pub(crate) fn unscored(mv: String) -> Self {
        Self {
            mv: Some(mv.clone()),
            score: Score::normalize(None),
            depth: 0,
            pv: vec![mv],
        }
    }
}

/// How a best-move search is bounded. Exactly one kind per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    Time(Duration),
}

/// Quality of a single move, computed fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEvaluation {
    #[serde(rename = "move")]
    pub mv: String,
    pub classification: MoveQuality,
    /// Centipawn delta from the mover's point of view; positive means the
    /// move did better than the engine predicted.
    pub score_difference: i32,
    /// Best line's score before the move, mover to move.
    pub before_score: Score,
    /// Best line's score after the move, opponent to move.
    pub after_score: Score,
    /// The engine's preferred move in the original position.
    pub best_move: Option<String>,
}

impl MoveEvaluation {
    /// Build an evaluation from the top lines before and after the move.
    /// A missing line contributes a zero score.
    pub fn from_lines(mv: &str, before: Option<&AnalysisLine>, after: Option<&AnalysisLine>) -> Self {
        let before_score = before.map(|l| l.score).unwrap_or_default();
        let after_score = after.map(|l| l.score).unwrap_or_default();
        let (score_difference, classification) = classify_transition(before_score, after_score);

        Self {
            mv: mv.to_string(),
            classification,
            score_difference,
            before_score,
            after_score,
            best_move: before.and_then(|l| l.mv.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(mv: &str, score: Score) -> AnalysisLine {
        AnalysisLine {
            mv: Some(mv.to_string()),
            score,
            depth: 12,
            pv: vec![mv.to_string()],
        }
    }

    #[test]
    fn test_from_info_truncates_pv() {
        let info = uci::EngineInfo::parse(
            "info depth 14 score cp 21 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4",
        )
        .unwrap();
        let line = AnalysisLine::from_info(info, 5);

        assert_eq!(line.mv.as_deref(), Some("e2e4"));
        assert_eq!(line.score, Score::Centipawns(21));
        assert_eq!(line.depth, 14);
        assert_eq!(line.pv, vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
    }

    #[test]
    fn test_from_info_without_moves() {
        let info = uci::EngineInfo::parse("info depth 0 score mate 0").unwrap();
        let line = AnalysisLine::from_info(info, 5);

        assert_eq!(line.mv, None);
        assert_eq!(line.score, Score::Mate(0));
        assert!(line.pv.is_empty());
    }

    #[test]
    fn test_evaluation_from_lines() {
        let before = line("e2e4", Score::Centipawns(35));
        let after = line("c7c5", Score::Centipawns(-30));
        let eval = MoveEvaluation::from_lines("d2d4", Some(&before), Some(&after));

        assert_eq!(eval.mv, "d2d4");
        assert_eq!(eval.score_difference, -5);
        assert_eq!(eval.classification, MoveQuality::Ok);
        assert_eq!(eval.best_move.as_deref(), Some("e2e4"));
    }

    #[test]
    fn test_missing_lines_score_zero() {
        let eval = MoveEvaluation::from_lines("e1g1", None, None);
        assert_eq!(eval.before_score, Score::Centipawns(0));
        assert_eq!(eval.after_score, Score::Centipawns(0));
        assert_eq!(eval.classification, MoveQuality::Good);
        assert!(eval.best_move.is_none());
    }

    #[test]
    fn test_evaluation_json_shape() {
        let before = line("e2e4", Score::Centipawns(35));
        let after = line("e1e2", Score::Mate(2));
        let eval = MoveEvaluation::from_lines("f2f3", Some(&before), Some(&after));
        let json = serde_json::to_value(&eval).unwrap();

        assert_eq!(json["move"], "f2f3");
        assert_eq!(json["classification"], "blunder");
        assert_eq!(json["after_score"]["display"], "M2");
        assert_eq!(json["best_move"], "e2e4");
    }
}
