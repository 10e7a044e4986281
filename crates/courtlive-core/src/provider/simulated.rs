// ── Simulated tennis match ──
//
// A deterministic best-of-three match replayed from its activation time.
// The seed comes from the connection id, so two engines (or two restarts)
// show the same match at the same elapsed time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::tennis::{
    Player, STATUS_COMPLETED, STATUS_IN_PROGRESS, Score, SetScore, TennisMatch,
};
use crate::model::{ConnectionId, MatchState};

const SECONDS_PER_POINT: i64 = 12;
const SETS_TO_WIN: u32 = 2;
const SERVER_WIN_PERCENT: u64 = 62;

const ROSTER: [(&str, &str); 8] = [
    ("A. Moreno", "ESP"),
    ("L. Fischer", "GER"),
    ("K. Tanaka", "JPN"),
    ("M. Laurent", "FRA"),
    ("J. Walker", "USA"),
    ("R. Costa", "BRA"),
    ("S. Novak", "CZE"),
    ("T. Okafor", "NGR"),
];

/// Synthetic match advanced by wall-clock time since activation.
#[derive(Debug, Clone)]
pub struct SimulatedMatch {
    id: ConnectionId,
    seed: u64,
    started_at: DateTime<Utc>,
}

impl SimulatedMatch {
    pub fn new(id: ConnectionId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            seed: fnv1a(id.as_uuid().as_bytes()),
            started_at,
        }
    }

    /// The match as it stands at `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> MatchState {
        let elapsed = now.signed_duration_since(self.started_at).num_seconds().max(0);
        let points = u64::try_from(elapsed / SECONDS_PER_POINT).unwrap_or(0);

        let mut board = ScoreBoard::new(usize::from(self.seed & 1 == 1));
        let mut played = 0;
        while played < points && board.winner.is_none() {
            let server_wins = splitmix64(self.seed ^ played) % 100 < SERVER_WIN_PERCENT;
            let winner = if server_wins {
                board.server
            } else {
                1 - board.server
            };
            board.play_point(winner);
            played += 1;
        }

        self.render(&board).to_value()
    }

    fn render(&self, board: &ScoreBoard) -> TennisMatch {
        let (p1, p2) = self.players();
        let (p1_points, p2_points) = board.point_labels();

        let mut sets: BTreeMap<String, SetScore> = board
            .completed
            .iter()
            .enumerate()
            .map(|(i, games)| ((i + 1).to_string(), set_score(*games)))
            .collect();
        if board.winner.is_none() {
            sets.insert(
                (board.completed.len() + 1).to_string(),
                set_score(board.games),
            );
        }

        let current_set = board.completed.len() + usize::from(board.winner.is_none());

        TennisMatch {
            match_id: format!("sim-{}", &self.id.to_string()[..8]),
            player1: p1,
            player2: p2,
            score: Score {
                player1_sets: i64::from(board.sets_won[0]),
                player2_sets: i64::from(board.sets_won[1]),
                player1_games: i64::from(board.games[0]),
                player2_games: i64::from(board.games[1]),
                player1_points: p1_points,
                player2_points: p2_points,
            },
            sets,
            match_status: if board.winner.is_some() {
                STATUS_COMPLETED.into()
            } else {
                STATUS_IN_PROGRESS.into()
            },
            serving_player: if board.server == 0 { 1 } else { 2 },
            current_set: u32::try_from(current_set).unwrap_or(1),
            is_tiebreak: board.tiebreak,
            tiebreak_score: board.tiebreak.then(|| SetScore {
                player1: i64::from(board.points[0]),
                player2: i64::from(board.points[1]),
            }),
            tournament: Some("Simulation Open".into()),
            round: Some("Exhibition".into()),
        }
    }

    fn players(&self) -> (Player, Player) {
        let len = ROSTER.len();
        let first = usize::try_from(self.seed % 8).unwrap_or(0);
        let offset = 1 + usize::try_from((self.seed >> 8) % 7).unwrap_or(0);
        let second = (first + offset) % len;
        let make = |(name, country): (&str, &str), seed: i64| Player {
            name: name.into(),
            country: Some(country.into()),
            seed: Some(seed),
        };
        (make(ROSTER[first], 1), make(ROSTER[second], 2))
    }
}

fn set_score(games: [u32; 2]) -> SetScore {
    SetScore {
        player1: i64::from(games[0]),
        player2: i64::from(games[1]),
    }
}

// ── Scoring ─────────────────────────────────────────────────────────

/// Standard scoring: four points a game with deuce, six games a set with a
/// tiebreak at 6-6, best of three sets.
#[derive(Debug)]
struct ScoreBoard {
    completed: Vec<[u32; 2]>,
    sets_won: [u32; 2],
    games: [u32; 2],
    points: [u32; 2],
    tiebreak: bool,
    server: usize,
    winner: Option<usize>,
}

impl ScoreBoard {
    fn new(server: usize) -> Self {
        Self {
            completed: Vec::new(),
            sets_won: [0, 0],
            games: [0, 0],
            points: [0, 0],
            tiebreak: false,
            server,
            winner: None,
        }
    }

    fn play_point(&mut self, winner: usize) {
        let loser = 1 - winner;
        self.points[winner] += 1;

        if self.tiebreak {
            if self.points[winner] >= 7 && self.points[winner] >= self.points[loser] + 2 {
                self.win_game(winner);
            } else if (self.points[0] + self.points[1]) % 2 == 1 {
                self.server = 1 - self.server;
            }
        } else if self.points[winner] >= 4 && self.points[winner] >= self.points[loser] + 2 {
            self.win_game(winner);
        }
    }

    fn win_game(&mut self, winner: usize) {
        let loser = 1 - winner;
        let was_tiebreak = self.tiebreak;
        self.points = [0, 0];
        self.tiebreak = false;
        self.games[winner] += 1;
        self.server = 1 - self.server;

        let (won, lost) = (self.games[winner], self.games[loser]);
        if was_tiebreak || (won >= 6 && won >= lost + 2) {
            self.completed.push(self.games);
            self.sets_won[winner] += 1;
            self.games = [0, 0];
            if self.sets_won[winner] == SETS_TO_WIN {
                self.winner = Some(winner);
            }
        } else if self.games == [6, 6] {
            self.tiebreak = true;
        }
    }

    fn point_labels(&self) -> (String, String) {
        let [a, b] = self.points;
        if self.tiebreak {
            return (a.to_string(), b.to_string());
        }
        if a >= 3 && b >= 3 {
            return match a.cmp(&b) {
                std::cmp::Ordering::Equal => ("40".into(), "40".into()),
                std::cmp::Ordering::Greater => ("AD".into(), "40".into()),
                std::cmp::Ordering::Less => ("40".into(), "AD".into()),
            };
        }
        let label = |p: u32| match p {
            0 => "0",
            1 => "15",
            2 => "30",
            _ => "40",
        };
        (label(a).into(), label(b).into())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn same_id_same_elapsed_same_match() {
        let id = ConnectionId::new();
        let a = SimulatedMatch::new(id, start());
        let b = SimulatedMatch::new(id, start());
        let at = start() + TimeDelta::minutes(17);
        assert_eq!(a.snapshot_at(at), b.snapshot_at(at));
    }

    #[test]
    fn fresh_match_is_love_all() {
        let sim = SimulatedMatch::new(ConnectionId::new(), start());
        let state = sim.snapshot_at(start());
        assert_eq!(state["score"]["player1Points"], "0");
        assert_eq!(state["score"]["player1Games"], 0);
        assert_eq!(state["matchStatus"], "in_progress");
        assert_eq!(state["currentSet"], 1);
        assert!(state["sets"]["1"].is_object());
    }

    #[test]
    fn match_advances_with_time() {
        let sim = SimulatedMatch::new(ConnectionId::new(), start());
        let early = sim.snapshot_at(start());
        let later = sim.snapshot_at(start() + TimeDelta::minutes(30));
        assert_ne!(early["score"], later["score"]);
    }

    #[test]
    fn long_running_match_completes() {
        let sim = SimulatedMatch::new(ConnectionId::new(), start());
        let state = sim.snapshot_at(start() + TimeDelta::days(2));
        assert_eq!(state["matchStatus"], "completed");
        let sets = state["score"]["player1Sets"].as_i64().unwrap()
            + state["score"]["player2Sets"].as_i64().unwrap();
        assert!((2..=3).contains(&sets));
    }

    #[test]
    fn time_before_activation_is_start_of_match() {
        let sim = SimulatedMatch::new(ConnectionId::new(), start());
        assert_eq!(
            sim.snapshot_at(start() - TimeDelta::hours(1)),
            sim.snapshot_at(start())
        );
    }

    #[test]
    fn four_straight_points_win_a_game() {
        let mut board = ScoreBoard::new(0);
        for _ in 0..4 {
            board.play_point(0);
        }
        assert_eq!(board.games, [1, 0]);
        assert_eq!(board.points, [0, 0]);
        assert_eq!(board.server, 1);
    }

    #[test]
    fn deuce_and_advantage_labels() {
        let mut board = ScoreBoard::new(0);
        for _ in 0..3 {
            board.play_point(0);
            board.play_point(1);
        }
        assert_eq!(board.point_labels(), ("40".into(), "40".into()));
        board.play_point(1);
        assert_eq!(board.point_labels(), ("40".into(), "AD".into()));
    }

    #[test]
    fn tiebreak_at_six_all_decides_set() {
        let mut board = ScoreBoard::new(0);
        for _ in 0..6 {
            win_game(&mut board, 0);
            win_game(&mut board, 1);
        }
        assert!(board.tiebreak);
        for _ in 0..7 {
            board.play_point(1);
        }
        assert!(!board.tiebreak);
        assert_eq!(board.completed, vec![[6, 7]]);
        assert_eq!(board.sets_won, [0, 1]);
    }

    #[test]
    fn two_sets_win_the_match() {
        let mut board = ScoreBoard::new(0);
        for _ in 0..12 {
            win_game(&mut board, 0);
        }
        assert_eq!(board.winner, Some(0));
        assert_eq!(board.completed, vec![[6, 0], [6, 0]]);
    }

    fn win_game(board: &mut ScoreBoard, player: usize) {
        for _ in 0..4 {
            board.play_point(player);
        }
    }
}
