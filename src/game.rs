// =============================================================================
// Game state machine
//
// A Game owns the live board, the list of moves played (with a cursor that
// can rewind without discarding moves), and a table counting how often each
// position occurred along the current path. After every change of position
// the legal moves and the status are recomputed from scratch.
// =============================================================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::board::{Board, Square};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::events::{self, Decision, GameEvent, GameObserver};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType, Promotion};
use crate::rules;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Normal,
    Check,
    Checkmate,
    Stalemate,
    DrawFiftyMove,
    DrawInsufficientMaterial,
    DrawRepetition,
}

impl Status {
    /// True once no further moves should be made.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Normal | Status::Check)
    }

    pub fn is_draw(self) -> bool {
        matches!(
            self,
            Status::Stalemate
                | Status::DrawFiftyMove
                | Status::DrawInsufficientMaterial
                | Status::DrawRepetition
        )
    }
}

/// Chooses the promotion kind when a promotion is made without one.
/// Returning `None` promotes to a queen.
pub type PromotionHandler = Box<dyn FnMut(Color) -> Option<Promotion>>;

/// A move described by its squares, as stored in a saved game.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        MoveRequest {
            from,
            to,
            promotion: None,
        }
    }
}

pub struct Game {
    board: Board,
    history: Vec<Move>,
    /// Number of history moves currently applied to `board`.
    cursor: usize,
    legal_moves: Vec<Move>,
    repetitions: HashMap<u64, u32>,
    status: Status,
    config: GameConfig,
    promotion_handler: Option<PromotionHandler>,
    observers: Vec<Box<dyn GameObserver>>,
    loading: bool,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board)
            .field("history", &self.history)
            .field("cursor", &self.cursor)
            .field("status", &self.status)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::standard()
    }
}

impl Game {
    pub fn new(board: Board) -> Self {
        Self::with_config(board, GameConfig::default())
    }

    /// A game from the standard starting position.
    pub fn standard() -> Self {
        Self::new(Board::new())
    }

    pub fn with_config(board: Board, config: GameConfig) -> Self {
        let mut game = Game {
            board,
            history: Vec::new(),
            cursor: 0,
            legal_moves: Vec::new(),
            repetitions: HashMap::new(),
            status: Status::Normal,
            config,
            promotion_handler: None,
            observers: Vec::new(),
            loading: false,
        };
        game.reset_history();
        game
    }

    /// Replaces the live board, discarding history and repetition counts.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.reset_history();
    }

    pub fn set_promotion_handler<F>(&mut self, handler: F)
    where
        F: FnMut(Color) -> Option<Promotion> + 'static,
    {
        self.promotion_handler = Some(Box::new(handler));
    }

    pub fn add_observer<O>(&mut self, observer: O)
    where
        O: GameObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    /// Every move of the game, including moves past the cursor.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_last(&self) -> bool {
        self.cursor == self.history.len()
    }

    pub fn is_ended(&self) -> bool {
        self.status.is_terminal()
    }

    /// Looks up the legal move between two squares. For a promotion the
    /// given kind is attached; kinds a pawn cannot become turn into a queen.
    pub fn get_move(&self, from: Square, to: Square, promotion: Option<PieceType>) -> Option<Move> {
        let mut mv = self
            .legal_moves
            .iter()
            .find(|m| m.from() == from && m.to() == to)?
            .clone();
        mv.set_promotion(promotion);
        Some(mv)
    }

    /// Makes a legal move, discarding any moves past the cursor.
    ///
    /// Returns `Ok(false)` if an observer cancelled the move.
    pub fn make(&mut self, mv: Move) -> Result<bool, GameError> {
        self.ensure_playable()?;

        let mut chosen = match self
            .legal_moves
            .iter()
            .find(|m| m.from() == mv.from() && m.to() == mv.to())
        {
            Some(legal) => legal.clone(),
            None => return Err(illegal(mv.from(), mv.to())),
        };
        chosen.resolve(mv.promotion());

        if !self.loading {
            let event = GameEvent::Move {
                mv: &chosen,
                cursor: self.cursor,
            };
            if events::ask(&mut self.observers, &event) == Decision::Cancel {
                return Ok(false);
            }
        }

        self.history.truncate(self.cursor);

        if chosen.is_promotion() && chosen.promotion().is_none() {
            let color = chosen.piece().color;
            let choice = self
                .promotion_handler
                .as_mut()
                .and_then(|handler| handler(color));
            chosen.resolve(Some(choice.unwrap_or(Promotion::Queen)));
        }

        chosen.apply(&mut self.board)?;
        self.record_position();
        self.refresh();
        self.cursor += 1;
        self.history.push(chosen);

        debug!(
            from = mv.from(),
            to = mv.to(),
            cursor = self.cursor,
            status = ?self.status,
            "move made"
        );
        if !self.loading {
            let event = GameEvent::Move {
                mv: &self.history[self.cursor - 1],
                cursor: self.cursor,
            };
            events::notify(&mut self.observers, &event);
        }
        Ok(true)
    }

    /// Looks up and makes the move between two squares.
    pub fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<bool, GameError> {
        self.ensure_playable()?;
        let mv = self
            .get_move(from, to, promotion)
            .ok_or_else(|| illegal(from, to))?;
        self.make(mv)
    }

    /// Steps forward through history. Returns `false` at the end of history
    /// or when an observer cancels.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        let event = GameEvent::Forward {
            mv: &self.history[self.cursor],
            cursor: self.cursor,
        };
        if events::ask(&mut self.observers, &event) == Decision::Cancel {
            return false;
        }

        self.step_forward();
        debug!(cursor = self.cursor, status = ?self.status, "stepped forward");

        let event = GameEvent::Forward {
            mv: &self.history[self.cursor - 1],
            cursor: self.cursor,
        };
        events::notify(&mut self.observers, &event);
        true
    }

    /// Steps back through history. Returns `false` at the start of history
    /// or when an observer cancels.
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        let event = GameEvent::Back {
            mv: &self.history[self.cursor - 1],
            cursor: self.cursor,
        };
        if events::ask(&mut self.observers, &event) == Decision::Cancel {
            return false;
        }

        self.step_back();
        debug!(cursor = self.cursor, status = ?self.status, "stepped back");

        let event = GameEvent::Back {
            mv: &self.history[self.cursor],
            cursor: self.cursor,
        };
        events::notify(&mut self.observers, &event);
        true
    }

    pub fn go_to_last(&mut self) -> bool {
        if events::ask(&mut self.observers, &GameEvent::Modify) == Decision::Cancel {
            return false;
        }
        while !self.is_last() {
            self.step_forward();
        }
        debug!(cursor = self.cursor, status = ?self.status, "went to last position");
        events::notify(&mut self.observers, &GameEvent::Modify);
        true
    }

    pub fn go_to_first(&mut self) -> bool {
        if events::ask(&mut self.observers, &GameEvent::Modify) == Decision::Cancel {
            return false;
        }
        while !self.is_first() {
            self.step_back();
        }
        debug!(status = ?self.status, "went to first position");
        events::notify(&mut self.observers, &GameEvent::Modify);
        true
    }

    /// Restores a saved game: installs `board`, then makes each requested
    /// move. Move notifications are suppressed while loading.
    ///
    /// Returns `Ok(false)` if an observer cancelled the load.
    pub fn load<I>(&mut self, board: Board, moves: I) -> Result<bool, GameError>
    where
        I: IntoIterator<Item = MoveRequest>,
    {
        if events::ask(&mut self.observers, &GameEvent::Load) == Decision::Cancel {
            return Ok(false);
        }

        self.loading = true;
        self.set_board(board);
        events::notify(&mut self.observers, &GameEvent::BoardLoaded);

        let result = moves
            .into_iter()
            .try_for_each(|req| self.play(req.from, req.to, req.promotion).map(|_| ()));
        self.loading = false;
        result?;

        debug!(moves = self.history.len(), status = ?self.status, "game loaded");
        events::notify(&mut self.observers, &GameEvent::MovesLoaded);
        Ok(true)
    }

    /// If the last three move pairs echo each other, the move that would
    /// repeat the cycle once more (likely a third repetition).
    pub fn repetitive_move_candidate(&self) -> Option<Move> {
        let c = self.cursor;
        if c < 7 {
            return None;
        }
        let h = &self.history;
        let echoes = |a: usize, b: usize| {
            h[c - a].from() == h[c - b].from() && h[c - a].to() == h[c - b].to()
        };
        if echoes(1, 5) && echoes(2, 6) && echoes(3, 7) {
            self.get_move(h[c - 4].from(), h[c - 4].to(), None)
        } else {
            None
        }
    }

    /// Pieces captured in the moves up to the cursor, with their counts.
    pub fn captured_pieces(&self) -> HashMap<Piece, usize> {
        let mut captures = HashMap::new();
        for captured in self.history[..self.cursor].iter().filter_map(Move::capture) {
            *captures.entry(captured).or_insert(0) += 1;
        }
        captures
    }

    /// The side to move is in check.
    pub fn is_check(&self) -> bool {
        self.board.king_in_check(self.board.side_to_move())
    }

    fn ensure_playable(&self) -> Result<(), GameError> {
        if self.status.is_terminal() && !self.config.allow_moves_after_end {
            warn!(status = ?self.status, "move rejected, game is over");
            return Err(GameError::GameOver(self.status));
        }
        Ok(())
    }

    fn reset_history(&mut self) {
        self.history.clear();
        self.repetitions.clear();
        self.cursor = 0;
        self.record_position();
        self.refresh();
        debug!(status = ?self.status, "board set");
    }

    fn step_forward(&mut self) {
        self.history[self.cursor].apply_resolved(&mut self.board);
        self.cursor += 1;
        self.record_position();
        self.refresh();
    }

    fn step_back(&mut self) {
        self.forget_position();
        self.cursor -= 1;
        self.history[self.cursor].undo(&mut self.board);
        self.refresh();
    }

    fn record_position(&mut self) {
        *self.repetitions.entry(self.board.position_hash()).or_insert(0) += 1;
    }

    fn forget_position(&mut self) {
        if let Entry::Occupied(mut entry) = self.repetitions.entry(self.board.position_hash()) {
            if *entry.get() > 1 {
                *entry.get_mut() -= 1;
            } else {
                entry.remove();
            }
        }
    }

    fn refresh(&mut self) {
        self.legal_moves = rules::legal_moves(&mut self.board);
        trace!(count = self.legal_moves.len(), "legal moves generated");

        let previous = self.status;
        self.status = self.classify();
        if self.status.is_terminal() && self.status != previous {
            info!(status = ?self.status, "game over");
        }
    }

    fn classify(&self) -> Status {
        if self.legal_moves.is_empty() {
            return if self.is_check() {
                Status::Checkmate
            } else {
                Status::Stalemate
            };
        }
        if self.board.has_insufficient_material() {
            return Status::DrawInsufficientMaterial;
        }
        if self.board.status().ply >= self.config.fifty_move_plies {
            return Status::DrawFiftyMove;
        }
        if self
            .repetitions
            .values()
            .any(|&count| count >= self.config.repetition_limit)
        {
            return Status::DrawRepetition;
        }
        if self.is_check() {
            Status::Check
        } else {
            Status::Normal
        }
    }
}

fn illegal(from: Square, to: Square) -> GameError {
    warn!(from, to, "illegal move rejected");
    GameError::IllegalMove { from, to }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::board::testing::{board_with, sq};
    use crate::board::BoardStatus;
    use crate::piece::Color::{Black, White};
    use crate::piece::PieceType::*;

    fn play(game: &mut Game, from: &str, to: &str) {
        let made = game
            .play(sq(from), sq(to), None)
            .unwrap_or_else(|e| panic!("{from}{to}: {e}"));
        assert!(made, "{from}{to} was cancelled");
    }

    /// Knights out and back for both sides: one full cycle returns to the
    /// starting position.
    const KNIGHT_CYCLE: [(&str, &str); 4] = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];

    #[test]
    fn new_game_starts_normal() {
        let game = Game::standard();
        assert_eq!(game.status(), Status::Normal);
        assert_eq!(game.legal_moves().len(), 20);
        assert!(game.is_first() && game.is_last());
        assert!(!game.is_ended());
    }

    #[test]
    fn fools_mate() {
        let mut game = Game::standard();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        assert_eq!(game.status(), Status::Normal);
        play(&mut game, "d8", "h4");
        assert_eq!(game.status(), Status::Checkmate);
        assert!(game.legal_moves().is_empty());
        assert!(game.is_check());
        assert!(game.is_ended());

        let err = game.play(sq("e2"), sq("e4"), None).unwrap_err();
        assert!(matches!(err, GameError::GameOver(Status::Checkmate)), "got {err}");
    }

    #[test]
    fn check_is_reported() {
        let mut game = Game::standard();
        play(&mut game, "e2", "e4");
        play(&mut game, "f7", "f6");
        play(&mut game, "d1", "h5");
        assert_eq!(game.status(), Status::Check);
    }

    #[test]
    fn illegal_moves_are_rejected() {
        let mut game = Game::standard();
        let err = game.play(sq("e2"), sq("e5"), None).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));

        let e4 = game.get_move(sq("e2"), sq("e4"), None).unwrap();
        assert!(game.make(e4.clone()).unwrap());
        let err = game.make(e4).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }), "stale move must be refused");
        assert_eq!(game.cursor(), 1);
    }

    #[test]
    fn threefold_repetition_on_third_occurrence_only() {
        let mut game = Game::standard();
        for cycle in 0..2 {
            for (i, (from, to)) in KNIGHT_CYCLE.iter().enumerate() {
                play(&mut game, from, to);
                let last = cycle == 1 && i == KNIGHT_CYCLE.len() - 1;
                if last {
                    assert_eq!(game.status(), Status::DrawRepetition);
                } else {
                    assert_eq!(
                        game.status(),
                        Status::Normal,
                        "drawn too early at ply {}",
                        game.cursor()
                    );
                }
            }
        }
    }

    #[test]
    fn repetition_follows_positions_not_move_order() {
        let mut game = Game::standard();
        let moves = [
            ("g1", "f3"),
            ("g8", "f6"),
            ("b1", "c3"),
            ("b8", "c6"),
            ("c3", "b1"),
            ("c6", "b8"),
            ("b1", "c3"),
            ("b8", "c6"),
            ("f3", "g1"),
            ("f6", "g8"),
            ("g1", "f3"),
            ("g8", "f6"),
        ];
        for (ply, (from, to)) in moves.iter().enumerate() {
            assert_eq!(game.status(), Status::Normal, "drawn too early before ply {}", ply + 1);
            play(&mut game, from, to);
        }
        // four knights out, reached after plies 4, 8 and 12 by different routes
        assert_eq!(game.status(), Status::DrawRepetition);
    }

    #[test]
    fn repetition_counts_follow_navigation() {
        let mut game = Game::standard();
        for _ in 0..2 {
            for (from, to) in KNIGHT_CYCLE {
                play(&mut game, from, to);
            }
        }
        assert_eq!(game.status(), Status::DrawRepetition);

        assert!(game.previous());
        assert_eq!(game.status(), Status::Normal);
        assert!(game.next());
        assert_eq!(game.status(), Status::DrawRepetition);

        assert!(game.go_to_first());
        assert!(game.is_first());
        assert_eq!(game.status(), Status::Normal);
        assert!(game.board().is_in_starting_position());
        assert_eq!(game.repetitions.get(&Board::new().position_hash()), Some(&1));
        assert_eq!(game.repetitions.len(), 1);

        assert!(game.go_to_last());
        assert!(game.is_last());
        assert_eq!(game.status(), Status::DrawRepetition);
    }

    #[test]
    fn tighter_repetition_limit_from_config() {
        let config = GameConfig::from_json(r#"{ "repetition_limit": 2 }"#).unwrap();
        let mut game = Game::with_config(Board::new(), config);
        for (from, to) in KNIGHT_CYCLE {
            play(&mut game, from, to);
        }
        assert_eq!(game.status(), Status::DrawRepetition);
    }

    fn quiet_board(ply: u32, extra: &[(&'static str, PieceType, Color)]) -> Board {
        let mut pieces = vec![
            ("e1", King, White),
            ("a2", Rook, White),
            ("e8", King, Black),
            ("h7", Rook, Black),
        ];
        pieces.extend_from_slice(extra);
        let mut board = board_with(&pieces, White);
        board.set_status(BoardStatus {
            ply,
            ..*board.status()
        });
        board
    }

    #[test]
    fn fifty_move_rule() {
        let mut game = Game::new(quiet_board(98, &[]));
        play(&mut game, "a2", "b2");
        assert_eq!(game.board().status().ply, 99);
        assert_eq!(game.status(), Status::Normal);
        play(&mut game, "h7", "g7");
        assert_eq!(game.board().status().ply, 100);
        assert_eq!(game.status(), Status::DrawFiftyMove);
    }

    #[test]
    fn pawn_move_resets_the_fifty_move_count() {
        let mut game = Game::new(quiet_board(99, &[("c2", Pawn, White)]));
        play(&mut game, "c2", "c3");
        assert_eq!(game.board().status().ply, 0);
        assert_eq!(game.status(), Status::Normal);
        play(&mut game, "h7", "g7");
        assert_eq!(game.board().status().ply, 1);
        assert_eq!(game.status(), Status::Normal);
    }

    #[test]
    fn stalemate() {
        let board = board_with(
            &[("a8", King, Black), ("b6", Queen, White), ("e1", King, White)],
            Black,
        );
        let game = Game::new(board);
        assert_eq!(game.status(), Status::Stalemate);
        assert!(game.status().is_draw());
    }

    #[test]
    fn capture_down_to_insufficient_material() {
        let board = board_with(
            &[
                ("e1", King, White),
                ("c3", Knight, White),
                ("e8", King, Black),
                ("d5", Rook, Black),
            ],
            White,
        );
        let mut game = Game::new(board);
        assert_eq!(game.status(), Status::Normal);
        play(&mut game, "c3", "d5");
        assert_eq!(game.status(), Status::DrawInsufficientMaterial);
    }

    fn promotion_board() -> Board {
        board_with(
            &[("e1", King, White), ("h5", King, Black), ("a7", Pawn, White)],
            White,
        )
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = Game::new(promotion_board());
        play(&mut game, "a7", "a8");
        assert_eq!(game.board().piece_at(sq("a8")), Some(Piece::new(Queen, White)));
        assert_eq!(game.history()[0].promotion(), Some(Promotion::Queen));
    }

    #[test]
    fn promotion_handler_is_asked_only_when_unset() {
        let calls = Rc::new(Cell::new(0));
        let mut game = Game::new(promotion_board());
        let counter = Rc::clone(&calls);
        game.set_promotion_handler(move |color| {
            assert_eq!(color, White);
            counter.set(counter.get() + 1);
            Some(Promotion::Knight)
        });

        play(&mut game, "a7", "a8");
        assert_eq!(calls.get(), 1);
        assert_eq!(game.board().piece_at(sq("a8")), Some(Piece::new(Knight, White)));

        // a preset kind skips the handler; a king is not honored
        assert!(game.previous());
        assert!(game.play(sq("a7"), sq("a8"), Some(King)).unwrap());
        assert_eq!(calls.get(), 1);
        assert_eq!(game.board().piece_at(sq("a8")), Some(Piece::new(Queen, White)));
    }

    #[test]
    fn handler_without_answer_promotes_to_queen() {
        let mut game = Game::new(promotion_board());
        game.set_promotion_handler(|_| None);
        play(&mut game, "a7", "a8");
        assert_eq!(game.board().piece_at(sq("a8")), Some(Piece::new(Queen, White)));
    }

    #[test]
    fn promotion_survives_navigation() {
        let mut game = Game::new(promotion_board());
        assert!(game.play(sq("a7"), sq("a8"), Some(Rook)).unwrap());
        assert!(game.previous());
        assert_eq!(game.board().piece_at(sq("a7")), Some(Piece::new(Pawn, White)));
        assert!(game.next());
        assert_eq!(game.board().piece_at(sq("a8")), Some(Piece::new(Rook, White)));
    }

    #[test]
    fn making_a_move_discards_the_redo_tail() {
        let mut game = Game::standard();
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        assert!(game.previous());
        assert!(game.previous());
        assert!(!game.previous(), "already at the start");

        play(&mut game, "d2", "d4");
        assert_eq!(game.history().len(), 1);
        assert!(game.is_last());
        assert!(!game.next());
        assert_eq!(game.history()[0].to(), sq("d4"));
    }

    #[test]
    fn navigation_restores_each_position() {
        let mut game = Game::standard();
        let mut boards = vec![game.board().clone()];
        for (from, to) in [("e2", "e4"), ("d7", "d5"), ("e4", "d5"), ("g8", "f6")] {
            play(&mut game, from, to);
            boards.push(game.board().clone());
        }
        for expected in boards.iter().rev().skip(1) {
            assert!(game.previous());
            assert_eq!(game.board(), expected);
        }
        for expected in boards.iter().skip(1) {
            assert!(game.next());
            assert_eq!(game.board(), expected);
        }
    }

    #[test]
    fn captured_pieces_up_to_the_cursor() {
        let mut game = Game::standard();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        play(&mut game, "e4", "d5");
        play(&mut game, "d8", "d5");

        let captured = game.captured_pieces();
        assert_eq!(captured.get(&Piece::new(Pawn, Black)), Some(&1));
        assert_eq!(captured.get(&Piece::new(Pawn, White)), Some(&1));

        assert!(game.previous());
        let captured = game.captured_pieces();
        assert_eq!(captured.get(&Piece::new(Pawn, Black)), Some(&1));
        assert_eq!(captured.get(&Piece::new(Pawn, White)), None);
    }

    #[test]
    fn repetitive_move_candidate_after_three_echoes() {
        let mut game = Game::standard();
        for (from, to) in KNIGHT_CYCLE.iter().chain(KNIGHT_CYCLE.iter()).take(6) {
            play(&mut game, from, to);
            assert!(game.repetitive_move_candidate().is_none());
        }
        let (from, to) = KNIGHT_CYCLE[2];
        play(&mut game, from, to);

        let candidate = game.repetitive_move_candidate().expect("cycle detected");
        assert_eq!((candidate.from(), candidate.to()), (sq("f6"), sq("g8")));
        assert!(game.make(candidate).unwrap());
        assert_eq!(game.status(), Status::DrawRepetition);
    }

    #[derive(Clone, Default)]
    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
        veto_forward: bool,
    }

    fn describe(event: &GameEvent<'_>) -> String {
        match event {
            GameEvent::Move { cursor, .. } => format!("move@{cursor}"),
            GameEvent::Forward { cursor, .. } => format!("forward@{cursor}"),
            GameEvent::Back { cursor, .. } => format!("back@{cursor}"),
            GameEvent::Modify => "modify".to_string(),
            GameEvent::Load => "load".to_string(),
            GameEvent::BoardLoaded => "board-loaded".to_string(),
            GameEvent::MovesLoaded => "moves-loaded".to_string(),
        }
    }

    impl GameObserver for Recorder {
        fn before(&mut self, event: &GameEvent<'_>) -> Decision {
            self.log.borrow_mut().push(format!("before:{}", describe(event)));
            if self.veto_forward && matches!(event, GameEvent::Forward { .. }) {
                Decision::Cancel
            } else {
                Decision::Proceed
            }
        }

        fn after(&mut self, event: &GameEvent<'_>) {
            self.log.borrow_mut().push(format!("after:{}", describe(event)));
        }
    }

    #[test]
    fn observers_see_and_veto_actions() {
        let recorder = Recorder {
            veto_forward: true,
            ..Recorder::default()
        };
        let log = Rc::clone(&recorder.log);
        let mut game = Game::standard();
        game.add_observer(recorder);

        play(&mut game, "e2", "e4");
        assert!(game.previous());
        assert!(!game.next(), "forward step is vetoed");
        assert_eq!(game.cursor(), 0);
        assert!(game.go_to_last(), "bulk navigation only asks about modify");
        assert_eq!(game.cursor(), 1);

        assert_eq!(
            *log.borrow(),
            vec![
                "before:move@0",
                "after:move@1",
                "before:back@1",
                "after:back@0",
                "before:forward@0",
                "before:modify",
                "after:modify",
            ]
        );
    }

    #[test]
    fn cancelled_move_changes_nothing() {
        struct Veto;
        impl GameObserver for Veto {
            fn before(&mut self, _: &GameEvent<'_>) -> Decision {
                Decision::Cancel
            }
        }

        let mut game = Game::standard();
        game.add_observer(Veto);
        assert!(!game.play(sq("e2"), sq("e4"), None).unwrap());
        assert!(game.board().is_in_starting_position());
        assert!(game.history().is_empty());
        assert!(!game.go_to_first());
    }

    #[test]
    fn load_replays_moves_quietly() {
        let recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        let mut game = Game::standard();
        game.add_observer(recorder);

        let moves = [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]
            .map(|(from, to)| MoveRequest::new(sq(from), sq(to)));
        assert!(game.load(Board::new(), moves).unwrap());

        assert_eq!(game.cursor(), 4);
        assert_eq!(game.status(), Status::Checkmate);
        assert_eq!(
            *log.borrow(),
            vec!["before:load", "after:board-loaded", "after:moves-loaded"]
        );
    }

    #[test]
    fn load_stops_at_an_illegal_move() {
        let mut game = Game::standard();
        let moves = [MoveRequest::new(sq("e2"), sq("e4")), MoveRequest::new(sq("e2"), sq("e4"))];
        let err = game.load(Board::new(), moves).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));
        assert_eq!(game.cursor(), 1);
        assert!(!game.loading);
    }
}
