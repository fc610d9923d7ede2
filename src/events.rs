use tracing::warn;

use crate::moves::Move;

/// Answer of an observer to a pending action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// Something a [`Game`](crate::game::Game) is about to do, or just did.
///
/// `cursor` is the history cursor: before the action in
/// [`GameObserver::before`], after it in [`GameObserver::after`].
#[derive(Debug)]
pub enum GameEvent<'a> {
    /// A new move made through `make`.
    Move { mv: &'a Move, cursor: usize },
    /// A step forward through existing history.
    Forward { mv: &'a Move, cursor: usize },
    /// A step back through history.
    Back { mv: &'a Move, cursor: usize },
    /// Bulk navigation (`go_to_first` / `go_to_last`).
    Modify,
    /// Restoring a saved game. Move events are not reported while loading.
    Load,
    BoardLoaded,
    MovesLoaded,
}

/// Host-side hooks into a game. Both methods default to doing nothing.
pub trait GameObserver {
    /// Called before an action; returning [`Decision::Cancel`] vetoes it.
    fn before(&mut self, _event: &GameEvent<'_>) -> Decision {
        Decision::Proceed
    }

    fn after(&mut self, _event: &GameEvent<'_>) {}
}

/// Asks every observer in turn; the first veto wins.
pub(crate) fn ask(observers: &mut [Box<dyn GameObserver>], event: &GameEvent<'_>) -> Decision {
    for observer in observers.iter_mut() {
        if observer.before(event) == Decision::Cancel {
            warn!(?event, "action cancelled by observer");
            return Decision::Cancel;
        }
    }
    Decision::Proceed
}

pub(crate) fn notify(observers: &mut [Box<dyn GameObserver>], event: &GameEvent<'_>) {
    for observer in observers.iter_mut() {
        observer.after(event);
    }
}
