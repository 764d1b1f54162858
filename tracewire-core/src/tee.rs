use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Source<T> = Box<dyn Iterator<Item = T> + Send>;

struct TeeState<T> {
    source: Source<T>,
    pending: [VecDeque<T>; 2],
    alive: [bool; 2],
}

/// One side of a buffering tee over a single producer.
///
/// Items pulled from the producer by one side are queued for the other side
/// until it catches up. Once a side is dropped nothing is queued for it.
pub struct TeeHalf<T> {
    shared: Arc<Mutex<TeeState<T>>>,
    side: usize,
}

/// Splits `source` into two iterators that each yield every remaining item once.
pub fn tee<T, I>(source: I) -> (TeeHalf<T>, TeeHalf<T>)
where
    T: Clone + Send + 'static,
    I: Iterator<Item = T> + Send + 'static,
{
    let shared = Arc::new(Mutex::new(TeeState {
        source: Box::new(source),
        pending: [VecDeque::new(), VecDeque::new()],
        alive: [true, true],
    }));
    (
        TeeHalf {
            shared: Arc::clone(&shared),
            side: 0,
        },
        TeeHalf { shared, side: 1 },
    )
}

impl<T> TeeHalf<T> {
    fn lock(&self) -> MutexGuard<'_, TeeState<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Items already pulled by the other side and waiting for this one.
    pub fn buffered(&self) -> usize {
        self.lock().pending[self.side].len()
    }
}

impl<T: Clone> Iterator for TeeHalf<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let side = self.side;
        let mut state = self.lock();
        if let Some(item) = state.pending[side].pop_front() {
            return Some(item);
        }

        let item = state.source.next()?;
        let other = 1 - side;
        if state.alive[other] {
            state.pending[other].push_back(item.clone());
        }
        Some(item)
    }
}

impl<T> Drop for TeeHalf<T> {
    fn drop(&mut self) {
        let side = self.side;
        let mut state = self.lock();
        state.alive[side] = false;
        state.pending[side].clear();
    }
}
