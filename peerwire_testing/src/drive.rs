//! Drivers that poll an operation the way a scheduler loop would.

use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

/// Turn budget generous enough for any scripted exchange in the tests.
pub const DEFAULT_TURNS: usize = 10_000;

/// A context whose waker does nothing.
#[must_use]
pub fn noop_context() -> Context<'static> { Context::from_waker(noop_waker_ref()) }

/// Poll once with a no-op waker.
pub fn poll_once<T>(poll: impl FnOnce(&mut Context<'_>) -> Poll<T>) -> Poll<T> {
    poll(&mut noop_context())
}

/// Poll until ready, for at most `max_turns` turns.
///
/// Returns the value together with the number of turns taken, or `None` if
/// the operation was still pending when the budget ran out.
pub fn drive<T>(
    mut poll: impl FnMut(&mut Context<'_>) -> Poll<T>,
    max_turns: usize,
) -> Option<(T, usize)> {
    let mut cx = noop_context();
    (1..=max_turns).find_map(|turn| match poll(&mut cx) {
        Poll::Ready(value) => Some((value, turn)),
        Poll::Pending => None,
    })
}
