//! Phase transitions over a [`Pattern`]'s step table.

use super::pattern::{Pattern, Repeat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(usize),
    Finished,
}

/// Index of the first phase with a non-zero duration.
pub fn first_active(pattern: &Pattern) -> usize {
    pattern
        .steps()
        .iter()
        .position(|s| s.seconds > 0)
        .unwrap_or(0)
}

/// The phase that follows `index`, skipping zero-duration rows.
pub fn next(pattern: &Pattern, index: usize) -> Transition {
    let len = pattern.len();
    let mut candidate = index + 1;

    // At most one full lap; a pattern always carries a non-zero phase.
    for _ in 0..len {
        if candidate >= len {
            match pattern.repeat {
                Repeat::Cycle => candidate = 0,
                Repeat::Once => return Transition::Finished,
            }
        }
        if pattern.steps()[candidate].seconds > 0 {
            return Transition::Next(candidate);
        }
        candidate += 1;
    }

    Transition::Finished
}

/// Jump to the first active phase of the following routine step.
///
/// Cyclic patterns treat every phase as its own step, so this is the same as
/// [`next`]. On the last step of a one-shot routine there is nowhere to go and
/// `None` is returned.
pub fn skip_step(pattern: &Pattern, index: usize) -> Option<usize> {
    match pattern.repeat {
        Repeat::Cycle => match next(pattern, index) {
            Transition::Next(i) => Some(i),
            Transition::Finished => None,
        },
        Repeat::Once => {
            let current = pattern.get(index)?.step;
            pattern
                .steps()
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, s)| s.step > current && s.seconds > 0)
                .map(|(i, _)| i)
        }
    }
}
