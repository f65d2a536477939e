//! Combinators - build new sources out of existing ones
//!
//! - [`Seq`] plays children back to back
//! - [`Mix`] sums children position-wise
//! - [`Take`] windows the first N samples of a child

mod mix;
mod seq;
mod take;

pub use mix::Mix;
pub use seq::Seq;
pub use take::Take;

use crate::source::Source;

/// Play `children` one after another
pub fn seq<S: Source>(children: Vec<S>) -> Seq<S> {
    Seq::new(children)
}

/// Sum `children` sample by sample
pub fn mix<S: Source>(children: Vec<S>) -> Mix<S> {
    Mix::new(children)
}

/// At most the first `n` samples of `child`
pub fn take<S: Source>(n: usize, child: S) -> Take<S> {
    Take::new(n, child)
}
