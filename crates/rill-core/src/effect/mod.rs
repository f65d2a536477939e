//! Stateless per-sample effects
//!
//! Every effect delegates the pull to its child, transforms the produced
//! samples in place and forwards the child's `(n, more)` and error verbatim.

mod clip;
mod gain;
mod pan;

pub use clip::Clip;
pub use gain::{db_to_gain, gain_to_db, Gain};
pub use pan::{Mono, Pan, Swap};
