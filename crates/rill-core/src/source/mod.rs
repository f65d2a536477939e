//! Stream sources - the single capability every audio producer implements
//!
//! A [`Source`] fills a caller-provided slice with up to `buf.len()` stereo
//! samples and reports how many it produced and whether it will ever produce
//! again. Terminal failures are reported separately through [`Source::err`],
//! so composites can multiplex many children without boxing an error on
//! every pull.
//!
//! # Contract
//!
//! - `stream` returns `(n, more)` with `n <= buf.len()`; only `buf[..n]` is
//!   written.
//! - `more == true` does not promise a full buffer. Every caller must handle
//!   partial fills.
//! - `more == false` may come with a trailing partial block (`n > 0`). All
//!   later pulls return `(0, false)`: sources never resurrect.
//! - Once `err()` returns `Some`, it keeps returning the same error and every
//!   later pull returns `(0, false)`.
//!
//! Composition graphs must be acyclic. A source handed to a combinator or to
//! the driver is owned by it; nothing else mutates its state.

mod error;
pub mod leaf;

pub use error::StreamError;
pub use leaf::{callback, constant, constant_forever, samples, silence, silence_forever};
pub use leaf::{Callback, Constant, Samples, Silence};

use crate::types::{StereoSample, STREAM_CHUNK};

/// A pull-based producer of stereo samples
pub trait Source: Send {
    /// Fill `buf` with up to `buf.len()` samples.
    ///
    /// Returns the number of samples written to the front of `buf` and
    /// whether the source may produce more on a later call.
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool);

    /// The sticky terminal error, if the source has failed.
    fn err(&self) -> Option<&StreamError> {
        None
    }
}

/// Type-erased source, the form the driver stores and `Seq`/`Mix` accept
/// for heterogeneous children.
pub type BoxSource = Box<dyn Source>;

impl<S: Source + ?Sized> Source for Box<S> {
    #[inline]
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        (**self).stream(buf)
    }

    #[inline]
    fn err(&self) -> Option<&StreamError> {
        (**self).err()
    }
}

/// Borrowing a source lets a combinator consume part of it while the caller
/// keeps the rest, e.g. `Take::new(n, &mut source)`.
impl<S: Source + ?Sized> Source for &mut S {
    #[inline]
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        (**self).stream(buf)
    }

    #[inline]
    fn err(&self) -> Option<&StreamError> {
        (**self).err()
    }
}

/// Adapter turning a plain function into a [`Source`]
///
/// The function receives the caller's buffer and returns `(produced, more)`
/// exactly like [`Source::stream`]. It never reports an error.
pub struct FnSource<F> {
    f: F,
    done: bool,
}

impl<F> FnSource<F>
where
    F: FnMut(&mut [StereoSample]) -> (usize, bool) + Send,
{
    pub fn new(f: F) -> Self {
        Self { f, done: false }
    }
}

impl<F> Source for FnSource<F>
where
    F: FnMut(&mut [StereoSample]) -> (usize, bool) + Send,
{
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        // Exhaustion is latched here so a careless closure cannot resurrect
        if self.done {
            return (0, false);
        }
        let (n, more) = (self.f)(buf);
        let n = n.min(buf.len());
        if !more {
            self.done = true;
        }
        (n, more)
    }
}

/// Wrap a function as a source
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut(&mut [StereoSample]) -> (usize, bool) + Send,
{
    FnSource::new(f)
}

/// Pull `source` to exhaustion and return everything it produced.
///
/// A source that never ends makes this loop forever, so window infinite
/// sources with `Take` first.
pub fn collect<S: Source + ?Sized>(source: &mut S) -> Result<Vec<StereoSample>, StreamError> {
    let mut out = Vec::new();
    let mut chunk = [StereoSample::silence(); STREAM_CHUNK];
    loop {
        let (n, more) = source.stream(&mut chunk);
        out.extend_from_slice(&chunk[..n]);
        if !more {
            break;
        }
    }
    match source.err() {
        Some(err) => Err(err.clone()),
        None => Ok(out),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test sources shared by the unit tests of every module

    use super::*;

    /// Infinite source producing 1, 2, 3, ... in both channels
    pub fn naturals() -> FnSource<impl FnMut(&mut [StereoSample]) -> (usize, bool) + Send> {
        let mut next = 1.0f32;
        from_fn(move |buf: &mut [StereoSample]| {
            for s in buf.iter_mut() {
                *s = StereoSample::mono(next);
                next += 1.0;
            }
            (buf.len(), true)
        })
    }

    /// Finite source over literal mono values
    pub fn mk(values: &[f32]) -> Samples {
        samples(values.iter().map(|&v| StereoSample::mono(v)).collect())
    }

    /// Left channel of each sample, for compact assertions
    pub fn lefts(samples: &[StereoSample]) -> Vec<f32> {
        samples.iter().map(|s| s.left).collect()
    }

    /// Source that produces `ok_pulls` pulls of `value` and then fails
    pub struct Failing {
        pub value: f32,
        pub ok_pulls: usize,
        pub error: Option<StreamError>,
    }

    impl Failing {
        pub fn new(value: f32, ok_pulls: usize) -> Self {
            Self {
                value,
                ok_pulls,
                error: None,
            }
        }
    }

    impl Source for Failing {
        fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
            if self.error.is_some() {
                return (0, false);
            }
            if self.ok_pulls == 0 {
                self.error = Some(StreamError::failed("injected failure"));
                return (0, false);
            }
            self.ok_pulls -= 1;
            buf.fill(StereoSample::mono(self.value));
            (buf.len(), true)
        }

        fn err(&self) -> Option<&StreamError> {
            self.error.as_ref()
        }
    }

    /// Source that delivers at most `max` samples per pull
    pub struct Trickle<S> {
        pub inner: S,
        pub max: usize,
    }

    impl<S: Source> Source for Trickle<S> {
        fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
            let len = buf.len().min(self.max);
            self.inner.stream(&mut buf[..len])
        }

        fn err(&self) -> Option<&StreamError> {
            self.inner.err()
        }
    }
}
