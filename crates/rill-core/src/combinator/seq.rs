//! Sequencing - play sources one after another

use crate::source::{Source, StreamError};
use crate::types::StereoSample;

/// Plays its children back to back
///
/// A single pull may drain the tail of one child and continue straight into
/// the next, so there is never a gap between children. The first child
/// error halts the sequence; later children are never pulled.
pub struct Seq<S> {
    children: Vec<S>,
    /// Index of the child currently being streamed
    current: usize,
    /// Set when `children[current]` failed
    failed: bool,
}

impl<S: Source> Seq<S> {
    pub fn new(children: Vec<S>) -> Self {
        Self {
            children,
            current: 0,
            failed: false,
        }
    }

    /// Children not yet exhausted (including the current one)
    pub fn remaining(&self) -> usize {
        if self.failed {
            return 0;
        }
        self.children.len() - self.current
    }
}

impl<S: Source> Source for Seq<S> {
    fn stream(&mut self, buf: &mut [StereoSample]) -> (usize, bool) {
        if self.failed {
            return (0, false);
        }

        let mut filled = 0;
        while filled < buf.len() && self.current < self.children.len() {
            let child = &mut self.children[self.current];
            let (n, more) = child.stream(&mut buf[filled..]);
            filled += n;

            if !more {
                if child.err().is_some() {
                    self.failed = true;
                    return (filled, false);
                }
                self.current += 1;
            } else if n == 0 {
                // Child is starved for now; retry it on the next pull
                break;
            }
        }

        // Zero-sample children (callbacks) still run even on an empty request
        while buf.is_empty() && self.current < self.children.len() {
            let child = &mut self.children[self.current];
            let (_, more) = child.stream(buf);
            if more {
                break;
            }
            if child.err().is_some() {
                self.failed = true;
                return (0, false);
            }
            self.current += 1;
        }

        (filled, self.current < self.children.len())
    }

    fn err(&self) -> Option<&StreamError> {
        if self.failed {
            self.children[self.current].err()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{lefts, mk, naturals, Failing, Trickle};
    use crate::source::{callback, collect, BoxSource};
    use crate::combinator::Take;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_seq_concatenates() {
        let mut seq = Seq::new(vec![mk(&[1.0, 2.0, 3.0]), mk(&[4.0, 5.0])]);
        let out = collect(&mut seq).unwrap();
        assert_eq!(lefts(&out), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_single_pull_spans_children() {
        let mut seq = Seq::new(vec![mk(&[1.0, 2.0]), mk(&[3.0]), mk(&[4.0, 5.0])]);
        let mut buf = [StereoSample::silence(); 4];

        assert_eq!(seq.stream(&mut buf), (4, true));
        assert_eq!(lefts(&buf), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(seq.stream(&mut buf), (1, false));
        assert_eq!(buf[0].left, 5.0);
        assert_eq!(seq.stream(&mut buf), (0, false));
    }

    #[test]
    fn test_partial_fills_are_continued() {
        let children = vec![
            Trickle { inner: mk(&[1.0, 2.0, 3.0]), max: 1 },
            Trickle { inner: mk(&[4.0]), max: 1 },
        ];
        let out = collect(&mut Seq::new(children)).unwrap();
        assert_eq!(lefts(&out), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_seq_is_exhausted() {
        let mut seq: Seq<BoxSource> = Seq::new(Vec::new());
        let mut buf = [StereoSample::silence(); 4];
        assert_eq!(seq.stream(&mut buf), (0, false));
    }

    #[test]
    fn test_error_halts_sequence() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        let children: Vec<BoxSource> = vec![
            Box::new(mk(&[1.0])),
            Box::new(Failing::new(2.0, 1)),
            Box::new(callback(move || flag.store(true, Ordering::SeqCst))),
        ];
        let mut seq = Seq::new(children);
        let mut buf = [StereoSample::silence(); 4];

        // 1 sample from the first child, then the failing child fills the rest
        assert_eq!(seq.stream(&mut buf), (4, true));
        assert_eq!(seq.stream(&mut buf), (0, false));
        assert!(seq.err().is_some());
        assert_eq!(seq.stream(&mut buf), (0, false));
        assert_eq!(seq.err(), Some(&StreamError::failed("injected failure")));
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[test]
    fn test_callback_fires_after_preceding_audio() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let children: Vec<BoxSource> = vec![
            Box::new(mk(&[1.0, 2.0, 3.0])),
            Box::new(callback(move || flag.store(true, Ordering::SeqCst))),
            Box::new(mk(&[4.0])),
        ];
        let mut seq = Seq::new(children);
        let mut buf = [StereoSample::silence(); 2];

        assert_eq!(seq.stream(&mut buf), (2, true));
        assert!(!fired.load(Ordering::SeqCst));
        assert_eq!(seq.stream(&mut buf), (2, false));
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(lefts(&buf), vec![3.0, 4.0]);
    }

    #[test]
    fn test_seq_of_windows_over_infinite_sources() {
        let children = vec![Take::new(2, naturals()), Take::new(3, naturals())];
        let out = collect(&mut Seq::new(children)).unwrap();
        assert_eq!(lefts(&out), vec![1.0, 2.0, 1.0, 2.0, 3.0]);
    }
}
