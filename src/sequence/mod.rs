//! Sequence — stitches a stream of documents into a stream of snapshots.
//!
//! Each document is active over an interval of the presentation timeline.
//! The sequencer walks the documents in order, asks each one for the
//! instants at which its rendering changes, and yields one `(time, snapshot)`
//! pair per change. Gaps between documents become explicit blank snapshots.
//!
//! Documents are parsed lazily, one at a time.

pub mod source;

use log::{debug, trace, warn};

use crate::error::{HrmError, Result};
use crate::time::Time;
use crate::types::Isd;
pub use source::{DocumentEntry, Manifest, SingleDocument};

/// A parsed document that can be sampled over time.
pub trait DocumentModel {
    /// Sorted, deduplicated instants at which the rendered tree changes.
    fn significant_times(&self) -> Vec<Time>;

    /// The visual tree valid at `t`.
    fn isd_at(&self, t: Time) -> Isd;
}

pub trait DocumentParser {
    type Model: DocumentModel;

    fn parse(&self, text: &str) -> Result<Self::Model>;
}

/// One element of the snapshot stream. `None` is a blank screen.
pub type TimedIsd = (Time, Option<Isd>);

struct ActiveDocument<M> {
    model: M,
    end: Option<Time>,
    times: Vec<Time>,
    next: usize,
}

/// Iterator over the snapshots of a sequence of documents.
///
/// Fused: after the stream ends, or after an error, it only yields `None`.
pub struct IsdSequence<I, P: DocumentParser> {
    documents: I,
    parser: P,
    tolerance: Time,
    cur_time: Option<Time>,
    /// Document held back while the gap before it is emitted.
    queued: Option<DocumentEntry>,
    active: Option<ActiveDocument<P::Model>>,
    finished: bool,
}

impl<I, P> IsdSequence<I, P>
where
    I: Iterator<Item = Result<DocumentEntry>>,
    P: DocumentParser,
{
    pub fn new(documents: impl IntoIterator<IntoIter = I>, parser: P) -> Self {
        Self::with_tolerance(documents, parser, Time::ZERO)
    }

    /// `tolerance` is the slack allowed when comparing document intervals.
    pub fn with_tolerance(
        documents: impl IntoIterator<IntoIter = I>,
        parser: P,
        tolerance: Time,
    ) -> Self {
        IsdSequence {
            documents: documents.into_iter(),
            parser,
            tolerance,
            cur_time: None,
            queued: None,
            active: None,
            finished: false,
        }
    }

    fn fail(&mut self, e: HrmError) -> Option<Result<TimedIsd>> {
        self.finished = true;
        Some(Err(e))
    }

    fn activate(&mut self, entry: DocumentEntry) -> Result<()> {
        self.cur_time = Some(entry.begin);
        let model = self.parser.parse(&entry.text)?;
        let times = model.significant_times();
        self.active = Some(ActiveDocument {
            model,
            end: entry.end,
            times,
            next: 0,
        });
        Ok(())
    }

    /// Activate `entry`, or hold it back and return a blank snapshot when a
    /// gap separates it from the previous document.
    fn enter(&mut self, entry: DocumentEntry) -> Result<Option<TimedIsd>> {
        if let Some(cur) = self.cur_time {
            if cur.since(entry.begin)? > self.tolerance {
                return Err(HrmError::OverlappingIntervals {
                    current: cur,
                    begin: entry.begin,
                });
            }
            if entry.begin.since(cur)? > self.tolerance {
                debug!("gap from {cur} to {}: inserting blank snapshot", entry.begin);
                self.queued = Some(entry);
                return Ok(Some((cur, None)));
            }
        }

        self.activate(entry)?;
        Ok(None)
    }

    /// Advance through the active document. Returns `None` once it has
    /// nothing more to contribute.
    fn step_active(&mut self) -> Result<Option<TimedIsd>> {
        let tolerance = self.tolerance;
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let mut cur = self.cur_time.unwrap_or(Time::ZERO);

        while active.next < active.times.len() {
            let left = active.times[active.next];
            let right = active.times.get(active.next + 1).copied();
            active.next += 1;

            let mut emitted = None;

            // The sub-interval must contain `cur` and not end within tolerance of it,
            // otherwise a late document would emit a time behind `cur`.
            let starts_by_cur = left.since(cur)? <= tolerance;
            let ends_after_cur = match right {
                Some(r) => r.since(cur)? > tolerance,
                None => true,
            };
            if starts_by_cur && ends_after_cur {
                emitted = Some((cur, Some(active.model.isd_at(left))));
                match right {
                    Some(r) => cur = r,
                    None => {
                        // An open-ended interval runs to the end of the stream.
                        self.finished = true;
                        self.cur_time = Some(cur);
                        if self.documents.next().is_some() {
                            warn!(
                                "content is open-ended from {cur}: \
                                 later documents in the stream are not validated"
                            );
                        }
                        return Ok(emitted);
                    }
                }
            }

            let exhausted = match active.end {
                Some(end) => end.since(cur)? <= tolerance,
                None => false,
            };
            if let Some(end) = active.end.filter(|_| exhausted) {
                cur = end;
            }
            self.cur_time = Some(cur);

            if exhausted {
                self.active = None;
                return Ok(emitted);
            }
            if emitted.is_some() {
                return Ok(emitted);
            }
        }

        self.active = None;
        Ok(None)
    }
}

impl<I, P> Iterator for IsdSequence<I, P>
where
    I: Iterator<Item = Result<DocumentEntry>>,
    P: DocumentParser,
{
    type Item = Result<TimedIsd>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if self.active.is_some() {
                match self.step_active() {
                    Ok(Some(pair)) => {
                        trace!("snapshot at {}", pair.0);
                        return Some(Ok(pair));
                    }
                    Ok(None) => continue,
                    Err(e) => return self.fail(e),
                }
            }

            if let Some(entry) = self.queued.take() {
                if let Err(e) = self.activate(entry) {
                    return self.fail(e);
                }
                continue;
            }

            let entry = match self.documents.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(e)) => return self.fail(e),
                Some(Ok(entry)) => entry,
            };

            match self.enter(entry) {
                Ok(Some(gap)) => return Some(Ok(gap)),
                Ok(None) => {}
                Err(e) => return self.fail(e),
            }
        }
    }
}
