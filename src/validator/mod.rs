//! Validator — runs a snapshot stream through the render model.
//!
//! For every snapshot the validator asks the [`HrmEngine`] how long the
//! decoder needs, works out how long it actually has, and reports through an
//! [`EventHandler`]. Budget overruns are reported, not raised: the run goes
//! on unless the handler asks to stop.

use std::ops::ControlFlow;

use log::{debug, error, info, trace, warn};

use crate::config::{HrmParameters, ValidatorConfig};
use crate::engine::{HrmEngine, IsdStatistics};
use crate::error::{HrmError, Result};
use crate::number::{Rational, as_f64, checked_sub};
use crate::sequence::{DocumentEntry, DocumentParser, IsdSequence, TimedIsd};
use crate::time::Time;

/// Everything known about one step of the run.
#[derive(Debug, Clone, Copy)]
pub struct HrmEvent<'a> {
    pub message: &'a str,
    /// Position of the snapshot in the stream.
    pub index: usize,
    pub time_offset: Time,
    /// Seconds the decoder had to present the snapshot.
    pub available_time: Rational,
    pub stats: &'a IsdStatistics,
}

/// Receives validation events. The defaults forward to the `log` facade.
///
/// Returning [`ControlFlow::Break`] from [`EventHandler::error`] stops the run
/// after the current snapshot.
pub trait EventHandler {
    fn debug(&mut self, event: &HrmEvent<'_>) {
        debug!("{} (#{}): {}", event.time_offset, event.index, event.message);
        trace!(
            "{} (#{}): {}",
            event.time_offset,
            event.index,
            serde_json::to_string(event.stats).unwrap_or_default()
        );
    }

    fn info(&mut self, event: &HrmEvent<'_>) {
        info!("{} (#{}): {}", event.time_offset, event.index, event.message);
    }

    fn warn(&mut self, event: &HrmEvent<'_>) {
        warn!("{} (#{}): {}", event.time_offset, event.index, event.message);
    }

    fn error(&mut self, event: &HrmEvent<'_>) -> ControlFlow<()> {
        error!("{} (#{}): {}", event.time_offset, event.index, event.message);
        ControlFlow::Continue(())
    }
}

/// Handler that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub snapshots: usize,
    pub errors: usize,
    /// The handler stopped the run early.
    pub aborted: bool,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    engine: HrmEngine,
}

impl Validator {
    pub fn new(params: HrmParameters) -> Self {
        Validator {
            engine: HrmEngine::with_parameters(params),
        }
    }

    /// Consume `isds`, which must be in strictly increasing time order.
    ///
    /// Structural errors (out-of-order snapshots, unsupported styles, errors
    /// from the stream itself) abort the run and are returned.
    pub fn run<I, H>(mut self, isds: I, handler: &mut H) -> Result<Outcome>
    where
        I: IntoIterator<Item = Result<TimedIsd>>,
        H: EventHandler + ?Sized,
    {
        let params = self.engine.parameters().clone();
        let mut outcome = Outcome::default();
        let mut previous: Option<Time> = None;
        // The first snapshot gets a full IPD.
        let mut last_render_time = -params.ipd;

        for (index, item) in isds.into_iter().enumerate() {
            let (time_offset, isd) = item?;

            if let Some(previous) = previous.filter(|p| time_offset <= *p) {
                return Err(HrmError::OutOfOrder {
                    previous,
                    current: time_offset,
                });
            }
            previous = Some(time_offset);

            let stats = self.engine.process(isd.as_ref())?;
            outcome.snapshots += 1;

            let now = time_offset.as_secs_rational();
            let elapsed = checked_sub(now, last_render_time, "available time")?;
            let available_time = params.ipd.min(elapsed);

            let trace = format!(
                "Render time {:.3}, available time {:.3}, glyph buffer size {:.3}",
                as_f64(stats.dur),
                as_f64(available_time),
                as_f64(stats.ngra_t)
            );
            let base = HrmEvent {
                message: "",
                index,
                time_offset,
                available_time,
                stats: &stats,
            };
            handler.debug(&HrmEvent { message: &trace, ..base });

            if stats.is_empty {
                // A blank screen does not restart the clock.
                continue;
            }

            let mut flow = ControlFlow::Continue(());

            if stats.dur > available_time {
                let message = format!(
                    "Rendering time exceeded ({:.3} > {:.3})",
                    as_f64(stats.dur),
                    as_f64(available_time)
                );
                outcome.errors += 1;
                flow = handler.error(&HrmEvent { message: &message, ..base });
            }

            if stats.ngra_t > params.ngbs {
                let message = format!(
                    "Glyph buffer size exceeded ({:.3} > {:.3})",
                    as_f64(stats.ngra_t),
                    as_f64(params.ngbs)
                );
                outcome.errors += 1;
                if handler.error(&HrmEvent { message: &message, ..base }).is_break() {
                    flow = ControlFlow::Break(());
                }
            }

            last_render_time = now;

            if flow.is_break() {
                outcome.aborted = true;
                break;
            }
        }

        Ok(outcome)
    }
}

/// Validate a snapshot stream with the reference parameters.
pub fn validate<I, H>(isds: I, handler: &mut H) -> Result<Outcome>
where
    I: IntoIterator<Item = Result<TimedIsd>>,
    H: EventHandler + ?Sized,
{
    Validator::default().run(isds, handler)
}

/// Sequence `documents` with `parser` and validate the resulting stream.
pub fn validate_documents<D, P, H>(
    documents: D,
    parser: P,
    handler: &mut H,
    config: &ValidatorConfig,
) -> Result<Outcome>
where
    D: IntoIterator<Item = Result<DocumentEntry>>,
    P: DocumentParser,
    H: EventHandler + ?Sized,
{
    let isds = IsdSequence::with_tolerance(documents, parser, config.tolerance);
    Validator::new(config.parameters.clone()).run(isds, handler)
}
