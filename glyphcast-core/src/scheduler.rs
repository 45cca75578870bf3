//! Fixed-cadence driver for encode sessions
//!
//! The ticker runs on the calling thread. Each tick produces exactly one
//! block; ticks never overlap. A tick that overruns its slot pushes the
//! schedule back instead of bursting to catch up.

use crate::error::SessionError;
use crate::fec::ErasureEngine;
use crate::sender::{EncodeSession, Emitted};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// Cloneable flag used to cancel a running ticker from another thread
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the ticker to stop before its next tick
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a ticker run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The sink asked to stop
    SinkFinished,
    /// The stop handle was triggered
    Cancelled,
}

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Blocks produced and handed to the sink
    pub ticks: u64,
    /// Why the run ended
    pub reason: StopReason,
}

/// Invokes `produce_next` once per interval
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    stop: StopHandle,
}

impl Ticker {
    /// Create a ticker with the given cadence
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop: StopHandle::default(),
        }
    }

    /// Handle that cancels this ticker
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Cadence between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drive `session` until the sink breaks, the stop handle fires, or
    /// encoding fails. The session is stopped on every exit path.
    pub fn run<E, F>(
        &self,
        session: &mut EncodeSession<E>,
        mut sink: F,
    ) -> Result<RunSummary, SessionError>
    where
        E: ErasureEngine,
        F: FnMut(&Emitted) -> ControlFlow<()>,
    {
        let mut ticks = 0u64;
        let mut deadline = Instant::now();

        #[cfg(feature = "logging")]
        info!("Ticker started: interval {:?}", self.interval);

        let reason = loop {
            if self.stop.is_stopped() {
                break StopReason::Cancelled;
            }

            let emitted = match session.produce_next() {
                Ok(emitted) => emitted,
                Err(err) => {
                    session.stop();
                    return Err(err);
                }
            };
            ticks += 1;

            if sink(&emitted).is_break() {
                break StopReason::SinkFinished;
            }

            deadline += self.interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                #[cfg(feature = "logging")]
                debug!("Tick {} overran its slot by {:?}", ticks, now - deadline);

                deadline = now;
            }
        };

        session.stop();

        #[cfg(feature = "logging")]
        info!("Ticker finished after {} ticks ({:?})", ticks, reason);

        Ok(RunSummary { ticks, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::SenderState;
    use crate::testkit::{FaultyEngine, HandleCounters};
    use bytes::Bytes;

    #[test]
    fn test_sink_bounds_run() {
        let mut session = EncodeSession::start_raptorq(Bytes::from(vec![7u8; 100]), 10).unwrap();
        let ticker = Ticker::new(Duration::from_millis(1));

        let mut ids = Vec::new();
        let summary = ticker
            .run(&mut session, |emitted| {
                ids.push(emitted.block_id);
                if ids.len() == 5 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.reason, StopReason::SinkFinished);
        assert_eq!(session.state(), SenderState::Stopped);
    }

    #[test]
    fn test_cadence_is_respected() {
        let mut session = EncodeSession::start_raptorq(Bytes::from(vec![7u8; 100]), 10).unwrap();
        let ticker = Ticker::new(Duration::from_millis(5));
        let started = Instant::now();

        let mut count = 0;
        ticker
            .run(&mut session, |_| {
                count += 1;
                if count == 4 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        // Three full intervals elapse between four ticks
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_stop_handle_cancels() {
        let mut session = EncodeSession::start_raptorq(Bytes::from(vec![7u8; 100]), 10).unwrap();
        let ticker = Ticker::new(Duration::from_millis(1));
        let stop = ticker.stop_handle();

        let summary = ticker
            .run(&mut session, |emitted| {
                if emitted.block_id == 2 {
                    stop.stop();
                }
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.reason, StopReason::Cancelled);
    }

    #[test]
    fn test_encode_failure_ends_run() {
        let counters = HandleCounters::default();
        let mut session = EncodeSession::new(FaultyEngine::failing_at(3, counters.clone()));
        session.start(Bytes::from(vec![1u8; 64]), 16).unwrap();

        let ticker = Ticker::new(Duration::from_millis(1));
        let mut seen = 0;
        let err = ticker
            .run(&mut session, |_| {
                seen += 1;
                ControlFlow::Continue(())
            })
            .unwrap_err();

        assert!(matches!(err, SessionError::EncodeFailed { block_id: 3, .. }));
        assert_eq!(seen, 3);
        assert_eq!(session.state(), SenderState::Stopped);
        assert_eq!(counters.encoders_destroyed(), 1);
    }
}
