//! Observation hook for the signal path.
//!
//! During scrambling every non-final node is reported twice: once on the
//! way in, with zero backward values, and once on the way out with the real
//! backward values. The reflector is reported once; its forward values are
//! repeated as the backward values.

use log::trace;

use crate::wheel::DeviceKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEvent<'a> {
    pub device: &'a str,
    pub kind: DeviceKind,
    pub position: usize,
    pub forward_in: usize,
    pub forward_out: usize,
    pub backward_in: usize,
    pub backward_out: usize,
}

impl TraceEvent<'_> {
    pub fn to_record(&self) -> TraceRecord {
        TraceRecord {
            device: self.device.to_string(),
            kind: self.kind,
            position: self.position,
            forward_in: self.forward_in,
            forward_out: self.forward_out,
            backward_in: self.backward_in,
            backward_out: self.backward_out,
        }
    }
}

/// Owned copy of a [`TraceEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    pub device: String,
    pub kind: DeviceKind,
    pub position: usize,
    pub forward_in: usize,
    pub forward_out: usize,
    pub backward_in: usize,
    pub backward_out: usize,
}

pub trait ScrambleTracer {
    fn trace(&mut self, event: &TraceEvent<'_>);
}

impl<F> ScrambleTracer for F
where
    F: FnMut(&TraceEvent<'_>),
{
    fn trace(&mut self, event: &TraceEvent<'_>) {
        self(event)
    }
}

/// Forwards every event to the `log` facade at trace level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTracer;

impl ScrambleTracer for LogTracer {
    fn trace(&mut self, event: &TraceEvent<'_>) {
        trace!(
            "scramble device={} position={} fwd={}->{} bwd={}->{}",
            event.device,
            event.position,
            event.forward_in,
            event.forward_out,
            event.backward_in,
            event.backward_out
        );
    }
}

/// Collects events in order.
#[derive(Clone, Debug, Default)]
pub struct TraceRecorder {
    records: Vec<TraceRecord>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn into_records(self) -> Vec<TraceRecord> {
        self.records
    }
}

impl ScrambleTracer for TraceRecorder {
    fn trace(&mut self, event: &TraceEvent<'_>) {
        self.records.push(event.to_record());
    }
}
