//! Collaborator interfaces the integrator calls out to: the trajectory
//! sink and the progress callback.
//!
//! The core never picks a concrete sink; callers inject one. Two sinks
//! are provided here: [`RawF32Sink`], the canonical no-length-prefix
//! format the source writes, and [`FramedF32Sink`], a more robust
//! variant (a header naming `N`, then one step-index-prefixed record
//! per step).

use std::io::{self, Write};

/// Everything the integrator reports once per step for logging,
/// progress bars, or cancellation checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepState {
    pub iter: u64,
    pub time: f64,
    pub temperature: f64,
    pub temperature_target: f64,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    pub total_energy: f64,
    pub mean_neighbor_count: f64,
}

/// Appended to once per step with the current position array. Expected
/// to be append-only and order-preserving.
pub trait TrajectorySink {
    fn record(&mut self, pos: &[[f32; 2]]) -> io::Result<()>;
}

/// A no-op sink for runs that don't need a trajectory on disk.
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn record(&mut self, _pos: &[[f32; 2]]) -> io::Result<()> {
        Ok(())
    }
}

/// The canonical on-disk format: raw 2D arrays of `f32`, concatenated in
/// step order with no per-record length prefix. Reading back requires
/// knowing `N` and the step count separately.
pub struct RawF32Sink<W: Write> {
    writer: W,
}

impl<W: Write> RawF32Sink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> TrajectorySink for RawF32Sink<W> {
    fn record(&mut self, pos: &[[f32; 2]]) -> io::Result<()> {
        for p in pos {
            self.writer.write_all(&p[0].to_le_bytes())?;
            self.writer.write_all(&p[1].to_le_bytes())?;
        }
        Ok(())
    }
}

/// A framed variant: a one-time `N` header, then per-record
/// `(step_index, 2*N floats)`. Self-describing at the cost of 8 bytes a
/// step.
pub struct FramedF32Sink<W: Write> {
    writer: W,
    n: usize,
    next_step: u64,
    header_written: bool,
}

impl<W: Write> FramedF32Sink<W> {
    pub fn new(writer: W, n: usize) -> Self {
        Self {
            writer,
            n,
            next_step: 0,
            header_written: false,
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(&(self.n as u64).to_le_bytes())?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write> TrajectorySink for FramedF32Sink<W> {
    fn record(&mut self, pos: &[[f32; 2]]) -> io::Result<()> {
        debug_assert_eq!(pos.len(), self.n);
        if !self.header_written {
            self.write_header()?;
        }
        self.writer.write_all(&self.next_step.to_le_bytes())?;
        for p in pos {
            self.writer.write_all(&p[0].to_le_bytes())?;
            self.writer.write_all(&p[1].to_le_bytes())?;
        }
        self.next_step += 1;
        Ok(())
    }
}

/// Invoked once per step with the latest [`StepState`]. A caller that
/// wants cancellation monitors a shared flag from inside its own
/// callback and stops calling `step` again from outside; the
/// integrator itself is not preemptible mid-step.
pub trait ProgressCallback {
    fn on_step(&mut self, state: &StepState);
}

impl<F: FnMut(&StepState)> ProgressCallback for F {
    fn on_step(&mut self, state: &StepState) {
        self(state)
    }
}

/// A callback that does nothing, for runs that don't need progress
/// reporting.
pub struct NoopCallback;

impl ProgressCallback for NoopCallback {
    fn on_step(&mut self, _state: &StepState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sink_concatenates_without_length_prefix() {
        let mut buf = Vec::new();
        {
            let mut sink = RawF32Sink::new(&mut buf);
            sink.record(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
            sink.record(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
        }
        assert_eq!(buf.len(), 2 * 2 * 2 * 4);
    }

    #[test]
    fn framed_sink_writes_header_once_and_prefixes_steps() {
        let mut buf = Vec::new();
        {
            let mut sink = FramedF32Sink::new(&mut buf, 2);
            sink.record(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
            sink.record(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
        }
        // header (8) + 2 * (step index (8) + 4 floats (16))
        assert_eq!(buf.len(), 8 + 2 * (8 + 16));
    }
}
