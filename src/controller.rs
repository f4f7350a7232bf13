//! Per-block pipeline: capture → shift → filter → playback.
//!
//! The controller owns every piece of cross-block state (phase, filter
//! history, sample clock, coefficients) and all block buffers. Nothing on the
//! per-block path allocates once the controller is built.

use crate::fsm::{PipelineEvent, PipelineFsm, PipelineState, TransitionResult};
use crate::{Error, Result};
use shiftline_core::{
    AtomicFlag, AudioBlock, Capture, CaptureSource, ParameterStore, PipelineMetrics,
    PlaybackSink, SampleClock, ShiftConfig, Submit, UnderrunFallback,
};
use shiftline_dsp::{FilterCoefficients, FilterDesigner, FilterState, FrequencyShifter, PhaseState};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What one [`PipelineController::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A block was transformed and accepted by the sink.
    Processed,
    /// A block was transformed but the sink was full; it was discarded.
    Dropped,
    /// Capture missed its deadline; a fallback block was emitted instead.
    Underrun,
    /// The pipeline drained and is idle.
    Stopped,
}

/// Thread-safe control surface for a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    stop: Arc<AtomicFlag>,
    parameters: Arc<ParameterStore>,
    metrics: Arc<PipelineMetrics>,
}

impl ControllerHandle {
    /// Ask the pipeline to stop at the next block boundary.
    pub fn request_stop(&self) {
        self.stop.set(true);
    }

    pub fn parameters(&self) -> &Arc<ParameterStore> {
        &self.parameters
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }
}

/// Drives one shifting stream.
pub struct PipelineController {
    config: ShiftConfig,
    fsm: PipelineFsm,
    parameters: Arc<ParameterStore>,
    metrics: Arc<PipelineMetrics>,
    stop: Arc<AtomicFlag>,

    clock: SampleClock,
    shifter: FrequencyShifter,
    designer: FilterDesigner,
    coefficients: FilterCoefficients,
    filter: FilterState,
    active_cutoff_hz: f32,

    input: AudioBlock,
    output: AudioBlock,
    fallback: AudioBlock,
    deadline: Duration,
}

impl PipelineController {
    pub fn new(config: ShiftConfig) -> Result<Self> {
        let parameters = Arc::new(ParameterStore::from_config(&config));
        Self::with_parameters(config, parameters)
    }

    /// Build around an existing parameter store (shared with a control surface).
    pub fn with_parameters(config: ShiftConfig, parameters: Arc<ParameterStore>) -> Result<Self> {
        config.validate()?;

        let sample_rate = config.sample_rate();
        let shifter = FrequencyShifter::new(config.shift_mode, sample_rate, config.block_size)?;
        let mut designer =
            FilterDesigner::new(sample_rate, config.filter_order, config.filter_family)?;
        let mut coefficients = designer.passthrough();

        let cutoff_hz = parameters.snapshot().cutoff_hz;
        derive_coefficients(&mut designer, &mut coefficients, cutoff_hz, parameters.nyquist_hz())?;

        let deadline = config.block_duration();
        Ok(Self {
            fsm: PipelineFsm::new(),
            metrics: Arc::new(PipelineMetrics::new(deadline)),
            stop: Arc::new(AtomicFlag::default()),
            clock: SampleClock::new(sample_rate),
            shifter,
            designer,
            coefficients,
            filter: FilterState::new(config.filter_order),
            active_cutoff_hz: cutoff_hz,
            input: AudioBlock::silent(config.block_size),
            output: AudioBlock::silent(config.block_size),
            fallback: AudioBlock::silent(config.block_size),
            deadline,
            parameters,
            config,
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            stop: Arc::clone(&self.stop),
            parameters: Arc::clone(&self.parameters),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Enter `Running`, keeping phase, filter history and clock.
    pub fn start(&mut self) -> Result<()> {
        match self.fsm.transition(PipelineEvent::Start) {
            TransitionResult::StateChanged(PipelineState::Running) => {
                self.stop.set(false);
                tracing::info!(
                    sample_rate = self.config.sample_rate_hz,
                    block_size = self.config.block_size,
                    mode = ?self.config.shift_mode,
                    position = self.clock.position(),
                    "pipeline started"
                );
                Ok(())
            }
            _ => Err(self.invalid_state("start")),
        }
    }

    /// Enter `Running` from a clean stream.
    pub fn restart(&mut self) -> Result<()> {
        match self.fsm.transition(PipelineEvent::Restart) {
            TransitionResult::Restarted => {
                self.stop.set(false);
                self.shifter.reset();
                self.filter.reset();
                self.clock.reset();
                self.output.fill_silence();
                tracing::info!("pipeline restarted");
                Ok(())
            }
            _ => Err(self.invalid_state("restart")),
        }
    }

    /// Ask for a stop at the next block boundary.
    pub fn request_stop(&self) {
        self.stop.set(true);
    }

    /// Run one block through the pipeline.
    pub fn tick<S, P>(&mut self, source: &mut S, sink: &mut P) -> Result<TickOutcome>
    where
        S: CaptureSource + ?Sized,
        P: PlaybackSink + ?Sized,
    {
        match self.fsm.state() {
            PipelineState::Idle => return Err(self.invalid_state("tick")),
            PipelineState::Stopping => return self.drain(sink),
            PipelineState::Running => {}
        }

        if self.stop.take() {
            self.fsm.transition(PipelineEvent::Stop);
            tracing::info!(position = self.clock.position(), "stop requested");
            return self.drain(sink);
        }

        let params = self.parameters.snapshot();

        match source.next_block(&mut self.input, self.deadline) {
            Ok(Capture::Ready) => {}
            Ok(Capture::Timeout) => return self.emit_fallback(sink),
            Err(e) => return Err(self.fault(e)),
        }

        let started = Instant::now();
        self.shifter
            .process(&params, &self.clock, &self.input, &mut self.output)?;
        if params.cutoff_hz != self.active_cutoff_hz {
            self.refresh_filter(params.cutoff_hz)?;
        }
        self.filter
            .process_in_place(&self.coefficients, &mut self.output)?;

        if self.metrics.record_block(started.elapsed()) {
            tracing::warn!(
                elapsed_us = started.elapsed().as_micros() as u64,
                budget_us = self.deadline.as_micros() as u64,
                "block transform missed its deadline"
            );
        }

        let submitted = sink.submit_block(&self.output);
        self.clock.advance(self.output.len());

        match submitted {
            Ok(Submit::Accepted) => Ok(TickOutcome::Processed),
            Ok(Submit::Backpressure) => {
                self.metrics.record_dropped();
                tracing::warn!(
                    dropped = self.metrics.dropped_blocks(),
                    "playback full, block dropped"
                );
                Ok(TickOutcome::Dropped)
            }
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Tick until the pipeline is idle again.
    pub fn run<S, P>(&mut self, source: &mut S, sink: &mut P) -> Result<()>
    where
        S: CaptureSource + ?Sized,
        P: PlaybackSink + ?Sized,
    {
        loop {
            if self.tick(source, sink)? == TickOutcome::Stopped {
                return Ok(());
            }
        }
    }

    pub fn state(&self) -> PipelineState {
        self.fsm.state()
    }

    pub fn phase(&self) -> PhaseState {
        self.shifter.phase()
    }

    pub fn clock(&self) -> SampleClock {
        self.clock
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coefficients
    }

    pub fn parameters(&self) -> &Arc<ParameterStore> {
        &self.parameters
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    /// Underrun: emit one stand-in block, leave phase, filter and clock alone.
    fn emit_fallback<P: PlaybackSink + ?Sized>(&mut self, sink: &mut P) -> Result<TickOutcome> {
        self.metrics.record_underrun();
        match self.config.underrun_fallback {
            UnderrunFallback::Silence => self.fallback.fill_silence(),
            UnderrunFallback::RepeatLast => self.fallback.copy_from(&self.output),
        }
        tracing::warn!(
            underruns = self.metrics.underruns(),
            position = self.clock.position(),
            fallback = ?self.config.underrun_fallback,
            "capture underrun"
        );

        match sink.submit_block(&self.fallback) {
            Ok(Submit::Accepted) => {}
            Ok(Submit::Backpressure) => self.metrics.record_dropped(),
            Err(e) => return Err(self.fault(e)),
        }
        Ok(TickOutcome::Underrun)
    }

    fn drain<P: PlaybackSink + ?Sized>(&mut self, sink: &mut P) -> Result<TickOutcome> {
        if let Err(e) = sink.flush() {
            return Err(self.fault(e));
        }
        self.fsm.transition(PipelineEvent::Drained);
        tracing::info!(
            blocks = self.metrics.blocks_processed(),
            underruns = self.metrics.underruns(),
            dropped = self.metrics.dropped_blocks(),
            "pipeline stopped"
        );
        Ok(TickOutcome::Stopped)
    }

    fn refresh_filter(&mut self, cutoff_hz: f32) -> Result<()> {
        derive_coefficients(
            &mut self.designer,
            &mut self.coefficients,
            cutoff_hz,
            self.parameters.nyquist_hz(),
        )?;
        self.filter.reset();
        self.active_cutoff_hz = cutoff_hz;
        Ok(())
    }

    fn fault(&mut self, error: shiftline_core::Error) -> Error {
        tracing::error!(%error, position = self.clock.position(), "device failure, pipeline halted");
        self.fsm.transition(PipelineEvent::Fault);
        Error::Core(error)
    }

    fn invalid_state(&self, operation: &str) -> Error {
        Error::InvalidState(format!("cannot {operation} while {:?}", self.fsm.state()))
    }
}

/// Pass-through at or above Nyquist, otherwise a lowpass at `cutoff_hz`.
fn derive_coefficients(
    designer: &mut FilterDesigner,
    coefficients: &mut FilterCoefficients,
    cutoff_hz: f32,
    nyquist_hz: f32,
) -> Result<()> {
    if cutoff_hz >= nyquist_hz {
        designer.passthrough_into(coefficients)?;
        tracing::debug!(cutoff_hz, "anti-aliasing filter disabled");
    } else {
        designer.design_into(cutoff_hz as f64, coefficients)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftline_core::{MemorySink, MemorySource, ShiftMode};

    fn config() -> ShiftConfig {
        ShiftConfig {
            sample_rate_hz: 1_000,
            block_size: 10,
            shift_mode: ShiftMode::Static,
            initial_cutoff_hz: 500.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_requires_running() {
        let mut controller = PipelineController::new(config()).unwrap();
        let mut source = MemorySource::new(vec![0.0; 10]);
        let mut sink = MemorySink::new();
        let err = controller.tick(&mut source, &mut sink).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_start_twice_is_invalid() {
        let mut controller = PipelineController::new(config()).unwrap();
        controller.start().unwrap();
        assert!(controller.start().is_err());
        assert!(controller.restart().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = ShiftConfig {
            block_size: 0,
            ..config()
        };
        assert!(matches!(
            PipelineController::new(bad),
            Err(Error::Core(shiftline_core::Error::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_cutoff_at_nyquist_uses_passthrough() {
        let controller = PipelineController::new(config()).unwrap();
        assert!(controller.coefficients().is_passthrough());
    }

    #[test]
    fn test_stale_stop_request_cleared_on_start() {
        let mut controller = PipelineController::new(config()).unwrap();
        controller.request_stop();
        controller.start().unwrap();

        let mut source = MemorySource::new(vec![0.5; 10]);
        let mut sink = MemorySink::new();
        assert_eq!(
            controller.tick(&mut source, &mut sink).unwrap(),
            TickOutcome::Processed
        );
    }
}
