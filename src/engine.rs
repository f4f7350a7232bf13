//! Live engine: runs a [`PipelineController`] on a dedicated audio thread.

use crate::controller::{ControllerHandle, PipelineController};
use crate::{Error, Result, ShiftEngineBuilder};
use shiftline_core::{CaptureSource, ParameterStore, PipelineMetrics, PlaybackSink, ShiftConfig};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thread_priority::ThreadPriority;

#[cfg(feature = "device")]
use shiftline_core::device::{self, StreamHandle};

/// Real-time frequency shifting engine.
///
/// Parameters can be changed at any time through [`parameters`](Self::parameters);
/// the audio thread picks them up at the next block.
///
/// # Example
///
/// ```ignore
/// use shiftline::prelude::*;
///
/// let mut engine = ShiftEngine::builder()
///     .sample_rate(44_100)
///     .block_size(4_096)
///     .dynamic(500.0, 2.0)
///     .cutoff(1_000.0)
///     .build()?;
///
/// engine.start()?;
/// engine.parameters().set_amplitude(800.0);
/// engine.stop()?;
/// ```
pub struct ShiftEngine {
    config: ShiftConfig,
    parameters: Arc<ParameterStore>,
    handle: Option<ControllerHandle>,
    worker: Option<JoinHandle<Result<()>>>,
    #[cfg(feature = "device")]
    streams: Vec<StreamHandle>,
}

impl ShiftEngine {
    pub fn builder() -> ShiftEngineBuilder {
        ShiftEngineBuilder::default()
    }

    pub(crate) fn new(config: ShiftConfig) -> Result<Self> {
        config.validate()?;
        let parameters = Arc::new(ParameterStore::from_config(&config));
        Ok(Self {
            config,
            parameters,
            handle: None,
            worker: None,
            #[cfg(feature = "device")]
            streams: Vec::new(),
        })
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    /// Shared parameter store (control surface).
    pub fn parameters(&self) -> &Arc<ParameterStore> {
        &self.parameters
    }

    /// Control handle of the current run, if started.
    pub fn handle(&self) -> Option<&ControllerHandle> {
        self.handle.as_ref()
    }

    /// Metrics of the current run, if started.
    pub fn metrics(&self) -> Option<&Arc<PipelineMetrics>> {
        self.handle.as_ref().map(ControllerHandle::metrics)
    }

    /// True while the audio thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Open the configured CPAL devices and start processing.
    #[cfg(feature = "device")]
    pub fn start(&mut self) -> Result<()> {
        self.ensure_stopped()?;

        let (input_stream, capture) = device::open_input(&self.config)?;
        let (output_stream, playback) = device::open_output(&self.config)?;
        self.streams = vec![input_stream, output_stream];

        if let Err(e) = self.start_with(capture, playback) {
            self.close_streams();
            return Err(e);
        }
        Ok(())
    }

    /// Start processing between any capture source and playback sink.
    pub fn start_with<S, P>(&mut self, mut source: S, mut sink: P) -> Result<()>
    where
        S: CaptureSource + Send + 'static,
        P: PlaybackSink + Send + 'static,
    {
        self.ensure_stopped()?;

        let mut controller =
            PipelineController::with_parameters(self.config.clone(), Arc::clone(&self.parameters))?;
        let handle = controller.handle();

        let worker = thread::Builder::new()
            .name("shiftline-audio".into())
            .spawn(move || {
                if let Err(e) = thread_priority::set_current_thread_priority(ThreadPriority::Max) {
                    tracing::debug!(?e, "could not raise audio thread priority");
                }

                controller.start()?;
                let result = controller.run(&mut source, &mut sink);
                if let Err(e) = &result {
                    tracing::error!(%e, "audio thread stopped with error");
                }
                result
            })?;

        self.handle = Some(handle);
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop at the next block boundary and wait for the audio thread.
    ///
    /// Returns the error that ended the run, if any.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(handle) = &self.handle {
            handle.request_stop();
        }

        let result = match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| Error::WorkerPanicked)?,
            None => Ok(()),
        };

        #[cfg(feature = "device")]
        self.close_streams();

        result
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.worker.is_some() {
            return Err(Error::InvalidState("engine already started".into()));
        }
        Ok(())
    }

    #[cfg(feature = "device")]
    fn close_streams(&mut self) {
        for stream in self.streams.drain(..) {
            if let Err(e) = stream.pause() {
                tracing::warn!(%e, "failed to pause stream");
            }
        }
    }
}

impl Drop for ShiftEngine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(%e, "engine stopped with error");
        }
    }
}
