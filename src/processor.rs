//! Host-facing block processor
//!
//! Owns the engine on the audio thread. Each call to [`SidProcessor::process`]
//! first drains the control queue, so updates land on block boundaries, then
//! renders one sample per frame into every output channel.
//!
//! The engine only exists once a sample rate is known. Until then register
//! updates are collected in a pending snapshot and loaded into the engine
//! when the first `sampleRate` update arrives.

use log::info;

use crate::backend::SidBackend;
use crate::config::SidConfig;
use crate::control::{
    apply_message, control_channel, frame_channel, ControlMessage, ControlReceiver,
    ControlSender, FrameMarker, FrameReceiver, FrameSender,
};
use crate::sid::waveforms::combined_tables;
use crate::sid::{ChipParameters, Sid};
use crate::{Result, SidError};

/// Frame markers buffered before the audio thread starts dropping them
const FRAME_QUEUE_CAPACITY: usize = 16;

/// Audio-thread processor wrapping a [`SidBackend`]
#[derive(Debug)]
pub struct SidProcessor<B: SidBackend = Sid> {
    config: SidConfig,
    engine: Option<B>,
    pending: ChipParameters,
    control: Option<ControlReceiver>,
    frames: Option<FrameSender>,
}

impl SidProcessor {
    /// Create a processor around the default [`Sid`] engine
    pub fn new(config: SidConfig) -> Result<Self> {
        Self::with_backend(config)
    }

    /// Create a processor together with its control sender and frame receiver
    pub fn with_channels(config: SidConfig) -> Result<(Self, ControlSender, FrameReceiver)> {
        let mut processor = Self::new(config)?;
        let (control_tx, control_rx) = control_channel(config.control_queue_capacity);
        let (frame_tx, frame_rx) = frame_channel(FRAME_QUEUE_CAPACITY);
        processor.attach_control(control_rx);
        processor.attach_frames(frame_tx);
        Ok((processor, control_tx, frame_rx))
    }
}

impl<B: SidBackend> SidProcessor<B> {
    /// Create a processor around any backend
    ///
    /// Builds the combined-waveform tables up front so the audio thread never
    /// pays for them.
    pub fn with_backend(config: SidConfig) -> Result<Self> {
        config.validate()?;
        combined_tables();
        let engine = match config.sample_rate {
            Some(rate) => Some(B::with_config(&config, rate)?),
            None => None,
        };
        info!(
            "SID processor: {} at {} Hz, sample rate {}",
            config.model,
            config.clock_hz,
            config
                .sample_rate
                .map_or_else(|| "pending".to_string(), |r| format!("{r} Hz"))
        );
        Ok(SidProcessor {
            config,
            engine,
            pending: ChipParameters::new(),
            control: None,
            frames: None,
        })
    }

    /// Drain control messages from this receiver before every block
    pub fn attach_control(&mut self, receiver: ControlReceiver) {
        self.control = Some(receiver);
    }

    /// Publish frame markers to this sender
    pub fn attach_frames(&mut self, sender: FrameSender) {
        self.frames = Some(sender);
    }

    /// True once a sample rate is known and the engine exists
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Engine, if initialized
    pub fn engine(&self) -> Option<&B> {
        self.engine.as_ref()
    }

    /// Mutable engine, if initialized
    pub fn engine_mut(&mut self) -> Option<&mut B> {
        self.engine.as_mut()
    }

    /// Configuration this processor was built from
    pub fn config(&self) -> &SidConfig {
        &self.config
    }

    /// Apply a control message directly (same-thread hosts)
    pub fn handle(&mut self, message: &ControlMessage) {
        if let Some(engine) = self.engine.as_mut() {
            apply_message(engine, message);
            return;
        }
        match message {
            ControlMessage::Update(update) => {
                update.merge_into(&mut self.pending);
                if let Some(rate) = update.sample_rate {
                    self.initialize(rate);
                }
            }
            ControlMessage::WriteRegister { addr, value } => {
                self.pending.write_register(*addr, *value)
            }
            ControlMessage::Reset => self.pending = ChipParameters::new(),
        }
    }

    fn initialize(&mut self, sample_rate: f64) {
        // Invalid rates were already rejected by the sender; ignore stragglers.
        if let Ok(mut engine) = B::with_config(&self.config, sample_rate) {
            engine.load_registers(&self.pending.to_registers());
            self.engine = Some(engine);
        }
    }

    /// Apply the control messages queued when the drain starts, returning
    /// how many were handled. Messages arriving meanwhile wait for the next
    /// block.
    pub fn drain_control(&mut self) -> usize {
        let Some(receiver) = self.control.take() else {
            return 0;
        };
        let mut handled = 0;
        for _ in 0..receiver.pending() {
            let Some(message) = receiver.try_recv() else {
                break;
            };
            self.handle(&message);
            handled += 1;
        }
        self.control = Some(receiver);
        handled
    }

    /// Render one block.
    ///
    /// Every output channel receives the same mono signal; when channel
    /// lengths differ only the shortest length is rendered.
    pub fn process(&mut self, outputs: &mut [&mut [f32]]) -> Result<()> {
        self.drain_control();
        let engine = self.engine.as_mut().ok_or(SidError::NotInitialized)?;

        let len = outputs.iter().map(|channel| channel.len()).min().unwrap_or(0);
        for i in 0..len {
            engine.clock();
            let sample = engine.get_sample();
            for channel in outputs.iter_mut() {
                channel[i] = sample;
            }
            if engine.frame_boundary() {
                if let Some(frames) = &self.frames {
                    frames.notify(FrameMarker {
                        frame: engine.frame_count(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render a mono block
    pub fn process_mono(&mut self, output: &mut [f32]) -> Result<()> {
        self.process(&mut [output])
    }
}
