use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, PlayError, Sink, Source, StreamError};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PlaybackStartFailure {
    #[error("track {} could not be opened: {source}", .path.display())]
    TrackUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("track {} is not a supported audio format: {source}", .path.display())]
    Undecodable {
        path: PathBuf,
        #[source]
        source: DecoderError,
    },
    #[error("no audio output device: {0}")]
    NoOutputDevice(#[from] StreamError),
    #[error("audio output refused the stream: {0}")]
    OutputRejected(#[from] PlayError),
}

/// Audio side of the record player.
///
/// Starting or resuming may fail; callers log the failure and carry on.
pub trait AudioOutput {
    fn start(&mut self) -> Result<(), PlaybackStartFailure>;
    fn pause(&mut self);
    fn resume(&mut self) -> Result<(), PlaybackStartFailure>;
    /// Called once per frame with the time since the previous frame
    fn advance(&mut self, _dt: Duration) {}
    /// Time the track has been playing since the last start
    fn position(&self) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stopped,
    Running,
    Held,
}

/// Open device stream with the looping track queued on it. The stream must
/// outlive the sink or playback stops.
struct LoopedTrack {
    _stream: OutputStream,
    sink: Sink,
}

impl LoopedTrack {
    fn open(path: &Path) -> Result<Self, PlaybackStartFailure> {
        let file = File::open(path).map_err(|source| PlaybackStartFailure::TrackUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|source| {
            PlaybackStartFailure::Undecodable { path: path.to_path_buf(), source }
        })?;

        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(source.repeat_infinite());
        Ok(LoopedTrack { _stream: stream, sink })
    }
}

/// Plays one track on a loop through the default output device.
///
/// Without a track it runs silently and only keeps the transport clock.
pub struct TrackPlayer {
    track: Option<PathBuf>,
    output: Option<LoopedTrack>,
    transport: Transport,
    position: Duration,
}

impl TrackPlayer {
    pub fn new(track: Option<PathBuf>) -> Self {
        TrackPlayer { track, output: None, transport: Transport::Stopped, position: Duration::ZERO }
    }
}

impl AudioOutput for TrackPlayer {
    fn start(&mut self) -> Result<(), PlaybackStartFailure> {
        // Stop whatever was queued before reopening from the top
        self.output = None;
        if let Some(path) = &self.track {
            self.output = Some(LoopedTrack::open(path)?);
        }
        self.position = Duration::ZERO;
        self.transport = Transport::Running;
        info!(track = ?self.track, "playback started");
        Ok(())
    }

    fn pause(&mut self) {
        if self.transport == Transport::Running {
            if let Some(output) = &self.output {
                output.sink.pause();
            }
            self.transport = Transport::Held;
            debug!(position = ?self.position, "playback paused");
        }
    }

    fn resume(&mut self) -> Result<(), PlaybackStartFailure> {
        if let Some(output) = &self.output {
            output.sink.play();
        } else if let Some(path) = &self.track {
            // An earlier start failed; try the device again
            self.output = Some(LoopedTrack::open(path)?);
        }
        self.transport = Transport::Running;
        debug!(position = ?self.position, "playback resumed");
        Ok(())
    }

    fn advance(&mut self, dt: Duration) {
        if self.transport == Transport::Running {
            self.position += dt;
        }
    }

    fn position(&self) -> Duration {
        self.position
    }
}
