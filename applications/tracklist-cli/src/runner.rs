/// Script execution against a virtual engine
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::script::{parse_script, Command, End};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracklist_playback::{
    AudioAsset, DecodeError, PlaybackEvent, PlaybackState, Player, PlayerError, Track,
    VirtualEngine, WavDecoder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Snapshot printed by the `status` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub state: PlaybackState,
    pub current_time: f64,
    pub track_id: Option<String>,
    pub queue_length: usize,
    pub volume: f32,
    pub is_muted: bool,
    pub clock: f64,
}

#[derive(Serialize)]
enum Line<'a> {
    Event(&'a PlaybackEvent),
    Status(&'a Status),
}

/// Runs commands and reports the resulting events to `out`
pub struct ScriptRunner<W: Write> {
    player: Player<VirtualEngine>,
    events: Rc<RefCell<Vec<PlaybackEvent>>>,
    sample_rate: u32,
    format: OutputFormat,
    out: W,
}

impl<W: Write> ScriptRunner<W> {
    pub fn new(config: &CliConfig, format: OutputFormat, out: W) -> Result<Self> {
        config.validate()?;
        let mut player = Player::new(
            VirtualEngine::new(),
            Box::new(WavDecoder),
            config.player.clone(),
        )
        .map_err(|e| CliError::Config(e.to_string()))?;

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        player.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        Ok(Self {
            player,
            events,
            sample_rate: config.sample_rate,
            format,
            out,
        })
    }

    /// Parse and run a whole script, stopping at the first failing line
    pub fn run(&mut self, script: &str) -> Result<()> {
        let commands = parse_script(script)?;
        tracing::info!(commands = commands.len(), "Running script");

        for (line, command) in commands {
            self.execute(line, &command)?;
            self.player.process_notifications();
            self.flush_events()?;
            if command == Command::Status {
                self.write_status()?;
            }
        }
        Ok(())
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.player.state(),
            current_time: self.player.current_time(),
            track_id: self.player.current_track().map(|track| track.id.clone()),
            queue_length: self.player.queue().len(),
            volume: self.player.volume(),
            is_muted: self.player.is_muted(),
            clock: self.player.engine().now(),
        }
    }

    pub fn player(&self) -> &Player<VirtualEngine> {
        &self.player
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn execute(&mut self, line: usize, command: &Command) -> Result<()> {
        tracing::debug!(line, ?command, "Executing");
        let at_line = move |source: PlayerError| CliError::Command { line, source };

        match command {
            Command::Load { id, seconds, end } => {
                let asset = AudioAsset::silence(*seconds, self.sample_rate, 1)
                    .map_err(|e| at_line(DecodeError::from(e).into()))?;
                let track = Track::new(id.clone(), asset);
                match end {
                    End::Front => self.player.load_track(track),
                    End::Rear => self.player.load_track_to_rear(track),
                }
                .map_err(at_line)?;
            }
            Command::LoadWav { id, path, end } => {
                let bytes = std::fs::read(path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                match end {
                    End::Front => self.player.load(id.clone(), &bytes),
                    End::Rear => self.player.load_to_rear(id.clone(), &bytes),
                }
                .map_err(at_line)?;
            }
            Command::Play => self.player.play(),
            Command::Pause => self.player.pause(),
            Command::Resume => self.player.resume(),
            Command::Stop => self.player.stop(),
            Command::Seek(to) => self.player.seek(*to),
            Command::SeekPlay(to) => self.player.seek_and_play(*to),
            Command::Forward(by) => {
                self.player.skip_forward(*by);
            }
            Command::Back(by) => {
                self.player.skip_backward(*by);
            }
            Command::Clear => self.player.clear(),
            Command::Advance(seconds) => {
                let ended = self.player.engine_mut().advance(*seconds);
                if ended > 0 {
                    tracing::debug!(ended, "Sessions reached end of asset");
                }
            }
            Command::Volume(volume) => self.player.set_volume(*volume).map_err(at_line)?,
            Command::Mute => self.player.mute(),
            Command::Unmute => self.player.unmute(),
            Command::Status => {}
        }
        Ok(())
    }

    fn flush_events(&mut self) -> Result<()> {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        for event in &events {
            match self.format {
                OutputFormat::Text => writeln!(self.out, "{}", describe(event))?,
                OutputFormat::Json => {
                    writeln!(self.out, "{}", serde_json::to_string(&Line::Event(event))?)?;
                }
            }
        }
        Ok(())
    }

    fn write_status(&mut self) -> Result<()> {
        let status = self.status();
        match self.format {
            OutputFormat::Text => writeln!(
                self.out,
                "status {} at {:.3}s track={} queue={} volume={:.2}{}",
                status.state,
                status.current_time,
                status.track_id.as_deref().unwrap_or("-"),
                status.queue_length,
                status.volume,
                if status.is_muted { " (muted)" } else { "" }
            )?,
            OutputFormat::Json => {
                writeln!(self.out, "{}", serde_json::to_string(&Line::Status(&status))?)?;
            }
        }
        Ok(())
    }
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::StateChanged { state } => format!("state {state}"),
        PlaybackEvent::AssetLoaded { duration } => format!("loaded {duration:.3}s"),
        PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id,
        } => format!(
            "track {} (was {})",
            track_id.as_deref().unwrap_or("-"),
            previous_track_id.as_deref().unwrap_or("-")
        ),
        PlaybackEvent::VolumeChanged { volume, is_muted } => {
            format!("volume {volume:.2}{}", if *is_muted { " (muted)" } else { "" })
        }
        PlaybackEvent::QueueChanged { length } => format!("queue {length}"),
    }
}
