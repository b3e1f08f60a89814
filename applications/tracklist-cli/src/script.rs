/// Command script parsing
///
/// One command per line; blank lines and `#` comments are skipped.
use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Which end of the queue a track is added to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Front,
    Rear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Queue a silent track of the given length
    Load { id: String, seconds: f64, end: End },
    /// Queue a track decoded from a WAV file
    LoadWav { id: String, path: PathBuf, end: End },
    Play,
    Pause,
    Resume,
    Stop,
    Seek(f64),
    SeekPlay(f64),
    Forward(usize),
    Back(usize),
    Clear,
    /// Move the engine clock
    Advance(f64),
    Volume(f32),
    Mute,
    Unmute,
    Status,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or("empty command")?;
        let args: Vec<&str> = words.collect();

        let command = match name {
            "load" | "load-rear" => {
                let [id, seconds] = exact::<2>(name, &args)?;
                Command::Load {
                    id: id.to_string(),
                    seconds: number(seconds)?,
                    end: if name == "load" { End::Front } else { End::Rear },
                }
            }
            "load-wav" | "load-wav-rear" => {
                let [id, path] = exact::<2>(name, &args)?;
                Command::LoadWav {
                    id: id.to_string(),
                    path: PathBuf::from(path),
                    end: if name == "load-wav" { End::Front } else { End::Rear },
                }
            }
            "play" => bare(name, &args, Command::Play)?,
            "pause" => bare(name, &args, Command::Pause)?,
            "resume" => bare(name, &args, Command::Resume)?,
            "stop" => bare(name, &args, Command::Stop)?,
            "clear" => bare(name, &args, Command::Clear)?,
            "mute" => bare(name, &args, Command::Mute)?,
            "unmute" => bare(name, &args, Command::Unmute)?,
            "status" => bare(name, &args, Command::Status)?,
            "seek" => Command::Seek(number(exact::<1>(name, &args)?[0])?),
            "seek-play" => Command::SeekPlay(number(exact::<1>(name, &args)?[0])?),
            "advance" => Command::Advance(number(exact::<1>(name, &args)?[0])?),
            "volume" => Command::Volume(number(exact::<1>(name, &args)?[0])?),
            "forward" => Command::Forward(steps(name, &args)?),
            "back" => Command::Back(steps(name, &args)?),
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(command)
    }
}

/// Parse a whole script
///
/// Returns each command with its 1-based line number.
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let command = line.parse::<Command>().map_err(|message| CliError::Parse {
            line: index + 1,
            message,
        })?;
        commands.push((index + 1, command));
    }
    Ok(commands)
}

fn exact<'a, const N: usize>(
    name: &str,
    args: &[&'a str],
) -> std::result::Result<[&'a str; N], String> {
    <[&str; N]>::try_from(args)
        .map_err(|_| format!("'{name}' takes {N} argument(s), got {}", args.len()))
}

fn bare(name: &str, args: &[&str], command: Command) -> std::result::Result<Command, String> {
    exact::<0>(name, args).map(|_| command)
}

fn steps(name: &str, args: &[&str]) -> std::result::Result<usize, String> {
    match args {
        [] => Ok(1),
        [n] => n.parse().map_err(|_| format!("invalid step count '{n}'")),
        _ => Err(format!("'{name}' takes at most 1 argument")),
    }
}

fn number<T: FromStr>(text: &str) -> std::result::Result<T, String> {
    text.parse().map_err(|_| format!("invalid number '{text}'"))
}
