use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use playsync::{EngineError, FrameIndex, SyncMode};

pub const USAGE: &str = "usage: playsync <TIMELINE.json> [--config PATH] [--fps N] [--frames N] \
[--mode strict|lenient] [--max-frame N] [--seek FRAME@TICK]... [--source URI] [--block-first-play]";

/// Scripted user seek applied once the session has completed `at_tick` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedSeek {
    pub frame: i64,
    pub at_tick: u64,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub timeline: PathBuf,
    pub config: Option<PathBuf>,
    pub fps: Option<f64>,
    pub frames: Option<u64>,
    pub mode: Option<SyncMode>,
    pub max_frame: Option<FrameIndex>,
    pub seeks: Vec<ScriptedSeek>,
    pub source: String,
    pub block_first_play: bool,
}

#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Engine(EngineError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}\n{USAGE}"),
            Self::Engine(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Engine(error) => Some(error),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut timeline = None;
        let mut parsed = Self {
            timeline: PathBuf::new(),
            config: None,
            fps: None,
            frames: None,
            mode: None,
            max_frame: None,
            seeks: Vec::new(),
            source: "simulated://source".to_string(),
            block_first_play: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value_for(&arg, &mut args)?)),
                "--fps" => parsed.fps = Some(parse_number(&arg, &value_for(&arg, &mut args)?)?),
                "--frames" => {
                    parsed.frames = Some(parse_number(&arg, &value_for(&arg, &mut args)?)?);
                }
                "--max-frame" => {
                    parsed.max_frame = Some(parse_number(&arg, &value_for(&arg, &mut args)?)?);
                }
                "--mode" => parsed.mode = Some(parse_mode(&value_for(&arg, &mut args)?)?),
                "--seek" => parsed.seeks.push(parse_seek(&value_for(&arg, &mut args)?)?),
                "--source" => parsed.source = value_for(&arg, &mut args)?,
                "--block-first-play" => parsed.block_first_play = true,
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option `{flag}`")));
                }
                _ if timeline.is_none() => timeline = Some(PathBuf::from(&arg)),
                _ => return Err(CliError::Usage(format!("unexpected argument `{arg}`"))),
            }
        }

        parsed.timeline =
            timeline.ok_or_else(|| CliError::Usage("missing timeline path".to_string()))?;
        parsed.seeks.sort_by_key(|seek| seek.at_tick);
        Ok(parsed)
    }
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, CliError> {
    args.next()
        .ok_or_else(|| CliError::Usage(format!("`{flag}` expects a value")))
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::Usage(format!("`{flag}` expects a number, got `{value}`")))
}

fn parse_mode(value: &str) -> Result<SyncMode, CliError> {
    match value {
        "strict" => Ok(SyncMode::Strict),
        "lenient" => Ok(SyncMode::Lenient),
        other => Err(CliError::Usage(format!("unknown mode `{other}`"))),
    }
}

fn parse_seek(value: &str) -> Result<ScriptedSeek, CliError> {
    let (frame, tick) = value
        .split_once('@')
        .ok_or_else(|| CliError::Usage(format!("seek `{value}` is not FRAME@TICK")))?;
    Ok(ScriptedSeek {
        frame: parse_number("--seek", frame)?,
        at_tick: parse_number("--seek", tick)?,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use playsync::SyncMode;

    use super::{CliArgs, CliError, ScriptedSeek};

    fn parse(args: &[&str]) -> Result<CliArgs, CliError> {
        CliArgs::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_overrides_and_sorts_seeks() {
        let args = parse(&[
            "timeline.json",
            "--fps",
            "30",
            "--frames",
            "900",
            "--mode",
            "lenient",
            "--seek",
            "620@200",
            "--seek",
            "-5@10",
        ])
        .expect("args should parse");

        assert_eq!(args.timeline, PathBuf::from("timeline.json"));
        assert_eq!(args.fps, Some(30.0));
        assert_eq!(args.frames, Some(900));
        assert_eq!(args.mode, Some(SyncMode::Lenient));
        assert_eq!(
            args.seeks,
            vec![
                ScriptedSeek {
                    frame: -5,
                    at_tick: 10
                },
                ScriptedSeek {
                    frame: 620,
                    at_tick: 200
                },
            ]
        );
    }

    #[test]
    fn missing_timeline_is_a_usage_error() {
        assert!(matches!(parse(&["--fps", "24"]), Err(CliError::Usage(_))));
    }

    #[test]
    fn malformed_values_are_usage_errors() {
        assert!(matches!(parse(&["t.json", "--fps"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["t.json", "--mode", "fast"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["t.json", "--seek", "12"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["t.json", "--verbose"]), Err(CliError::Usage(_))));
    }
}
