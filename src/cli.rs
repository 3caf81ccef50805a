use crate::config::{ViewerConfig, ViewerConfigOverrides};
use crate::phase::Request;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Session played when no `--script` is given: the intro, one full cycle and
/// a free rotation.
pub const DEFAULT_SCRIPT: &str = "\
discover
wait 3000
forward
wait 5000
forward
wait 5500
forward
wait 3500
forward
wait 4500
rotate
wait 2500
";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    asset: Option<PathBuf>,
    script: Option<PathBuf>,
    seconds: Option<f32>,
    tick_ms: Option<u32>,
    idle_spin: Option<bool>,
    preset: Option<String>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "asset" => overrides.asset = Some(PathBuf::from(value)),
                "script" => overrides.script = Some(PathBuf::from(value)),
                "seconds" => {
                    let seconds =
                        value.parse::<f32>().with_context(|| format!("Invalid seconds '{value}'"))?;
                    if !seconds.is_finite() || seconds < 0.0 {
                        bail!("Invalid seconds '{value}'. Use a non-negative number.");
                    }
                    overrides.seconds = Some(seconds);
                }
                "tick-ms" => {
                    let tick_ms = value.parse::<u32>().with_context(|| format!("Invalid tick-ms '{value}'"))?;
                    if tick_ms == 0 {
                        bail!("Invalid tick-ms '0'. Ticks must be at least 1 ms.");
                    }
                    overrides.tick_ms = Some(tick_ms);
                }
                "idle-spin" => overrides.idle_spin = Some(parse_bool_flag("idle-spin", &value)?),
                "preset" => {
                    if ViewerConfig::preset(&value).is_none() {
                        bail!("Unknown preset '{value}'. Use studio or tour.");
                    }
                    overrides.preset = Some(value);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --asset, --script, --seconds, \
                     --tick-ms, --idle-spin, --preset."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_overrides(&self) -> ViewerConfigOverrides {
        ViewerConfigOverrides { tick_ms: self.tick_ms, idle_spin: self.idle_spin, discover_more: None }
    }

    pub fn asset(&self) -> Option<&Path> {
        self.asset.as_deref()
    }

    /// Extra time to run after the script ends.
    pub fn seconds(&self) -> f32 {
        self.seconds.unwrap_or(0.0)
    }

    /// Preset first, then the config file on top of defaults, then flags.
    pub fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = match (&self.preset, &self.config) {
            (Some(_), Some(_)) => bail!("--preset and --config cannot be combined"),
            (Some(name), None) => {
                ViewerConfig::preset(name).ok_or_else(|| anyhow!("Unknown preset '{name}'"))?
            }
            (None, Some(path)) => ViewerConfig::load_or_default(path),
            (None, None) => ViewerConfig::default(),
        };
        let overrides = self.config_overrides();
        if !overrides.is_empty() {
            eprintln!("[cli] overriding {}", overrides.applied_fields().join(", "));
            config.apply_overrides(&overrides);
        }
        Ok(config)
    }

    pub fn load_script(&self) -> Result<Vec<ScriptStep>> {
        match &self.script {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read script {}", path.display()))?;
                parse_script(&text).with_context(|| format!("Failed to parse script {}", path.display()))
            }
            None => parse_script(DEFAULT_SCRIPT),
        }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<u32>, Option<bool>, Option<&str>) {
        (self.tick_ms, self.idle_spin, self.preset.as_deref())
    }
}

/// One line of a session script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Request(Request),
    Wait { ms: u32 },
    Resize { width: u32, height: u32 },
    Dispose,
}

/// Parses one step per line. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let step = match head {
            "wait" => ScriptStep::Wait { ms: parse_number(words.next(), "wait", line_no)? },
            "resize" => ScriptStep::Resize {
                width: parse_number(words.next(), "resize width", line_no)?,
                height: parse_number(words.next(), "resize height", line_no)?,
            },
            "dispose" => ScriptStep::Dispose,
            other => ScriptStep::Request(
                Request::parse(other).ok_or_else(|| anyhow!("line {line_no}: unknown step '{other}'"))?,
            ),
        };
        if let Some(extra) = words.next() {
            bail!("line {line_no}: unexpected '{extra}' after '{head}'");
        }
        steps.push(step);
    }
    Ok(steps)
}

fn parse_number(word: Option<&str>, what: &str, line_no: usize) -> Result<u32> {
    let word = word.ok_or_else(|| anyhow!("line {line_no}: {what} needs a number"))?;
    word.parse::<u32>().with_context(|| format!("line {line_no}: invalid {what} '{word}'"))
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::StablePhase;

    #[test]
    fn parses_tick_idle_and_preset() {
        let args = ["watch_viewer", "--tick-ms", "10", "--idle-spin", "off", "--preset", "tour"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.as_tuple(), (Some(10), Some(false), Some("tour")));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["watch_viewer", "--tick-ms", "10", "--tick-ms", "25", "--idle-spin", "on"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.as_tuple(), (Some(25), Some(true), None));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["watch_viewer", "--seconds"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_presets() {
        let err = CliOverrides::parse(["watch_viewer", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = CliOverrides::parse(["watch_viewer", "--preset", "kiosk"]).unwrap_err();
        assert!(err.to_string().contains("Unknown preset"));
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert!(CliOverrides::parse(["watch_viewer", "--tick-ms", "0"]).is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let overrides =
            CliOverrides::parse(["watch_viewer", "--preset", "tour", "--idle-spin", "no"]).expect("parse");
        let config = overrides.resolve_config().expect("config");
        assert_eq!(config.variant, "tour");
        assert!(!config.timing.idle_spin);
    }

    #[test]
    fn script_steps_parse_with_comments() {
        let script = "# tour\nforward\n\nwait 4500  # explosion\ngoto:folded\nresize 800 600\ndispose\n";
        let steps = parse_script(script).expect("script");
        assert_eq!(
            steps,
            vec![
                ScriptStep::Request(Request::Forward),
                ScriptStep::Wait { ms: 4500 },
                ScriptStep::Request(Request::Goto(StablePhase::Folded)),
                ScriptStep::Resize { width: 800, height: 600 },
                ScriptStep::Dispose,
            ]
        );
    }

    #[test]
    fn script_errors_name_the_line() {
        let err = parse_script("forward\nsideways\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        let err = parse_script("wait soon\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid wait"));
    }

    #[test]
    fn default_script_parses() {
        assert!(!parse_script(DEFAULT_SCRIPT).expect("default script").is_empty());
    }
}
