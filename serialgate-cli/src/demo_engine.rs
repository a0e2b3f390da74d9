//! Built-in demonstration engine.
//!
//! Stands in for an expensive single-threaded resource: construction can be
//! made slow (`warmup_ms`), each computation can be made slow (`delay_ms`),
//! and marker strings let a user trigger a failed request or an engine
//! interrupt from the command line.

use std::str::FromStr;
use std::thread;
use std::time::Duration;

use tracing::debug;

use serialgate::config::{ConfigFileError, EngineSettings};
use serialgate::engine::{ComputeError, ConstructError, Engine};

/// Text transformation applied to each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoMode {
    /// Uppercase the input
    #[default]
    Upper,
    /// Reverse the characters of the input
    Reverse,
    /// Return the input unchanged
    Echo,
}

impl DemoMode {
    fn apply(self, input: &str) -> String {
        match self {
            DemoMode::Upper => input.to_uppercase(),
            DemoMode::Reverse => input.chars().rev().collect(),
            DemoMode::Echo => input.to_string(),
        }
    }
}

impl FromStr for DemoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upper" => Ok(DemoMode::Upper),
            "reverse" => Ok(DemoMode::Reverse),
            "echo" => Ok(DemoMode::Echo),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Settings read from the `[engine]` config section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoSettings {
    pub mode: DemoMode,
    pub delay: Duration,
    pub warmup: Duration,
    pub fail_marker: Option<String>,
    pub interrupt_marker: Option<String>,
}

impl DemoSettings {
    /// Reads the demo engine's keys; unknown keys are ignored.
    pub fn from_config(engine: &EngineSettings) -> Result<Self, ConfigFileError> {
        let millis = "must be a non-negative integer (milliseconds)";

        Ok(Self {
            mode: engine
                .parse::<DemoMode>("mode", "must be one of: upper, reverse, echo")?
                .unwrap_or_default(),
            delay: Duration::from_millis(engine.parse("delay_ms", millis)?.unwrap_or(0)),
            warmup: Duration::from_millis(engine.parse("warmup_ms", millis)?.unwrap_or(0)),
            fail_marker: marker(engine, "fail_marker"),
            interrupt_marker: marker(engine, "interrupt_marker"),
        })
    }
}

fn marker(engine: &EngineSettings, key: &str) -> Option<String> {
    engine
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Engine that transforms text lines.
pub struct DemoEngine {
    settings: DemoSettings,
    handled: u64,
}

impl DemoEngine {
    /// Builds the engine, sleeping for the configured warmup.
    pub fn load(settings: DemoSettings) -> Result<Self, ConstructError> {
        if !settings.warmup.is_zero() {
            debug!(warmup_ms = settings.warmup.as_millis() as u64, "Warming up demo engine");
            thread::sleep(settings.warmup);
        }
        Ok(Self {
            settings,
            handled: 0,
        })
    }
}

impl Engine for DemoEngine {
    type Params = String;
    type Output = String;

    fn compute(&mut self, params: String) -> Result<String, ComputeError> {
        self.handled += 1;

        if let Some(marker) = &self.settings.interrupt_marker {
            if params.contains(marker.as_str()) {
                return Err(ComputeError::Interrupted);
            }
        }
        if let Some(marker) = &self.settings.fail_marker {
            if params.contains(marker.as_str()) {
                return Err(ComputeError::failed(format!(
                    "input contains '{}' (request #{})",
                    marker, self.handled
                )));
            }
        }

        if !self.settings.delay.is_zero() {
            thread::sleep(self.settings.delay);
        }

        Ok(self.settings.mode.apply(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> EngineSettings {
        let mut engine = EngineSettings::default();
        for (k, v) in pairs {
            engine.set(*k, *v);
        }
        engine
    }

    #[test]
    fn test_defaults_from_empty_section() {
        let demo = DemoSettings::from_config(&EngineSettings::default()).unwrap();
        assert_eq!(demo, DemoSettings::default());
        assert_eq!(demo.mode, DemoMode::Upper);
    }

    #[test]
    fn test_settings_parsed() {
        let demo = DemoSettings::from_config(&settings(&[
            ("mode", "Reverse"),
            ("delay_ms", "15"),
            ("fail_marker", "boom"),
            ("interrupt_marker", " "),
            ("unrelated", "x"),
        ]))
        .unwrap();

        assert_eq!(demo.mode, DemoMode::Reverse);
        assert_eq!(demo.delay, Duration::from_millis(15));
        assert_eq!(demo.fail_marker.as_deref(), Some("boom"));
        assert_eq!(demo.interrupt_marker, None);
    }

    #[test]
    fn test_bad_values_rejected() {
        let err = DemoSettings::from_config(&settings(&[("mode", "shout")])).unwrap_err();
        assert!(err.to_string().contains("engine.mode"));

        let err = DemoSettings::from_config(&settings(&[("delay_ms", "-3")])).unwrap_err();
        assert!(err.to_string().contains("milliseconds"));
    }

    #[test]
    fn test_modes() {
        let mut upper = DemoEngine::load(DemoSettings::default()).unwrap();
        assert_eq!(upper.compute("abc".to_string()).unwrap(), "ABC");

        let mut reverse = DemoEngine::load(DemoSettings {
            mode: DemoMode::Reverse,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(reverse.compute("abc".to_string()).unwrap(), "cba");

        let mut echo = DemoEngine::load(DemoSettings {
            mode: DemoMode::Echo,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(echo.compute("abc".to_string()).unwrap(), "abc");
    }

    #[test]
    fn test_markers() {
        let mut engine = DemoEngine::load(DemoSettings {
            fail_marker: Some("bad".to_string()),
            interrupt_marker: Some("stop".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            engine.compute("a bad line".to_string()),
            Err(ComputeError::Failed(ref msg)) if msg.contains("request #1")
        ));
        assert!(matches!(
            engine.compute("please stop".to_string()),
            Err(ComputeError::Interrupted)
        ));
        // Failures do not poison the engine.
        assert_eq!(engine.compute("fine".to_string()).unwrap(), "FINE");
    }
}
