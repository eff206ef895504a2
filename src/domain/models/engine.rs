//! Browser engines and the run context they execute in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::UnknownEngine;

/// Closed set of browser engines the harness knows expectations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Chromium,
    Firefox,
    Webkit,
}

impl Engine {
    pub const ALL: [Self; 3] = [Self::Chromium, Self::Firefox, Self::Webkit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" | "gecko" => Ok(Self::Firefox),
            "webkit" | "safari" => Ok(Self::Webkit),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

/// Identity of one test run: the engine plus whether it runs headless.
///
/// Headed and headless Firefox disagree on how a click restores focus into a
/// frame, so expectations are keyed on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunContext {
    pub engine: Engine,
    pub headless: bool,
}

impl RunContext {
    pub const fn headless(engine: Engine) -> Self {
        Self {
            engine,
            headless: true,
        }
    }

    pub const fn headed(engine: Engine) -> Self {
        Self {
            engine,
            headless: false,
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.headless { "headless" } else { "headed" };
        write!(f, "{} ({mode})", self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_round_trips_through_strings() {
        for engine in Engine::ALL {
            assert_eq!(engine.as_str().parse::<Engine>(), Ok(engine));
        }
        assert_eq!("Safari".parse::<Engine>(), Ok(Engine::Webkit));
        assert!("netscape".parse::<Engine>().is_err());
    }

    #[test]
    fn test_run_context_display() {
        assert_eq!(
            RunContext::headed(Engine::Firefox).to_string(),
            "firefox (headed)"
        );
    }
}
