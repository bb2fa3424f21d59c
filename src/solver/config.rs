use std::{fmt::Display, str::FromStr, time::Duration};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Unknown restart policy '{}' (expected never, fixed:N, geometric:N or luby:N)", value))]
    UnknownRestartPolicy { value: String },
    #[snafu(display("Restart interval in '{}' must be a positive integer", value))]
    InvalidInterval {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Restart interval in '{}' must be a positive integer", value))]
    ZeroInterval { value: String },
    #[snafu(display("Unknown polarity mode '{}' (expected random, saved, positive or negative)", value))]
    UnknownPolarityMode { value: String },
}

/// When the search discards its trail and starts again from level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Never,
    /// Restart after every `n` conflicts.
    Fixed(u64),
    /// Start with `first` conflicts, growing the interval to `i * 3 / 2 + 10` after each restart.
    Geometric { first: u64 },
    /// Restart after `unit * luby(k)` conflicts on the k-th restart.
    Luby { unit: u64 },
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::Geometric { first: 50 }
    }
}

impl FromStr for RestartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "never" {
            return Ok(RestartPolicy::Never);
        }

        let (kind, interval) = match s.find(':') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => return UnknownRestartPolicy { value: s }.fail(),
        };
        let interval = interval
            .parse::<u64>()
            .context(InvalidInterval { value: s })?;
        ensure!(interval > 0, ZeroInterval { value: s });

        match kind {
            "fixed" => Ok(RestartPolicy::Fixed(interval)),
            "geometric" => Ok(RestartPolicy::Geometric { first: interval }),
            "luby" => Ok(RestartPolicy::Luby { unit: interval }),
            _ => UnknownRestartPolicy { value: s }.fail(),
        }
    }
}

impl Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartPolicy::Never => write!(f, "never"),
            RestartPolicy::Fixed(n) => write!(f, "fixed:{}", n),
            RestartPolicy::Geometric { first } => write!(f, "geometric:{}", first),
            RestartPolicy::Luby { unit } => write!(f, "luby:{}", unit),
        }
    }
}

/// Which value a decision gives to the chosen variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityMode {
    Random,
    /// Phase saving: reuse the value the variable had before it was unassigned.
    Saved,
    Positive,
    Negative,
}

impl Default for PolarityMode {
    fn default() -> Self {
        PolarityMode::Random
    }
}

impl FromStr for PolarityMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(PolarityMode::Random),
            "saved" => Ok(PolarityMode::Saved),
            "positive" => Ok(PolarityMode::Positive),
            "negative" => Ok(PolarityMode::Negative),
            _ => UnknownPolarityMode { value: s }.fail(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub restart: RestartPolicy,
    pub polarity: PolarityMode,
    /// VSIDS decay factor, within (0, 1].
    pub var_decay: f64,
    /// Seed for random polarities and heuristic tie-breaking.
    pub seed: u64,
    pub time_limit: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            restart: RestartPolicy::default(),
            polarity: PolarityMode::default(),
            var_decay: 0.95,
            seed: 0,
            time_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_restart_policy() {
        assert_eq!("never".parse::<RestartPolicy>().unwrap(), RestartPolicy::Never);
        assert_eq!(
            "fixed:1".parse::<RestartPolicy>().unwrap(),
            RestartPolicy::Fixed(1)
        );
        assert_eq!(
            "geometric:50".parse::<RestartPolicy>().unwrap(),
            RestartPolicy::Geometric { first: 50 }
        );
        assert_eq!(
            "luby:100".parse::<RestartPolicy>().unwrap(),
            RestartPolicy::Luby { unit: 100 }
        );

        assert!(matches!(
            "luby".parse::<RestartPolicy>(),
            Err(ConfigError::UnknownRestartPolicy { .. })
        ));
        assert!(matches!(
            "fixed:0".parse::<RestartPolicy>(),
            Err(ConfigError::ZeroInterval { .. })
        ));
        assert!(matches!(
            "fixed:-3".parse::<RestartPolicy>(),
            Err(ConfigError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn restart_policy_display_parses_back() {
        let policy = RestartPolicy::Geometric { first: 7 };
        assert_eq!(policy.to_string().parse::<RestartPolicy>().unwrap(), policy);
    }

    #[test]
    fn parse_polarity_mode() {
        assert_eq!("saved".parse::<PolarityMode>().unwrap(), PolarityMode::Saved);
        assert!("sometimes".parse::<PolarityMode>().is_err());
    }
}
