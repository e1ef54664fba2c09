use std::time::{Duration, Instant};

use crate::{error::ConfigError, io::EmbeddedOptions, solver::DEFAULT_RESTART_BASE};

/// Settings of a solver run: embedded DIMACS options first, then
/// whatever the command line overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Portfolio size, `None` for the available parallelism.
    pub threads: Option<usize>,
    pub time_limit: Option<Duration>,
    pub restart_base: usize,
    /// Negative is quiet, 0 is the default level.
    pub verbose: i64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threads: None,
            time_limit: None,
            restart_base: DEFAULT_RESTART_BASE,
            verbose: 0,
        }
    }
}

fn positive(name: &str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value)
        .ok()
        .filter(|&value| value > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        })
}

impl SolverConfig {
    pub fn from_options(options: &EmbeddedOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (name, value) in options.iter() {
            config.set(name, value)?;
        }
        Ok(config)
    }

    /// Applies one named option. Unknown names are left alone.
    pub fn set(&mut self, name: &str, value: i64) -> Result<(), ConfigError> {
        match name {
            "threads" => self.threads = Some(positive(name, value)?),
            "time-limit" => {
                let secs = u64::try_from(value).map_err(|_| ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                })?;
                self.time_limit = Some(Duration::from_secs(secs));
            }
            "restart-base" => self.restart_base = positive(name, value)?,
            "verbose" => self.verbose = value,
            _ => (),
        }
        Ok(())
    }

    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.time_limit.map(|limit| start + limit)
    }
}
