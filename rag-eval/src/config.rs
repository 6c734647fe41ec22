//! Evaluation knobs: K cutoffs, concurrency and per-query timeout.

use std::time::Duration;

use crate::error::EvalError;

pub const DEFAULT_K_VALUES: [usize; 4] = [1, 3, 5, 10];

#[derive(Clone, Debug, PartialEq)]
pub struct EvalConfig {
    /// Cutoffs to score at; retrieval runs once at the largest.
    pub k_values: Vec<usize>,
    /// Queries in flight.
    pub concurrency: usize,
    /// Per-query retrieval timeout.
    pub timeout: Duration,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            k_values: DEFAULT_K_VALUES.to_vec(),
            concurrency: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EvalConfig {
    pub fn with_k_values(mut self, k_values: Vec<usize>) -> Self {
        self.k_values = k_values;
        self
    }

    /// Reads `EVAL_K_VALUES` (comma-separated), `EVAL_CONCURRENCY`, `EVAL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, EvalError> {
        let mut cfg = Self::default();
        if let Some(v) = env("EVAL_K_VALUES") {
            cfg.k_values = parse_k_values(&v)?;
        }
        if let Some(v) = env("EVAL_CONCURRENCY") {
            cfg.concurrency = v
                .parse()
                .map_err(|_| EvalError::Config(format!("EVAL_CONCURRENCY: cannot parse '{v}'")))?;
        }
        if let Some(v) = env("EVAL_TIMEOUT_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| EvalError::Config(format!("EVAL_TIMEOUT_SECS: cannot parse '{v}'")))?;
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        normalized_k_values(&self.k_values)?;
        if self.concurrency == 0 {
            return Err(EvalError::Config("concurrency must be > 0".into()));
        }
        if self.timeout.is_zero() {
            return Err(EvalError::Config("timeout must be > 0".into()));
        }
        Ok(())
    }

    /// Sorted, de-duplicated K values.
    pub fn sorted_k_values(&self) -> Result<Vec<usize>, EvalError> {
        normalized_k_values(&self.k_values)
    }
}

/// Parses `"1, 3,5"`; any non-integer or non-positive entry is a config error.
pub fn parse_k_values(s: &str) -> Result<Vec<usize>, EvalError> {
    let ks = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<usize>()
                .map_err(|_| EvalError::Config(format!("invalid K value '{t}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    normalized_k_values(&ks)
}

fn normalized_k_values(ks: &[usize]) -> Result<Vec<usize>, EvalError> {
    if ks.is_empty() {
        return Err(EvalError::Config("K list is empty".into()));
    }
    if ks.contains(&0) {
        return Err(EvalError::Config("K values must be positive".into()));
    }
    let mut out = ks.to_vec();
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn env(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_k_values() {
        assert_eq!(parse_k_values("5, 1,3,5").expect("valid"), vec![1, 3, 5]);
        assert!(matches!(parse_k_values(""), Err(EvalError::Config(_))));
        assert!(parse_k_values("0,3").is_err());
        assert!(parse_k_values("-1").is_err());
        assert!(parse_k_values("three").is_err());
    }

    #[test]
    fn validate_checks_every_knob() {
        assert!(EvalConfig::default().validate().is_ok());
        assert!(EvalConfig::default().with_k_values(vec![]).validate().is_err());
        let cfg = EvalConfig {
            concurrency: 0,
            ..EvalConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = EvalConfig {
            timeout: Duration::ZERO,
            ..EvalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
