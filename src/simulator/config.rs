/// Load driver configuration.
use std::time::Duration;

use crate::protocol::{LengthMode, OpKind, WireFormat};
use crate::transport::SessionOptions;

/// Think-time range in milliseconds. Each pause is drawn uniformly from
/// the closed interval `[min_ms, max_ms]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinkTime {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl ThinkTime {
    pub fn new(min_ms: f64, max_ms: f64) -> Result<Self, String> {
        if !min_ms.is_finite() || !max_ms.is_finite() || min_ms < 0.0 {
            return Err(format!("invalid think time range {}-{}ms", min_ms, max_ms));
        }
        if max_ms < min_ms {
            return Err(format!(
                "think time max ({}ms) must not be below min ({}ms)",
                max_ms, min_ms
            ));
        }
        Ok(Self { min_ms, max_ms })
    }

    /// Parse `"250-750ms"` or `"500ms"` (the `ms` suffix is optional).
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_end_matches("ms").trim();
        let (min_str, max_str) = match trimmed.split_once('-') {
            Some((min, max)) => (min.trim(), max.trim()),
            None => (trimmed, trimmed),
        };
        let min_ms = min_str
            .parse::<f64>()
            .map_err(|_| format!("invalid think time '{}'", raw))?;
        let max_ms = max_str
            .parse::<f64>()
            .map_err(|_| format!("invalid think time '{}'", raw))?;
        Self::new(min_ms, max_ms)
    }

    /// Draw one pause duration.
    pub fn sample(&self) -> Duration {
        let ms = self.min_ms + fastrand::f64() * (self.max_ms - self.min_ms);
        Duration::from_secs_f64(ms / 1000.0)
    }
}

/// Relative weights for operation selection. Arbitrary positive integers;
/// a zero weight disables that operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationWeights {
    pub put: u32,
    pub get: u32,
}

impl OperationWeights {
    pub fn new(put: u32, get: u32) -> Result<Self, String> {
        if put == 0 && get == 0 {
            return Err("at least one operation weight must be positive".to_string());
        }
        Ok(Self { put, get })
    }

    pub fn total(&self) -> u64 {
        self.put as u64 + self.get as u64
    }

    /// Map a roll in `0..total()` onto an operation kind.
    pub fn choose(&self, roll: u64) -> OpKind {
        if roll < self.put as u64 {
            OpKind::Put
        } else {
            OpKind::Get
        }
    }
}

impl Default for OperationWeights {
    fn default() -> Self {
        Self { put: 1, get: 1 }
    }
}

/// Per-operation workload shape shared by every virtual client.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub wire_format: WireFormat,
    pub length_mode: LengthMode,
    pub weights: OperationWeights,
    pub think_time: Option<ThinkTime>,
    /// Value payload written by PUT operations.
    pub value: String,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            wire_format: WireFormat::Newline,
            length_mode: LengthMode::Bytes,
            weights: OperationWeights::default(),
            think_time: None,
            value: "test_value".to_string(),
        }
    }
}

/// Full driver configuration for one run.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub clients: usize,
    /// Per-client operation budget. Unlimited when `None`.
    pub requests_per_client: Option<usize>,
    /// Run-wide deadline after which the stop flag is raised.
    pub duration: Option<Duration>,
    pub workload: WorkloadConfig,
    pub session: SessionOptions,
}

impl DriverConfig {
    pub fn new(clients: usize) -> Self {
        Self {
            clients,
            requests_per_client: None,
            duration: None,
            workload: WorkloadConfig::default(),
            session: SessionOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.clients == 0 {
            return Err("client count must be positive".to_string());
        }
        if self.requests_per_client.is_none() && self.duration.is_none() {
            return Err("either a request budget or a duration is required".to_string());
        }
        if self.session.read_buffer_size == 0 {
            return Err("read buffer size must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_value_think_time() {
        let tt = ThinkTime::parse("500ms").unwrap();
        assert_eq!(tt, ThinkTime { min_ms: 500.0, max_ms: 500.0 });
    }

    #[test]
    fn parses_range_think_time() {
        let tt = ThinkTime::parse("250-750ms").unwrap();
        assert_eq!(tt.min_ms, 250.0);
        assert_eq!(tt.max_ms, 750.0);
    }

    #[test]
    fn parses_fractional_millisecond_ranges() {
        let tt = ThinkTime::parse("0-5ms").unwrap();
        assert_eq!(tt.min_ms, 0.0);
        assert_eq!(tt.max_ms, 5.0);

        let tt = ThinkTime::parse("0.5-2.5").unwrap();
        assert_eq!(tt.min_ms, 0.5);
        assert_eq!(tt.max_ms, 2.5);
    }

    #[test]
    fn rejects_inverted_or_garbage_ranges() {
        assert!(ThinkTime::parse("750-250ms").is_err());
        assert!(ThinkTime::parse("fast").is_err());
        assert!(ThinkTime::parse("-5ms").is_err());
    }

    #[test]
    fn samples_stay_inside_the_closed_interval() {
        let tt = ThinkTime::parse("2-4ms").unwrap();
        for _ in 0..100 {
            let d = tt.sample();
            assert!(d >= Duration::from_secs_f64(0.002));
            assert!(d <= Duration::from_secs_f64(0.004));
        }
    }

    #[test]
    fn weights_partition_the_roll_space() {
        let weights = OperationWeights::new(2, 3).unwrap();
        assert_eq!(weights.total(), 5);
        assert_eq!(weights.choose(0), OpKind::Put);
        assert_eq!(weights.choose(1), OpKind::Put);
        assert_eq!(weights.choose(2), OpKind::Get);
        assert_eq!(weights.choose(4), OpKind::Get);
    }

    #[test]
    fn zero_weight_disables_one_kind() {
        let weights = OperationWeights::new(0, 1).unwrap();
        assert_eq!(weights.choose(0), OpKind::Get);
        assert!(OperationWeights::new(0, 0).is_err());
    }

    #[test]
    fn driver_config_requires_a_stopping_condition() {
        let config = DriverConfig::new(4);
        assert!(config.validate().is_err());

        let mut config = DriverConfig::new(4);
        config.requests_per_client = Some(10);
        assert!(config.validate().is_ok());

        let mut config = DriverConfig::new(0);
        config.duration = Some(Duration::from_secs(1));
        assert!(config.validate().is_err());
    }
}
