use crate::domain::{SweepError, SweepResult};
use serde::Deserialize;

pub(crate) const MAX_RANGE_VALUES: usize = 1_000_000;

/// Half-open `start..end` range sampled every `step`.
///
/// Stepping rule: `n = ceil((end - start) / step)` and `value_i = start + i * step`
/// for `i in 0..n`. Values are computed multiplicatively so error does not
/// accumulate across steps; a trailing value that lands on or past `end`
/// through rounding is dropped, so every value is strictly below `end`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSpec {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl RangeSpec {
    pub const fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Sample count before the end guard in [`RangeSpec::values`] is applied.
    pub fn count(&self) -> SweepResult<usize> {
        self.validate()?;
        if self.end <= self.start {
            return Ok(0);
        }

        let raw = ((self.end - self.start) / self.step).ceil();
        if !raw.is_finite() || raw > MAX_RANGE_VALUES as f64 {
            return Err(SweepError::config(
                "CONFIG.RANGE_TOO_LARGE",
                format!(
                    "range {}..{} step {} produces more than {} values",
                    self.start, self.end, self.step, MAX_RANGE_VALUES
                ),
            ));
        }
        Ok(raw as usize)
    }

    pub fn values(&self) -> SweepResult<Vec<f64>> {
        let count = self.count()?;
        let mut values = (0..count)
            .map(|index| self.start + index as f64 * self.step)
            .collect::<Vec<_>>();

        while values.last().is_some_and(|last| *last >= self.end) {
            values.pop();
        }
        Ok(values)
    }

    fn validate(&self) -> SweepResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SweepError::config(
                "CONFIG.RANGE_BOUNDS",
                format!(
                    "range bounds must be finite, got start={} end={}",
                    self.start, self.end
                ),
            ));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SweepError::config(
                "CONFIG.RANGE_STEP",
                format!("range step must be a positive number, got {}", self.step),
            ));
        }
        Ok(())
    }
}
