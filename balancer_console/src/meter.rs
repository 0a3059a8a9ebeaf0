use std::cmp;
use std::fmt;
use std::time::Duration;

use hdrhistogram::Histogram;


#[derive(Clone, Copy, Debug)]
pub struct MeterStats {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
    pub num_values: u64,
}

impl fmt::Display for MeterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.num_values;
        if n == 0 {
            write!(f, "- (N={n})")
        } else {
            write!(f, "P50={}, P90={}, P99={}, max={} (N={n})", self.p50, self.p90, self.p99, self.max)
        }
    }
}


pub struct Meter {
    histogram: Histogram<u64>,
}

impl Meter {
    pub fn new() -> anyhow::Result<Self> {
        const SIGNIFICANT_DIGITS: u8 = 3;
        Ok(Meter { histogram: Histogram::new(SIGNIFICANT_DIGITS)? })
    }

    pub fn record(&mut self, value: u64) { self.histogram.saturating_record(value); }

    pub fn record_duration(&mut self, duration: Duration) {
        let value = cmp::min(duration.as_millis(), u64::MAX.into()) as u64;
        self.record(value);
    }

    pub fn stats(&self) -> MeterStats {
        MeterStats {
            p50: self.histogram.value_at_quantile(0.5),
            p90: self.histogram.value_at_quantile(0.9),
            p99: self.histogram.value_at_quantile(0.99),
            max: self.histogram.max(),
            num_values: self.histogram.len(),
        }
    }
}
