//! RTT estimation using the Jacobson/Karels algorithm, in whole milliseconds.
//!
//! SRTT   = 7/8 * SRTT   + 1/8 * sample
//! RTTVAR = 3/4 * RTTVAR + 1/4 * |SRTT - sample|
//! RTO    = SRTT + max(interval, 4 * RTTVAR)
//! RTO is clamped to the session's [rto_min, rto_max].

/// RTT estimator driving the session retransmission timeout.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    /// Smoothed RTT, `None` until the first sample.
    srtt: Option<u32>,
    /// RTT variance.
    rttvar: u32,
    /// Current retransmission timeout.
    rto: u32,
    /// Floor for the variance component (the flush interval).
    granularity: u32,
    min_rto: u32,
    max_rto: u32,
}

impl RttEstimator {
    pub fn new(initial_rto: u32, min_rto: u32, max_rto: u32, granularity: u32) -> Self {
        Self {
            srtt: None,
            rttvar: 0,
            rto: initial_rto.clamp(min_rto, max_rto),
            granularity,
            min_rto,
            max_rto,
        }
    }

    /// Update the estimator with a new RTT sample.
    pub fn update(&mut self, sample: u32) {
        match self.srtt {
            None => {
                self.srtt = Some(sample.max(1));
                self.rttvar = sample / 2;
            }
            Some(srtt) => {
                let diff = srtt.abs_diff(sample);
                self.rttvar = ((self.rttvar as u64 * 3 + diff as u64) / 4) as u32;
                let smoothed = ((srtt as u64 * 7 + sample as u64) / 8) as u32;
                self.srtt = Some(smoothed.max(1));
            }
        }
        self.recompute_rto();
    }

    fn recompute_rto(&mut self) {
        if let Some(srtt) = self.srtt {
            let var_component = self.granularity.max(self.rttvar.saturating_mul(4));
            self.rto = srtt
                .saturating_add(var_component)
                .clamp(self.min_rto, self.max_rto);
        }
    }

    pub fn srtt(&self) -> Option<u32> {
        self.srtt
    }

    pub fn rttvar(&self) -> u32 {
        self.rttvar
    }

    /// Returns the current retransmission timeout.
    pub fn rto(&self) -> u32 {
        self.rto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> RttEstimator {
        RttEstimator::new(200, 100, 60_000, 100)
    }

    #[test]
    fn starts_at_initial_rto() {
        let est = estimator();
        assert_eq!(est.rto(), 200);
        assert_eq!(est.srtt(), None);
    }

    #[test]
    fn first_sample_initializes() {
        let mut est = estimator();
        est.update(100);
        assert_eq!(est.srtt(), Some(100));
        assert_eq!(est.rttvar(), 50);
        // 100 + max(100, 200)
        assert_eq!(est.rto(), 300);
    }

    #[test]
    fn subsequent_samples_smooth() {
        let mut est = estimator();
        est.update(100);
        est.update(180);
        // (7 * 100 + 180) / 8 = 110
        assert_eq!(est.srtt(), Some(110));
        // (3 * 50 + 80) / 4 = 57
        assert_eq!(est.rttvar(), 57);
    }

    #[test]
    fn rto_clamped_min() {
        let mut est = RttEstimator::new(200, 100, 60_000, 10);
        est.update(0);
        assert_eq!(est.rto(), 100);
    }

    #[test]
    fn rto_clamped_max() {
        let mut est = estimator();
        est.update(100_000);
        assert_eq!(est.rto(), 60_000);
    }
}
