//! Result shape shared by every relaxation method, plus phase timing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Fractional usage of customers and edges in a relaxation optimum.
///
/// Values are summed over depots and lie in `[0, 1]` up to solver tolerance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub customers: Vec<f64>,
    pub edges: Vec<f64>,
}

/// Outcome of a relaxation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelaxationResult {
    pub objective_value: f64,
    /// Elapsed seconds per named phase.
    pub time: BTreeMap<String, f64>,
    /// Number of master optimizations (1 for direct formulations).
    pub iterations: usize,
    /// Number of columns generated, including the initial ones.
    pub columns: usize,
    /// `(columns generated so far, objective)` after every master optimization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<(usize, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<Utilization>,
}

impl RelaxationResult {
    pub fn total_time(&self) -> f64 {
        self.time.values().sum()
    }
}

impl fmt::Display for RelaxationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj {}", self.objective_value.trunc() as i64)?;
        for (name, seconds) in &self.time {
            write!(f, " {} {:.1}", name, seconds)?;
        }
        Ok(())
    }
}

/// Accumulates wall-clock time per phase name.
///
/// Starting a phase closes the previous one; time spent in a phase that is
/// entered repeatedly adds up.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    time: BTreeMap<String, f64>,
    current: Option<(&'static str, Instant)>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, phase: &'static str) {
        self.stop();
        self.current = Some((phase, Instant::now()));
    }

    pub fn stop(&mut self) {
        if let Some((phase, started)) = self.current.take() {
            *self.time.entry(phase.to_string()).or_insert(0.0) += started.elapsed().as_secs_f64();
        }
    }

    pub fn finish(mut self) -> BTreeMap<String, f64> {
        self.stop();
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_truncates_objective() {
        let mut time = BTreeMap::new();
        time.insert("optimize".to_string(), 1.26);
        time.insert("pricing".to_string(), 0.04);
        let result = RelaxationResult {
            objective_value: 41.97,
            time,
            ..Default::default()
        };
        assert_eq!(result.to_string(), "obj 41 optimize 1.3 pricing 0.0");
        assert!((result.total_time() - 1.30).abs() < 1e-12);
    }

    #[test]
    fn test_timer_accumulates_repeated_phases() {
        let mut timer = PhaseTimer::new();
        timer.start("a");
        timer.start("b");
        timer.start("a");
        let time = timer.finish();
        assert_eq!(time.len(), 2);
        assert!(time["a"] >= 0.0);
        assert!(time.contains_key("b"));
    }

    #[test]
    fn test_result_json_omits_empty_progress() {
        let result = RelaxationResult {
            objective_value: 3.0,
            iterations: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("progress"));
        assert!(!json.contains("utilization"));
        let back: RelaxationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
