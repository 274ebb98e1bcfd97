// xwfc-app/src/progress.rs

use std::time::{Duration, Instant};
use xwfc_core::{ProgressCallback, ProgressInfo};

/// Trait for reporting the progress of the XWFC solver.
///
/// Implementors of this trait can display progress information in various ways
/// (e.g., log lines, a status bar).
pub trait ProgressReporter {
    /// Called after every observation with updated progress information.
    fn report(&mut self, info: &ProgressInfo);
}

/// Logs a progress line at most once per `interval`.
#[derive(Debug)]
pub struct LogProgressReporter {
    interval: Duration,
    last_report: Option<Instant>,
    reported: usize,
}

impl LogProgressReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: None,
            reported: 0,
        }
    }

    /// Number of progress lines logged so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    fn due(&mut self, now: Instant) -> bool {
        match self.last_report {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }
}

/// Share of resolved variables, in percent. An empty system counts as done.
pub fn resolved_percentage(info: &ProgressInfo) -> f64 {
    if info.total_variables == 0 {
        100.0
    } else {
        info.resolved_variables as f64 / info.total_variables as f64 * 100.0
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report(&mut self, info: &ProgressInfo) {
        if !self.due(Instant::now()) {
            return;
        }
        self.reported += 1;
        log::info!(
            "Progress: observation {}, resolved {}/{} ({:.1}%), {} backtracks, {} restarts, {:?} elapsed",
            info.observations,
            info.resolved_variables,
            info.total_variables,
            resolved_percentage(info),
            info.backtracks,
            info.restarts,
            info.elapsed_time
        );
    }
}

/// Turns a reporter into a solver callback. Reporting never aborts the run.
pub fn progress_callback<P: ProgressReporter + 'static>(mut reporter: P) -> ProgressCallback {
    Box::new(move |info: &ProgressInfo| {
        reporter.report(info);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(resolved: usize, total: usize) -> ProgressInfo {
        ProgressInfo {
            observations: 1,
            resolved_variables: resolved,
            total_variables: total,
            backtracks: 0,
            restarts: 0,
            elapsed_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_reports_are_throttled() {
        let mut reporter = LogProgressReporter::new(Duration::from_secs(3600));
        reporter.report(&info(1, 4));
        reporter.report(&info(2, 4));
        reporter.report(&info(3, 4));
        assert_eq!(reporter.reported(), 1);
    }

    #[test]
    fn test_zero_interval_reports_every_time() {
        let mut reporter = LogProgressReporter::new(Duration::ZERO);
        for resolved in 0..5 {
            reporter.report(&info(resolved, 4));
        }
        assert_eq!(reporter.reported(), 5);
    }

    #[test]
    fn test_due_after_interval() {
        let mut reporter = LogProgressReporter::new(Duration::from_millis(10));
        let start = Instant::now();
        assert!(reporter.due(start));
        assert!(!reporter.due(start + Duration::from_millis(5)));
        assert!(reporter.due(start + Duration::from_millis(10)));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(resolved_percentage(&info(1, 4)), 25.0);
        assert_eq!(resolved_percentage(&info(0, 0)), 100.0);
    }

    #[test]
    fn test_callback_never_aborts() {
        let mut callback = progress_callback(LogProgressReporter::new(Duration::ZERO));
        assert!(callback(&info(1, 2)).is_ok());
    }
}
