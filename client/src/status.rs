use std::time::Duration;

/// Label shown while a reply is in flight and still empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    Processing,
    Analyzing,
    Finalizing,
}

const ANALYZING_AFTER: Duration = Duration::from_secs(2);
const FINALIZING_AFTER: Duration = Duration::from_secs(5);

impl StatusPhase {
    pub fn at(elapsed: Duration) -> Self {
        if elapsed >= FINALIZING_AFTER {
            StatusPhase::Finalizing
        } else if elapsed >= ANALYZING_AFTER {
            StatusPhase::Analyzing
        } else {
            StatusPhase::Processing
        }
    }

    /// Phase changes after the reply started, for scheduling UI timers.
    pub fn schedule() -> [(Duration, StatusPhase); 2] {
        [
            (ANALYZING_AFTER, StatusPhase::Analyzing),
            (FINALIZING_AFTER, StatusPhase::Finalizing),
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusPhase::Processing => "Prosesa...",
            StatusPhase::Analyzing => "Analiza…",
            StatusPhase::Finalizing => "Finaliza...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases() {
        assert_eq!(StatusPhase::at(Duration::ZERO), StatusPhase::Processing);
        assert_eq!(StatusPhase::at(Duration::from_millis(1999)), StatusPhase::Processing);
        assert_eq!(StatusPhase::at(Duration::from_secs(2)), StatusPhase::Analyzing);
        assert_eq!(StatusPhase::at(Duration::from_secs(60)), StatusPhase::Finalizing);
        for (after, phase) in StatusPhase::schedule() {
            assert_eq!(StatusPhase::at(after), phase);
        }
        assert_eq!(StatusPhase::Analyzing.label(), "Analiza…");
    }
}
