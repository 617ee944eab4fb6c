use std::time::{Duration, Instant};

/// Transient message in the corner of the map
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, shown_at: Instant, duration: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at,
            duration,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.duration
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

/// Which overlay layers have reported a tile failure. Latched: once a layer
/// failed it stays failed for the rest of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerFailures {
    pub wms: bool,
    pub cadastral: bool,
}

impl LayerFailures {
    pub fn any(&self) -> bool {
        self.wms || self.cadastral
    }

    /// Toast text for the current combination, None while nothing failed
    pub fn message(&self) -> Option<&'static str> {
        match (self.wms, self.cadastral) {
            (true, true) => Some(
                "Neither WMS nor cadastral layer could be loaded, please check your network connection.",
            ),
            (true, false) => {
                Some("Error while fetching WMS layer, please check your network connection.")
            }
            (false, true) => {
                Some("Error while fetching cadastral layer, please check your network connection.")
            }
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_expiry_boundary() {
        let start = Instant::now();
        let toast = Toast::new("x", start, Duration::from_millis(3200));
        assert!(!toast.is_expired(start + Duration::from_millis(3199)));
        assert!(toast.is_expired(start + Duration::from_millis(3200)));
    }

    #[test]
    fn test_failure_messages() {
        let mut failures = LayerFailures::default();
        assert_eq!(failures.message(), None);
        assert!(!failures.any());

        failures.wms = true;
        assert!(failures.message().unwrap().starts_with("Error while fetching WMS layer"));

        failures.cadastral = true;
        assert!(failures.message().unwrap().starts_with("Neither WMS nor cadastral"));

        failures.wms = false;
        assert!(failures
            .message()
            .unwrap()
            .starts_with("Error while fetching cadastral layer"));
    }
}
