#![forbid(unsafe_code)]

pub mod graph;
pub mod history;
pub mod layout;

pub mod ids {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    pub fn new_frame_id() -> String {
        format!("frame-{}-{}", crate::time::now_ms(), next())
    }

    pub fn new_project_id() -> String {
        format!("proj-{}-{}", crate::time::now_ms(), next())
    }

    /// Canonical edge id for a `(source, target)` pair. Reconnecting an
    /// edge regenerates its id from the new endpoints, so edge ids are not
    /// stable handles across reconnection.
    pub fn edge_id(source: &str, target: &str) -> String {
        format!("edge-{source}-{target}")
    }

    fn next() -> u64 {
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct FrameId(String);

    impl FrameId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, FrameIdError> {
            let value = value.into();
            validate_frame_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum FrameIdError {
        Empty,
        TooLong,
        ContainsControl,
    }

    impl FrameIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "frame id must not be empty",
                Self::TooLong => "frame id is too long",
                Self::ContainsControl => "frame id contains control characters",
            }
        }
    }

    fn validate_frame_id(value: &str) -> Result<(), FrameIdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FrameIdError::Empty);
        }
        if trimmed.len() > 256 {
            return Err(FrameIdError::TooLong);
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(FrameIdError::ContainsControl);
        }
        Ok(())
    }
}

pub mod time {
    pub fn now_ms() -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration,
            Err(_) => return 0,
        };

        i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
    }
}
