use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Custom deserializer for Duration from milliseconds
pub fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom serializer for Duration to milliseconds
pub fn serialize_duration_to_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct PollInterval {
        #[serde(
            deserialize_with = "deserialize_duration_from_seconds",
            serialize_with = "serialize_duration_to_seconds"
        )]
        interval: Duration,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Backoff {
        #[serde(
            deserialize_with = "deserialize_duration_from_ms",
            serialize_with = "serialize_duration_to_ms"
        )]
        backoff: Duration,
    }

    #[test]
    fn test_interval_from_seconds() {
        let parsed: PollInterval = serde_json::from_str(r#"{"interval": 300}"#).unwrap();
        assert_eq!(parsed.interval, Duration::from_secs(300));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"interval":300}"#);
    }

    #[test]
    fn test_backoff_from_ms() {
        let parsed: Backoff = serde_json::from_str(r#"{"backoff": 250}"#).unwrap();
        assert_eq!(parsed.backoff, Duration::from_millis(250));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"backoff":250}"#);
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let result: Result<PollInterval, _> = serde_json::from_str(r#"{"interval": -5}"#);
        assert!(result.is_err());
    }
}
