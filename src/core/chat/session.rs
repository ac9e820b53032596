use std::fmt;

use chrono::Utc;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Client-generated id correlating chat turns on the server:
/// `session_<epoch millis>_<9 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self::from_parts(Utc::now().timestamp_millis(), &random_suffix())
    }

    fn from_parts(millis: i64, suffix: &str) -> Self {
        Self(format!("session_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn random_suffix() -> String {
    let mut bytes = [0u8; SUFFIX_LEN];
    if getrandom::fill(&mut bytes).is_err() {
        // No OS entropy: fall back to the clock so ids stay distinct.
        let nanos = Utc::now().timestamp_subsec_nanos();
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (nanos >> (i % 4 * 8)) as u8 ^ (i as u8).wrapping_mul(37);
        }
    }
    bytes
        .iter()
        .map(|byte| BASE36[*byte as usize % BASE36.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = SessionId::generate();
        let parts: Vec<_> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3, "{id}");
        assert_eq!(parts[0], "session");
        let millis: i64 = parts[1].parse().expect("millis");
        let now = Utc::now().timestamp_millis();
        assert!(millis <= now && now - millis < 60_000, "{id}");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn consecutive_ids_differ() {
        let first = SessionId::generate();
        let second = SessionId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn parts_are_joined_with_underscores() {
        assert_eq!(
            SessionId::from_parts(1700000000000, "abc123xyz").as_str(),
            "session_1700000000000_abc123xyz"
        );
    }
}
