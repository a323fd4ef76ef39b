use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of random bytes in a generated access token.
pub const ACCESS_TOKEN_BYTES: usize = 10;

/// 熱水器的存取權杖：配對時經 BLE 送出，之後作為 HTTP Basic 認證
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// 產生 20 個十六進位字元的新權杖
    pub fn generate() -> Self {
        // v4 UUID 的第 6、8 位元組含版本與變體位元，其餘 12 個位元組皆為隨機
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        let random = bytes[..6].iter().chain(&bytes[10..14]);

        let mut token = String::with_capacity(ACCESS_TOKEN_BYTES * 2);
        for byte in random {
            token.push_str(&format!("{:02x}", byte));
        }
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// 避免權杖出現在 debug 日誌
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_lowercase_hex() {
        let token = AccessToken::generate();
        assert_eq!(token.as_str().len(), ACCESS_TOKEN_BYTES * 2);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(AccessToken::generate(), AccessToken::generate());
    }

    #[test]
    fn test_debug_hides_token() {
        let token = AccessToken::from("deadbeef");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
        assert_eq!(token.to_string(), "deadbeef");
    }
}
