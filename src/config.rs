//! GTID 텍스트 파싱 설정

use serde::{Deserialize, Serialize};

/// 정규형이 아닌 입력(겹침, 연접, 역순)을 어떻게 처리할지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// 정렬 후 병합하여 정규형으로 복구
    #[default]
    Normalize,
    /// 이미 정규형인 입력만 허용: 범위 목록은 정렬/병합된 상태,
    /// source 는 오름차순이고 중복과 빈 항목이 없어야 함
    Strict,
}

/// 파싱 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseConfig {
    pub mode: ParseMode,
    /// "NULL" 을 빈 GTID 집합으로 취급 (MySQL 이 미설정 gtid_executed 를 NULL 로 출력)
    pub accept_null: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            mode: ParseMode::Normalize,
            accept_null: true,
        }
    }
}

impl ParseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        ParseConfig {
            mode: ParseMode::Strict,
            ..Default::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_default() {
        let config = ParseConfig::default();
        assert_eq!(config.mode, ParseMode::Normalize);
        assert!(config.accept_null);
        assert!(!config.is_strict());
    }

    #[test]
    fn test_parse_config_strict() {
        let config = ParseConfig::strict();
        assert!(config.is_strict());
        assert!(config.accept_null);
    }

    #[test]
    fn test_parse_mode_json() {
        let config: ParseConfig =
            serde_json::from_str(r#"{"mode":"strict","accept_null":false}"#).unwrap();
        assert_eq!(config.mode, ParseMode::Strict);
        assert!(!config.accept_null);
    }
}
