//! GTID 관련 에러 타입

use std::convert::Infallible;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GtidError {
    #[error("유효하지 않은 범위: {first}-{last} (first > last)")]
    InvalidRange { first: u64, last: u64 },

    /// fast-path append 에서만 발생. 이 경우 원본 리스트는 변경되지 않음
    #[error("순서가 맞지 않는 append: {range} 는 마지막 범위 {last} 이후여야 합니다")]
    OutOfOrderAppend { range: String, last: String },

    #[error("타입 불일치: {0}")]
    TypeMismatch(String),

    #[error("잘못된 GTID 항목: {0}")]
    MalformedEntry(String),

    #[error("인덱스 범위 초과: {index} (길이 {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("알 수 없는 source: {0}")]
    UnknownSource(String),
}

// 정수 -> 범위 변환은 실패하지 않음
impl From<Infallible> for GtidError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, GtidError>;
