//! MySQL GTID 집합 표현 및 연산
//!
//! 복제 서버가 source 별로 어떤 트랜잭션을 실행했는지 추적하는 GTID 집합을 다룹니다.
//! 주요 기능:
//! - GTID 범위 / 범위 목록 / 집합 (항상 정규형 유지)
//! - 합집합, 차집합, 교집합, 포함 관계, 개수
//! - "uuid:1-100:200,uuid2:1-50" 텍스트 형식 파싱 및 직렬화

pub mod config;
pub mod error;
pub mod gtid;
pub mod range;
pub mod range_list;

pub use config::{ParseConfig, ParseMode};
pub use error::{GtidError, Result};
pub use gtid::{Gtid, GtidSet};
pub use range::GtidRange;
pub use range_list::RangeList;
