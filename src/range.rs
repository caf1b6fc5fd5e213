//! GTID 범위 (한 source 의 연속된 sequence 구간)
//!
//! 형식: "F" (단일) 또는 "F-L" (구간, 양 끝 포함)

use crate::error::{GtidError, Result};
use crate::range_list::RangeList;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref RANGE_TOKEN: Regex = Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap();
}

/// 닫힌 구간 `[first, last]`. 항상 `first <= last`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GtidRange {
    first: u64,
    last: u64,
}

impl GtidRange {
    pub fn new(first: u64, last: u64) -> Result<Self> {
        if first > last {
            return Err(GtidError::InvalidRange { first, last });
        }
        Ok(GtidRange { first, last })
    }

    /// 길이 1 범위
    pub fn single(value: u64) -> Self {
        GtidRange {
            first: value,
            last: value,
        }
    }

    pub fn first(&self) -> u64 {
        self.first
    }

    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn is_single(&self) -> bool {
        self.first == self.last
    }

    /// 위치 접근: 0 = first, 1 = last
    pub fn get(&self, index: usize) -> Result<u64> {
        match index {
            0 => Ok(self.first),
            1 => Ok(self.last),
            _ => Err(GtidError::IndexOutOfRange { index, len: 2 }),
        }
    }

    /// 포함된 트랜잭션 수. 전체 u64 구간은 u64::MAX 로 포화
    pub fn count(&self) -> u64 {
        (self.last - self.first).saturating_add(1)
    }

    /// self 가 other 를 완전히 덮는지
    pub fn contains(&self, other: &GtidRange) -> bool {
        self.first <= other.first && self.last >= other.last
    }

    pub fn contains_value(&self, value: u64) -> bool {
        value >= self.first && value <= self.last
    }

    pub fn overlaps(&self, other: &GtidRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// self 바로 뒤에 other 가 이어지는지 (방향성 있음)
    pub fn is_consecutive_with(&self, other: &GtidRange) -> bool {
        self.last.checked_add(1) == Some(other.first)
    }

    /// 겹치거나 연접하면 하나로 병합, 아니면 두 범위를 정렬해서 반환
    pub fn union(&self, other: &GtidRange) -> RangeList {
        RangeList::from_canonical(self.union_pieces(other))
    }

    pub(crate) fn union_pieces(&self, other: &GtidRange) -> Vec<GtidRange> {
        if self.overlaps(other)
            || self.is_consecutive_with(other)
            || other.is_consecutive_with(self)
        {
            vec![GtidRange {
                first: self.first.min(other.first),
                last: self.last.max(other.last),
            }]
        } else if self < other {
            vec![*self, *other]
        } else {
            vec![*other, *self]
        }
    }

    /// self 에서 other 와 겹치는 부분을 제거. 가운데가 뚫리면 두 조각이 남음
    pub fn difference(&self, other: &GtidRange) -> RangeList {
        RangeList::from_canonical(self.difference_pieces(other))
    }

    pub(crate) fn difference_pieces(&self, other: &GtidRange) -> Vec<GtidRange> {
        if self == other {
            return Vec::new();
        }
        if !self.overlaps(other) {
            return vec![*self];
        }

        let mut pieces = Vec::with_capacity(2);
        if self.first < other.first {
            pieces.push(GtidRange {
                first: self.first,
                last: other.first - 1,
            });
        }
        if self.last > other.last {
            pieces.push(GtidRange {
                first: other.last + 1,
                last: self.last,
            });
        }
        pieces
    }

    /// 겹치는 부분
    pub fn intersection(&self, other: &GtidRange) -> Option<GtidRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(GtidRange {
            first: self.first.max(other.first),
            last: self.last.min(other.last),
        })
    }
}

impl fmt::Display for GtidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

impl FromStr for GtidRange {
    type Err = GtidError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let caps = RANGE_TOKEN
            .captures(token)
            .ok_or_else(|| GtidError::MalformedEntry(format!("Invalid range: {:?}", token)))?;

        let parse_bound = |m: &str| {
            m.parse::<u64>()
                .map_err(|_| GtidError::MalformedEntry(format!("Invalid sequence: {}", m)))
        };

        let first = parse_bound(&caps[1])?;
        match caps.get(2) {
            Some(last) => GtidRange::new(first, parse_bound(last.as_str())?),
            None => Ok(GtidRange::single(first)),
        }
    }
}

impl From<u64> for GtidRange {
    fn from(value: u64) -> Self {
        GtidRange::single(value)
    }
}

impl TryFrom<(u64, u64)> for GtidRange {
    type Error = GtidError;

    fn try_from((first, last): (u64, u64)) -> Result<Self> {
        GtidRange::new(first, last)
    }
}

impl TryFrom<&str> for GtidRange {
    type Error = GtidError;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl TryFrom<&[u64]> for GtidRange {
    type Error = GtidError;

    fn try_from(values: &[u64]) -> Result<Self> {
        match *values {
            [value] => Ok(GtidRange::single(value)),
            [first, last] => GtidRange::new(first, last),
            _ => Err(GtidError::TypeMismatch(format!(
                "range needs 1 or 2 values, got {}",
                values.len()
            ))),
        }
    }
}

impl Serialize for GtidRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GtidRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
