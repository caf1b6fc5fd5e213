//! 한 source 의 GTID 범위 목록
//!
//! 형식: "1-200:202:207-251"
//! 모든 연산 이후 정렬되어 있고, 겹치거나 연접한 이웃이 없음 (정규형)

use crate::config::ParseConfig;
use crate::error::{GtidError, Result};
use crate::range::GtidRange;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 정규형 범위 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RangeList {
    ranges: Vec<GtidRange>,
}

impl RangeList {
    pub fn new() -> Self {
        RangeList { ranges: Vec::new() }
    }

    /// 이미 정규형인 벡터를 그대로 감싼다
    pub(crate) fn from_canonical(ranges: Vec<GtidRange>) -> Self {
        debug_assert!(is_canonical(&ranges), "non-canonical ranges: {:?}", ranges);
        RangeList { ranges }
    }

    /// 임의 순서의 범위들을 정렬, 병합
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = GtidRange>,
    {
        RangeList {
            ranges: normalize(ranges.into_iter().collect()),
        }
    }

    /// 튜플, 정수, 문자열 등을 범위로 변환한 뒤 정규화
    pub fn try_from_iter<I, T>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: TryInto<GtidRange>,
        GtidError: From<T::Error>,
    {
        let ranges = items
            .into_iter()
            .map(|item| item.try_into().map_err(GtidError::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_ranges(ranges))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParseConfig::default())
    }

    /// ':' 로 구분된 범위 목록 파싱. 빈 문자열은 빈 목록
    pub fn parse_with(text: &str, config: &ParseConfig) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(RangeList::new());
        }

        let tokens = text
            .split(':')
            .map(str::parse::<GtidRange>)
            .collect::<Result<Vec<_>>>()?;

        if config.is_strict() {
            if let Some(pair) = tokens
                .windows(2)
                .find(|pair| !is_canonical_pair(&pair[0], &pair[1]))
            {
                return Err(GtidError::MalformedEntry(format!(
                    "range {} is out of order or adjacent to {} in {:?}",
                    pair[1], pair[0], text
                )));
            }
            return Ok(RangeList::from_canonical(tokens));
        }

        let token_count = tokens.len();
        let ranges = normalize(tokens);
        if ranges.len() != token_count {
            debug!(
                "Normalized range list {:?}: {} tokens -> {} ranges",
                text,
                token_count,
                ranges.len()
            );
        }
        Ok(RangeList { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GtidRange> {
        self.ranges.iter()
    }

    pub fn as_slice(&self) -> &[GtidRange] {
        &self.ranges
    }

    pub fn get(&self, index: usize) -> Result<&GtidRange> {
        self.ranges.get(index).ok_or(GtidError::IndexOutOfRange {
            index,
            len: self.ranges.len(),
        })
    }

    /// 전체 트랜잭션 수
    pub fn count(&self) -> u64 {
        self.ranges
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.count()))
    }

    /// 어떤 범위 하나가 주어진 범위를 완전히 덮는지
    pub fn contains(&self, range: &GtidRange) -> bool {
        self.ranges.iter().any(|r| r.contains(range))
    }

    pub fn contains_value(&self, sequence: u64) -> bool {
        self.ranges.iter().any(|r| r.contains_value(sequence))
    }

    pub fn contains_all(&self, other: &RangeList) -> bool {
        other.ranges.iter().all(|r| self.contains(r))
    }

    pub fn union(&self, other: &RangeList) -> RangeList {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        RangeList {
            ranges: normalize(self.ranges.iter().chain(other.ranges.iter()).copied().collect()),
        }
    }

    /// 마지막 범위 이후에 오는 범위만 받는 빠른 추가.
    /// 순서가 어긋나면 에러를 돌려주고 self 는 그대로 남는다
    pub fn append(&self, range: GtidRange) -> Result<RangeList> {
        if let Some(tail) = self.ranges.last() {
            if range < *tail {
                return Err(GtidError::OutOfOrderAppend {
                    range: range.to_string(),
                    last: tail.to_string(),
                });
            }
        }

        let mut ranges = self.ranges.clone();
        push_merged(&mut ranges, range);
        Ok(RangeList::from_canonical(ranges))
    }

    pub fn difference(&self, other: &RangeList) -> RangeList {
        if self == other {
            return RangeList::new();
        }

        let mut remaining = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let mut pieces = vec![*range];
            for sub in other.ranges.iter().filter(|sub| sub.overlaps(range)) {
                pieces = pieces.iter().flat_map(|p| p.difference_pieces(sub)).collect();
                if pieces.is_empty() {
                    break;
                }
            }
            remaining.extend(pieces);
        }

        RangeList::from_ranges(remaining)
    }

    pub fn intersection(&self, other: &RangeList) -> RangeList {
        let overlaps = self
            .ranges
            .iter()
            .flat_map(|a| other.ranges.iter().filter_map(move |b| a.intersection(b)));
        RangeList::from_ranges(overlaps)
    }
}

/// 정렬 후 왼쪽부터 이웃끼리 병합
fn normalize(mut ranges: Vec<GtidRange>) -> Vec<GtidRange> {
    ranges.sort();
    let mut merged = Vec::with_capacity(ranges.len());
    for range in ranges {
        push_merged(&mut merged, range);
    }
    merged
}

/// 마지막 범위를 꺼내 새 범위와 합친 뒤 1~2개를 다시 넣는다.
/// range 는 마지막 범위보다 작지 않아야 함
fn push_merged(ranges: &mut Vec<GtidRange>, range: GtidRange) {
    match ranges.pop() {
        Some(tail) => ranges.extend(tail.union_pieces(&range)),
        None => ranges.push(range),
    }
}

fn is_canonical_pair(prev: &GtidRange, next: &GtidRange) -> bool {
    prev.last()
        .checked_add(1)
        .map_or(false, |after| after < next.first())
}

fn is_canonical(ranges: &[GtidRange]) -> bool {
    ranges
        .windows(2)
        .all(|pair| is_canonical_pair(&pair[0], &pair[1]))
}

impl fmt::Display for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl FromStr for RangeList {
    type Err = GtidError;

    fn from_str(s: &str) -> Result<Self> {
        RangeList::parse(s)
    }
}

impl FromIterator<GtidRange> for RangeList {
    fn from_iter<I: IntoIterator<Item = GtidRange>>(iter: I) -> Self {
        RangeList::from_ranges(iter)
    }
}

impl<'a> IntoIterator for &'a RangeList {
    type Item = &'a GtidRange;
    type IntoIter = std::slice::Iter<'a, GtidRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl Serialize for RangeList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RangeList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(first: u64, last: u64) -> GtidRange {
        GtidRange::new(first, last).unwrap()
    }

    fn list(text: &str) -> RangeList {
        text.parse().unwrap()
    }

    #[test]
    fn test_range_list_parse() {
        let ranges = list("1-200:202:207-251");
        assert_eq!(ranges.as_slice(), &[r(1, 200), GtidRange::single(202), r(207, 251)]);
        assert_eq!(ranges.count(), 246);
        assert_eq!(ranges.to_string(), "1-200:202:207-251");
    }

    #[test]
    fn test_range_list_parse_empty() {
        assert!(list("").is_empty());
        assert!(list("  ").is_empty());
        assert_eq!(list("").to_string(), "");
    }

    #[test]
    fn test_range_list_parse_bad_token() {
        assert!(matches!(
            RangeList::parse("1-5::9"),
            Err(GtidError::MalformedEntry(_))
        ));
        assert!(matches!(
            RangeList::parse("1-5:x"),
            Err(GtidError::MalformedEntry(_))
        ));
        assert!(matches!(
            RangeList::parse("1-5:9-7"),
            Err(GtidError::InvalidRange { first: 9, last: 7 })
        ));
    }

    #[test]
    fn test_range_list_normalize_repairs_input() {
        let ranges = list("50-60:1-10:5-20:21:100");
        assert_eq!(ranges.to_string(), "1-21:50-60:100");
        assert_eq!(ranges.count(), 21 + 11 + 1);
    }

    #[test]
    fn test_range_list_strict_accepts_canonical() {
        let ranges = RangeList::parse_with("1-200:202:207-251", &ParseConfig::strict()).unwrap();
        assert_eq!(ranges, list("1-200:202:207-251"));
    }

    #[test]
    fn test_range_list_strict_rejects_non_canonical() {
        let strict = ParseConfig::strict();
        for text in ["1-10:5-20", "1-10:11-20", "20-30:1-5", "3:3"] {
            assert!(
                matches!(
                    RangeList::parse_with(text, &strict),
                    Err(GtidError::MalformedEntry(_))
                ),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_range_list_get() {
        let ranges = list("1-5:7");
        assert_eq!(ranges.get(1).unwrap(), &GtidRange::single(7));
        assert_eq!(
            ranges.get(2),
            Err(GtidError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_range_list_try_from_iter() {
        let from_pairs = RangeList::try_from_iter([(7u64, 9u64), (1, 5)]).unwrap();
        assert_eq!(from_pairs.to_string(), "1-5:7-9");

        let from_strs = RangeList::try_from_iter(["7-9", "1-5", "6"]).unwrap();
        assert_eq!(from_strs.to_string(), "1-9");

        let from_values = RangeList::try_from_iter([3u64, 1, 2]).unwrap();
        assert_eq!(from_values.to_string(), "1-3");

        assert!(matches!(
            RangeList::try_from_iter([(9u64, 1u64)]),
            Err(GtidError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_list_contains() {
        let ranges = list("1-100:200-300");
        assert!(ranges.contains(&r(10, 20)));
        assert!(ranges.contains(&r(200, 300)));
        assert!(!ranges.contains(&r(90, 210)));
        assert!(ranges.contains_value(250));
        assert!(!ranges.contains_value(150));

        assert!(ranges.contains_all(&list("5:50-60:250")));
        assert!(!ranges.contains_all(&list("5:150")));
        assert!(ranges.contains_all(&RangeList::new()));
    }

    #[test]
    fn test_range_list_union() {
        let merged = list("1-10:20-30").union(&list("11-19:40"));
        assert_eq!(merged.to_string(), "1-30:40");

        let merged = list("5").union(&RangeList::new());
        assert_eq!(merged.to_string(), "5");

        let merged = RangeList::new().union(&list("1-3:8"));
        assert_eq!(merged.to_string(), "1-3:8");
    }

    #[test]
    fn test_range_list_append() {
        let ranges = list("1-10:20-30");

        let appended = ranges.append(r(31, 40)).unwrap();
        assert_eq!(appended.to_string(), "1-10:20-40");

        let appended = ranges.append(r(50, 60)).unwrap();
        assert_eq!(appended.to_string(), "1-10:20-30:50-60");

        let appended = ranges.append(r(25, 26)).unwrap();
        assert_eq!(appended.to_string(), "1-10:20-30");

        let appended = RangeList::new().append(GtidRange::single(1)).unwrap();
        assert_eq!(appended.to_string(), "1");
    }

    #[test]
    fn test_range_list_append_out_of_order() {
        let ranges = list("1-10:20-30");
        let err = ranges.append(r(12, 15)).unwrap_err();
        assert!(matches!(err, GtidError::OutOfOrderAppend { .. }));
        assert_eq!(ranges.to_string(), "1-10:20-30");
    }

    #[test]
    fn test_range_list_difference() {
        let left = list("1-100:200-300");

        assert_eq!(left.difference(&list("50-60")).to_string(), "1-49:61-100:200-300");
        assert_eq!(
            left.difference(&list("10:20:250-400")).to_string(),
            "1-9:11-19:21-100:200-249"
        );
        assert_eq!(left.difference(&list("400-500")), left);
        assert!(left.difference(&left).is_empty());
        assert!(left.difference(&list("1-300")).is_empty());
        assert!(RangeList::new().difference(&left).is_empty());
    }

    #[test]
    fn test_range_list_intersection() {
        let left = list("1-100:200-300");
        let right = list("50-250:290");
        assert_eq!(left.intersection(&right).to_string(), "50-100:200-250:290");
        assert!(left.intersection(&list("150")).is_empty());
    }

    #[test]
    fn test_range_list_serde() {
        let ranges = list("1-5:7");
        let json = serde_json::to_string(&ranges).unwrap();
        assert_eq!(json, "\"1-5:7\"");
        let back: RangeList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ranges);
    }
}
