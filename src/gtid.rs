//! GTID (Global Transaction ID) 집합
//!
//! GTID 형식: source:sequence-number
//! 여러 서버의 GTID 집합: "uuid1:1-100:200,\nuuid2:1-50"

use crate::config::ParseConfig;
use crate::error::{GtidError, Result};
use crate::range::GtidRange;
use crate::range_list::RangeList;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// 단일 트랜잭션 식별자 (source:sequence)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gtid {
    pub source: String,
    pub sequence: u64,
}

impl Gtid {
    pub fn new(source: impl Into<String>, sequence: u64) -> Self {
        Gtid {
            source: source.into(),
            sequence,
        }
    }
}

impl FromStr for Gtid {
    type Err = GtidError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (source, sequence) = s
            .rsplit_once(':')
            .ok_or_else(|| GtidError::MalformedEntry(format!("Invalid GTID format: {}", s)))?;

        let source = source.trim();
        if source.is_empty() {
            return Err(GtidError::MalformedEntry(format!("Missing source: {}", s)));
        }
        let sequence = sequence
            .trim()
            .parse::<u64>()
            .map_err(|_| GtidError::MalformedEntry(format!("Invalid sequence: {}", sequence)))?;

        Ok(Gtid::new(source, sequence))
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.sequence)
    }
}

/// 전체 GTID 집합 (source 별 범위 목록). 빈 범위 목록은 저장하지 않음
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtidSet {
    sets: BTreeMap<String, RangeList>,
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet {
            sets: BTreeMap::new(),
        }
    }

    /// (source, 범위 목록) 쌍들로 생성. 같은 source 는 합치고 빈 목록은 버림
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RangeList)>,
        S: Into<String>,
    {
        let mut sets: BTreeMap<String, RangeList> = BTreeMap::new();
        for (source, ranges) in entries {
            if ranges.is_empty() {
                continue;
            }
            match sets.entry(source.into()) {
                Entry::Vacant(slot) => {
                    slot.insert(ranges);
                }
                Entry::Occupied(mut slot) => {
                    let merged = slot.get().union(&ranges);
                    slot.insert(merged);
                }
            }
        }
        GtidSet { sets }
    }

    /// GTID 문자열 파싱 (format: "uuid1:1-100:200,uuid2:1-50")
    pub fn parse(gtid_str: &str) -> Result<Self> {
        Self::parse_with(gtid_str, &ParseConfig::default())
    }

    pub fn parse_with(gtid_str: &str, config: &ParseConfig) -> Result<Self> {
        let text = gtid_str.trim();
        if text.is_empty() || (config.accept_null && text == "NULL") {
            return Ok(GtidSet::new());
        }

        let mut sets: BTreeMap<String, RangeList> = BTreeMap::new();
        let mut previous_source: Option<&str> = None;
        for entry in text.split(',') {
            let entry = entry.trim();
            // 끝에 붙은 쉼표나 연속된 쉼표로 생긴 빈 항목
            if entry.is_empty() {
                if config.is_strict() {
                    return Err(GtidError::MalformedEntry(format!(
                        "Empty entry in {:?}",
                        text
                    )));
                }
                continue;
            }
            let (source, ranges_str) = entry.split_once(':').ok_or_else(|| {
                GtidError::MalformedEntry(format!("Missing ':' in entry {:?}", entry))
            })?;

            let source = source.trim();
            if source.is_empty() {
                return Err(GtidError::MalformedEntry(format!(
                    "Missing source in entry {:?}",
                    entry
                )));
            }
            if ranges_str.trim().is_empty() {
                return Err(GtidError::MalformedEntry(format!(
                    "No ranges for source {}",
                    source
                )));
            }

            if config.is_strict() {
                if let Some(previous) = previous_source {
                    if source < previous {
                        return Err(GtidError::MalformedEntry(format!(
                            "Source {} is out of order after {}",
                            source, previous
                        )));
                    }
                }
                previous_source = Some(source);
            }

            let ranges = RangeList::parse_with(ranges_str, config)?;
            match sets.entry(source.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(ranges);
                }
                Entry::Occupied(mut slot) => {
                    if config.is_strict() {
                        return Err(GtidError::MalformedEntry(format!(
                            "Duplicate source {}",
                            source
                        )));
                    }
                    debug!("Merging duplicate entries for source {}", source);
                    let merged = slot.get().union(&ranges);
                    slot.insert(merged);
                }
            }
        }

        Ok(GtidSet { sets })
    }

    /// source 의 범위 목록. 없으면 UnknownSource
    pub fn get(&self, source: &str) -> Result<&RangeList> {
        self.sets
            .get(source)
            .ok_or_else(|| GtidError::UnknownSource(source.to_string()))
    }

    pub fn ranges(&self, source: &str) -> Option<&RangeList> {
        self.sets.get(source)
    }

    pub fn has(&self, source: &str) -> bool {
        self.sets.contains_key(source)
    }

    /// source 개수
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, RangeList> {
        self.sets.iter()
    }

    /// 전체 트랜잭션 수
    pub fn count(&self) -> u64 {
        self.sets
            .values()
            .fold(0u64, |acc, ranges| acc.saturating_add(ranges.count()))
    }

    pub fn contains_gtid(&self, gtid: &Gtid) -> bool {
        self.sets
            .get(&gtid.source)
            .map_or(false, |ranges| ranges.contains_value(gtid.sequence))
    }

    /// gtid 하나를 추가한 새 집합
    pub fn with_gtid(&self, gtid: &Gtid) -> GtidSet {
        let single = RangeList::from_ranges([GtidRange::single(gtid.sequence)]);
        let mut sets = self.sets.clone();
        let merged = match sets.get(&gtid.source) {
            Some(existing) => existing.union(&single),
            None => single,
        };
        sets.insert(gtid.source.clone(), merged);
        GtidSet { sets }
    }

    pub fn union(&self, other: &GtidSet) -> GtidSet {
        let mut sets = self.sets.clone();
        for (source, ranges) in &other.sets {
            let merged = match sets.get(source) {
                Some(existing) => existing.union(ranges),
                None => ranges.clone(),
            };
            if !merged.is_empty() {
                sets.insert(source.clone(), merged);
            }
        }
        GtidSet { sets }
    }

    /// self 에만 있는 트랜잭션. other 에만 있는 source 는 무시
    pub fn difference(&self, other: &GtidSet) -> GtidSet {
        let sets = self
            .sets
            .iter()
            .filter_map(|(source, ranges)| {
                let residue = match other.sets.get(source) {
                    Some(sub) => ranges.difference(sub),
                    None => ranges.clone(),
                };
                trace!("difference for {}: {} -> {}", source, ranges, residue);
                (!residue.is_empty()).then(|| (source.clone(), residue))
            })
            .collect();
        GtidSet { sets }
    }

    pub fn intersection(&self, other: &GtidSet) -> GtidSet {
        let sets = self
            .sets
            .iter()
            .filter_map(|(source, ranges)| {
                let common = ranges.intersection(other.sets.get(source)?);
                (!common.is_empty()).then(|| (source.clone(), common))
            })
            .collect();
        GtidSet { sets }
    }

    /// MySQL GTID_SUBSET 과 같은 의미
    pub fn is_subset_of(&self, other: &GtidSet) -> bool {
        self.sets.iter().all(|(source, ranges)| {
            other
                .sets
                .get(source)
                .map_or(false, |theirs| theirs.contains_all(ranges))
        })
    }

    pub fn contains_all(&self, other: &GtidSet) -> bool {
        other.is_subset_of(self)
    }

    /// 한 줄 형식 (SQL 이나 dump 명령에 넣을 때)
    pub fn to_compact_string(&self) -> String {
        self.join_entries(",")
    }

    fn join_entries(&self, separator: &str) -> String {
        self.sets
            .iter()
            .map(|(source, ranges)| format!("{}:{}", source, ranges))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// {"source": "1-5:7"} 형태의 JSON 객체
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.sets
                .iter()
                .map(|(source, ranges)| (source.clone(), Value::String(ranges.to_string())))
                .collect(),
        )
    }

    /// JSON 문자열(텍스트 형식) 또는 to_json 형태의 객체
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => GtidSet::parse(text),
            Value::Object(entries) => {
                let mut parsed = Vec::with_capacity(entries.len());
                for (source, ranges) in entries {
                    let text = ranges.as_str().ok_or_else(|| {
                        GtidError::TypeMismatch(format!(
                            "ranges for {} must be a string, got {}",
                            source, ranges
                        ))
                    })?;
                    parsed.push((source.clone(), RangeList::parse(text)?));
                }
                Ok(GtidSet::from_entries(parsed))
            }
            other => Err(GtidError::TypeMismatch(format!(
                "GTID set must be a string or an object, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join_entries(",\n"))
    }
}

impl FromStr for GtidSet {
    type Err = GtidError;

    fn from_str(s: &str) -> Result<Self> {
        GtidSet::parse(s)
    }
}

impl<'a> IntoIterator for &'a GtidSet {
    type Item = (&'a String, &'a RangeList);
    type IntoIter = btree_map::Iter<'a, String, RangeList>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

impl Serialize for GtidSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GtidSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
