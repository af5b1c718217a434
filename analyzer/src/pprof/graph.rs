//! Decoded profile graph
//!
//! All string-table indices are resolved once at decode time, and functions
//! and locations are indexed by id. Dangling id references are tolerated:
//! they simply fail to resolve and the views treat them as "no call stack".

use super::proto;
use crate::error::DecodeError;
use flate2::read::GzDecoder;
use prost::Message;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueType {
    pub ty: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Innermost frame first, as on the wire
    pub location_ids: Vec<u64>,
    /// One value per sample type; `values[0]` is the primary cost
    pub values: Vec<i64>,
    pub labels: BTreeMap<String, Vec<String>>,
    pub num_labels: BTreeMap<String, Vec<i64>>,
    pub num_units: BTreeMap<String, Vec<String>>,
}

impl Sample {
    /// Primary cost dimension, if the sample carries any value
    pub fn primary_value(&self) -> Option<i64> {
        self.values.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub id: u64,
    pub memory_start: u64,
    pub memory_limit: u64,
    pub file_offset: u64,
    pub file: String,
    pub build_id: String,
    pub has_functions: bool,
    pub has_filenames: bool,
    pub has_line_numbers: bool,
    pub has_inline_frames: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub function_id: u64,
    pub line: i64,
    pub column: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: u64,
    pub mapping_id: u64,
    pub address: u64,
    /// Inlined frames; the last entry is the outermost caller
    pub lines: Vec<Line>,
    pub is_folded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub id: u64,
    pub name: String,
    pub system_name: String,
    pub filename: String,
    pub start_line: i64,
}

/// A fully decoded profiling snapshot
#[derive(Debug, Clone)]
pub struct ProfileGraph {
    pub sample_types: Vec<ValueType>,
    pub default_sample_type: String,
    pub samples: Vec<Sample>,
    pub mappings: Vec<Mapping>,
    pub locations: Vec<Location>,
    pub functions: Vec<Function>,
    pub comments: Vec<String>,
    pub drop_frames: String,
    pub keep_frames: String,
    pub time_nanos: i64,
    pub duration_nanos: i64,
    pub period_type: Option<ValueType>,
    pub period: i64,

    function_index: HashMap<u64, usize>,
    location_index: HashMap<u64, usize>,
}

impl ProfileGraph {
    /// Decode a pprof snapshot, gzip-compressed or raw.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let raw: Cow<'_, [u8]> = if data.starts_with(&GZIP_MAGIC) {
            let mut out = Vec::with_capacity(data.len() * 4);
            GzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(DecodeError::Gzip)?;
            Cow::Owned(out)
        } else {
            Cow::Borrowed(data)
        };

        let profile = proto::Profile::decode(raw.as_ref())?;
        Self::from_proto(profile)
    }

    /// Resolve string indices and build the id indexes
    pub fn from_proto(p: proto::Profile) -> Result<Self, DecodeError> {
        let strings = StringTable::new(&p.string_table)?;

        let sample_types = p
            .sample_type
            .iter()
            .map(|vt| strings.value_type(vt))
            .collect::<Result<Vec<_>, _>>()?;

        let samples = p
            .sample
            .iter()
            .map(|s| strings.sample(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mappings = p
            .mapping
            .iter()
            .map(|m| {
                Ok(Mapping {
                    id: m.id,
                    memory_start: m.memory_start,
                    memory_limit: m.memory_limit,
                    file_offset: m.file_offset,
                    file: strings.get(m.filename)?,
                    build_id: strings.get(m.build_id)?,
                    has_functions: m.has_functions,
                    has_filenames: m.has_filenames,
                    has_line_numbers: m.has_line_numbers,
                    has_inline_frames: m.has_inline_frames,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        let locations: Vec<Location> = p
            .location
            .iter()
            .map(|l| Location {
                id: l.id,
                mapping_id: l.mapping_id,
                address: l.address,
                lines: l
                    .line
                    .iter()
                    .map(|ln| Line {
                        function_id: ln.function_id,
                        line: ln.line,
                        column: ln.column,
                    })
                    .collect(),
                is_folded: l.is_folded,
            })
            .collect();

        let functions = p
            .function
            .iter()
            .map(|f| {
                Ok(Function {
                    id: f.id,
                    name: strings.get(f.name)?,
                    system_name: strings.get(f.system_name)?,
                    filename: strings.get(f.filename)?,
                    start_line: f.start_line,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        let comments = p
            .comment
            .iter()
            .map(|&c| strings.get(c))
            .collect::<Result<Vec<_>, _>>()?;

        let period_type = p
            .period_type
            .as_ref()
            .map(|vt| strings.value_type(vt))
            .transpose()?;

        let function_index = functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id, i))
            .collect();
        let location_index = locations
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id, i))
            .collect();

        Ok(Self {
            sample_types,
            default_sample_type: strings.get(p.default_sample_type)?,
            samples,
            mappings,
            locations,
            functions,
            comments,
            drop_frames: strings.get(p.drop_frames)?,
            keep_frames: strings.get(p.keep_frames)?,
            time_nanos: p.time_nanos,
            duration_nanos: p.duration_nanos,
            period_type,
            period: p.period,
            function_index,
            location_index,
        })
    }

    pub fn function(&self, id: u64) -> Option<&Function> {
        self.function_index.get(&id).map(|&i| &self.functions[i])
    }

    pub fn location(&self, id: u64) -> Option<&Location> {
        self.location_index.get(&id).map(|&i| &self.locations[i])
    }

    /// Locations of a sample that resolve, innermost first
    pub fn sample_locations<'a>(&'a self, sample: &'a Sample) -> impl Iterator<Item = &'a Location> {
        sample
            .location_ids
            .iter()
            .filter_map(move |&id| self.location(id))
    }

    /// Sum of `values[index]` over every sample that has that value,
    /// saturating at the `i64` bounds
    pub fn total_value(&self, index: usize) -> i64 {
        self.samples
            .iter()
            .filter_map(|s| s.values.get(index))
            .fold(0i64, |acc, &v| acc.saturating_add(v))
    }
}

struct StringTable<'a>(&'a [String]);

impl<'a> StringTable<'a> {
    fn new(table: &'a [String]) -> Result<Self, DecodeError> {
        match table.first() {
            Some(first) if first.is_empty() => Ok(Self(table)),
            _ => Err(DecodeError::StringTable),
        }
    }

    fn get(&self, index: i64) -> Result<String, DecodeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.0.get(i))
            .cloned()
            .ok_or(DecodeError::StringIndex {
                index,
                len: self.0.len(),
            })
    }

    fn value_type(&self, vt: &proto::ValueType) -> Result<ValueType, DecodeError> {
        Ok(ValueType {
            ty: self.get(vt.r#type)?,
            unit: self.get(vt.unit)?,
        })
    }

    fn sample(&self, s: &proto::Sample) -> Result<Sample, DecodeError> {
        let mut labels: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut num_labels: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        let mut num_units: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for label in &s.label {
            let key = self.get(label.key)?;
            if label.str != 0 {
                labels.entry(key).or_default().push(self.get(label.str)?);
            } else if label.num != 0 || label.num_unit != 0 {
                let unit = self.get(label.num_unit)?;
                num_labels.entry(key.clone()).or_default().push(label.num);
                num_units.entry(key).or_default().push(unit);
            }
        }
        // Units are only reported for keys where at least one was set.
        num_units.retain(|_, units| units.iter().any(|u| !u.is_empty()));

        Ok(Sample {
            location_ids: s.location_id.clone(),
            values: s.value.clone(),
            labels,
            num_labels,
            num_units,
        })
    }
}
