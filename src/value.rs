// Copyright 2024 The Dynabridge Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Attribute-type model and value encoding (spec §4.8, §9 "dynamic attribute
//! values"). The store's tagged-union attribute value maps directly onto
//! [`aws_sdk_dynamodb::types::AttributeValue`], reused as-is rather than
//! reinvented. `ColumnValue` is the driver-side counterpart used both as a
//! bind argument (caller → store) and as a scan destination (store →
//! caller).

use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::{Error, Result};

/// One of the attribute types a stored field or a projected column can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Str,
    /// `N`, decoded as an integer.
    Int,
    /// `N`, decoded as a float (declared via a `DECIMAL`/`DECIMALS` cast, or
    /// discovered when a wildcard/unknown `N` value contains a `.`).
    Float,
    Bytes,
    Bool,
    StringSet,
    IntSet,
    FloatSet,
    ByteSet,
    List,
    Map,
    Null,
}

impl AttrType {
    /// The single JSON envelope key the store wraps this type's payload in.
    pub fn envelope_key(self) -> &'static str {
        match self {
            AttrType::Str => "S",
            AttrType::Int | AttrType::Float => "N",
            AttrType::Bytes => "B",
            AttrType::Bool => "BOOL",
            AttrType::StringSet => "SS",
            AttrType::IntSet | AttrType::FloatSet => "NS",
            AttrType::ByteSet => "BS",
            AttrType::List => "L",
            AttrType::Map => "M",
            AttrType::Null => "NULL",
        }
    }

    /// The database type name `Rows::column_type_database_type_name` reports
    /// (spec §4.5).
    pub fn database_type_name(self) -> &'static str {
        match self {
            AttrType::Str => "STRING",
            AttrType::Int => "INT",
            AttrType::Float => "DECIMAL",
            AttrType::Bytes | AttrType::ByteSet => "BYTES",
            AttrType::Bool => "BOOLEAN",
            AttrType::StringSet => "STRINGS",
            AttrType::IntSet => "INTS",
            AttrType::FloatSet => "DECIMALS",
            AttrType::List => "LIST",
            AttrType::Map => "MAP",
            AttrType::Null => "STRING",
        }
    }

    /// Resolves an envelope key (as seen on the wire, or mapped from a DDL
    /// column type) into an `AttrType`. `n_is_float` distinguishes `N`/`NS`
    /// discovered with a decimal point from plain integers.
    pub fn from_envelope_key(key: &str, n_is_float: bool) -> Option<Self> {
        Some(match key {
            "S" => AttrType::Str,
            "N" if n_is_float => AttrType::Float,
            "N" => AttrType::Int,
            "B" => AttrType::Bytes,
            "BOOL" => AttrType::Bool,
            "SS" => AttrType::StringSet,
            "NS" if n_is_float => AttrType::FloatSet,
            "NS" => AttrType::IntSet,
            "BS" => AttrType::ByteSet,
            "L" => AttrType::List,
            "M" => AttrType::Map,
            "NULL" => AttrType::Null,
            _ => return None,
        })
    }
}

/// A decoded field/column value, or a caller-bound argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Bool(bool),
    StringSet(Vec<String>),
    IntSet(Vec<i64>),
    FloatSet(Vec<f64>),
    ByteSet(Vec<Vec<u8>>),
    List(Vec<ColumnValue>),
    Map(BTreeMap<String, ColumnValue>),
    Null,
}

impl ColumnValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            ColumnValue::Str(_) => AttrType::Str,
            ColumnValue::Int(_) => AttrType::Int,
            ColumnValue::Float(_) => AttrType::Float,
            ColumnValue::Bytes(_) => AttrType::Bytes,
            ColumnValue::Bool(_) => AttrType::Bool,
            ColumnValue::StringSet(_) => AttrType::StringSet,
            ColumnValue::IntSet(_) => AttrType::IntSet,
            ColumnValue::FloatSet(_) => AttrType::FloatSet,
            ColumnValue::ByteSet(_) => AttrType::ByteSet,
            ColumnValue::List(_) => AttrType::List,
            ColumnValue::Map(_) => AttrType::Map,
            ColumnValue::Null => AttrType::Null,
        }
    }
}

/// Formats an integer the way the original encodes `NS`/`N` members: plain
/// base-10.
pub fn format_int(v: i64) -> String {
    v.to_string()
}

/// Formats a float the way the original encodes `NS`/`N` members: fixed
/// point, 10 digits after the decimal (spec §4.8, §B).
pub fn format_float(v: f64) -> String {
    format!("{v:.10}")
}

/// Encodes a caller-bound argument into the wire attribute-value envelope
/// (spec §4.8): string slices become `SS`; int/float slices become `NS`
/// (formatted per [`format_int`]/[`format_float`]); everything else maps
/// onto the matching scalar/composite `AttributeValue` variant directly.
pub fn encode_argument(value: &ColumnValue) -> Result<AttributeValue> {
    Ok(match value {
        ColumnValue::Str(s) => AttributeValue::S(s.clone()),
        ColumnValue::Int(i) => AttributeValue::N(format_int(*i)),
        ColumnValue::Float(f) => AttributeValue::N(format_float(*f)),
        ColumnValue::Bytes(b) => AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(b.clone())),
        ColumnValue::Bool(b) => AttributeValue::Bool(*b),
        ColumnValue::StringSet(items) => AttributeValue::Ss(items.clone()),
        ColumnValue::IntSet(items) => {
            AttributeValue::Ns(items.iter().map(|v| format_int(*v)).collect())
        }
        ColumnValue::FloatSet(items) => {
            AttributeValue::Ns(items.iter().map(|v| format_float(*v)).collect())
        }
        ColumnValue::ByteSet(items) => AttributeValue::Bs(
            items
                .iter()
                .map(|b| aws_sdk_dynamodb::primitives::Blob::new(b.clone()))
                .collect(),
        ),
        ColumnValue::List(items) => {
            let encoded: Result<Vec<_>> = items.iter().map(encode_argument).collect();
            AttributeValue::L(encoded?)
        }
        ColumnValue::Map(m) => {
            let mut encoded = std::collections::HashMap::with_capacity(m.len());
            for (k, v) in m {
                encoded.insert(k.clone(), encode_argument(v)?);
            }
            AttributeValue::M(encoded)
        }
        ColumnValue::Null => AttributeValue::Null(true),
    })
}

/// Decodes a store-returned `AttributeValue` envelope into a `ColumnValue`,
/// honoring `declared` when the field's attribute type was established by
/// schema or a cast (so `N` decodes as the declared int/float kind rather
/// than guessing).
pub fn decode_attribute_value(value: &AttributeValue, declared: Option<AttrType>) -> Result<ColumnValue> {
    Ok(match value {
        AttributeValue::S(s) => ColumnValue::Str(s.clone()),
        AttributeValue::N(n) => {
            if matches!(declared, Some(AttrType::Float)) || n.contains('.') {
                ColumnValue::Float(n.parse().map_err(|_| {
                    Error::Decode {
                        message: format!("invalid N literal: {n}"),
                        snapshot: n.clone(),
                    }
                })?)
            } else {
                ColumnValue::Int(n.parse().map_err(|_| Error::Decode {
                    message: format!("invalid N literal: {n}"),
                    snapshot: n.clone(),
                })?)
            }
        }
        AttributeValue::B(b) => ColumnValue::Bytes(b.clone().into_inner()),
        AttributeValue::Bool(b) => ColumnValue::Bool(*b),
        AttributeValue::Ss(items) => ColumnValue::StringSet(items.clone()),
        AttributeValue::Ns(items) => {
            if matches!(declared, Some(AttrType::FloatSet)) {
                let parsed: std::result::Result<Vec<f64>, _> = items.iter().map(|v| v.parse()).collect();
                ColumnValue::FloatSet(parsed.map_err(|_| Error::Decode {
                    message: "invalid NS literal".to_string(),
                    snapshot: items.join(","),
                })?)
            } else {
                let parsed: std::result::Result<Vec<i64>, _> = items.iter().map(|v| v.parse()).collect();
                ColumnValue::IntSet(parsed.map_err(|_| Error::Decode {
                    message: "invalid NS literal".to_string(),
                    snapshot: items.join(","),
                })?)
            }
        }
        AttributeValue::Bs(items) => {
            ColumnValue::ByteSet(items.iter().map(|b| b.clone().into_inner()).collect())
        }
        AttributeValue::L(items) => {
            let decoded: Result<Vec<_>> = items
                .iter()
                .map(|item| decode_attribute_value(item, None))
                .collect();
            ColumnValue::List(decoded?)
        }
        AttributeValue::M(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(k.clone(), decode_attribute_value(v, None)?);
            }
            ColumnValue::Map(out)
        }
        AttributeValue::Null(_) => ColumnValue::Null,
        other => {
            return Err(Error::Decode {
                message: format!("unsupported attribute value variant: {other:?}"),
                snapshot: String::new(),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_floats_fixed_point_10() {
        assert_eq!(format_float(3.5), "3.5000000000");
    }

    #[test]
    fn encodes_string_set_and_number_set() {
        let ss = encode_argument(&ColumnValue::StringSet(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(ss, AttributeValue::Ss(vec!["a".into(), "b".into()]));

        let ns = encode_argument(&ColumnValue::IntSet(vec![1, 2, 3])).unwrap();
        assert_eq!(
            ns,
            AttributeValue::Ns(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn decodes_n_as_int_by_default() {
        let decoded = decode_attribute_value(&AttributeValue::N("42".into()), None).unwrap();
        assert_eq!(decoded, ColumnValue::Int(42));
    }

    #[test]
    fn decodes_n_as_float_when_declared_or_containing_dot() {
        let decoded = decode_attribute_value(&AttributeValue::N("42".into()), Some(AttrType::Float)).unwrap();
        assert_eq!(decoded, ColumnValue::Float(42.0));

        let decoded = decode_attribute_value(&AttributeValue::N("3.5".into()), None).unwrap();
        assert_eq!(decoded, ColumnValue::Float(3.5));
    }

    #[test]
    fn round_trips_list_values() {
        let value = ColumnValue::List(vec![ColumnValue::Int(1), ColumnValue::Str("x".into())]);
        let encoded = encode_argument(&value).unwrap();
        let decoded = decode_attribute_value(&encoded, None).unwrap();
        assert_eq!(decoded, value);
    }
}
