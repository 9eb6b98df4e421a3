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

//! Type Model: the joint field/column table produced by planning (spec §3,
//! §9 "cyclic references"). Fields and columns reference each other by
//! position index into these two parallel vectors, never by pointer — both
//! tables are built up while a statement is planned and then move, as plain
//! owned data, into the immutable [`crate::plan::Plan`]. That ownership
//! transfer is this crate's equivalent of the original's atomic one-shot
//! `Init` flag: once the `Plan` is behind an `Arc`, nothing can mutate it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::plan::functions::Function;
use crate::value::{AttrType, ColumnValue};

/// A storage attribute this plan reads.
#[derive(Debug, Clone)]
pub struct Field {
    pub position: usize,
    pub name: String,
    pub attr_type: AttrType,
    pub required: bool,
}

/// How a column's value is produced on each row.
#[derive(Clone)]
pub enum Producer {
    /// Simple projection: copy the first linked field (substituting the
    /// column's default when the field is absent/null).
    Fields(Vec<usize>),
    /// Computed by a registered function (spec §4.7).
    Function(Arc<dyn Function>),
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Producer::Fields(positions) => f.debug_tuple("Fields").field(positions).finish(),
            Producer::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// One projection item the caller sees.
#[derive(Debug, Clone)]
pub struct Column {
    pub position: usize,
    pub name: String,
    pub col_type: AttrType,
    pub default: Option<ColumnValue>,
    pub producer: Producer,
}

/// Returns the rightmost dotted segment of `name`, used as the field lookup
/// key (spec §3: "name (the rightmost dotted segment for lookup)").
pub fn lookup_key(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Fields + columns for one plan, plus the key-schema attribute names
/// (informational, used only by the insert planner's required-attribute
/// check).
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    pub fields: Vec<Field>,
    pub columns: Vec<Column>,
    pub key_attributes: Vec<String>,
    field_index: HashMap<String, usize>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field if one with the same lookup key isn't already present;
    /// returns its position either way.
    pub fn add_field(&mut self, name: impl Into<String>, attr_type: AttrType, required: bool) -> usize {
        let name = name.into();
        let key = lookup_key(&name).to_string();
        if let Some(&pos) = self.field_index.get(&key) {
            return pos;
        }
        let position = self.fields.len();
        self.fields.push(Field {
            position,
            name,
            attr_type,
            required,
        });
        self.field_index.insert(key, position);
        position
    }

    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.field_index.get(lookup_key(name)).copied()
    }

    /// Like [`TypeModel::add_field`], but when the field already exists
    /// (e.g. added plainly by an earlier projection item) an explicit cast
    /// wins and overwrites its attribute type (spec §4.1: cast functions
    /// "emit a field of the cast's target attribute type").
    pub fn add_field_typed(&mut self, name: impl Into<String>, attr_type: AttrType, required: bool) -> usize {
        let name = name.into();
        let key = lookup_key(&name).to_string();
        if let Some(&pos) = self.field_index.get(&key) {
            self.fields[pos].attr_type = attr_type;
            self.fields[pos].required = self.fields[pos].required || required;
            return pos;
        }
        self.add_field(name, attr_type, required)
    }

    pub fn field(&self, position: usize) -> &Field {
        &self.fields[position]
    }

    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        col_type: AttrType,
        default: Option<ColumnValue>,
        producer: Producer,
    ) -> usize {
        let position = self.columns.len();
        self.columns.push(Column {
            position,
            name: name.into(),
            col_type,
            default,
            producer,
        });
        position
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_key_strips_leading_segments() {
        assert_eq!(lookup_key("Publication.ISBN"), "ISBN");
        assert_eq!(lookup_key("ISBN"), "ISBN");
    }

    #[test]
    fn add_field_dedupes_by_lookup_key() {
        let mut model = TypeModel::new();
        let a = model.add_field("ISBN", AttrType::Str, true);
        let b = model.add_field("ISBN", AttrType::Str, true);
        assert_eq!(a, b);
        assert_eq!(model.fields.len(), 1);
    }

    #[test]
    fn field_positions_are_dense() {
        let mut model = TypeModel::new();
        model.add_field("ISBN", AttrType::Str, true);
        model.add_field("Name", AttrType::Str, false);
        assert_eq!(model.field_position("Name"), Some(1));
    }
}
