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

//! Execution State (spec §3): the per-call buffer a statement execution
//! draws from the plan's pool. Holds one decoded value per field (reset to
//! `Null` before each row so a previous row's slice-typed field doesn't leak
//! into a row where the attribute is absent) and the caller's bound
//! arguments, indexed by bind position.

use crate::plan::functions::RowContext;
use crate::value::ColumnValue;

#[derive(Debug, Clone)]
pub struct ExecState {
    pub fields: Vec<ColumnValue>,
    pub args: Vec<ColumnValue>,
}

impl ExecState {
    pub fn new(field_count: usize) -> Self {
        ExecState {
            fields: vec![ColumnValue::Null; field_count],
            args: Vec::new(),
        }
    }

    /// Resets every field slot to `Null` (spec §4.5 step 3: "slice-typed
    /// fields are reset to an empty slice... before each row's decode").
    pub fn reset_fields(&mut self) {
        for field in &mut self.fields {
            *field = ColumnValue::Null;
        }
    }
}

impl RowContext for ExecState {
    fn field_value(&self, position: usize) -> &ColumnValue {
        &self.fields[position]
    }

    fn arg_value(&self, bind_position: usize) -> &ColumnValue {
        &self.args[bind_position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_every_field_to_null() {
        let mut state = ExecState::new(2);
        state.fields[0] = ColumnValue::Str("x".into());
        state.fields[1] = ColumnValue::Int(1);
        state.reset_fields();
        assert_eq!(state.fields, vec![ColumnValue::Null, ColumnValue::Null]);
    }
}
