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

//! Parameter Registry (spec §3): list parameters (INSERT/UPDATE values) and
//! criteria parameters (WHERE), sharing one `BindingLen` counter so bind
//! positions are assigned in the order the planner visits placeholders
//! across both lists.

use crate::value::ColumnValue;

/// What a parameter resolves to at bind time.
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// A concrete value already known at plan time (e.g. `1=1`'s `1`, or a
    /// literal passed to `ARRAY_EXISTS`).
    Literal(ColumnValue),
    /// A `?` placeholder; resolved from the caller's positional arguments at
    /// bind time.
    Placeholder { bind_position: usize },
    /// References a field by position (rarely used directly as a parameter,
    /// but kept for symmetry with the original's parameter kinds).
    Field(usize),
    /// References a column by position.
    Column(usize),
}

/// One registered parameter: its source-identifier name (the left-hand side
/// of the comparison it came from, or the target column for INSERT/UPDATE)
/// plus its kind.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
}

/// Two ordered placeholder lists sharing one bind-position counter, plus a
/// third list for placeholders a function constructor registers as an extra
/// call argument (spec §4.7) rather than a value that appears literally as a
/// `?` in the rendered PartiQL text — `ARRAY_EXISTS(field, ?)`'s second
/// argument is resolved from the caller's bound argument at call time, but
/// never sent to the store, since the projection function runs client-side.
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    pub list_params: Vec<Parameter>,
    pub criteria_params: Vec<Parameter>,
    pub function_params: Vec<Parameter>,
    binding_len: usize,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `?` placeholders registered so far across both
    /// lists; this is what `Statement::NumInput` reports.
    pub fn num_input(&self) -> usize {
        self.binding_len
    }

    fn next_binding(&mut self) -> usize {
        let position = self.binding_len;
        self.binding_len += 1;
        position
    }

    /// Registers a `?` appearing in an INSERT/UPDATE value position.
    pub fn push_list_placeholder(&mut self, name: impl Into<String>) -> usize {
        let bind_position = self.next_binding();
        self.list_params.push(Parameter {
            name: name.into(),
            kind: ParamKind::Placeholder { bind_position },
        });
        bind_position
    }

    /// Registers a literal value appearing in an INSERT/UPDATE value
    /// position.
    pub fn push_list_literal(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.list_params.push(Parameter {
            name: name.into(),
            kind: ParamKind::Literal(value),
        });
    }

    /// Registers a `?` appearing in a WHERE clause (including inside an
    /// `IN (...)` list).
    pub fn push_criteria_placeholder(&mut self, name: impl Into<String>) -> usize {
        let bind_position = self.next_binding();
        self.criteria_params.push(Parameter {
            name: name.into(),
            kind: ParamKind::Placeholder { bind_position },
        });
        bind_position
    }

    /// Registers a `?` passed as a function constructor's extra call
    /// argument (spec §4.7, e.g. `ARRAY_EXISTS(field, ?)`). Shares the same
    /// bind-position counter as the other two lists, but is kept separate
    /// since it never appears literally in the plan's PartiQL text.
    pub fn push_function_placeholder(&mut self, name: impl Into<String>) -> usize {
        let bind_position = self.next_binding();
        self.function_params.push(Parameter {
            name: name.into(),
            kind: ParamKind::Placeholder { bind_position },
        });
        bind_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_positions_are_shared_across_lists() {
        let mut registry = ParamRegistry::new();
        let a = registry.push_list_placeholder("Name");
        let b = registry.push_criteria_placeholder("ISBN");
        let c = registry.push_list_placeholder("Published");
        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(registry.num_input(), 3);
    }
}
