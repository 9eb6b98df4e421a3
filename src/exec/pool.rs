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

//! A bounded per-plan free-list of [`ExecState`] buffers (spec §9 "plan
//! pooling"): acquired before a statement executes, released when its
//! cursor closes. A fresh allocation on miss is always acceptable, so the
//! pool never blocks and never grows without bound beyond what concurrent
//! in-flight statements actually need.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::state::ExecState;

const MAX_POOLED_PER_PLAN: usize = 16;

/// Keyed by the plan's SQL text, since each distinct plan owns its own
/// free-list (spec §3: "Execution State is acquired from the plan's pool").
#[derive(Default)]
pub struct StatePool {
    free_lists: Mutex<HashMap<String, Vec<ExecState>>>,
}

impl StatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, plan_sql: &str, field_count: usize) -> ExecState {
        let mut free_lists = self.free_lists.lock();
        if let Some(list) = free_lists.get_mut(plan_sql) {
            if let Some(mut state) = list.pop() {
                state.reset_fields();
                state.args.clear();
                return state;
            }
        }
        ExecState::new(field_count)
    }

    pub fn release(&self, plan_sql: &str, state: ExecState) {
        let mut free_lists = self.free_lists.lock();
        let list = free_lists.entry(plan_sql.to_string()).or_default();
        if list.len() < MAX_POOLED_PER_PLAN {
            list.push(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ColumnValue;

    #[test]
    fn released_states_are_reused() {
        let pool = StatePool::new();
        let mut state = pool.acquire("SELECT 1", 2);
        state.fields[0] = ColumnValue::Int(7);
        pool.release("SELECT 1", state);

        let reused = pool.acquire("SELECT 1", 2);
        assert_eq!(reused.fields, vec![ColumnValue::Null, ColumnValue::Null]);
    }

    #[test]
    fn miss_allocates_fresh_state() {
        let pool = StatePool::new();
        let state = pool.acquire("SELECT 1", 3);
        assert_eq!(state.fields.len(), 3);
    }
}
