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

//! Cursor (spec §4.5): issues the PartiQL call, tracks the continuation
//! token, applies the row limit, drives the streaming decoder, and exposes
//! the relational row iterator.

use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::Result;
use crate::plan::type_model::Producer;
use crate::plan::Plan;
use crate::store::{Item, StoreClient};
use crate::value::{AttrType, ColumnValue};

use super::decode::decode_row;
use super::pool::StatePool;
use super::state::ExecState;

/// Cursor lifecycle (spec §4.5): *active* while more rows are available
/// locally or via continuation, *drained* once exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Active,
    Drained,
}

pub struct Cursor {
    plan: Arc<Plan>,
    store: Arc<dyn StoreClient>,
    pool: Arc<StatePool>,
    exec_state: Option<ExecState>,
    items: Vec<Item>,
    index: usize,
    yielded: usize,
    next_token: Option<String>,
    parameters: Vec<AttributeValue>,
    state: CursorState,
    closed: bool,
}

impl Cursor {
    /// Issues the first fetch and returns a cursor positioned before the
    /// first row (spec §4.3 `QueryContext`). `bound_args` is the caller's
    /// full positional argument list, indexed by bind position — it seeds
    /// the execution state so a projection function's extra placeholder
    /// argument (spec §4.7, e.g. `ARRAY_EXISTS(field, ?)`) can be resolved
    /// at reconcile time via `RowContext::arg_value`.
    pub async fn open(
        plan: Arc<Plan>,
        store: Arc<dyn StoreClient>,
        pool: Arc<StatePool>,
        parameters: Vec<AttributeValue>,
        bound_args: Vec<ColumnValue>,
    ) -> Result<Self> {
        let mut exec_state = pool.acquire(&plan.sql, plan.type_model.fields.len());
        exec_state.args = bound_args;
        let mut cursor = Cursor {
            plan,
            store,
            pool,
            exec_state: Some(exec_state),
            items: Vec::new(),
            index: 0,
            yielded: 0,
            next_token: None,
            parameters,
            state: CursorState::Active,
            closed: false,
        };
        cursor.fetch(None).await?;
        Ok(cursor)
    }

    async fn fetch(&mut self, token: Option<String>) -> Result<()> {
        let output = self
            .store
            .execute_statement(&self.plan.partiql, self.parameters.clone(), token)
            .await?;
        log::debug!(
            "fetched {} row(s) for plan `{}`, next_token={:?}",
            output.items.len(),
            self.plan.sql,
            output.next_token
        );
        self.items = output.items;
        self.index = 0;
        self.next_token = output.next_token;
        Ok(())
    }

    /// Advances the cursor by one row, decoding and reconciling it into
    /// `dest`. Returns `false` at end-of-stream (spec §4.5).
    pub async fn next(&mut self, dest: &mut [Option<ColumnValue>]) -> Result<bool> {
        if self.state == CursorState::Drained {
            return Ok(false);
        }
        if let Some(limit) = self.plan.limit {
            if self.yielded >= limit {
                self.state = CursorState::Drained;
                return Ok(false);
            }
        }

        if self.index >= self.items.len() {
            match self.next_token.take() {
                Some(token) => self.fetch(Some(token)).await?,
                None => {
                    self.state = CursorState::Drained;
                    return Ok(false);
                }
            }
            if self.items.is_empty() {
                self.state = CursorState::Drained;
                return Ok(false);
            }
        }

        let item = self.items[self.index].clone();
        self.index += 1;

        let exec_state = self
            .exec_state
            .as_mut()
            .expect("exec state is only taken on close");
        decode_row(&item, &self.plan.type_model, exec_state)?;
        reconcile(&self.plan, exec_state, dest)?;
        self.yielded += 1;
        Ok(true)
    }

    pub fn columns(&self) -> Vec<String> {
        self.plan.type_model.column_names()
    }

    pub fn scan_type(&self, index: usize) -> AttrType {
        self.plan.type_model.columns[index].col_type
    }

    pub fn database_type_name(&self, index: usize) -> &'static str {
        self.plan.type_model.columns[index].col_type.database_type_name()
    }

    pub fn nullable(&self, index: usize) -> bool {
        match &self.plan.type_model.columns[index].producer {
            Producer::Fields(positions) => positions
                .first()
                .map(|&p| !self.plan.type_model.fields[p].required)
                .unwrap_or(true),
            Producer::Function(_) => false,
        }
    }

    /// Releases the execution state back to the plan's pool. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(state) = self.exec_state.take() {
            self.pool.release(&self.plan.sql, state);
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

fn reconcile(plan: &Plan, state: &ExecState, dest: &mut [Option<ColumnValue>]) -> Result<()> {
    for column in &plan.type_model.columns {
        let value = match &column.producer {
            Producer::Fields(positions) => {
                let first = positions.first().copied();
                match first {
                    Some(position) => {
                        let field_value = &state.fields[position];
                        if matches!(field_value, ColumnValue::Null) {
                            column.default.clone()
                        } else {
                            Some(field_value.clone())
                        }
                    }
                    None => column.default.clone(),
                }
            }
            Producer::Function(func) => Some(func.call(state)?),
        };
        dest[column.position] = value;
    }
    Ok(())
}
