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

//! `Statement` (spec §6, §4.3): `NumInput`, `Exec` and `Query` over one
//! compiled `Plan`.

use std::sync::Arc;

use crate::error::Result;
use crate::exec::cursor::Cursor;
use crate::exec::ddl_driver;
use crate::exec::pool::StatePool;
use crate::plan::Plan;
use crate::store::StoreClient;
use crate::value::ColumnValue;

use super::{bind_parameters, Rows};

pub struct Statement {
    plan: Arc<Plan>,
    store: Arc<dyn StoreClient>,
    pool: Arc<StatePool>,
}

impl Statement {
    pub(crate) fn new(plan: Arc<Plan>, store: Arc<dyn StoreClient>, pool: Arc<StatePool>) -> Self {
        Statement { plan, store, pool }
    }

    /// The number of `?` placeholders this statement expects (spec §6).
    pub fn num_input(&self) -> usize {
        self.plan.num_input()
    }

    pub fn plan(&self) -> &Arc<Plan> {
        &self.plan
    }

    /// Runs a DDL/insert/update/delete plan to completion (spec §4.3
    /// `ExecContext`). Returns the number of affected rows: `0` for DDL,
    /// `1` on a successful insert/update/delete.
    pub async fn exec(&self, args: Vec<ColumnValue>) -> Result<u64> {
        if self.plan.ddl.is_some() {
            ddl_driver::execute(&self.plan, self.store.as_ref()).await?;
            return Ok(0);
        }

        let parameters = bind_parameters(&self.plan.params, &args)?;
        self.store
            .execute_statement(&self.plan.partiql, parameters, None)
            .await?;
        Ok(1)
    }

    /// Runs a query plan, issuing the first fetch and returning the row
    /// cursor (spec §4.3 `QueryContext`).
    pub async fn query(&self, args: Vec<ColumnValue>) -> Result<Rows> {
        let parameters = bind_parameters(&self.plan.params, &args)?;
        let cursor = Cursor::open(
            self.plan.clone(),
            self.store.clone(),
            self.pool.clone(),
            parameters,
            args,
        )
        .await?;
        Ok(Rows::new(cursor))
    }

    /// No resources are held directly by a `Statement` (the plan is shared
    /// via `Arc`, and execution state lives only inside a `Rows`'s cursor),
    /// so closing one is a no-op kept for symmetry with the driver contract
    /// (spec §6).
    pub fn close(&self) {}
}
