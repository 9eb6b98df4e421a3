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

//! `Open(dsn) -> Connection` (spec §6). One `Connection` owns the store
//! client, the plan cache and the execution-state pool for every statement
//! prepared from it.

use std::sync::Arc;

use crate::dsn::Dsn;
use crate::error::Result;
use crate::exec::pool::StatePool;
use crate::plan::cache::PlanCache;
use crate::plan::{self, Plan};
use crate::store::{AwsStore, StoreClient};

use super::Statement;

pub struct Connection {
    store: Arc<dyn StoreClient>,
    cache: Arc<PlanCache>,
    pool: Arc<StatePool>,
}

impl Connection {
    /// Parses `dsn` and connects to the store (spec §6 DSN grammar).
    /// `execMaxCache` (default 100, per spec §3) sizes the plan cache.
    pub async fn open(dsn: &str) -> Result<Self> {
        let parsed = Dsn::parse(dsn)?;
        let store = AwsStore::connect(&parsed).await;
        Ok(Self::from_store(Arc::new(store), parsed.exec_max_cache))
    }

    /// Builds a connection around an already-constructed store client
    /// (used by embedding applications wiring up a custom `StoreClient`,
    /// and by this crate's own tests with an in-memory fake).
    pub fn from_store(store: Arc<dyn StoreClient>, exec_max_cache: usize) -> Self {
        Connection {
            store,
            cache: Arc::new(PlanCache::new(exec_max_cache)),
            pool: Arc::new(StatePool::new()),
        }
    }

    /// Prepares `sql` into a `Statement`, consulting the plan cache first
    /// (spec §3, §4.2). On a cache miss, builds the plan once (classifying
    /// the statement, binding it against the target table's schema) and
    /// inserts it before returning.
    pub async fn prepare(&self, sql: &str) -> Result<Statement> {
        let plan = match self.cache.lookup(sql) {
            Some(plan) => {
                log::debug!("plan cache hit for `{sql}`");
                plan
            }
            None => {
                log::debug!("plan cache miss for `{sql}`, building");
                let built = plan::build(sql, self.store.as_ref()).await?;
                let arc = plan::arc(built);
                self.cache.put(arc.clone());
                arc
            }
        };
        Ok(Statement::new(plan, self.store.clone(), self.pool.clone()))
    }

    /// Direct access to the underlying plan, bypassing the cache, for
    /// callers that already hold a compiled `Plan` (e.g. a previous
    /// `prepare` whose statement was closed but the plan kept alive).
    pub fn statement_from_plan(&self, plan: Arc<Plan>) -> Statement {
        Statement::new(plan, self.store.clone(), self.pool.clone())
    }
}
