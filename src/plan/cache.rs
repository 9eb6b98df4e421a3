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

//! Plan Cache (spec §3, §4.2): a process-wide bounded mapping from SQL text
//! to compiled plan, all-or-nothing on eviction. Grounded directly on the
//! original's `executions` struct (`execution.go`): one reader-writer lock
//! guarding an index map plus a flat list, not a sharded concurrent map —
//! the all-or-nothing eviction has to clear both structures atomically,
//! which a sharded map can't express as a single operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Plan;

struct Inner {
    cache: HashMap<String, usize>,
    plans: Vec<Arc<Plan>>,
}

/// Capacity `< 1` disables caching entirely (spec §4.2, §B).
pub struct PlanCache {
    max_size: usize,
    inner: RwLock<Inner>,
}

impl PlanCache {
    pub fn new(max_size: usize) -> Self {
        PlanCache {
            max_size,
            inner: RwLock::new(Inner {
                cache: HashMap::new(),
                plans: Vec::new(),
            }),
        }
    }

    pub fn lookup(&self, sql: &str) -> Option<Arc<Plan>> {
        let inner = self.inner.read();
        let position = *inner.cache.get(sql)?;
        inner.plans.get(position).cloned()
    }

    pub fn put(&self, plan: Arc<Plan>) {
        if self.max_size < 1 {
            return;
        }
        let mut inner = self.inner.write();
        if inner.plans.len() + 1 > self.max_size {
            log::debug!("plan cache at capacity ({}), clearing", self.max_size);
            inner.cache.clear();
            inner.plans.clear();
        }
        let position = inner.plans.len();
        inner.cache.insert(plan.sql.clone(), position);
        inner.plans.push(plan);
    }
}
