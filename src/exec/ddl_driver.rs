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

//! Table DDL driver (spec §4.6): issues the `CREATE TABLE`/`DROP TABLE`
//! call, then polls `describe_table` every [`POLL_INTERVAL`] up to
//! [`POLL_TIMEOUT`] wall-clock time waiting for the table to settle: for a
//! create, that means the table is no longer in the `CREATING` state, or
//! has disappeared entirely; for a drop, that the table is absent. A poll
//! that never converges is not reported as an error — execution just
//! returns with whatever state was last observed, matching the original's
//! "best effort" table-readiness wait rather than a hard deadline failure.

use std::time::Duration;

use crate::error::Result;
use crate::plan::{Ddl, Plan};
use crate::store::StoreClient;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a `CreateTable`/`DropTable` plan to completion (spec §4.6). Returns
/// once the table settles, or once the timeout elapses — whichever first.
pub async fn execute(plan: &Plan, store: &dyn StoreClient) -> Result<()> {
    match plan
        .ddl
        .as_ref()
        .expect("ddl_driver::execute is only called for DDL plans")
    {
        Ddl::CreateTable { if_not_exists, request } => {
            match store.create_table(request.clone()).await {
                Ok(()) => {}
                Err(err) if *if_not_exists && is_idempotent_noop(&err) => {
                    log::debug!("table `{}` already exists, IF NOT EXISTS honored", request.table_name);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            wait_until(store, &request.table_name, |description| match description {
                Some(table) => !table.creating,
                None => true,
            })
            .await;
        }
        Ddl::DropTable { if_exists, table_name } => {
            match store.delete_table(table_name).await {
                Ok(()) => {}
                Err(err) if *if_exists && is_idempotent_noop(&err) => {
                    log::debug!("table `{table_name}` already absent, IF EXISTS honored");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            wait_until(store, table_name, |description| description.is_none()).await;
        }
    }
    Ok(())
}

/// True for the terminal-state errors that make `IF NOT EXISTS`/`IF EXISTS`
/// a no-op rather than a failure: the table already exists (create) or is
/// already gone (drop).
fn is_idempotent_noop(err: &crate::error::Error) -> bool {
    use crate::error::{Error, TransportError};
    match err {
        Error::Transport(TransportError::ResourceNotFound(_)) => true,
        Error::Transport(TransportError::Generic { code, .. }) => code.contains("ResourceInUse"),
        _ => false,
    }
}

/// Polls `describe_table` until `done` is satisfied or [`POLL_TIMEOUT`]
/// elapses. Never surfaces a timeout; a describe error during polling also
/// just ends the wait rather than failing the whole DDL statement, since the
/// create/drop call itself already succeeded.
async fn wait_until<F>(store: &dyn StoreClient, table_name: &str, done: F)
where
    F: Fn(Option<&crate::store::TableDescription>) -> bool,
{
    let deadline = tokio::time::Instant::now() + POLL_TIMEOUT;
    loop {
        match store.describe_table(table_name).await {
            Ok(description) => {
                if done(description.as_ref()) {
                    return;
                }
            }
            Err(err) => {
                log::warn!("describe_table(`{table_name}`) failed while polling: {err}");
                return;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            log::warn!("timed out waiting for `{table_name}` to settle after {POLL_TIMEOUT:?}");
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
