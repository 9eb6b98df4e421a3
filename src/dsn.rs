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

//! DSN parsing: `dynamodb://<host-or-'aws'>/<region>?option=value…`.
//!
//! Credential-bearing options (`key`, `secret`, `token`, `roleArn`, `session`,
//! `cred`, `credURL`, `credKey`, `credID`) are recognized and stripped so they
//! don't trip the "unsupported options" check, but loading the secret they
//! name is a job for the caller's AWS config layer, not this crate.

use std::collections::HashMap;

use crate::error::{Error, Result};

const SCHEME: &str = "dynamodb";
const AWS_CLOUD_ENDPOINT: &str = "aws";
const DEFAULT_EXEC_MAX_CACHE: usize = 100;

const RECOGNIZED_OPTIONS: &[&str] = &[
    "key",
    "secret",
    "token",
    "roleArn",
    "session",
    "cred",
    "credURL",
    "credKey",
    "credID",
    "execMaxCache",
];

/// A parsed `dynamodb://` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub endpoint: Option<String>,
    pub region: String,
    pub exec_max_cache: usize,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub token: Option<String>,
    pub role_arn: Option<String>,
    pub session: Option<String>,
    pub cred: Option<String>,
    pub cred_url: Option<String>,
    pub cred_key: Option<String>,
    pub cred_id: Option<String>,
}

impl Dsn {
    /// Parses a DSN string, rejecting options this driver doesn't recognize.
    pub fn parse(dsn: &str) -> Result<Self> {
        if dsn.is_empty() {
            return Err(Error::InvalidDsn("dsn was empty".to_string()));
        }
        let url = url::Url::parse(dsn).map_err(|e| Error::InvalidDsn(e.to_string()))?;
        if url.scheme() != SCHEME {
            return Err(Error::InvalidDsn(format!(
                "invalid dsn scheme, expected {SCHEME}, but had: {}",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or("");
        let endpoint = if !host.is_empty() && host != AWS_CLOUD_ENDPOINT {
            let mut host = host.to_string();
            if let Some(port) = url.port() {
                host = format!("{host}:{port}");
            }
            if !host.contains("://") {
                host = format!("http://{host}");
            }
            Some(host)
        } else {
            None
        };

        let region = url.path().trim_matches('/').to_string();

        let mut values: HashMap<String, String> = HashMap::new();
        for (k, v) in url.query_pairs() {
            values.insert(k.into_owned(), v.into_owned());
        }

        let mut exec_max_cache = DEFAULT_EXEC_MAX_CACHE;
        if let Some(v) = values.remove("execMaxCache") {
            exec_max_cache = v
                .parse()
                .map_err(|_| Error::InvalidDsn(format!("invalid execMaxCache: {v}")))?;
        }

        let cfg = Dsn {
            endpoint,
            region,
            exec_max_cache,
            key: values.remove("key"),
            secret: values.remove("secret"),
            token: values.remove("token"),
            role_arn: values.remove("roleArn"),
            session: values.remove("session"),
            cred: values.remove("cred"),
            cred_url: values.remove("credURL"),
            cred_key: values.remove("credKey"),
            cred_id: values.remove("credID"),
        };

        if !values.is_empty() {
            let mut unsupported: Vec<String> = values.into_keys().collect();
            unsupported.sort();
            return Err(Error::UnsupportedDsnOptions(unsupported));
        }

        Ok(cfg)
    }
}

/// Purely documents which query options this crate recognizes; used by
/// integrations that want to pre-validate a DSN string without parsing it.
pub fn recognized_options() -> &'static [&'static str] {
    RECOGNIZED_OPTIONS
}
