//! In-process shard with the same command and scripting semantics as the
//! remote backend: string and hash values with key-level TTL, glob
//! enumeration, scripts addressed by SHA-1, and `NOSCRIPT` for unknown
//! identifiers. Each command takes the shard lock once, so a script runs as
//! one indivisible step while the pipelined variant takes it twice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use regex::bytes::Regex;
use sha1::{Digest, Sha1};
use tokio::time::Instant;

use super::{ShardConnection, StoreError, DELETE_BY_PATTERN, HASH_SET_EXPIRE};

enum Value {
    Str(Vec<u8>),
    Hash(HashMap<Vec<u8>, Vec<u8>>),
}

struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Keyspace {
    slots: HashMap<Vec<u8>, Slot>,
}

impl Keyspace {
    fn purge_if_expired(&mut self, key: &[u8]) {
        let now = Instant::now();
        if self.slots.get(key).is_some_and(|s| s.is_expired(now)) {
            self.slots.remove(key);
        }
    }

    fn live(&mut self, key: &[u8]) -> Option<&mut Slot> {
        self.purge_if_expired(key);
        self.slots.get_mut(key)
    }

    fn hset(&mut self, key: &[u8], field: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.purge_if_expired(key);
        let slot = self.slots.entry(key.to_vec()).or_insert_with(|| Slot {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::Hash(fields) => {
                fields.insert(field.to_vec(), value.to_vec());
                Ok(())
            }
            Value::Str(_) => Err(StoreError::WrongType(String::from_utf8_lossy(key).into_owned())),
        }
    }

    fn expire(&mut self, key: &[u8], ttl_secs: u64) {
        if let Some(slot) = self.live(key) {
            slot.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
        }
    }

    fn matching(&mut self, pattern: &Regex) -> Vec<Vec<u8>> {
        let now = Instant::now();
        self.slots.retain(|_, slot| !slot.is_expired(now));
        self.slots
            .keys()
            .filter(|k| pattern.is_match(k))
            .cloned()
            .collect()
    }
}

/// In-memory [`ShardConnection`].
pub struct MemoryShard {
    id: String,
    keyspace: Mutex<Keyspace>,
    scripts: Mutex<HashMap<String, String>>,
    script_loads: AtomicUsize,
    evals: AtomicUsize,
    failing_evals: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryShard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keyspace: Mutex::new(Keyspace::default()),
            scripts: Mutex::new(HashMap::new()),
            script_loads: AtomicUsize::new(0),
            evals: AtomicUsize::new(0),
            failing_evals: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Forgets every loaded script, as a server restart would.
    pub fn flush_scripts(&self) {
        self.scripts.lock().clear();
    }

    /// Makes the next `n` script executions fail with an unknown-identifier error.
    pub fn fail_next_evals(&self, n: usize) {
        self.failing_evals.store(n, Ordering::SeqCst);
    }

    /// While offline every command fails with a backend error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn script_loads(&self) -> usize {
        self.script_loads.load(Ordering::SeqCst)
    }

    pub fn evals(&self) -> usize {
        self.evals.load(Ordering::SeqCst)
    }

    /// Live key count.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.keyspace
            .lock()
            .slots
            .values()
            .filter(|s| !s.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keyspace.lock().live(key.as_bytes()).is_some()
    }

    /// Remaining TTL in whole seconds, `-1` without expiry, `None` when missing.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        let mut ks = self.keyspace.lock();
        let slot = ks.live(key.as_bytes())?;
        Some(remaining_secs(slot))
    }

    /// TTL of the key holding `field`, observed in the same step as the field
    /// itself. `None` when the field is absent.
    pub fn hash_field_ttl(&self, key: &str, field: &str) -> Option<i64> {
        let mut ks = self.keyspace.lock();
        let slot = ks.live(key.as_bytes())?;
        match &slot.value {
            Value::Hash(fields) if fields.contains_key(field.as_bytes()) => {
                Some(remaining_secs(slot))
            }
            _ => None,
        }
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("shard {} is unreachable", self.id)));
        }
        Ok(())
    }

    fn run_script(
        &self,
        body: &str,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Result<Vec<String>, StoreError> {
        let mut ks = self.keyspace.lock();
        if body == HASH_SET_EXPIRE.body {
            let (key, field) = match keys {
                [key, field, ..] => (*key, *field),
                _ => return Err(StoreError::Backend("wrong number of keys".to_string())),
            };
            let (value, ttl) = match args {
                [value, ttl, ..] => (*value, parse_ttl(ttl)?),
                _ => return Err(StoreError::Backend("wrong number of args".to_string())),
            };
            ks.hset(key, field, value)?;
            ks.expire(key, ttl);
            Ok(Vec::new())
        } else if body == DELETE_BY_PATTERN.body {
            let pattern = keys
                .first()
                .ok_or_else(|| StoreError::Backend("wrong number of keys".to_string()))?;
            let matcher = glob_to_regex(pattern)?;
            let matched = ks.matching(&matcher);
            for key in &matched {
                ks.slots.remove(key);
            }
            Ok(matched
                .into_iter()
                .map(|k| String::from_utf8_lossy(&k).into_owned())
                .collect())
        } else {
            Err(StoreError::Backend("script not supported by memory shard".to_string()))
        }
    }
}

#[async_trait::async_trait]
impl ShardConnection for MemoryShard {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_online()?;
        let mut ks = self.keyspace.lock();
        match ks.live(key) {
            None => Ok(None),
            Some(Slot { value: Value::Str(v), .. }) => Ok(Some(v.clone())),
            Some(_) => Err(StoreError::WrongType(String::from_utf8_lossy(key).into_owned())),
        }
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: u64) -> Result<(), StoreError> {
        self.ensure_online()?;
        let expires_at = (ttl_secs > 0).then(|| Instant::now() + Duration::from_secs(ttl_secs));
        self.keyspace.lock().slots.insert(
            key.to_vec(),
            Slot {
                value: Value::Str(value.to_vec()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_online()?;
        let mut ks = self.keyspace.lock();
        match ks.live(key) {
            None => Ok(None),
            Some(Slot { value: Value::Hash(fields), .. }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(StoreError::WrongType(String::from_utf8_lossy(key).into_owned())),
        }
    }

    async fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.keyspace.lock().hset(key, field, value)
    }

    async fn hset_expire_pipelined(
        &self,
        key: &[u8],
        field: &[u8],
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        // Two commands, two lock acquisitions: readers can land in between.
        self.keyspace.lock().hset(key, field, value)?;
        tokio::task::yield_now().await;
        self.keyspace.lock().expire(key, ttl_secs);
        Ok(())
    }

    async fn hdel(&self, key: &[u8], field: &[u8]) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut ks = self.keyspace.lock();
        let now_empty = match ks.live(key) {
            Some(Slot { value: Value::Hash(fields), .. }) => {
                fields.remove(field);
                fields.is_empty()
            }
            Some(_) => {
                return Err(StoreError::WrongType(String::from_utf8_lossy(key).into_owned()))
            }
            None => false,
        };
        if now_empty {
            ks.slots.remove(key);
        }
        Ok(())
    }

    async fn del(&self, key: &[u8]) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.keyspace.lock().slots.remove(key);
        Ok(())
    }

    async fn flush_db(&self) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.keyspace.lock().slots.clear();
        Ok(())
    }

    async fn script_load(&self, body: &str) -> Result<String, StoreError> {
        self.ensure_online()?;
        self.script_loads.fetch_add(1, Ordering::SeqCst);
        let sha = hex::encode(Sha1::digest(body.as_bytes()));
        self.scripts.lock().insert(sha.clone(), body.to_string());
        Ok(sha)
    }

    async fn eval_sha(
        &self,
        sha: &str,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Result<Vec<String>, StoreError> {
        self.ensure_online()?;
        self.evals.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .failing_evals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::NoScript(format!(
                "NOSCRIPT No matching script. Please use EVAL. ({sha})"
            )));
        }

        let body = self.scripts.lock().get(sha).cloned();
        match body {
            Some(body) => self.run_script(&body, keys, args),
            None => Err(StoreError::NoScript(format!(
                "NOSCRIPT No matching script. Please use EVAL. ({sha})"
            ))),
        }
    }
}

fn remaining_secs(slot: &Slot) -> i64 {
    match slot.expires_at {
        None => -1,
        Some(at) => {
            let left = at.saturating_duration_since(Instant::now());
            // Round up like the server does for a freshly set TTL.
            ((left.as_millis() as i64) + 999) / 1000
        }
    }
}

fn parse_ttl(raw: &[u8]) -> Result<u64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| StoreError::Backend("value is not an integer".to_string()))
}

/// Translates a glob (`*`, `?`, `[...]`, `\x`) into an anchored byte regex.
pub(crate) fn glob_to_regex(pattern: &[u8]) -> Result<Regex, StoreError> {
    let pattern = String::from_utf8_lossy(pattern);
    let mut re = String::with_capacity(pattern.len() * 2 + 8);
    re.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    re.push_str(&regex::escape(&next.to_string()));
                }
            }
            '[' => {
                re.push('[');
                let mut first = true;
                for inner in chars.by_ref() {
                    match inner {
                        ']' => break,
                        '^' if first => re.push('^'),
                        '\\' | '[' | '&' | '~' => {
                            re.push('\\');
                            re.push(inner);
                        }
                        _ => re.push(inner),
                    }
                    first = false;
                }
                re.push(']');
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| StoreError::Backend(format!("invalid pattern: {e}")))
}
