//! Short external tokens ("hashes") for cards and columns.
//!
//! Hashes look like `card-x7q2` / `col-0k9a`: a namespace prefix plus four
//! base-36 characters (1,679,616 values per namespace). The registry keeps no
//! state of its own; collision checks run against the hashes already present
//! on the board snapshot, and idempotency records live on the board too.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use taskboard_core::config::DEFAULT_HASH_RETRY_LIMIT;
use taskboard_core::{AppConfig, TaskboardError, TaskboardResult};
use uuid::Uuid;

use crate::board::Board;

pub const HASH_LENGTH: usize = 4;
pub const HASH_SPACE: u32 = 36 * 36 * 36 * 36;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HashNamespace {
    Card,
    Column,
}

impl HashNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            HashNamespace::Card => "card",
            HashNamespace::Column => "col",
        }
    }

    /// Whether `hash` is well-formed for this namespace.
    pub fn accepts(self, hash: &str) -> bool {
        hash.strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|token| {
                token.len() == HASH_LENGTH
                    && token
                        .bytes()
                        .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
            })
    }
}

impl fmt::Display for HashNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashNamespace::Card => write!(f, "card"),
            HashNamespace::Column => write!(f, "column"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyRecord {
    pub namespace: HashNamespace,
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct ExternalIdentityRegistry {
    retry_limit: u32,
}

impl Default for ExternalIdentityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_RETRY_LIMIT)
    }
}

impl ExternalIdentityRegistry {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            retry_limit: retry_limit.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.hash_retry_limit)
    }

    /// Draw a fresh hash for `namespace` that is not in `in_use`.
    ///
    /// Gives up with `HashCollision` after the configured number of draws.
    pub fn assign_hash<R: Rng>(
        &self,
        namespace: HashNamespace,
        in_use: &HashSet<String>,
        rng: &mut R,
    ) -> TaskboardResult<String> {
        for attempt in 1..=self.retry_limit {
            let candidate = format!("{}-{}", namespace.prefix(), random_token(rng));
            if !in_use.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(
                "Hash {} already taken (attempt {}/{})",
                candidate,
                attempt,
                self.retry_limit
            );
        }
        tracing::warn!(
            "Exhausted {} attempts assigning a {} hash ({} in use)",
            self.retry_limit,
            namespace,
            in_use.len()
        );
        Err(TaskboardError::HashCollision {
            namespace: namespace.to_string(),
            attempts: self.retry_limit,
        })
    }

    /// Return the entity's hash, assigning one first if it has none.
    ///
    /// An assigned hash is never replaced.
    pub fn ensure_hash<R: Rng>(
        &self,
        board: &Board,
        namespace: HashNamespace,
        id: Uuid,
        rng: &mut R,
    ) -> TaskboardResult<(Board, String)> {
        let existing = match namespace {
            HashNamespace::Card => board.require_card(id)?.hash.clone(),
            HashNamespace::Column => board.require_column(id)?.hash.clone(),
        };
        if let Some(hash) = existing {
            return Ok((board.clone(), hash));
        }

        let hash = self.assign_hash(namespace, &hashes_in_use(board, namespace), rng)?;
        let mut next = board.clone();
        match namespace {
            HashNamespace::Card => {
                if let Some(card) = next.cards.get_mut(&id) {
                    card.hash = Some(hash.clone());
                }
            }
            HashNamespace::Column => {
                if let Some(column) = next.columns.get_mut(&id) {
                    column.hash = Some(hash.clone());
                }
            }
        }
        next.touch(Utc::now());
        tracing::debug!("Assigned {} to {} {}", hash, namespace, id);
        Ok((next, hash))
    }
}

fn random_token<R: Rng>(rng: &mut R) -> String {
    (0..HASH_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn hashes_in_use(board: &Board, namespace: HashNamespace) -> HashSet<String> {
    match namespace {
        HashNamespace::Card => board
            .cards
            .values()
            .filter_map(|c| c.hash.clone())
            .collect(),
        HashNamespace::Column => board
            .columns
            .values()
            .filter_map(|c| c.hash.clone())
            .collect(),
    }
}

/// Find the internal id carrying `hash`.
///
/// Linear scan; fine at board scale.
pub fn resolve(board: &Board, namespace: HashNamespace, hash: &str) -> TaskboardResult<Uuid> {
    let found = match namespace {
        HashNamespace::Card => board
            .cards
            .values()
            .find(|c| c.hash.as_deref() == Some(hash))
            .map(|c| c.id),
        HashNamespace::Column => board
            .columns
            .values()
            .find(|c| c.hash.as_deref() == Some(hash))
            .map(|c| c.id),
    };
    found.ok_or_else(|| match namespace {
        HashNamespace::Card => TaskboardError::CardNotFound(hash.to_string()),
        HashNamespace::Column => TaskboardError::ColumnNotFound(hash.to_string()),
    })
}

/// Map key for an idempotency record; the same caller key may be used once
/// per namespace.
fn idempotency_slot(namespace: HashNamespace, key: &str) -> String {
    format!("{}:{}", namespace.prefix(), key)
}

/// Hash previously minted under `key`, if that create already happened.
pub fn find_idempotent<'a>(
    board: &'a Board,
    namespace: HashNamespace,
    key: &str,
) -> Option<&'a str> {
    board
        .idempotency_keys
        .get(&idempotency_slot(namespace, key))
        .filter(|record| record.namespace == namespace)
        .map(|record| record.hash.as_str())
}

pub fn record_idempotency_key(
    board: &Board,
    namespace: HashNamespace,
    key: &str,
    hash: &str,
) -> Board {
    let mut next = board.clone();
    next.idempotency_keys.insert(
        idempotency_slot(namespace, key),
        IdempotencyRecord {
            namespace,
            hash: hash.to_string(),
        },
    );
    next
}
