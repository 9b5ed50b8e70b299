//! Changesets: staged batches of record set additions and removals.
//!
//! A [`Changeset`] moves through `Building -> Applying -> {Committed, Rejected}`.
//! While building it accepts [`add`](Changeset::add), [`remove`](Changeset::remove)
//! and [`upsert`](Changeset::upsert); [`apply`](Changeset::apply) is terminal and
//! every later call fails with [`ProviderError::InvalidState`].
//!
//! The batch rules live in [`check_batch`] and [`plan_batch`] so that real and
//! stub backends enforce exactly the same semantics:
//!
//! - an add conflicts with a key that already exists, unless the same batch
//!   removes that key (remove + add is a replace);
//! - two adds of one key conflict unless a remove of that key sits between them;
//! - a remove of a missing key fails, unless an earlier add in the batch
//!   created it;
//! - an upsert never conflicts with stored state.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{ProviderError, Result};
use crate::types::{RecordKey, ResourceRecordSet};
use crate::utils::log_sanitizer::summarize_values;

// ============ Change Model ============

/// What a staged change does to its identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Create; the key must not exist.
    Add,
    /// Delete; the key must exist. Matched by key, not by value.
    Remove,
    /// Create or replace.
    Upsert,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Upsert => "upsert",
        })
    }
}

/// One staged operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub action: ChangeAction,
    pub rrset: ResourceRecordSet,
}

/// Anything that can be validated as part of a batch.
///
/// Implemented by [`Change`] and by backend wire types, so a backend (or its
/// stub) runs the same planner the client does.
pub trait BatchEntry {
    fn action(&self) -> ChangeAction;
    fn key(&self) -> RecordKey;
}

impl BatchEntry for Change {
    fn action(&self) -> ChangeAction {
        self.action
    }

    fn key(&self) -> RecordKey {
        self.rrset.key()
    }
}

/// Why a batch was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchViolation {
    /// An add targets a key that exists (or is already staged).
    Duplicate(RecordKey),
    /// A remove targets a key that does not exist.
    Missing(RecordKey),
}

impl BatchViolation {
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Duplicate(key) | Self::Missing(key) => key,
        }
    }

    /// Convert into the public error taxonomy.
    pub fn into_error(self, provider: &str) -> ProviderError {
        match self {
            Self::Duplicate(key) => ProviderError::Conflict {
                provider: provider.to_string(),
                name: key.name().to_string(),
                record_type: key.rrs_type().to_string(),
                raw_message: None,
            },
            Self::Missing(key) => ProviderError::RecordNotFound {
                provider: provider.to_string(),
                name: key.name().to_string(),
                record_type: key.rrs_type().to_string(),
                raw_message: None,
            },
        }
    }
}

impl fmt::Display for BatchViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(key) => write!(f, "record set {key} already exists"),
            Self::Missing(key) => write!(f, "record set {key} was not found"),
        }
    }
}

// ============ Batch Rules ============

/// Validate the internal consistency of a batch without looking at stored state.
///
/// Catches adds (or upserts) staged twice for one key with no remove between
/// them. Checks against existing records are left to [`plan_batch`], which the
/// backend runs with its authoritative snapshot.
pub fn check_batch<E: BatchEntry>(changes: &[E]) -> std::result::Result<(), BatchViolation> {
    // key -> 是否已有未被 remove 抵消的 add/upsert
    let mut staged: HashMap<RecordKey, bool> = HashMap::new();
    for change in changes {
        let key = change.key();
        match change.action() {
            ChangeAction::Add | ChangeAction::Upsert => {
                if staged.get(&key).copied().unwrap_or(false) {
                    return Err(BatchViolation::Duplicate(key));
                }
                staged.insert(key, true);
            }
            ChangeAction::Remove => {
                staged.insert(key, false);
            }
        }
    }
    Ok(())
}

/// Validate a batch against the keys currently stored and return the commit order.
///
/// The result is a permutation of indices into `changes`. It equals the
/// submitted order except for one case: when a stored key's first operation
/// in the batch is an add and a remove of that key follows, the first remove is
/// moved ahead of the add, so the pair commits as a replace. Upserts never
/// trigger the move.
///
/// Nothing is mutated; on `Err` the caller must not commit any part of the batch.
pub fn plan_batch<E: BatchEntry>(
    existing: &HashSet<RecordKey>,
    changes: &[E],
) -> std::result::Result<Vec<usize>, BatchViolation> {
    let keys: Vec<RecordKey> = changes.iter().map(BatchEntry::key).collect();

    // 已存在的 key：第一次 remove 的位置
    let mut first_remove: HashMap<&RecordKey, usize> = HashMap::new();
    for (index, change) in changes.iter().enumerate() {
        if change.action() == ChangeAction::Remove && existing.contains(&keys[index]) {
            first_remove.entry(&keys[index]).or_insert(index);
        }
    }

    let mut order = Vec::with_capacity(changes.len());
    let mut seen: HashSet<&RecordKey> = HashSet::new();
    let mut hoisted: HashSet<usize> = HashSet::new();
    for (index, key) in keys.iter().enumerate() {
        if hoisted.contains(&index) {
            continue;
        }
        // 只有 add 在前时才前移 remove；upsert/remove 保持提交顺序
        if seen.insert(key)
            && changes[index].action() == ChangeAction::Add
            && let Some(&remove_at) = first_remove.get(key)
            && remove_at > index
        {
            order.push(remove_at);
            hoisted.insert(remove_at);
        }
        order.push(index);
    }

    let mut present: HashSet<&RecordKey> = existing.iter().collect();
    for &index in &order {
        let key = &keys[index];
        match changes[index].action() {
            ChangeAction::Add => {
                if !present.insert(key) {
                    return Err(BatchViolation::Duplicate(key.clone()));
                }
            }
            ChangeAction::Remove => {
                if !present.remove(key) {
                    return Err(BatchViolation::Missing(key.clone()));
                }
            }
            ChangeAction::Upsert => {
                present.insert(key);
            }
        }
    }

    Ok(order)
}

/// Split a batch into chunks of at most `max_size` changes.
///
/// All changes for one identity key stay in the same chunk, in their original
/// relative order, so a replace is never torn across two requests. A single
/// key with more than `max_size` changes gets a chunk of its own.
pub fn split_batch<E: BatchEntry + Clone>(changes: &[E], max_size: usize) -> Vec<Vec<E>> {
    let max_size = max_size.max(1);

    let mut groups: Vec<(RecordKey, Vec<E>)> = Vec::new();
    let mut group_of: HashMap<RecordKey, usize> = HashMap::new();
    for change in changes {
        let key = change.key();
        if let Some(&slot) = group_of.get(&key) {
            groups[slot].1.push(change.clone());
        } else {
            group_of.insert(key.clone(), groups.len());
            groups.push((key, vec![change.clone()]));
        }
    }

    let mut chunks: Vec<Vec<E>> = Vec::new();
    let mut current: Vec<E> = Vec::new();
    for (_, group) in groups {
        if !current.is_empty() && current.len() + group.len() > max_size {
            chunks.push(std::mem::take(&mut current));
        }
        current.extend(group);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ============ Changeset ============

/// Backend half of a changeset: submits a validated batch.
///
/// Implemented by each provider's record set store.
#[async_trait]
pub trait ChangesetApplier: Send + Sync {
    /// Provider identifier used to label errors.
    fn provider_name(&self) -> &'static str;

    /// Commit `changes` as one unit where the backend allows it.
    ///
    /// The backend is responsible for checking the batch against its own state
    /// (see [`plan_batch`]).
    async fn submit(&self, ctx: &Context, changes: &[Change]) -> Result<()>;
}

/// Lifecycle state of a [`Changeset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangesetState {
    Building,
    Applying,
    Committed,
    Rejected,
}

impl fmt::Display for ChangesetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Building => "building",
            Self::Applying => "applying",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        })
    }
}

/// An ordered, single-use batch of changes bound to one record set store.
///
/// Borrows the store it was started from; it cannot outlive it.
///
/// ```rust,no_run
/// # use dnsprovider::*;
/// # async fn example(sets: &dyn ResourceRecordSets, ctx: &Context) -> Result<()> {
/// let old = sets.new_record_set("www.example.com", vec!["10.0.0.1".into()], 300, RrsType::A);
/// let new = sets.new_record_set("www.example.com", vec!["10.0.0.2".into()], 300, RrsType::A);
///
/// sets.start_changeset().remove(old)?.add(new)?.apply(ctx).await?;
/// # Ok(())
/// # }
/// ```
pub struct Changeset<'a> {
    applier: &'a dyn ChangesetApplier,
    changes: Vec<Change>,
    state: ChangesetState,
}

impl<'a> Changeset<'a> {
    /// Empty changeset in the `Building` state.
    pub fn new(applier: &'a dyn ChangesetApplier) -> Self {
        Self {
            applier,
            changes: Vec::new(),
            state: ChangesetState::Building,
        }
    }

    /// Stage creation of `rrset`. Not validated until [`apply`](Self::apply).
    pub fn add(&mut self, rrset: ResourceRecordSet) -> Result<&mut Self> {
        self.stage(ChangeAction::Add, rrset)
    }

    /// Stage removal of the record set with `rrset`'s identity key.
    pub fn remove(&mut self, rrset: ResourceRecordSet) -> Result<&mut Self> {
        self.stage(ChangeAction::Remove, rrset)
    }

    /// Stage creation or replacement of `rrset`.
    pub fn upsert(&mut self, rrset: ResourceRecordSet) -> Result<&mut Self> {
        self.stage(ChangeAction::Upsert, rrset)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn state(&self) -> ChangesetState {
        self.state
    }

    /// Staged changes in submission order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Validate and commit the batch. Terminal: the changeset cannot be reused.
    ///
    /// An empty changeset commits as a no-op without contacting the backend.
    /// On `Backend` or `Cancelled` errors the zone may be partially updated;
    /// list it again to learn its true state.
    pub async fn apply(&mut self, ctx: &Context) -> Result<()> {
        let provider = self.applier.provider_name();
        if self.state != ChangesetState::Building {
            return Err(ProviderError::InvalidState {
                provider: provider.to_string(),
                detail: format!("apply called on a changeset that is already {}", self.state),
            });
        }
        self.state = ChangesetState::Applying;

        let outcome = self.commit(ctx).await;
        match &outcome {
            Ok(()) => {
                self.state = ChangesetState::Committed;
                log::debug!(
                    "[{provider}] Changeset committed ({} change(s))",
                    self.changes.len()
                );
            }
            Err(e) => {
                self.state = ChangesetState::Rejected;
                if e.is_expected() {
                    log::warn!("[{provider}] Changeset rejected: {e}");
                } else {
                    log::error!("[{provider}] Changeset failed: {e}");
                }
            }
        }
        outcome
    }

    async fn commit(&self, ctx: &Context) -> Result<()> {
        let provider = self.applier.provider_name();
        if self.changes.is_empty() {
            log::debug!("[{provider}] Empty changeset, nothing to submit");
            return Ok(());
        }

        check_batch(&self.changes).map_err(|v| v.into_error(provider))?;
        ctx.check(provider, "apply")?;

        for change in &self.changes {
            log::debug!(
                "[{provider}] {} {} {} ttl={} {}",
                change.action,
                change.rrset.name(),
                change.rrset.rrs_type(),
                change.rrset.ttl(),
                summarize_values(change.rrset.rrdatas())
            );
        }

        self.applier.submit(ctx, &self.changes).await
    }

    fn stage(&mut self, action: ChangeAction, rrset: ResourceRecordSet) -> Result<&mut Self> {
        if self.state != ChangesetState::Building {
            return Err(ProviderError::InvalidState {
                provider: self.applier.provider_name().to_string(),
                detail: format!("cannot {action} on a changeset that is already {}", self.state),
            });
        }
        self.changes.push(Change { action, rrset });
        Ok(self)
    }
}

impl fmt::Debug for Changeset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changeset")
            .field("provider", &self.applier.provider_name())
            .field("state", &self.state)
            .field("changes", &self.changes)
            .finish()
    }
}
