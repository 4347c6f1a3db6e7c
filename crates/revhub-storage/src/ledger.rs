//! Pull request ledger.
//!
//! Records live in a [`ShardedMap`] keyed by pull request id. Creation is a
//! check-and-insert under the write lock of the id's shard, so concurrent
//! creations with one id produce exactly one record. Membership is read
//! through [`MemberDirectory`] before any ledger lock is taken; the ledger
//! never holds one of its own locks while calling into the directory.

use std::collections::HashSet;
use std::sync::Arc;

use revhub_core::{
    metrics, CoreError, CoreResult, MemberDirectory, PullRequest, PullRequestShort,
};
use tracing::{debug, info, warn};

use crate::reviewers::{choose_one, select_reviewers};
use crate::shard::ShardedMap;

/// Attempts before a reassignment gives up on a pull request that keeps changing.
const REASSIGN_ATTEMPTS: usize = 8;

pub struct PullRequestLedger {
    records: ShardedMap<PullRequest>,
    directory: Arc<dyn MemberDirectory>,
    max_reviewers: usize,
}

impl PullRequestLedger {
    pub fn new(
        directory: Arc<dyn MemberDirectory>,
        shard_count: usize,
        max_reviewers: usize,
    ) -> Self {
        Self {
            records: ShardedMap::new(shard_count),
            directory,
            max_reviewers,
        }
    }

    /// Creates an open pull request authored by an active member.
    ///
    /// Reviewers are drawn from the author's active teammates.
    ///
    /// # Errors
    ///
    /// - `DuplicateId` when `pull_request_id` is already in the ledger
    /// - `UnknownAuthor` when `author_id` is not an active member of any team
    pub fn create_pull_request(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> CoreResult<PullRequest> {
        // Cheap early rejection; the insert below re-checks under the lock.
        if self.records.contains_key(pull_request_id) {
            return Err(self.duplicate(pull_request_id));
        }

        if !self.directory.is_active_member(author_id) {
            warn!(pull_request_id, author_id, "rejecting pull request from unknown author");
            return Err(CoreError::UnknownAuthor {
                author_id: author_id.to_string(),
            });
        }

        let reviewers = select_reviewers(
            self.directory.active_teammates(author_id),
            self.max_reviewers,
        );
        let pr = PullRequest::open(pull_request_id, pull_request_name, author_id, reviewers);

        self.records
            .insert_if_absent(pull_request_id.to_string(), pr.clone())
            .map_err(|_| self.duplicate(pull_request_id))?;

        metrics::PULL_REQUESTS_CREATED.inc();
        debug!(
            pull_request_id,
            author_id,
            reviewers = ?pr.assigned_reviewers,
            "pull request created"
        );
        Ok(pr)
    }

    pub fn get_pull_request(&self, pull_request_id: &str) -> CoreResult<PullRequest> {
        self.records
            .get_cloned(pull_request_id)
            .ok_or_else(|| not_found(pull_request_id))
    }

    /// Marks a pull request merged. Merging twice returns the merged record unchanged.
    pub fn merge_pull_request(&self, pull_request_id: &str) -> CoreResult<PullRequest> {
        let (pr, newly_merged) = self
            .records
            .with_mut(pull_request_id, |pr| {
                pr.map(|pr| {
                    let newly_merged = pr.merge();
                    (pr.clone(), newly_merged)
                })
            })
            .ok_or_else(|| not_found(pull_request_id))?;

        if newly_merged {
            metrics::PULL_REQUESTS_MERGED.inc();
            info!(pull_request_id, "pull request merged");
        } else {
            debug!(pull_request_id, "pull request already merged");
        }
        Ok(pr)
    }

    /// Replaces `old_reviewer_id` with a random active teammate of theirs.
    ///
    /// The replacement keeps the old reviewer's position and is never the
    /// author or someone already assigned. Returns the updated record and the
    /// new reviewer's id.
    pub fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> CoreResult<(PullRequest, String)> {
        for _ in 0..REASSIGN_ATTEMPTS {
            let current = self.get_pull_request(pull_request_id)?;
            self.check_reassignable(&current, old_reviewer_id)?;

            let candidates: Vec<String> = self
                .directory
                .active_teammates(old_reviewer_id)
                .into_iter()
                .filter(|id| *id != current.author_id && !current.has_reviewer(id))
                .collect();

            let new_reviewer = choose_one(&candidates).ok_or_else(|| {
                metrics::CONFLICTS.with_label_values(&["no_candidate"]).inc();
                CoreError::NoCandidate {
                    pull_request_id: pull_request_id.to_string(),
                }
            })?;

            // Apply only if nobody touched the reviewers since `current` was read.
            let applied = self.records.with_mut(pull_request_id, |pr| match pr {
                Some(pr) if !pr.is_merged() && pr.assigned_reviewers == current.assigned_reviewers => {
                    pr.replace_reviewer(old_reviewer_id, new_reviewer.clone());
                    Some(pr.clone())
                }
                _ => None,
            });

            if let Some(pr) = applied {
                metrics::REVIEWERS_REASSIGNED.inc();
                info!(
                    pull_request_id,
                    old_reviewer_id,
                    new_reviewer_id = %new_reviewer,
                    "reviewer reassigned"
                );
                return Ok((pr, new_reviewer));
            }

            debug!(pull_request_id, "pull request changed during reassignment, retrying");
        }

        Err(CoreError::internal(format!(
            "pull request `{pull_request_id}` kept changing during reassignment"
        )))
    }

    /// Moves every open review held by `departing` users to other active teammates.
    ///
    /// All affected pull requests are planned before any is changed, so a
    /// `NoCandidate` failure leaves the ledger untouched. Replacements are
    /// active teammates of the departing reviewer, never the author, a
    /// current reviewer or another departing user. Returns the updated
    /// records.
    pub fn hand_over_reviews(&self, departing: &[String]) -> CoreResult<Vec<PullRequest>> {
        let departing: HashSet<&str> = departing.iter().map(String::as_str).collect();

        let mut affected = Vec::new();
        self.records.for_each(|pr| {
            if !pr.is_merged() && holds_review(pr, &departing) {
                affected.push(pr.clone());
            }
        });

        for pr in &affected {
            self.plan_handover(pr, &departing)?;
        }

        let mut updated = Vec::with_capacity(affected.len());
        for pr in &affected {
            if let Some(pr) = self.apply_handover(&pr.pull_request_id, &departing)? {
                updated.push(pr);
            }
        }

        if !updated.is_empty() {
            info!(count = updated.len(), "reviews handed over from deactivated members");
        }
        Ok(updated)
    }

    /// Pull requests listing `user_id` as reviewer, oldest first.
    pub fn reviews_for(&self, user_id: &str) -> CoreResult<Vec<PullRequestShort>> {
        if !self.directory.user_exists(user_id) {
            return Err(CoreError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }

        let mut found = Vec::new();
        self.records.for_each(|pr| {
            if pr.has_reviewer(user_id) {
                found.push((pr.created_at, pr.short()));
            }
        });
        found.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.pull_request_id.cmp(&b.1.pull_request_id))
        });

        Ok(found.into_iter().map(|(_, short)| short).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn records(&self) -> &ShardedMap<PullRequest> {
        &self.records
    }

    fn check_reassignable(&self, pr: &PullRequest, old_reviewer_id: &str) -> CoreResult<()> {
        if pr.is_merged() {
            metrics::CONFLICTS.with_label_values(&["pull_request_merged"]).inc();
            return Err(CoreError::PullRequestMerged {
                pull_request_id: pr.pull_request_id.clone(),
            });
        }
        if !self.directory.user_exists(old_reviewer_id) {
            return Err(CoreError::UserNotFound {
                user_id: old_reviewer_id.to_string(),
            });
        }
        if !pr.has_reviewer(old_reviewer_id) {
            metrics::CONFLICTS.with_label_values(&["reviewer_not_assigned"]).inc();
            return Err(CoreError::ReviewerNotAssigned {
                pull_request_id: pr.pull_request_id.clone(),
                user_id: old_reviewer_id.to_string(),
            });
        }
        Ok(())
    }

    /// Reviewer list of `pr` with every departing reviewer replaced in place.
    fn plan_handover(&self, pr: &PullRequest, departing: &HashSet<&str>) -> CoreResult<Vec<String>> {
        let mut reviewers = pr.assigned_reviewers.clone();

        for slot in 0..reviewers.len() {
            if !departing.contains(reviewers[slot].as_str()) {
                continue;
            }

            let candidates: Vec<String> = self
                .directory
                .active_teammates(&reviewers[slot])
                .into_iter()
                .filter(|id| {
                    *id != pr.author_id
                        && !departing.contains(id.as_str())
                        && !reviewers.contains(id)
                })
                .collect();

            reviewers[slot] = choose_one(&candidates).ok_or_else(|| {
                metrics::CONFLICTS.with_label_values(&["no_candidate"]).inc();
                CoreError::NoCandidate {
                    pull_request_id: pr.pull_request_id.clone(),
                }
            })?;
        }

        Ok(reviewers)
    }

    /// Re-plans and applies one handover with the same compare-and-apply
    /// loop as `reassign_reviewer`. `None` when the record is gone, merged or
    /// no longer holds a departing reviewer.
    fn apply_handover(
        &self,
        pull_request_id: &str,
        departing: &HashSet<&str>,
    ) -> CoreResult<Option<PullRequest>> {
        for _ in 0..REASSIGN_ATTEMPTS {
            let Some(current) = self.records.get_cloned(pull_request_id) else {
                return Ok(None);
            };
            if current.is_merged() || !holds_review(&current, departing) {
                return Ok(None);
            }

            let reviewers = self.plan_handover(&current, departing)?;

            let applied = self.records.with_mut(pull_request_id, |pr| match pr {
                Some(pr) if !pr.is_merged() && pr.assigned_reviewers == current.assigned_reviewers => {
                    pr.assigned_reviewers = reviewers;
                    Some(pr.clone())
                }
                _ => None,
            });

            if let Some(pr) = applied {
                metrics::REVIEWERS_REASSIGNED.inc();
                debug!(
                    pull_request_id,
                    reviewers = ?pr.assigned_reviewers,
                    "reviews handed over"
                );
                return Ok(Some(pr));
            }

            debug!(pull_request_id, "pull request changed during handover, retrying");
        }

        Err(CoreError::internal(format!(
            "pull request `{pull_request_id}` kept changing during handover"
        )))
    }

    fn duplicate(&self, pull_request_id: &str) -> CoreError {
        warn!(pull_request_id, "pull request already exists");
        metrics::CONFLICTS.with_label_values(&["duplicate_id"]).inc();
        CoreError::DuplicateId {
            pull_request_id: pull_request_id.to_string(),
        }
    }
}

fn holds_review(pr: &PullRequest, departing: &HashSet<&str>) -> bool {
    pr.assigned_reviewers
        .iter()
        .any(|r| departing.contains(r.as_str()))
}

fn not_found(pull_request_id: &str) -> CoreError {
    CoreError::PullRequestNotFound {
        pull_request_id: pull_request_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipStore;
    use revhub_core::{Member, PullRequestStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup(max_reviewers: usize) -> (Arc<MembershipStore>, PullRequestLedger) {
        let store = Arc::new(MembershipStore::new(4));
        store
            .register_team(
                "backend",
                vec![
                    Member::new("u1", "Alice", true),
                    Member::new("u2", "Bob", true),
                    Member::new("u3", "Carol", true),
                    Member::new("u4", "Dave", false),
                ],
            )
            .unwrap();
        let ledger = PullRequestLedger::new(store.clone(), 4, max_reviewers);
        (store, ledger)
    }

    #[test]
    fn test_create_assigns_active_teammates() {
        let (_store, ledger) = setup(2);
        let pr = ledger.create_pull_request("pr-1", "Add search", "u1").unwrap();

        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.assigned_reviewers.len(), 2);
        assert!(!pr.has_reviewer("u1"));
        assert!(!pr.has_reviewer("u4"));
        assert_eq!(ledger.get_pull_request("pr-1").unwrap(), pr);
    }

    #[test]
    fn test_create_duplicate_id() {
        let (_store, ledger) = setup(2);
        ledger.create_pull_request("pr-1", "x", "u1").unwrap();

        let err = ledger.create_pull_request("pr-1", "y", "u2").unwrap_err();
        assert_eq!(err.code(), "duplicate_id");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get_pull_request("pr-1").unwrap().pull_request_name, "x");
    }

    #[test]
    fn test_create_unknown_or_inactive_author() {
        let (_store, ledger) = setup(2);

        let err = ledger.create_pull_request("pr-1", "x", "ghost").unwrap_err();
        assert_eq!(err.code(), "unknown_author");

        let err = ledger.create_pull_request("pr-2", "x", "u4").unwrap_err();
        assert_eq!(err.code(), "unknown_author");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_reviewer_assignment_disabled() {
        let (_store, ledger) = setup(0);
        let pr = ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[test]
    fn test_concurrent_create_same_id() {
        let (_store, ledger) = setup(2);
        let successes = AtomicUsize::new(0);
        let duplicates = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..64 {
                scope.spawn(|| match ledger.create_pull_request("pr-race", "race", "u1") {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(CoreError::DuplicateId { .. }) => {
                        duplicates.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(duplicates.load(Ordering::SeqCst), 63);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (_store, ledger) = setup(2);
        ledger.create_pull_request("pr-1", "x", "u1").unwrap();

        let first = ledger.merge_pull_request("pr-1").unwrap();
        assert_eq!(first.status, PullRequestStatus::Merged);
        let second = ledger.merge_pull_request("pr-1").unwrap();
        assert_eq!(second.merged_at, first.merged_at);

        let err = ledger.merge_pull_request("missing").unwrap_err();
        assert_eq!(err.code(), "pull_request_not_found");
    }

    #[test]
    fn test_reassign_picks_remaining_teammate() {
        let (store, ledger) = setup(1);
        store
            .register_team(
                "frontend",
                vec![Member::new("u2", "Bob", true), Member::new("u5", "Eve", true)],
            )
            .unwrap();
        let pr = ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        let old = pr.assigned_reviewers[0].clone();

        let (updated, replacement) = ledger.reassign_reviewer("pr-1", &old).unwrap();

        assert_ne!(replacement, old);
        assert_ne!(replacement, "u1");
        assert_eq!(updated.assigned_reviewers, vec![replacement.clone()]);
        assert_eq!(ledger.get_pull_request("pr-1").unwrap(), updated);
    }

    #[test]
    fn test_reassign_errors() {
        let (store, ledger) = setup(2);
        ledger.create_pull_request("pr-1", "x", "u1").unwrap();

        // u2 and u3 are both assigned, u4 is inactive: no one is left.
        let err = ledger.reassign_reviewer("pr-1", "u2").unwrap_err();
        assert_eq!(err.code(), "no_candidate");

        let err = ledger.reassign_reviewer("pr-1", "u4").unwrap_err();
        assert_eq!(err.code(), "reviewer_not_assigned");

        let err = ledger.reassign_reviewer("pr-1", "ghost").unwrap_err();
        assert_eq!(err.code(), "user_not_found");

        let err = ledger.reassign_reviewer("missing", "u2").unwrap_err();
        assert_eq!(err.code(), "pull_request_not_found");

        store.set_user_active("u4", true).unwrap();
        ledger.merge_pull_request("pr-1").unwrap();
        let err = ledger.reassign_reviewer("pr-1", "u2").unwrap_err();
        assert_eq!(err.code(), "pull_request_merged");
    }

    #[test]
    fn test_reassign_after_deactivation() {
        let (store, ledger) = setup(1);
        let pr = ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        let old = pr.assigned_reviewers[0].clone();
        store.set_user_active(&old, false).unwrap();

        let (updated, replacement) = ledger.reassign_reviewer("pr-1", &old).unwrap();
        assert!(replacement == "u2" || replacement == "u3");
        assert_ne!(replacement, old);
        assert!(!updated.has_reviewer(&old));
    }

    #[test]
    fn test_reviews_for() {
        let (_store, ledger) = setup(2);
        ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        ledger.create_pull_request("pr-2", "y", "u1").unwrap();

        // u1 authored both; u2 and u3 review both.
        let reviews = ledger.reviews_for("u2").unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].pull_request_id, "pr-1");
        assert!(ledger.reviews_for("u1").unwrap().is_empty());
        assert_eq!(ledger.reviews_for("ghost").unwrap_err().code(), "user_not_found");
    }

    #[test]
    fn test_hand_over_reviews() {
        let (store, ledger) = setup(2);
        store.set_user_active("u4", true).unwrap();
        let pr = ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        ledger.create_pull_request("pr-2", "y", "u1").unwrap();
        let merged = ledger.merge_pull_request("pr-2").unwrap();
        let departing = pr.assigned_reviewers[0].clone();

        let updated = ledger.hand_over_reviews(&[departing.clone()]).unwrap();

        // Merged pull requests keep their reviewers.
        assert_eq!(updated.len(), 1);
        let after = ledger.get_pull_request("pr-1").unwrap();
        assert_eq!(after, updated[0]);
        assert!(!after.has_reviewer(&departing));
        assert!(!after.has_reviewer("u1"));
        assert_eq!(after.assigned_reviewers.len(), 2);
        assert_eq!(after.assigned_reviewers[1], pr.assigned_reviewers[1]);
        assert_eq!(ledger.get_pull_request("pr-2").unwrap(), merged);
    }

    #[test]
    fn test_hand_over_without_candidate_changes_nothing() {
        let (_store, ledger) = setup(2);
        let first = ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        let second = ledger.create_pull_request("pr-2", "y", "u2").unwrap();

        // u4 is inactive, so nobody outside u2/u3 can take over.
        let err = ledger
            .hand_over_reviews(&["u2".to_string(), "u3".to_string()])
            .unwrap_err();
        assert_eq!(err.code(), "no_candidate");
        assert_eq!(ledger.get_pull_request("pr-1").unwrap(), first);
        assert_eq!(ledger.get_pull_request("pr-2").unwrap(), second);
    }

    #[test]
    fn test_hand_over_with_no_open_reviews() {
        let (_store, ledger) = setup(2);
        ledger.create_pull_request("pr-1", "x", "u1").unwrap();
        assert!(ledger.hand_over_reviews(&["u1".to_string()]).unwrap().is_empty());
        assert!(ledger.hand_over_reviews(&[]).unwrap().is_empty());
    }
}
