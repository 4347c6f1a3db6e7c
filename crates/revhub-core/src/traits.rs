/// Read-only membership lookups consumed by the pull request ledger.
///
/// Implementations must be callable concurrently with team registrations
/// and must not block for longer than a short in-memory critical section.
pub trait MemberDirectory: Send + Sync {
    /// Returns `true` when `user_id` is active in at least one team.
    fn is_active_member(&self, user_id: &str) -> bool;

    /// Returns `true` when any team lists `user_id`, active or not.
    fn user_exists(&self, user_id: &str) -> bool;

    /// Active members of every team listing `user_id` (whatever the user's
    /// own flag), excluding `user_id` itself, deduplicated and in
    /// registration order.
    fn active_teammates(&self, user_id: &str) -> Vec<String>;
}
