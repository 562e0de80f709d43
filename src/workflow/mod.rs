pub mod aggregate;
pub mod approval;
pub mod leave;

/// Identity of the acting reviewer. `user_id` is what gets recorded on
/// reviewed rows; `employee_id` is the reviewer's own employee record (when
/// the account is linked to one) and is what the self-review ban compares
/// against. The two id spaces are distinct and must never be mixed.
#[derive(Debug, Clone, Copy)]
pub struct Reviewer {
    pub user_id: u64,
    pub employee_id: Option<u64>,
}
