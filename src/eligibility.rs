use std::collections::BTreeMap;

use crate::errors::EligibilityError;
use crate::models::{
    Category, CategoryEligibility, EligibilityResult, ParticipationLedger, Student,
    StudentHandle,
};
use crate::policy::EligibilityPolicy;

/// Computes, for every category, either the completed marker or the
/// classmates `requester` may still team up with.
pub fn evaluate(
    ledger: &ParticipationLedger,
    requester: &StudentHandle,
    policy: &EligibilityPolicy,
) -> Result<EligibilityResult, EligibilityError> {
    let requester_record = ledger
        .get(requester)
        .ok_or_else(|| EligibilityError::UnknownRequester {
            requester: requester.clone(),
        })?;

    // Availability does not depend on the category, only on the requester.
    let available: Vec<StudentHandle> = ledger
        .students()
        .filter(|candidate| is_available(candidate, requester_record, policy))
        .map(|candidate| candidate.handle.clone())
        .collect();

    let mut categories = BTreeMap::new();
    for category in Category::ALL {
        let outcome = if requester_record.has_completed(category) {
            CategoryEligibility::AlreadyCompleted
        } else {
            CategoryEligibility::Eligible(available.clone())
        };
        categories.insert(category, outcome);
    }

    tracing::debug!(
        requester = %requester,
        available = available.len(),
        completed = requester_record.completed_categories.len(),
        "eligibility evaluated"
    );

    Ok(EligibilityResult {
        requester: requester.clone(),
        categories,
    })
}

/// True when `candidate` passes every rule at once.
pub fn is_available(
    candidate: &Student,
    requester: &Student,
    policy: &EligibilityPolicy,
) -> bool {
    let not_self = candidate.handle != requester.handle;
    let under_collaboration_cap = candidate.collaboration_count < policy.collaboration_cap;
    let under_load_cap = candidate.completed_categories.len() < policy.load_cap;
    let new_partner =
        !policy.exclude_past_partners || !requester.past_partners.contains(&candidate.handle);

    not_self && under_collaboration_cap && under_load_cap && new_partner
}
