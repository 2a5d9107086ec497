use std::collections::HashSet;

use crate::errors::EligibilityError;
use crate::models::{Group, GroupListing, ParticipationLedger, Student, StudentHandle};

/// Ledger plus the group entries that named no rostered student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBuild {
    pub ledger: ParticipationLedger,
    pub malformed: Vec<EligibilityError>,
}

/// Splits a group folder name into member handles, in order of appearance.
///
/// Empty segments from doubled or trailing delimiters are skipped and a
/// handle that repeats within one name is kept once.
pub fn parse_group_name(entry: &str, delimiter: &str) -> Vec<StudentHandle> {
    let mut seen = HashSet::new();
    entry
        .split(delimiter)
        .filter_map(StudentHandle::new)
        .filter(|handle| seen.insert(handle.clone()))
        .collect()
}

pub fn parse_listing(listing: &GroupListing, delimiter: &str) -> Vec<Group> {
    listing
        .iter()
        .flat_map(|(&category, entries)| {
            entries.iter().map(move |entry| Group {
                category,
                entry: entry.clone(),
                members: parse_group_name(entry, delimiter),
            })
        })
        .collect()
}

/// Folds past groups into per-student history.
///
/// Every roster handle gets a record, history or not. Members missing from
/// the roster are ignored; a group with no rostered member is reported in
/// [`LedgerBuild::malformed`] and otherwise dropped.
pub fn build(roster: &[StudentHandle], groups: &[Group]) -> LedgerBuild {
    let mut ledger =
        ParticipationLedger::from_students(roster.iter().cloned().map(Student::new));
    let mut malformed = Vec::new();

    for group in groups {
        let members: Vec<&StudentHandle> = group
            .members
            .iter()
            .filter(|handle| ledger.contains(handle))
            .collect();

        if members.is_empty() {
            malformed.push(EligibilityError::MalformedGroupEntry {
                category: group.category,
                entry: group.entry.clone(),
            });
            continue;
        }

        if members.len() < group.members.len() {
            tracing::debug!(
                category = %group.category,
                entry = %group.entry,
                resolved = members.len(),
                "group names handles missing from the roster"
            );
        }

        for &member in &members {
            let Some(student) = ledger.get_mut(member) else {
                continue;
            };
            student.completed_categories.insert(group.category);
            student.collaboration_count += 1;
            student.past_partners.extend(
                members
                    .iter()
                    .filter(|&&partner| partner != member)
                    .map(|&partner| partner.clone()),
            );
        }
    }

    LedgerBuild { ledger, malformed }
}

/// Parses `listing` and builds the ledger, logging dropped entries.
pub fn build_from_listing(
    roster: &[StudentHandle],
    listing: &GroupListing,
    delimiter: &str,
) -> ParticipationLedger {
    let groups = parse_listing(listing, delimiter);
    let LedgerBuild { ledger, malformed } = build(roster, &groups);

    for error in &malformed {
        tracing::warn!(%error, "skipping group entry");
    }
    tracing::info!(
        students = ledger.len(),
        groups = groups.len() - malformed.len(),
        skipped = malformed.len(),
        "participation ledger built"
    );

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn handles(names: &[&str]) -> Vec<StudentHandle> {
        names.iter().filter_map(StudentHandle::new).collect()
    }

    fn handle(name: &str) -> StudentHandle {
        StudentHandle::new(name).unwrap()
    }

    fn listing(entries: &[(Category, &[&str])]) -> GroupListing {
        let mut listing = GroupListing::new();
        for category in Category::ALL {
            listing.insert(category, Vec::new());
        }
        for (category, names) in entries {
            listing
                .entry(*category)
                .or_default()
                .extend(names.iter().map(|name| name.to_string()));
        }
        listing
    }

    #[test]
    fn parses_members_in_order() {
        assert_eq!(parse_group_name("carinawi-urama", "-"), handles(&["carinawi", "urama"]));
    }

    #[test]
    fn parse_skips_empty_segments_and_repeats() {
        assert_eq!(
            parse_group_name("-Alice--bob-alice-", "-"),
            handles(&["alice", "bob"])
        );
        assert!(parse_group_name("", "-").is_empty());
        assert!(parse_group_name("---", "-").is_empty());
    }

    #[test]
    fn parse_honours_custom_delimiter() {
        assert_eq!(parse_group_name("alice+bob", "+"), handles(&["alice", "bob"]));
        assert_eq!(parse_group_name("alice-bob", "+"), handles(&["alice-bob"]));
    }

    #[test]
    fn every_roster_student_gets_a_record() {
        let roster = handles(&["alice", "bob"]);
        let LedgerBuild { ledger, malformed } = build(&roster, &[]);

        assert_eq!(ledger.len(), 2);
        assert!(malformed.is_empty());
        let alice = ledger.get(&handle("alice")).unwrap();
        assert_eq!(alice.collaboration_count, 0);
        assert!(alice.completed_categories.is_empty());
    }

    #[test]
    fn records_categories_counts_and_partners() {
        let roster = handles(&["alice", "bob", "joe"]);
        let groups = parse_listing(
            &listing(&[
                (Category::Essay, &["alice-bob"]),
                (Category::Demo, &["alice-joe"]),
            ]),
            "-",
        );
        let ledger = build(&roster, &groups).ledger;

        let alice = ledger.get(&handle("alice")).unwrap();
        assert_eq!(alice.collaboration_count, 2);
        assert_eq!(
            alice.completed_categories.iter().copied().collect::<Vec<_>>(),
            vec![Category::Demo, Category::Essay]
        );
        assert_eq!(
            alice.past_partners.iter().cloned().collect::<Vec<_>>(),
            handles(&["bob", "joe"])
        );

        let bob = ledger.get(&handle("bob")).unwrap();
        assert_eq!(bob.collaboration_count, 1);
        assert!(bob.has_completed(Category::Essay));
        assert!(!bob.has_completed(Category::Demo));
    }

    #[test]
    fn repeated_category_counts_every_membership() {
        let roster = handles(&["alice", "bob", "joe"]);
        let groups = parse_listing(
            &listing(&[(Category::Essay, &["alice-bob", "alice-joe"])]),
            "-",
        );
        let ledger = build(&roster, &groups).ledger;

        let alice = ledger.get(&handle("alice")).unwrap();
        assert_eq!(alice.collaboration_count, 2);
        assert_eq!(alice.completed_categories.len(), 1);
    }

    #[test]
    fn drops_entries_without_rostered_members() {
        let roster = handles(&["alice", "bob"]);
        let groups = parse_listing(
            &listing(&[(Category::Essay, &["template", "README.md", "alice-bob"])]),
            "-",
        );
        let LedgerBuild { ledger, malformed } = build(&roster, &groups);

        assert_eq!(
            malformed,
            vec![
                EligibilityError::MalformedGroupEntry {
                    category: Category::Essay,
                    entry: "template".to_string(),
                },
                EligibilityError::MalformedGroupEntry {
                    category: Category::Essay,
                    entry: "README.md".to_string(),
                },
            ]
        );
        assert!(!ledger.contains(&handle("template")));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn unregistered_members_do_not_become_students() {
        let roster = handles(&["alice"]);
        let groups = parse_listing(&listing(&[(Category::Demo, &["alice-mallory"])]), "-");
        let LedgerBuild { ledger, malformed } = build(&roster, &groups);

        assert!(malformed.is_empty());
        assert!(!ledger.contains(&handle("mallory")));
        let alice = ledger.get(&handle("alice")).unwrap();
        assert_eq!(alice.collaboration_count, 1);
        assert!(alice.past_partners.is_empty());
    }

    #[test]
    fn folder_casing_is_normalized() {
        let roster = handles(&["alice", "bob"]);
        let groups = parse_listing(&listing(&[(Category::Feedback, &["Alice-BOB"])]), "-");
        let ledger = build(&roster, &groups).ledger;

        assert!(ledger.get(&handle("bob")).unwrap().has_completed(Category::Feedback));
    }

    #[test]
    fn build_from_listing_matches_build() {
        let roster = handles(&["alice", "bob"]);
        let listing = listing(&[(Category::Essay, &["alice-bob", "notes.txt"])]);

        let expected = build(&roster, &parse_listing(&listing, "-")).ledger;
        assert_eq!(build_from_listing(&roster, &listing, "-"), expected);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const NAMES: [&str; 6] = ["alice", "bob", "joe", "eve", "ann", "tom"];

        fn arb_groups() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
            proptest::collection::vec(
                (0..Category::ALL.len(), proptest::collection::vec(0..NAMES.len() + 2, 0..4)),
                0..12,
            )
        }

        fn to_groups(raw: &[(usize, Vec<usize>)]) -> Vec<Group> {
            raw.iter()
                .map(|(category, members)| {
                    let entry = members
                        .iter()
                        .map(|&i| NAMES.get(i).copied().unwrap_or("stranger"))
                        .collect::<Vec<_>>()
                        .join("-");
                    Group {
                        category: Category::ALL[*category],
                        members: parse_group_name(&entry, "-"),
                        entry,
                    }
                })
                .collect()
        }

        proptest! {
            #[test]
            fn build_is_idempotent(raw in arb_groups()) {
                let roster = handles(&NAMES);
                let groups = to_groups(&raw);
                prop_assert_eq!(build(&roster, &groups), build(&roster, &groups));
            }

            #[test]
            fn build_ignores_group_order(raw in arb_groups()) {
                let roster = handles(&NAMES);
                let groups = to_groups(&raw);
                let mut reversed = groups.clone();
                reversed.reverse();
                prop_assert_eq!(build(&roster, &groups).ledger, build(&roster, &reversed).ledger);
            }

            #[test]
            fn ledger_only_holds_roster(raw in arb_groups()) {
                let roster = handles(&NAMES);
                let ledger = build(&roster, &to_groups(&raw)).ledger;
                prop_assert_eq!(ledger.len(), roster.len());
                for (student, expected) in ledger.students().zip(&roster) {
                    prop_assert_eq!(&student.handle, expected);
                    prop_assert!(student.collaboration_count as usize >= student.completed_categories.len());
                }
            }
        }
    }
}
