// Ordering properties of the reconstruction fold, checked over generated
// event sets with distinct dates.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use signoff::events::aggregate::reconstruct;
use signoff::events::WorkflowEvent;

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + Days::new(u64::from(offset))
}

fn events_from(offsets: &std::collections::BTreeSet<u32>, seeds: &[(bool, u32)]) -> Vec<WorkflowEvent> {
    offsets
        .iter()
        .zip(seeds.iter())
        .map(|(&offset, &(approved, week))| {
            if approved {
                WorkflowEvent::Approved {
                    occurred_at: day(offset),
                    week,
                }
            } else {
                WorkflowEvent::Rejected {
                    occurred_at: day(offset),
                }
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn first_approval_is_the_earliest_approved_event(
        offsets in prop::collection::btree_set(0u32..400, 1..10),
        seeds in prop::collection::vec((any::<bool>(), 1u32..54), 10),
    ) {
        let events = events_from(&offsets, &seeds);
        let earliest_approved = events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Approved { occurred_at, .. } => Some(*occurred_at),
                WorkflowEvent::Rejected { .. } => None,
            })
            .min();

        match (reconstruct(events), earliest_approved) {
            (Some(history), Some(earliest)) => prop_assert_eq!(history.first.occurred_at, earliest),
            (None, None) => {}
            (history, earliest) => prop_assert!(
                false,
                "history {:?} disagrees with earliest approval {:?}",
                history,
                earliest
            ),
        }
    }

    #[test]
    fn rejection_count_matches_the_prefix_before_first_approval(
        offsets in prop::collection::btree_set(0u32..400, 1..10),
        seeds in prop::collection::vec((any::<bool>(), 1u32..54), 10),
    ) {
        let events = events_from(&offsets, &seeds);
        if let Some(history) = reconstruct(events.clone()) {
            let expected = events
                .iter()
                .filter(|event| {
                    matches!(event, WorkflowEvent::Rejected { occurred_at }
                        if *occurred_at < history.first.occurred_at)
                })
                .count() as u32;
            prop_assert_eq!(history.rejections_before_first, expected);
        }
    }

    #[test]
    fn input_order_is_irrelevant_for_distinct_dates(
        offsets in prop::collection::btree_set(0u32..400, 1..10),
        seeds in prop::collection::vec((any::<bool>(), 1u32..54), 10),
    ) {
        let events = events_from(&offsets, &seeds);
        let mut reversed = events.clone();
        reversed.reverse();
        prop_assert_eq!(reconstruct(events), reconstruct(reversed));
    }

    #[test]
    fn resubmissions_come_out_in_date_order(
        offsets in prop::collection::btree_set(0u32..400, 2..10),
        seeds in prop::collection::vec((any::<bool>(), 1u32..54), 10),
    ) {
        let events = events_from(&offsets, &seeds);
        if let Some(history) = reconstruct(events) {
            let dates: Vec<_> = history.resubmissions.iter().map(|a| a.occurred_at).collect();
            let mut sorted = dates.clone();
            sorted.sort();
            prop_assert_eq!(dates, sorted);
        }
    }
}
