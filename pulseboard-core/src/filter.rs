//! Entity filtering — pure scope predicate over the catalog.
//!
//! An entity survives when its platform is in the platform set AND its id is
//! in the account set. Empty sets mean "nothing selected", not "everything":
//! either set being empty yields an empty result. An account whose platform
//! fell out of the platform set is silently excluded rather than erroring.

use crate::domain::{Entity, EntityId, Platform};
use std::collections::BTreeSet;

/// Filter the catalog down to the selected scope.
///
/// Pure function of its three inputs; entities are cloned out, never mutated.
pub fn filter_entities(
    catalog: &[Entity],
    platforms: &BTreeSet<Platform>,
    accounts: &BTreeSet<EntityId>,
) -> Vec<Entity> {
    if platforms.is_empty() || accounts.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|e| platforms.contains(&e.platform) && accounts.contains(&e.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawCounters;

    fn entity(id: &str, platform: Platform) -> Entity {
        Entity {
            id: EntityId::new(id),
            name: id.to_string(),
            platform,
            owned: false,
            counters: RawCounters {
                views: 100,
                likes: 10,
                comments: 2,
                shares: 1,
                posts_count: 3,
                followers: 500,
                followers_start: 480,
                followers_end: 500,
                daily_post_counts: vec![1, 1, 1],
            },
        }
    }

    fn catalog() -> Vec<Entity> {
        vec![
            entity("a", Platform::Youtube),
            entity("b", Platform::Tiktok),
            entity("c", Platform::Youtube),
        ]
    }

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn keeps_intersection_of_platform_and_account() {
        let platforms: BTreeSet<_> = [Platform::Youtube].into_iter().collect();
        let accounts: BTreeSet<_> = [EntityId::new("a"), EntityId::new("b")]
            .into_iter()
            .collect();
        let out = filter_entities(&catalog(), &platforms, &accounts);
        // "b" is selected but its platform is not: silently excluded.
        assert_eq!(ids(&out), vec!["a"]);
    }

    #[test]
    fn empty_platform_set_yields_empty() {
        let accounts: BTreeSet<_> = [EntityId::new("a")].into_iter().collect();
        let out = filter_entities(&catalog(), &BTreeSet::new(), &accounts);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_account_set_yields_empty() {
        let platforms: BTreeSet<_> = Platform::ALL.into_iter().collect();
        let out = filter_entities(&catalog(), &platforms, &BTreeSet::new());
        assert!(out.is_empty());
    }

    #[test]
    fn catalog_order_is_preserved() {
        let platforms: BTreeSet<_> = Platform::ALL.into_iter().collect();
        let accounts: BTreeSet<_> = ["c", "a", "b"].iter().map(|s| EntityId::new(*s)).collect();
        let out = filter_entities(&catalog(), &platforms, &accounts);
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let platforms: BTreeSet<_> = Platform::ALL.into_iter().collect();
        let accounts: BTreeSet<_> = ["a", "b"].iter().map(|s| EntityId::new(*s)).collect();
        let once = filter_entities(&catalog(), &platforms, &accounts);
        let twice = filter_entities(&once, &platforms, &accounts);
        assert_eq!(once, twice);
    }
}
