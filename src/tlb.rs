use std::{collections::VecDeque, iter};

use crate::error::ConfigError;

pub type Vpn = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
}

impl AccessResult {
    pub fn is_hit(self) -> bool {
        self == AccessResult::Hit
    }
}

#[derive(Debug)]
struct SetIndex {
    mask: Vpn,
}

impl SetIndex {
    fn apply(&self, vpn: Vpn) -> usize {
        (vpn & self.mask) as usize
    }
}

/// Set-associative TLB with per-set LRU replacement.
///
/// Each set keeps its resident VPNs ordered MRU first, LRU last. Presence in a
/// set is validity; a cold TLB has every set empty.
#[derive(Debug)]
pub struct SetAssociativeTlb {
    sets: Vec<VecDeque<Vpn>>,
    n_ways: usize,
    index: SetIndex,
}

impl SetAssociativeTlb {
    pub fn new(n_sets: usize, n_ways: usize) -> Result<Self, ConfigError> {
        if n_sets == 0 {
            return Err(ConfigError::ZeroSets);
        }
        if n_ways == 0 {
            return Err(ConfigError::ZeroWays);
        }
        if !n_sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo(n_sets));
        }

        Ok(SetAssociativeTlb {
            sets: iter::repeat_with(|| VecDeque::with_capacity(n_ways))
                .take(n_sets)
                .collect(),
            n_ways,
            index: SetIndex {
                mask: (n_sets - 1) as Vpn,
            },
        })
    }

    pub fn n_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn n_ways(&self) -> usize {
        self.n_ways
    }

    pub fn set_of(&self, vpn: Vpn) -> usize {
        self.index.apply(vpn)
    }

    pub fn access(&mut self, vpn: Vpn) -> AccessResult {
        let set = self.index.apply(vpn);
        let ru_order = &mut self.sets[set];

        if let Some(pos) = ru_order.iter().position(|&resident| resident == vpn) {
            ru_order.remove(pos);
            ru_order.push_front(vpn);
            return AccessResult::Hit;
        }

        if ru_order.len() >= self.n_ways {
            if let Some(victim) = ru_order.pop_back() {
                log::trace!("set {set}: evict vpn {victim} for vpn {vpn}");
            }
        }
        ru_order.push_front(vpn);
        AccessResult::Miss
    }

    /// Resident VPNs of `set`, MRU first.
    pub fn set_entries(&self, set: usize) -> impl Iterator<Item = Vpn> + '_ {
        self.sets[set].iter().copied()
    }

    pub fn contains(&self, vpn: Vpn) -> bool {
        self.sets[self.index.apply(vpn)].contains(&vpn)
    }

    pub fn occupancy(&self) -> usize {
        self.sets.iter().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::AccessResult::{Hit, Miss};
    use super::*;

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(
            SetAssociativeTlb::new(0, 4).unwrap_err(),
            ConfigError::ZeroSets
        );
        assert_eq!(
            SetAssociativeTlb::new(8, 0).unwrap_err(),
            ConfigError::ZeroWays
        );
        assert_eq!(
            SetAssociativeTlb::new(12, 4).unwrap_err(),
            ConfigError::SetsNotPowerOfTwo(12)
        );
        assert!(SetAssociativeTlb::new(1, 1).is_ok());
        assert!(SetAssociativeTlb::new(128, 64).is_ok());
    }

    #[test]
    fn first_access_is_cold_miss() {
        let mut tlb = SetAssociativeTlb::new(64, 4).unwrap();
        assert_eq!(tlb.access(1234), Miss);
        assert_eq!(tlb.access(1234), Hit);
    }

    #[test]
    fn index_is_low_bits() {
        let tlb = SetAssociativeTlb::new(16, 2).unwrap();
        assert_eq!(tlb.set_of(0x35), 0x5);
        assert_eq!(tlb.set_of(16), 0);
        let single = SetAssociativeTlb::new(1, 2).unwrap();
        assert_eq!(single.set_of(u64::MAX), 0);
    }

    #[test]
    fn evicts_least_recently_used() {
        // 4 sets: 1, 5 and 9 all land in set 1.
        let mut tlb = SetAssociativeTlb::new(4, 2).unwrap();
        assert_eq!(tlb.access(1), Miss);
        assert_eq!(tlb.access(5), Miss);
        assert_eq!(tlb.access(9), Miss);
        assert!(!tlb.contains(1));
        assert_eq!(tlb.access(5), Hit);
        assert_eq!(tlb.access(1), Miss);
    }

    #[test]
    fn hit_refreshes_recency() {
        let mut tlb = SetAssociativeTlb::new(1, 2).unwrap();
        tlb.access(10);
        tlb.access(20);
        assert_eq!(tlb.access(10), Hit);
        assert_eq!(tlb.set_entries(0).collect::<Vec<_>>(), vec![10, 20]);
        // 20 is now LRU
        assert_eq!(tlb.access(30), Miss);
        assert_eq!(tlb.set_entries(0).collect::<Vec<_>>(), vec![30, 10]);
    }

    #[test]
    fn single_entry_thrashes_on_alternation() {
        // 7 evicts 5, so the third access to 5 misses again.
        let mut tlb = SetAssociativeTlb::new(1, 1).unwrap();
        let outcomes: Vec<_> = [5, 7, 5].iter().map(|&vpn| tlb.access(vpn)).collect();
        assert_eq!(outcomes, vec![Miss, Miss, Miss]);
    }

    #[test]
    fn other_sets_untouched() {
        let mut tlb = SetAssociativeTlb::new(2, 1).unwrap();
        tlb.access(0);
        tlb.access(1);
        tlb.access(3);
        assert!(tlb.contains(0));
        assert!(!tlb.contains(1));
        assert_eq!(tlb.occupancy(), 2);
    }

    #[test]
    fn sets_never_exceed_ways() {
        let mut tlb = SetAssociativeTlb::new(8, 3).unwrap();
        for vpn in (0..2000u64).map(|i| (i * 7919) % 257) {
            tlb.access(vpn);
            for set in 0..tlb.n_sets() {
                let entries: Vec<_> = tlb.set_entries(set).collect();
                assert!(entries.len() <= tlb.n_ways());
                let mut dedup = entries.clone();
                dedup.sort_unstable();
                dedup.dedup();
                assert_eq!(dedup.len(), entries.len());
            }
        }
    }

    #[test]
    fn generated_trace_respects_set_bounds() {
        let trace = crate::trace::generate_trace(20_000, 8192, 4096, 0.85, 16, 42).unwrap();
        let mut tlb = SetAssociativeTlb::new(16, 4).unwrap();
        for r in &trace {
            tlb.access(r.vpn);
            let set = tlb.set_of(r.vpn);
            let entries: Vec<_> = tlb.set_entries(set).collect();
            assert!(entries.len() <= tlb.n_ways());
            assert_eq!(entries[0], r.vpn);
            assert_eq!(entries.iter().filter(|&&vpn| vpn == r.vpn).count(), 1);
        }
        assert!(tlb.occupancy() <= tlb.n_sets() * tlb.n_ways());
        for set in 0..tlb.n_sets() {
            assert!(tlb.set_entries(set).all(|vpn| tlb.set_of(vpn) == set));
        }
    }
}
