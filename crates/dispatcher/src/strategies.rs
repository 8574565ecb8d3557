use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::debug;

use ridehail_domain::DriverStatus;

/// 司机选择策略
///
/// 输入是司机状态表和排除集合，输出一个空闲且不在排除集合中的司机。
pub trait DriverSelectionStrategy: Send + Sync {
    fn select_driver(
        &self,
        drivers: &HashMap<String, DriverStatus>,
        excluding: &HashSet<String>,
    ) -> Option<String>;

    fn name(&self) -> &str;
}

/// 所有可被选中的司机，按ID排序以保证结果只取决于随机数序列
pub fn eligible_drivers<'a>(
    drivers: &'a HashMap<String, DriverStatus>,
    excluding: &HashSet<String>,
) -> Vec<&'a String> {
    let mut candidates: Vec<&String> = drivers
        .iter()
        .filter(|(id, status)| **status == DriverStatus::Available && !excluding.contains(*id))
        .map(|(id, _)| id)
        .collect();
    candidates.sort();
    candidates
}

/// 在候选司机中均匀随机选择，避免总是偏向固定顺序中的某个司机
pub struct RandomSelectionStrategy {
    rng: Option<Mutex<StdRng>>,
}

impl RandomSelectionStrategy {
    pub fn new() -> Self {
        Self { rng: None }
    }

    /// 固定种子，便于复现选择序列
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomSelectionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverSelectionStrategy for RandomSelectionStrategy {
    fn select_driver(
        &self,
        drivers: &HashMap<String, DriverStatus>,
        excluding: &HashSet<String>,
    ) -> Option<String> {
        let candidates = eligible_drivers(drivers, excluding);
        if candidates.is_empty() {
            debug!("没有可用的司机 (排除 {} 个)", excluding.len());
            return None;
        }

        let selected = match &self.rng {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                candidates.choose(&mut *rng).copied()
            }
            None => candidates.choose(&mut rand::rng()).copied(),
        };

        debug!(
            "随机策略从 {} 个候选司机中选择: {:?}",
            candidates.len(),
            selected
        );
        selected.cloned()
    }

    fn name(&self) -> &str {
        "Random"
    }
}

/// 总是选择ID最小的候选司机
pub struct FirstAvailableStrategy;

impl DriverSelectionStrategy for FirstAvailableStrategy {
    fn select_driver(
        &self,
        drivers: &HashMap<String, DriverStatus>,
        excluding: &HashSet<String>,
    ) -> Option<String> {
        eligible_drivers(drivers, excluding)
            .first()
            .map(|id| (*id).clone())
    }

    fn name(&self) -> &str {
        "FirstAvailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drivers(entries: &[(&str, DriverStatus)]) -> HashMap<String, DriverStatus> {
        entries
            .iter()
            .map(|(id, status)| (id.to_string(), *status))
            .collect()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_eligible_drivers_filters_busy_and_excluded() {
        let table = drivers(&[
            ("d3", DriverStatus::Available),
            ("d1", DriverStatus::Available),
            ("d2", DriverStatus::Busy),
            ("d4", DriverStatus::Available),
        ]);

        let eligible = eligible_drivers(&table, &set(&["d4"]));
        assert_eq!(eligible, vec!["d1", "d3"]);
    }

    #[test]
    fn test_random_strategy_no_candidates() {
        let strategy = RandomSelectionStrategy::new();
        assert!(strategy
            .select_driver(&HashMap::new(), &HashSet::new())
            .is_none());

        let table = drivers(&[("d1", DriverStatus::Busy), ("d2", DriverStatus::Available)]);
        assert!(strategy.select_driver(&table, &set(&["d2"])).is_none());
    }

    #[test]
    fn test_random_strategy_never_picks_excluded() {
        let strategy = RandomSelectionStrategy::with_seed(7);
        let table = drivers(&[
            ("d1", DriverStatus::Available),
            ("d2", DriverStatus::Available),
            ("d3", DriverStatus::Available),
        ]);
        let excluded = set(&["d2"]);

        for _ in 0..200 {
            let picked = strategy.select_driver(&table, &excluded).unwrap();
            assert_ne!(picked, "d2");
        }
    }

    #[test]
    fn test_random_strategy_covers_all_candidates() {
        let strategy = RandomSelectionStrategy::with_seed(42);
        let table = drivers(&[
            ("d1", DriverStatus::Available),
            ("d2", DriverStatus::Available),
            ("d3", DriverStatus::Available),
        ]);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            let picked = strategy.select_driver(&table, &HashSet::new()).unwrap();
            *counts.entry(picked).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        for count in counts.values() {
            // 期望约1000次
            assert!(*count > 800 && *count < 1200, "分布不均匀: {counts:?}");
        }
    }

    #[test]
    fn test_seeded_strategy_is_reproducible() {
        let table = drivers(&[
            ("a", DriverStatus::Available),
            ("b", DriverStatus::Available),
            ("c", DriverStatus::Available),
        ]);
        let first = RandomSelectionStrategy::with_seed(99);
        let second = RandomSelectionStrategy::with_seed(99);

        for _ in 0..20 {
            assert_eq!(
                first.select_driver(&table, &HashSet::new()),
                second.select_driver(&table, &HashSet::new())
            );
        }
    }

    #[test]
    fn test_first_available_strategy() {
        let strategy = FirstAvailableStrategy;
        let table = drivers(&[
            ("d2", DriverStatus::Available),
            ("d1", DriverStatus::Busy),
            ("d3", DriverStatus::Available),
        ]);

        assert_eq!(
            strategy.select_driver(&table, &HashSet::new()),
            Some("d2".to_string())
        );
        assert_eq!(
            strategy.select_driver(&table, &set(&["d2"])),
            Some("d3".to_string())
        );
        assert_eq!(strategy.name(), "FirstAvailable");
    }
}
