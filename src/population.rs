use crate::config::Config;
use crate::factory;
use crate::interfaces::InterfaceRegistry;
use crate::types::Flow;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationUpdate {
    pub aged: usize,
    pub evicted: usize,
    pub created: usize,
}

/// All flows, one list per interface, indexed like the registry.
#[derive(Debug)]
pub struct FlowPopulation {
    flows: Vec<VecDeque<Flow>>,
    target: usize,
    reap_low_pct: u32,
    reap_high_pct: u32,
}

impl FlowPopulation {
    pub fn new(config: &Config, interface_count: usize) -> Self {
        Self {
            flows: (0..interface_count).map(|_| VecDeque::new()).collect(),
            target: config.target_population(),
            reap_low_pct: config.reap_low_pct,
            reap_high_pct: config.reap_high_pct,
        }
    }

    pub fn total(&self) -> usize {
        self.flows.iter().map(VecDeque::len).sum()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn flows(&self, index: usize) -> impl Iterator<Item = &Flow> {
        self.flows.get(index).into_iter().flatten()
    }

    /// One tick: age every flow, evict a random share, then top up toward
    /// the target. Both eviction and creation work from the population
    /// counted after aging; creation does not see what eviction removed.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        registry: &InterfaceRegistry,
        rng: &mut R,
        now_ms: i64,
        flows_remaining: &mut u64,
    ) -> PopulationUpdate {
        let aged = self.age(rng, now_ms);
        let total = self.total();
        let evicted = self.evict(rng, total);
        let created = self.create(registry, rng, now_ms, total, flows_remaining);

        debug!(
            "🌊 Population: {} aged, {} evicted, {} created, {} live (target {})",
            aged,
            evicted,
            created,
            self.total(),
            self.target
        );

        PopulationUpdate {
            aged,
            evicted,
            created,
        }
    }

    fn age<R: Rng + ?Sized>(&mut self, rng: &mut R, now_ms: i64) -> usize {
        let mut aged = 0;
        for flow in self.flows.iter_mut().flatten() {
            flow.update(rng, now_ms);
            aged += 1;
        }
        aged
    }

    /// Shuffle each interface's list, then pop from a random end. This is
    /// not a uniform sample and is not meant to be one.
    fn evict<R: Rng + ?Sized>(&mut self, rng: &mut R, total: usize) -> usize {
        if total == 0 || self.flows.is_empty() {
            return 0;
        }

        let pct = rng.random_range(self.reap_low_pct..=self.reap_high_pct);
        let reap = total * pct as usize / 100;
        let per_interface = reap / self.flows.len();
        if per_interface == 0 {
            return 0;
        }

        let mut evicted = 0;
        for flows in &mut self.flows {
            flows.make_contiguous().shuffle(rng);
            for _ in 0..per_interface {
                let removed = if rng.random_bool(0.5) {
                    flows.pop_front()
                } else {
                    flows.pop_back()
                };
                match removed {
                    Some(_) => evicted += 1,
                    None => break,
                }
            }
        }
        evicted
    }

    fn create<R: Rng + ?Sized>(
        &mut self,
        registry: &InterfaceRegistry,
        rng: &mut R,
        now_ms: i64,
        total: usize,
        flows_remaining: &mut u64,
    ) -> usize {
        if total >= self.target || self.flows.is_empty() {
            return 0;
        }

        // Floor division: any remainder is dropped, not carried over
        let per_interface = (self.target - total) / self.flows.len();
        let mut created = 0;
        for (index, flows) in self.flows.iter_mut().enumerate() {
            let Some(interface) = registry.get(index) else {
                continue;
            };
            for _ in 0..per_interface {
                if *flows_remaining == 0 {
                    return created;
                }
                flows.push_back(factory::create(registry, interface, rng, now_ms));
                *flows_remaining -= 1;
                created += 1;
            }
        }
        created
    }
}
