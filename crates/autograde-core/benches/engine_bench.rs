//! # Decision Pipeline Benchmarks
//!
//! Run with: `cargo bench -p autograde-core`

use autograde_core::{
    ActorId, AutogradeConfig, AutogradeService, CapabilityAuthority, CostLine,
    DamageCooldownTracker, Inventory, ItemId, LocationKey, Notice, PieceDefinition, PieceId,
    PlacedPiece, PlacementEvent, PlacementKind, Tier, TierCost, Timestamp, UpgradeCost,
    UpgradeHooks, VariantId, World,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

/// Host that grants everything and holds unlimited resources.
struct OpenHost;

impl CapabilityAuthority for OpenHost {
    fn has_capability(&self, _actor: ActorId, name: &str) -> bool {
        name == "bgrade.all"
    }
}

impl Inventory for OpenHost {
    fn item_amount(&self, _actor: ActorId, _item: ItemId) -> u64 {
        u64::MAX
    }
    fn take_items(&mut self, _actor: ActorId, _cost: &UpgradeCost) {}
    fn give_item(&mut self, _actor: ActorId, _item: ItemId, _amount: u64) {}
}

impl World for OpenHost {
    fn can_build(&self, _actor: ActorId, _piece: &PlacedPiece) -> bool {
        true
    }
    fn apply_upgrade(&mut self, _piece: &PlacedPiece, _tier: Tier, _variant: VariantId) {}
    fn remove_piece(&mut self, _piece: &PlacedPiece) {}
    fn play_upgrade_effect(&mut self, _: ActorId, _: &PlacedPiece, _: Tier, _: VariantId) {}
    fn notify(&mut self, _actor: ActorId, _notice: Notice) {}
}

impl UpgradeHooks for OpenHost {}

fn wall() -> Arc<PieceDefinition> {
    let mut definition = PieceDefinition::new("wall");
    for value in 0..=4u8 {
        if let Ok(tier) = Tier::new(value) {
            definition = definition.with_tier(TierCost {
                tier,
                lines: vec![CostLine::new(ItemId(1), 100), CostLine::new(ItemId(2), 25)],
            });
        }
    }
    Arc::new(definition)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    let definition = wall();

    for actors in [1u64, 100, 1_000] {
        let mut service = AutogradeService::new(AutogradeConfig::default()).expect("service");
        service.start();
        let mut host = OpenHost;
        for id in 0..actors {
            service
                .set_tier(&host, ActorId(id), Tier::METAL, None, Timestamp(0))
                .expect("set tier");
        }

        let event = PlacementEvent {
            actor: ActorId(0),
            kind: PlacementKind::Structural,
            piece: PlacedPiece {
                id: PieceId(1),
                definition: Arc::clone(&definition),
                tier: Tier::DISABLED,
                location: LocationKey::from_millimetres(0, 0, 0),
            },
        };

        group.bench_with_input(BenchmarkId::from_parameter(actors), &event, |b, event| {
            b.iter(|| service.on_placement(&mut host, black_box(event), Timestamp(1)));
        });
    }

    group.finish();
}

fn bench_cooldown_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("cooldown_prune");

    for entries in [100i64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, &n| {
            b.iter(|| {
                let mut tracker = DamageCooldownTracker::new();
                for i in 0..n {
                    let until = Timestamp(u64::try_from(i % 60).unwrap_or(0));
                    tracker.record_hit(LocationKey::from_millimetres(i * 100, 0, 0), until);
                }
                black_box(tracker.prune(Timestamp(30)))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_placement, bench_cooldown_prune);
criterion_main!(benches);
