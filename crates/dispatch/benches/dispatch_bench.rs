//! Dispatch Engine Performance Benchmarks
//!
//! Measures the hot paths of assignment on dispatcher workstation hardware:
//! - Haversine distance between two coordinates
//! - Nearest-unit ranking over growing rosters
//! - Event serialization overhead on the live feed

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use std::collections::HashSet;

use lifelink_dispatch::nearest_available;
use lifelink_domain::{DispatchEvent, LocationReport, Unit};
use lifelink_geo::{haversine_km, Coordinate};
use lifelink_registry::{BoardState, EmergencyStore, UnitRegistry};
use rand::Rng;

/// Build a board with `count` available units scattered around Manhattan
fn scattered_board(count: usize) -> BoardState {
    let mut rng = rand::thread_rng();
    let mut units = UnitRegistry::new(0);
    for i in 0..count {
        let id = format!("unit-{i:04}");
        let mut unit = Unit::new(id.clone(), format!("crew {i}"), format!("AMB-{i:04}"), 0);
        unit.go_on_duty(0).unwrap();
        unit.update_location(
            Coordinate::new(rng.gen_range(40.55..40.90), rng.gen_range(-74.10..-73.75)),
            LocationReport::at(0),
        );
        units.register(unit).unwrap();
    }
    BoardState {
        units,
        emergencies: EmergencyStore::new(),
    }
}

/// Benchmark: single haversine distance
fn bench_haversine(c: &mut Criterion) {
    let city_hall = Coordinate::new(40.7128, -74.0060);
    let times_square = Coordinate::new(40.7580, -73.9855);

    c.bench_function("haversine_km", |b| {
        b.iter(|| black_box(haversine_km(black_box(city_hall), black_box(times_square))))
    });
}

/// Benchmark: nearest-unit ranking (varying roster sizes)
fn bench_nearest_available(c: &mut Criterion) {
    let scene = Coordinate::new(40.758, -73.9855);
    let excluded = HashSet::new();

    for count in [10usize, 100, 1000] {
        let state = scattered_board(count);

        c.bench_with_input(
            BenchmarkId::new("nearest_available", count),
            &count,
            |b, _| {
                b.iter(|| black_box(nearest_available(&state, scene, &excluded)));
            },
        );
    }
}

/// Benchmark: feed event serialization
fn bench_event_serialization(c: &mut Criterion) {
    let event = DispatchEvent::UnitAssigned {
        emergency_id: "EMG-1755907200000-K3X9Q".to_string(),
        unit_id: "unit-0042".to_string(),
        distance_km: 5.31,
        eta_minutes: 4,
        at: 1_755_907_200_000,
    };

    c.bench_function("event_serialize_assignment", |b| {
        b.iter(|| black_box(serde_json::to_string(&event).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_haversine,
    bench_nearest_available,
    bench_event_serialization,
);

criterion_main!(benches);
