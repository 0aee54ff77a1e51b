//! Deferred setup queue behavior and thread affinity

use entity_physics::prelude::*;
use rapier3d::prelude::SharedShape;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const DT: f32 = 1.0 / 60.0;

fn make_space(config: PhysicsConfig) -> PhysicsSpace {
    let _ = tracing_subscriber::fmt::try_init();

    let mut space = PhysicsSpace::new(config);
    space.shapes().register(1, SharedShape::ball(0.5));
    space.initialize();
    space.start();
    space
}

#[test]
fn test_setup_runs_once_object_exists() {
    let mut space = make_space(PhysicsConfig::with_gravity(Vec3::ZERO));
    let mut world = World::new();
    let ran = Arc::new(AtomicBool::new(false));

    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));

    let flag = ran.clone();
    space.setup_object(ball, move |access| {
        let body = access.as_rigid_body().expect("expected a rigid body");
        body.set_linear_velocity(Vec3::new(0.0, 5.0, 0.0));
        flag.store(true, Ordering::SeqCst);
    });

    space.update(&mut world, DT).unwrap();

    assert!(ran.load(Ordering::SeqCst), "setup should have run");
    let velocity = space.linear_velocity(ball).unwrap();
    assert!((velocity.y - 5.0).abs() < 1e-3);
}

#[test]
fn test_setup_retries_until_components_arrive() {
    let mut space = make_space(PhysicsConfig::with_gravity(Vec3::ZERO));
    let mut world = World::new();
    let ran = Arc::new(AtomicBool::new(false));

    // entity exists but does not qualify for a physics object yet
    let ball = world.spawn(());
    let flag = ran.clone();
    space.setup_object(ball, move |_access| {
        flag.store(true, Ordering::SeqCst);
    });

    for _ in 0..3 {
        space.update(&mut world, DT).unwrap();
    }
    assert!(!ran.load(Ordering::SeqCst), "no object yet, must not run");

    world
        .insert(
            ball,
            (
                SpawnPosition::new(Vec3::ZERO),
                ShapeInfo::new(1),
                Mass::new(1.0, 0),
            ),
        )
        .unwrap();
    space.update(&mut world, DT).unwrap();

    assert!(ran.load(Ordering::SeqCst), "setup should run after creation");
}

#[test]
fn test_setup_abandoned_after_retry_cap() {
    let mut config = PhysicsConfig::with_gravity(Vec3::ZERO);
    config.max_setup_retries = 5;
    let mut space = make_space(config);
    let mut world = World::new();
    let ran = Arc::new(AtomicBool::new(false));

    // this entity never gets physics components
    let orphan = world.spawn(());
    let flag = ran.clone();
    space.setup_object(orphan, move |_access| {
        flag.store(true, Ordering::SeqCst);
    });

    for _ in 0..10 {
        space.update(&mut world, DT).unwrap();
    }

    assert!(!ran.load(Ordering::SeqCst));

    // even if the entity qualifies later, the command is gone
    world
        .insert(
            orphan,
            (
                SpawnPosition::new(Vec3::ZERO),
                ShapeInfo::new(1),
                Mass::new(1.0, 0),
            ),
        )
        .unwrap();
    space.update(&mut world, DT).unwrap();
    assert!(!ran.load(Ordering::SeqCst), "abandoned setup must not run");
}

#[test]
fn test_update_panics_off_thread() {
    let mut space = make_space(PhysicsConfig::with_gravity(Vec3::ZERO));

    let result = thread::spawn(move || {
        let mut world = World::new();
        let _ = space.update(&mut world, DT);
    })
    .join();

    assert!(result.is_err(), "update off the owning thread must panic");
}

#[test]
fn test_update_panics_before_initialize() {
    let _ = tracing_subscriber::fmt::try_init();

    let result = thread::spawn(|| {
        let mut space = PhysicsSpace::new(PhysicsConfig::default());
        let mut world = World::new();
        let _ = space.update(&mut world, DT);
    })
    .join();

    assert!(result.is_err(), "update before initialize must panic");
}
