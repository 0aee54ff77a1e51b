//! End-to-end lifecycle and gravity integration through the full space

use entity_physics::prelude::*;
use rapier3d::prelude::SharedShape;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct CountingListener {
    added: AtomicUsize,
    updated: AtomicUsize,
    removed: AtomicUsize,
    frames: AtomicUsize,
    ended: AtomicUsize,
}

impl PhysicsObjectListener for CountingListener {
    fn start_frame(&self, _time: f32) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn end_frame(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }

    fn object_added(&self, _object: &ObjectView) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn object_updated(&self, _object: &ObjectView) {
        self.updated.fetch_add(1, Ordering::SeqCst);
    }

    fn object_removed(&self, _object: &ObjectView) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

fn make_space(gravity: Vec3) -> PhysicsSpace {
    let _ = tracing_subscriber::fmt::try_init();

    let mut space = PhysicsSpace::new(PhysicsConfig::with_gravity(gravity));
    space.shapes().register(1, SharedShape::ball(0.5));
    space.initialize();
    space.start();
    space
}

#[test]
fn test_dynamic_body_falls_under_gravity() {
    let mut space = make_space(Vec3::new(0.0, -20.0, 0.0));
    let mut world = World::new();

    let ball = world.spawn((
        SpawnPosition::new(Vec3::new(0.0, 10.0, 0.0)),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));

    for _ in 0..20 {
        space.update(&mut world, DT).expect("update failed");
    }

    let velocity = space.linear_velocity(ball).expect("ball has no body");
    let expected = -20.0 * 20.0 * DT;
    assert!(
        (velocity.y - expected).abs() < 1e-2,
        "expected vy ~ {expected}, got {}",
        velocity.y
    );

    let view = space.object_view(ball).expect("ball has no view");
    assert!(
        view.location.y < 10.0 - 1.0,
        "ball should have fallen, y = {}",
        view.location.y
    );
}

#[test]
fn test_listener_sees_add_update_remove() {
    let mut space = make_space(Vec3::new(0.0, -9.81, 0.0));
    let listener = Arc::new(CountingListener::default());
    space.add_physics_listener(listener.clone());

    let mut world = World::new();
    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));

    for _ in 0..5 {
        space.update(&mut world, DT).unwrap();
    }

    assert_eq!(listener.added.load(Ordering::SeqCst), 1);
    assert_eq!(listener.frames.load(Ordering::SeqCst), 5);
    // one pose publication per step, starting on the creation frame
    assert_eq!(listener.updated.load(Ordering::SeqCst), 5);

    world.despawn(ball).unwrap();
    space.update(&mut world, DT).unwrap();

    assert_eq!(listener.removed.load(Ordering::SeqCst), 1);
    assert!(!space.contains(ball));
    assert_eq!(space.body_count(), 0);
}

#[test]
fn test_static_body_ignores_gravity_but_follows_spawn_edits() {
    let mut space = make_space(Vec3::new(0.0, -9.81, 0.0));
    let mut world = World::new();

    let wall = world.spawn((
        SpawnPosition::new(Vec3::new(2.0, 3.0, 4.0)),
        ShapeInfo::new(1),
        Mass::fixed(0),
    ));

    for _ in 0..10 {
        space.update(&mut world, DT).unwrap();
    }
    let view = space.object_view(wall).unwrap();
    assert_eq!(view.location, Vec3::new(2.0, 3.0, 4.0));

    // editing the placement of a static body moves it
    *world.get::<&mut SpawnPosition>(wall).unwrap() = SpawnPosition::new(Vec3::new(5.0, 0.0, 0.0));
    space.update(&mut world, DT).unwrap();

    let view = space.object_view(wall).unwrap();
    assert_eq!(view.location, Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_missing_shape_is_an_error() {
    let mut space = make_space(Vec3::ZERO);
    let mut world = World::new();

    world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(99),
        Mass::new(1.0, 0),
    ));

    let result = space.update(&mut world, DT);
    assert!(matches!(result, Err(SpaceError::ObjectCreation { .. })));
}

#[test]
fn test_frame_notifications_paired_on_sync_error() {
    let mut space = make_space(Vec3::ZERO);
    let listener = Arc::new(CountingListener::default());
    space.add_physics_listener(listener.clone());

    let mut world = World::new();
    world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(99),
        Mass::new(1.0, 0),
    ));

    assert!(space.update(&mut world, DT).is_err());

    // every start_frame gets its end_frame, even on an aborted cycle
    assert_eq!(listener.frames.load(Ordering::SeqCst), 1);
    assert_eq!(listener.ended.load(Ordering::SeqCst), 1);
}

#[test]
fn test_time_scale_zero_freezes_simulation() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut config = PhysicsConfig::with_gravity(Vec3::new(0.0, -9.81, 0.0));
    config.time_scale = 0.0;
    let mut space = PhysicsSpace::new(config);
    space.shapes().register(1, SharedShape::ball(0.5));
    space.initialize();
    space.start();

    let mut world = World::new();
    let ball = world.spawn((
        SpawnPosition::new(Vec3::new(0.0, 10.0, 0.0)),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));

    for _ in 0..10 {
        space.update(&mut world, DT).unwrap();
    }

    // objects are still created, but nothing moves
    let view = space.object_view(ball).expect("ball should be tracked");
    assert_eq!(view.location, Vec3::new(0.0, 10.0, 0.0));
    assert_eq!(space.linear_velocity(ball), Some(Vec3::ZERO));
}
