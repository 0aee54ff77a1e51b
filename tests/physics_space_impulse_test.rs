//! One-shot impulse component consumption

use entity_physics::prelude::*;
use rapier3d::prelude::SharedShape;

const DT: f32 = 1.0 / 60.0;

fn make_space() -> PhysicsSpace {
    let _ = tracing_subscriber::fmt::try_init();

    let mut space = PhysicsSpace::new(PhysicsConfig::with_gravity(Vec3::ZERO));
    space.shapes().register(1, SharedShape::ball(0.5));
    space.initialize();
    space.start();
    space
}

#[test]
fn test_linear_impulse_sets_velocity_once() {
    let mut space = make_space();
    let mut world = World::new();

    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));
    space.update(&mut world, DT).unwrap();

    world.insert_one(ball, Impulse::linear(Vec3::new(1.0, 0.0, 0.0))).unwrap();
    space.update(&mut world, DT).unwrap();

    // the component is consumed on the cycle that read it
    assert!(world.get::<&Impulse>(ball).is_err());

    let velocity = space.linear_velocity(ball).unwrap();
    assert!(
        (velocity - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-3,
        "expected (1,0,0), got {velocity:?}"
    );

    // no gravity, so the velocity persists and the ball coasts
    for _ in 0..59 {
        space.update(&mut world, DT).unwrap();
    }
    let view = space.object_view(ball).unwrap();
    assert!(
        (view.location.x - 1.0).abs() < 1e-2,
        "expected x ~ 1.0 after one second, got {}",
        view.location.x
    );
}

#[test]
fn test_angular_impulse_spins_body() {
    let mut space = make_space();
    let mut world = World::new();

    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));
    space.update(&mut world, DT).unwrap();

    world.insert_one(ball, Impulse::angular(Vec3::new(0.0, 2.0, 0.0))).unwrap();
    space.update(&mut world, DT).unwrap();

    assert!(world.get::<&Impulse>(ball).is_err());
    let view = space.object_view(ball).unwrap();
    assert!(
        view.rotation != Quat::IDENTITY,
        "angular impulse should rotate the body"
    );
}

#[test]
fn test_impulse_without_body_is_discarded() {
    let mut space = make_space();
    let mut world = World::new();

    // no physics components at all, just the impulse
    let entity = world.spawn((Impulse::linear(Vec3::X),));
    space.update(&mut world, DT).unwrap();

    assert!(world.get::<&Impulse>(entity).is_err());
    assert!(!space.contains(entity));
}
