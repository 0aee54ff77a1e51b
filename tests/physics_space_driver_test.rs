//! Control driver lifecycle and per-step callbacks

use entity_physics::prelude::*;
use rapier3d::prelude::SharedShape;
use std::sync::{Arc, Mutex};

const DT: f32 = 1.0 / 60.0;

type EventLog = Arc<Mutex<Vec<String>>>;

struct RecordingDriver {
    name: &'static str,
    log: EventLog,
}

impl RecordingDriver {
    fn boxed(name: &'static str, log: &EventLog) -> Box<dyn ControlDriver> {
        Box::new(Self {
            name,
            log: log.clone(),
        })
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", self.name, event));
    }
}

impl ControlDriver for RecordingDriver {
    fn initialize(&mut self, _body: &mut BodyAccess<'_>) {
        self.record("initialize");
    }

    fn update(&mut self, _dt: f32, _body: &mut BodyAccess<'_>) {
        self.record("update");
    }

    fn terminate(&mut self, _body: &mut BodyAccess<'_>) {
        self.record("terminate");
    }
}

/// Steers its body to a fixed target by authoring the pose directly.
struct KinematicDriver {
    target: Vec3,
}

impl ControlDriver for KinematicDriver {
    fn initialize(&mut self, body: &mut BodyAccess<'_>) {
        body.set_kinematic(true);
    }

    fn update(&mut self, _dt: f32, body: &mut BodyAccess<'_>) {
        body.set_location(self.target);
    }

    fn terminate(&mut self, body: &mut BodyAccess<'_>) {
        body.set_kinematic(false);
    }
}

fn make_space() -> PhysicsSpace {
    let _ = tracing_subscriber::fmt::try_init();

    let mut space = PhysicsSpace::new(PhysicsConfig::with_gravity(Vec3::ZERO));
    space.shapes().register(1, SharedShape::ball(0.5));
    space.initialize();
    space.start();
    space
}

#[test]
fn test_driver_lifecycle_ordering() {
    let mut space = make_space();
    let mut world = World::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));

    // queued before the body exists; resolved once it does
    space.set_control_driver(ball, Some(RecordingDriver::boxed("first", &log)));
    space.update(&mut world, DT).unwrap();

    // a replacement terminates the old driver before the new one starts
    space.set_control_driver(ball, Some(RecordingDriver::boxed("second", &log)));
    space.update(&mut world, DT).unwrap();

    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "first initialize",
            "first update",
            "first terminate",
            "second initialize",
            "second update",
        ]
    );
}

#[test]
fn test_driver_terminated_on_entity_removal() {
    let mut space = make_space();
    let mut world = World::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    let ball = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::new(1.0, 0),
    ));
    space.set_control_driver(ball, Some(RecordingDriver::boxed("driver", &log)));
    space.update(&mut world, DT).unwrap();

    world.despawn(ball).unwrap();
    space.update(&mut world, DT).unwrap();

    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["driver initialize", "driver update", "driver terminate"]
    );
}

#[test]
fn test_kinematic_driver_moves_static_body() {
    let mut space = make_space();
    let mut world = World::new();

    let platform = world.spawn((
        SpawnPosition::new(Vec3::ZERO),
        ShapeInfo::new(1),
        Mass::fixed(0),
    ));
    space.set_control_driver(
        platform,
        Some(Box::new(KinematicDriver {
            target: Vec3::new(0.0, 4.0, 0.0),
        })),
    );

    for _ in 0..3 {
        space.update(&mut world, DT).unwrap();
    }

    let view = space.object_view(platform).unwrap();
    assert!(
        (view.location - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-3,
        "driver should have moved the platform, got {:?}",
        view.location
    );
}
