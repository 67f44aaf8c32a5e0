use glam::{Mat4, Vec3};
use crate::physics::*;

fn desc(position: Vec3) -> RigidBodyDesc {
    RigidBodyDesc { mass: 2.0, is_static: false, shape: CollisionShape::Empty, position }
}

#[test]
fn test_add_body_uses_position() {
    let mut world = KinematicWorld::new();
    let handle = world.add_body(desc(Vec3::new(1.0, 2.0, 3.0))).unwrap();
    assert_eq!(world.world_transform(handle), Some(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))));
}

#[test]
fn test_set_position_teleports() {
    let mut world = KinematicWorld::new();
    let handle = world.add_body(desc(Vec3::ZERO)).unwrap();
    world.body_mut(handle).unwrap().set_position(Vec3::new(0.0, 5.0, 0.0));
    assert_eq!(world.world_transform(handle).unwrap().w_axis, glam::Vec4::new(0.0, 5.0, 0.0, 1.0));
}

#[test]
fn test_remove_body_invalidates_handle() {
    let mut world = KinematicWorld::new();
    let handle = world.add_body(desc(Vec3::ZERO)).unwrap();
    assert!(world.remove_body(handle));
    assert!(!world.remove_body(handle));
    assert!(world.world_transform(handle).is_none());
    assert!(world.is_empty());
}

#[test]
fn test_negative_mass_rejected() {
    let mut world = KinematicWorld::new();
    let mut bad = desc(Vec3::ZERO);
    bad.mass = -1.0;
    assert!(world.add_body(bad).is_err());
}
