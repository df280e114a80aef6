//! Orientation predicates.
//!
//! Upright-style checks rotate the object's canonical up axis into world
//! coordinates and look at its vertical component. Objects that do not
//! declare a canonical up axis cannot be checked and produce
//! `ExecutionError::MissingUpAxis`. A non-finite orientation or rotated
//! axis produces `ExecutionError::NonFiniteMeasurement`.

use glam::DVec3;

use crate::config::EvaluatorConfig;
use crate::error::{ExecutionError, GoalResult};
use crate::geometry::{angle_between_degrees, wrapped_angle_diff_degrees, Axis, Pose};
use crate::scene::PhysicalObject;

use super::Args;

fn non_finite(predicate: &'static str) -> ExecutionError {
    ExecutionError::NonFiniteMeasurement {
        predicate: predicate.to_string(),
    }
}

/// The object's pose, provided its orientation is finite. A zero quaternion
/// from the scene normalizes to NaN.
fn oriented_pose(object: &dyn PhysicalObject, predicate: &'static str) -> GoalResult<Pose> {
    let pose = object.pose()?;
    if pose.orientation.is_finite() {
        Ok(pose)
    } else {
        Err(non_finite(predicate).into())
    }
}

fn world_axis(object: &dyn PhysicalObject, axis: Axis, predicate: &'static str) -> GoalResult<DVec3> {
    let v = oriented_pose(object, predicate)?.world_axis(axis);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(non_finite(predicate).into())
    }
}

fn world_up(object: &dyn PhysicalObject, predicate: &'static str) -> GoalResult<DVec3> {
    let axis = object.up_axis().ok_or_else(|| ExecutionError::MissingUpAxis {
        object: object.name().to_string(),
        predicate,
    })?;
    world_axis(object, axis, predicate)
}

fn angle(a: DVec3, b: DVec3, predicate: &'static str) -> GoalResult<f64> {
    angle_between_degrees(a, b)
        .filter(|deg| deg.is_finite())
        .ok_or_else(|| non_finite(predicate).into())
}

fn within(value: f64, lo: f64, hi: f64) -> bool {
    lo <= value && value <= hi
}

/// `UpsideDown(a)`.
pub fn upside_down(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    Ok(world_up(args.object(0)?, "UpsideDown")?.z < config.upside_down_z)
}

/// `Upright(a)`.
pub fn upright(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    Ok(world_up(args.object(0)?, "Upright")?.z >= config.upright_z)
}

/// `UprightWithin45(a)`: tilted no more than 45 degrees from upright.
pub fn upright_within_45(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    Ok(world_up(args.object(0)?, "UprightWithin45")?.z >= config.upright_45_z)
}

/// `AxisAlignedWithin(a, axis, lo, hi)`: angle between `a`'s local `axis`
/// and world +Z is within `[lo, hi]` degrees.
pub fn axis_aligned_within(args: &Args<'_, '_>) -> GoalResult<bool> {
    let local = world_axis(args.object(0)?, args.axis(1)?, "AxisAlignedWithin")?;
    let deg = angle(local, DVec3::Z, "AxisAlignedWithin")?;
    Ok(within(deg, args.number(2)?, args.number(3)?))
}

/// `AxisAlignedWithinWorldAxis(a, axis, lo, hi, world)`.
pub fn axis_aligned_within_world_axis(args: &Args<'_, '_>) -> GoalResult<bool> {
    let local = world_axis(args.object(0)?, args.axis(1)?, "AxisAlignedWithinWorldAxis")?;
    let world: Axis = args.axis(4)?;
    let deg = angle(local, world.unit(), "AxisAlignedWithinWorldAxis")?;
    Ok(within(deg, args.number(2)?, args.number(3)?))
}

/// `AxisAlignedWithinObjectAxis(a, b, axis_a, axis_b, lo, hi)`.
pub fn axis_aligned_within_object_axis(args: &Args<'_, '_>) -> GoalResult<bool> {
    let a = world_axis(args.object(0)?, args.axis(2)?, "AxisAlignedWithinObjectAxis")?;
    let b = world_axis(args.object(1)?, args.axis(3)?, "AxisAlignedWithinObjectAxis")?;
    let deg = angle(a, b, "AxisAlignedWithinObjectAxis")?;
    Ok(within(deg, args.number(4)?, args.number(5)?))
}

/// `OrientedAtDegree(a, roll, pitch, yaw, tol_roll, tol_pitch, tol_yaw)`:
/// XYZ Euler angles each within tolerance, compared on the circle.
pub fn oriented_at_degree(args: &Args<'_, '_>) -> GoalResult<bool> {
    let current = oriented_pose(args.object(0)?, "OrientedAtDegree")?.euler_degrees();
    let target = args.triple(1)?;
    let tolerance = args.triple(4)?;
    Ok(current
        .iter()
        .zip(target)
        .zip(tolerance)
        .all(|((&c, t), tol)| wrapped_angle_diff_degrees(c, t) <= tol))
}

/// `IsFacingObject(a, b, lx, ly, lz, deg)`: `a`'s local direction `l`,
/// rotated into the world, points at `b` within `deg` degrees.
pub fn is_facing_object(args: &Args<'_, '_>) -> GoalResult<bool> {
    let pose = oriented_pose(args.object(0)?, "IsFacingObject")?;
    let target = args.object(1)?.pose()?.position;
    let facing = pose.world_direction(DVec3::from_array(args.triple(2)?));
    let deg = angle(facing, target - pose.position, "IsFacingObject")?;
    Ok(deg <= args.number(5)?)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    use glam::DQuat;

    use crate::error::{ExecutionError, GoalError};
    use crate::expr::Operand;
    use crate::geometry::{Axis, Pose};
    use crate::predicate::{check, PredicateKind};
    use crate::scene::{InMemoryScene, SceneObject};

    fn obj(name: &str) -> Operand {
        Operand::object(name)
    }

    fn num(v: f64) -> Operand {
        Operand::Number(v)
    }

    fn posed(name: &str, rotation: DQuat) -> SceneObject {
        SceneObject::new(name).with_pose(Pose::at(0.0, 0.0, 0.9).with_orientation(rotation))
    }

    #[test]
    fn test_upright_uses_declared_up_axis() {
        // A bottle modelled lying along local y, stood up by a quarter turn about x.
        let scene = InMemoryScene::new()
            .with(posed("bottle", DQuat::from_rotation_x(FRAC_PI_2)).with_up_axis(Axis::Y))
            .with(posed("mug", DQuat::IDENTITY).with_up_axis(Axis::Z));
        assert!(check(&scene, PredicateKind::Upright, &[obj("bottle")]).unwrap());
        assert!(check(&scene, PredicateKind::Upright, &[obj("mug")]).unwrap());
        assert!(!check(&scene, PredicateKind::UpsideDown, &[obj("mug")]).unwrap());
    }

    #[test]
    fn test_upside_down() {
        let scene = InMemoryScene::new().with(posed("mug", DQuat::from_rotation_x(PI)).with_up_axis(Axis::Z));
        assert!(check(&scene, PredicateKind::UpsideDown, &[obj("mug")]).unwrap());
        assert!(!check(&scene, PredicateKind::Upright, &[obj("mug")]).unwrap());
    }

    #[test]
    fn test_upright_within_45() {
        let tilted = DQuat::from_rotation_y(FRAC_PI_4 * 0.9);
        let scene = InMemoryScene::new()
            .with(posed("cup", tilted).with_up_axis(Axis::Z))
            .with(posed("jar", DQuat::from_rotation_y(FRAC_PI_2)).with_up_axis(Axis::Z));
        assert!(check(&scene, PredicateKind::UprightWithin45, &[obj("cup")]).unwrap());
        assert!(!check(&scene, PredicateKind::Upright, &[obj("cup")]).unwrap());
        assert!(!check(&scene, PredicateKind::UprightWithin45, &[obj("jar")]).unwrap());
    }

    #[test]
    fn test_missing_up_axis_is_an_error() {
        let scene = InMemoryScene::new().with(posed("box", DQuat::IDENTITY));
        let err = check(&scene, PredicateKind::Upright, &[obj("box")]).unwrap_err();
        assert!(matches!(
            err,
            GoalError::Execution(ExecutionError::MissingUpAxis { predicate: "Upright", .. })
        ));
    }

    #[test]
    fn test_degenerate_orientation_is_an_error() {
        let zero = Pose::from_wxyz([0.0, 0.0, 0.9], [0.0, 0.0, 0.0, 0.0]);
        let scene = InMemoryScene::new()
            .with(SceneObject::new("mug").with_pose(zero).with_up_axis(Axis::Z))
            .with(SceneObject::new("plate"));
        for kind in [PredicateKind::Upright, PredicateKind::UpsideDown, PredicateKind::UprightWithin45] {
            let err = check(&scene, kind, &[obj("mug")]).unwrap_err();
            assert!(matches!(
                err,
                GoalError::Execution(ExecutionError::NonFiniteMeasurement { .. })
            ));
        }
        let aligned = [obj("mug"), Operand::Axis(Axis::Z), num(0.0), num(180.0)];
        assert!(check(&scene, PredicateKind::AxisAlignedWithin, &aligned)
            .unwrap_err()
            .is_execution());
        let facing = [obj("mug"), obj("plate"), num(0.0), num(0.0), num(1.0), num(180.0)];
        assert!(check(&scene, PredicateKind::IsFacingObject, &facing)
            .unwrap_err()
            .is_execution());
        let oriented = [obj("mug"), num(0.0), num(0.0), num(0.0), num(180.0), num(180.0), num(180.0)];
        assert!(check(&scene, PredicateKind::OrientedAtDegree, &oriented)
            .unwrap_err()
            .is_execution());
    }

    #[test]
    fn test_axis_aligned_within() {
        let scene = InMemoryScene::new().with(posed("book", DQuat::from_rotation_x(FRAC_PI_2)));
        let ops = |axis, lo, hi| [obj("book"), Operand::Axis(axis), num(lo), num(hi)];
        assert!(check(&scene, PredicateKind::AxisAlignedWithin, &ops(Axis::Z, 85.0, 95.0)).unwrap());
        assert!(check(&scene, PredicateKind::AxisAlignedWithin, &ops(Axis::Y, 0.0, 5.0)).unwrap());
        assert!(!check(&scene, PredicateKind::AxisAlignedWithin, &ops(Axis::X, 0.0, 80.0)).unwrap());
        // An inverted window never matches.
        assert!(!check(&scene, PredicateKind::AxisAlignedWithin, &ops(Axis::Z, 95.0, 85.0)).unwrap());
    }

    #[test]
    fn test_axis_aligned_against_world_and_object_axes() {
        let scene = InMemoryScene::new()
            .with(posed("a", DQuat::from_rotation_z(FRAC_PI_2)))
            .with(posed("b", DQuat::IDENTITY));
        let world = [
            obj("a"),
            Operand::Axis(Axis::X),
            num(0.0),
            num(5.0),
            Operand::Axis(Axis::Y),
        ];
        assert!(check(&scene, PredicateKind::AxisAlignedWithinWorldAxis, &world).unwrap());

        let objects = [
            obj("a"),
            obj("b"),
            Operand::Axis(Axis::X),
            Operand::Axis(Axis::Y),
            num(0.0),
            num(5.0),
        ];
        assert!(check(&scene, PredicateKind::AxisAlignedWithinObjectAxis, &objects).unwrap());
    }

    #[test]
    fn test_oriented_at_degree_wraps_angles() {
        let scene = InMemoryScene::new().with(posed("pan", DQuat::from_rotation_z(-FRAC_PI_2)));
        let ops = [obj("pan"), num(0.0), num(0.0), num(270.0), num(5.0), num(5.0), num(10.0)];
        assert!(check(&scene, PredicateKind::OrientedAtDegree, &ops).unwrap());
        let ops = [obj("pan"), num(0.0), num(0.0), num(90.0), num(5.0), num(5.0), num(10.0)];
        assert!(!check(&scene, PredicateKind::OrientedAtDegree, &ops).unwrap());
    }

    #[test]
    fn test_is_facing_object() {
        let scene = InMemoryScene::new()
            .with(SceneObject::new("bottle").with_pose(Pose::at(0.0, 0.0, 1.0)))
            .with(SceneObject::new("plate").with_pose(Pose::at(0.0, 0.05, 2.0)));
        let ops = |deg| [obj("bottle"), obj("plate"), num(0.0), num(0.0), num(1.0), num(deg)];
        assert!(check(&scene, PredicateKind::IsFacingObject, &ops(13.0)).unwrap());
        assert!(!check(&scene, PredicateKind::IsFacingObject, &ops(1.0)).unwrap());
    }
}
