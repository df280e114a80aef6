//! Measurements and the comparison predicates that consume them.

use crate::error::{ExecutionError, GoalResult};
use crate::expr::Measurement;
use crate::geometry::planar_distance;
use crate::scene::Scene;

use super::Args;

/// Takes a measurement against the current scene.
///
/// # Errors
/// `UnresolvedObject` for unknown names, `SceneQuery` for failed pose
/// queries, `NonFiniteMeasurement` if the result is NaN or infinite.
pub fn measure(measurement: &Measurement, scene: &dyn Scene) -> GoalResult<f64> {
    let value = match measurement {
        Measurement::Position { object, axis } => {
            axis.component(scene.resolve(object)?.pose()?.position)
        }
        Measurement::PlanarDistance { a, b } => {
            let pa = scene.resolve(a)?.pose()?.position;
            let pb = scene.resolve(b)?.pose()?.position;
            planar_distance(pa, pb)
        }
        Measurement::Distance { a, b } => {
            let pa = scene.resolve(a)?.pose()?.position;
            let pb = scene.resolve(b)?.pose()?.position;
            pa.distance(pb)
        }
    };
    if !value.is_finite() {
        return Err(ExecutionError::NonFiniteMeasurement {
            predicate: measurement.name().to_string(),
        }
        .into());
    }
    tracing::trace!(measure = measurement.name(), value, "measurement taken");
    Ok(value)
}

/// `Equal(s, t, tol)`.
pub fn equal(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok((args.number(0)? - args.number(1)?).abs() <= args.number(2)?)
}

/// `GreaterThan(s, t)`.
pub fn greater_than(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.number(0)? > args.number(1)?)
}

/// `LessThan(s, t)`.
pub fn less_than(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.number(0)? < args.number(1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GoalError;
    use crate::expr::Operand;
    use crate::geometry::{Axis, Pose};
    use crate::predicate::{check, PredicateKind};
    use crate::scene::{InMemoryScene, SceneObject};

    fn scene() -> InMemoryScene {
        InMemoryScene::new()
            .with(SceneObject::new("ketchup").with_pose(Pose::at(0.0, 0.0, 0.509)))
            .with(SceneObject::new("gripper").with_pose(Pose::at(0.03, 0.04, 0.6)))
    }

    fn height(name: &str) -> Measurement {
        Measurement::Position {
            object: name.to_string(),
            axis: Axis::Z,
        }
    }

    #[test]
    fn test_measurements() {
        let scene = scene();
        assert!((measure(&height("ketchup"), &scene).unwrap() - 0.509).abs() < 1e-12);
        let planar = Measurement::PlanarDistance {
            a: "gripper".to_string(),
            b: "ketchup".to_string(),
        };
        assert!((measure(&planar, &scene).unwrap() - 0.05).abs() < 1e-12);
        let full = Measurement::Distance {
            a: "gripper".to_string(),
            b: "ketchup".to_string(),
        };
        assert!(measure(&full, &scene).unwrap() > 0.05);
    }

    #[test]
    fn test_equal_with_measured_operand() {
        let scene = scene();
        let ops = [Operand::Measure(height("ketchup")), Operand::Number(0.509), Operand::Number(0.001)];
        assert!(check(&scene, PredicateKind::Equal, &ops).unwrap());
        let ops = [Operand::Measure(height("ketchup")), Operand::Number(0.52), Operand::Number(0.001)];
        assert!(!check(&scene, PredicateKind::Equal, &ops).unwrap());
    }

    #[test]
    fn test_strict_comparisons() {
        let scene = scene();
        let planar = Operand::Measure(Measurement::PlanarDistance {
            a: "gripper".to_string(),
            b: "ketchup".to_string(),
        });
        assert!(check(&scene, PredicateKind::GreaterThan, &[planar.clone(), Operand::Number(0.024)]).unwrap());
        assert!(!check(&scene, PredicateKind::LessThan, &[planar, Operand::Number(0.024)]).unwrap());
        assert!(!check(&scene, PredicateKind::GreaterThan, &[Operand::Number(1.0), Operand::Number(1.0)]).unwrap());
    }

    #[test]
    fn test_non_finite_measurement_is_an_error() {
        let scene = InMemoryScene::new().with(SceneObject::new("lost").with_pose(Pose::at(f64::NAN, 0.0, 0.0)));
        let m = Measurement::Position {
            object: "lost".to_string(),
            axis: Axis::X,
        };
        let err = measure(&m, &scene).unwrap_err();
        assert!(matches!(
            err,
            GoalError::Execution(ExecutionError::NonFiniteMeasurement { .. })
        ));
    }
}
