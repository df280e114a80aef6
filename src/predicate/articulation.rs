//! Articulation and power-state predicates.

use crate::config::EvaluatorConfig;
use crate::error::GoalResult;

use super::Args;

/// `Open(a)`.
pub fn open(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.object(0)?.is_open()?)
}

/// `Close(a)`.
pub fn close(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.object(0)?.is_close()?)
}

/// `TurnOn(a)`.
pub fn turn_on(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.object(0)?.turn_on()?)
}

/// `TurnOff(a)`.
pub fn turn_off(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(args.object(0)?.turn_off()?)
}

/// `OpenRatio(a, r)`: the opening extent is within the configured
/// tolerance of `r`.
pub fn open_ratio(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    let ratio = args.object(0)?.open_ratio()?;
    Ok((ratio - args.number(1)?).abs() <= config.open_ratio_tolerance)
}

#[cfg(test)]
mod tests {
    use crate::error::{ExecutionError, GoalError};
    use crate::expr::Operand;
    use crate::predicate::{check, PredicateKind};
    use crate::scene::{InMemoryScene, SceneError, SceneObject};

    fn scene() -> InMemoryScene {
        InMemoryScene::new()
            .with(SceneObject::new("cabinet_top").articulated(false))
            .with(SceneObject::new("stove").switchable(true))
            .with(SceneObject::new("plate"))
    }

    #[test]
    fn test_open_close() {
        let mut scene = scene();
        let top = [Operand::object("cabinet_top")];
        assert!(check(&scene, PredicateKind::Close, &top).unwrap());
        assert!(!check(&scene, PredicateKind::Open, &top).unwrap());
        scene.object_mut("cabinet_top").unwrap().set_open(true);
        assert!(check(&scene, PredicateKind::Open, &top).unwrap());
    }

    #[test]
    fn test_turn_on_off() {
        let mut scene = scene();
        let stove = [Operand::object("stove")];
        assert!(check(&scene, PredicateKind::TurnOn, &stove).unwrap());
        scene.object_mut("stove").unwrap().set_powered(false);
        assert!(check(&scene, PredicateKind::TurnOff, &stove).unwrap());
    }

    #[test]
    fn test_open_ratio_tolerance() {
        let mut scene = scene();
        scene.object_mut("cabinet_top").unwrap().set_open_ratio(0.55);
        let at = |r| [Operand::object("cabinet_top"), Operand::Number(r)];
        assert!(check(&scene, PredicateKind::OpenRatio, &at(0.5)).unwrap());
        assert!(!check(&scene, PredicateKind::OpenRatio, &at(1.0)).unwrap());
    }

    #[test]
    fn test_unsupported_capability_propagates() {
        let scene = scene();
        let err = check(&scene, PredicateKind::Open, &[Operand::object("plate")]).unwrap_err();
        assert!(matches!(
            err,
            GoalError::Execution(ExecutionError::SceneQuery(SceneError::Unsupported { capability: "is_open", .. }))
        ));
    }
}
