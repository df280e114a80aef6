use serde_json::json;
use tracing_subscriber::EnvFilter;

use goalcheck::goal::{from_json, to_json_pretty};
use goalcheck::{
    ConstraintKind, Expr, Goal, GoalError, GoalEvaluator, InMemoryScene, Operand, Pose, PredicateKind,
    SceneObject, SequenceKind, ValidationError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

fn kitchen() -> InMemoryScene {
    InMemoryScene::new()
        .with(SceneObject::new("gripper0_hand").with_pose(Pose::at(0.0, 0.0, 1.2)))
        .with(SceneObject::new("wine_bottle_1").with_pose(Pose::at(0.3, 0.0, 0.5)))
        .with(SceneObject::new("ketchup_1").with_pose(Pose::at(-0.2, 0.1, 0.5)))
        .with(SceneObject::new("alphabet_soup_1").with_pose(Pose::at(-0.2, -0.1, 0.5)))
        .with(SceneObject::new("basket_1").with_pose(Pose::at(0.1, 0.2, 0.45)))
        .with(SceneObject::new("milk_1").with_pose(Pose::at(0.0, -0.3, 0.5)))
}

fn put_in_basket(scene: &mut InMemoryScene, item: &str) {
    scene.set_contact(item, "basket_1", true).unwrap();
    scene.set_contains("basket_1", item, true).unwrap();
}

fn authored_goal() -> Goal {
    let states = json!([
        ["ConstraintNever", ["InContact", "gripper0_hand", "wine_bottle_1"]],
        ["Sequential", [["In", "ketchup_1", "basket_1"], ["In", "alphabet_soup_1", "basket_1"]]],
        ["Once", "lift_milk", ["InAir", "milk_1", 0.9]]
    ]);
    Goal::from_authored(
        "put the ketchup then the soup in the basket and lift the milk once",
        vec!["ketchup_1".to_string(), "alphabet_soup_1".to_string()],
        &states,
    )
    .unwrap()
}

#[test]
fn authored_goal_episode() {
    init_tracing();
    let mut scene = kitchen();
    let goal = authored_goal();
    let mut evaluator = GoalEvaluator::new();

    // Nothing done yet.
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());

    put_in_basket(&mut scene, "ketchup_1");
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());

    scene.set_pose("milk_1", Pose::at(0.0, -0.3, 1.0)).unwrap();
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());

    // Milk put back down: the Once latch keeps holding.
    scene.set_pose("milk_1", Pose::at(0.0, -0.3, 0.5)).unwrap();
    put_in_basket(&mut scene, "alphabet_soup_1");
    assert!(evaluator.evaluate_goal(&goal, &scene).unwrap());
    assert_eq!(evaluator.tick(), 4);

    // Brushing the wine bottle latches Never to false for good.
    scene.set_contact("gripper0_hand", "wine_bottle_1", true).unwrap();
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());
    scene.set_contact("gripper0_hand", "wine_bottle_1", false).unwrap();
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());

    assert_eq!(evaluator.registry().latch(ConstraintKind::Once, "lift_milk"), Some(true));
    assert_eq!(
        evaluator
            .registry()
            .latch(ConstraintKind::Never, "InContact(gripper0_hand, wine_bottle_1)"),
        Some(false)
    );
}

#[test]
fn sequence_explanations_are_reported() {
    let mut scene = kitchen();
    let goal = authored_goal();
    let mut evaluator = GoalEvaluator::new();

    put_in_basket(&mut scene, "alphabet_soup_1");
    let report = evaluator.evaluate_report(&goal.root, &scene).unwrap();
    assert!(!report.satisfied);
    assert_eq!(report.episode, evaluator.episode());

    let explanations: Vec<_> = report.explanations_for("Sequential").collect();
    assert_eq!(explanations.len(), 1);
    assert_eq!(
        explanations[0].node,
        "Sequential([In(ketchup_1, basket_1), In(alphabet_soup_1, basket_1)])"
    );
    assert!(!explanations[0].result.value);
    assert!(explanations[0].result.explanation.contains("before step 0"));
    assert!(report.to_string().starts_with("tick 0: not satisfied"));
}

#[test]
fn reset_gives_a_fresh_episode() {
    let mut scene = kitchen();
    let goal = authored_goal();
    let mut evaluator = GoalEvaluator::new();

    scene.set_contact("gripper0_hand", "wine_bottle_1", true).unwrap();
    put_in_basket(&mut scene, "ketchup_1");
    put_in_basket(&mut scene, "alphabet_soup_1");
    scene.set_pose("milk_1", Pose::at(0.0, -0.3, 1.0)).unwrap();
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());

    let first = evaluator.episode();
    evaluator.reset();
    assert_ne!(evaluator.episode(), first);
    assert_eq!(evaluator.tick(), 0);

    // Same world without the contact. The Never latch starts over, and the
    // sequence sees its steps rise in order again.
    scene.set_contact("gripper0_hand", "wine_bottle_1", false).unwrap();
    scene.set_contains("basket_1", "alphabet_soup_1", false).unwrap();
    assert!(!evaluator.evaluate_goal(&goal, &scene).unwrap());
    scene.set_contains("basket_1", "alphabet_soup_1", true).unwrap();
    assert!(evaluator.evaluate_goal(&goal, &scene).unwrap());
}

#[test]
fn or_does_not_skip_temporal_children() {
    let scene = kitchen();
    let mut evaluator = GoalEvaluator::new();
    let always_true = Expr::atomic(PredicateKind::True, vec![]).unwrap();
    let contact = Expr::atomic(PredicateKind::InContact, vec!["gripper0_hand".into(), "milk_1".into()]).unwrap();
    let goal = Expr::or([
        always_true.clone(),
        Expr::sequential("steps", [always_true, contact]),
    ]);

    assert!(evaluator.evaluate(&goal, &scene).unwrap());
    let state = evaluator.registry().sequence(SequenceKind::Sequential, "steps").unwrap();
    assert_eq!(state.next_expected_index(), 1);
}

#[test]
fn all_and_any_do_not_skip_temporal_children() {
    let scene = kitchen();
    let mut evaluator = GoalEvaluator::new();
    let always_true = Expr::atomic(PredicateKind::True, vec![]).unwrap();
    let always_false = Expr::atomic(PredicateKind::False, vec![]).unwrap();
    let contact = Expr::atomic(PredicateKind::InContact, vec!["gripper0_hand".into(), "milk_1".into()]).unwrap();
    let goal = Expr::and([
        Expr::all([
            always_false.clone(),
            Expr::sequential("under_all", [always_true.clone(), contact.clone()]),
        ]),
        Expr::any([
            always_true.clone(),
            Expr::sequential("under_any", [always_true, contact]),
        ]),
    ]);

    assert!(!evaluator.evaluate(&goal, &scene).unwrap());
    for name in ["under_all", "under_any"] {
        let state = evaluator.registry().sequence(SequenceKind::Sequential, name).unwrap();
        assert_eq!(state.next_expected_index(), 1, "{name}");
    }

    let negated = Expr::not(Expr::all([always_false.clone(), always_false]));
    assert!(evaluator.evaluate(&negated, &scene).unwrap());
}

#[test]
fn failed_tick_changes_nothing() {
    init_tracing();
    let mut scene = kitchen();
    let mut evaluator = GoalEvaluator::new();
    let goal = Expr::and([
        Expr::once("lift", Expr::atomic(PredicateKind::InAir, vec!["milk_1".into(), 0.9.into()]).unwrap()),
        Expr::relaxed_sequential(
            "stack",
            [Expr::atomic(PredicateKind::Stack, vec!["ketchup_1".into(), "plate_1".into()]).unwrap()],
        ),
    ]);

    scene.set_pose("milk_1", Pose::at(0.0, -0.3, 1.0)).unwrap();
    let err = evaluator.evaluate(&goal, &scene).unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().contains("plate_1"));
    assert_eq!(evaluator.tick(), 0);
    assert!(evaluator.registry().is_empty());

    // Once the plate exists the same tick goes through and Once observes
    // the milk being lifted.
    scene.insert(SceneObject::new("plate_1").with_pose(Pose::at(-0.2, 0.1, 0.4)));
    assert!(!evaluator.evaluate(&goal, &scene).unwrap());
    assert_eq!(evaluator.tick(), 1);
    assert_eq!(evaluator.registry().latch(ConstraintKind::Once, "lift"), Some(true));
}

#[test]
fn destroyed_object_aborts_tick() {
    let mut scene = kitchen();
    let mut evaluator = GoalEvaluator::new();
    let goal = Expr::always(
        "bottle_down",
        Expr::atomic(PredicateKind::Under, vec!["wine_bottle_1".into(), "gripper0_hand".into()]).unwrap(),
    );
    assert!(evaluator.evaluate(&goal, &scene).unwrap());

    scene.object_mut("wine_bottle_1").unwrap().destroy();
    assert!(evaluator.evaluate(&goal, &scene).unwrap_err().is_execution());
    assert_eq!(evaluator.tick(), 1);
    assert_eq!(evaluator.registry().latch(ConstraintKind::Always, "bottle_down"), Some(true));
}

#[test]
fn watch_never_changes_the_verdict() {
    let scene = kitchen();
    let mut evaluator = GoalEvaluator::new();
    let up = Expr::atomic(PredicateKind::Up, vec![Operand::object("milk_1")]).unwrap();
    let goal = Expr::and([Expr::watch(up), Expr::atomic(PredicateKind::True, vec![]).unwrap()]);

    let report = evaluator.evaluate_report(&goal, &scene).unwrap();
    assert!(report.satisfied);
    let watch = report.explanations_for("Watch").next().unwrap();
    assert_eq!(watch.result.explanation, "Up(milk_1) = false");
}

#[test]
fn validation_errors_surface_before_evaluation() {
    let scene = kitchen();
    let mut evaluator = GoalEvaluator::new();

    let empty = Expr::And(Vec::new());
    assert!(matches!(
        evaluator.evaluate(&empty, &scene),
        Err(GoalError::Validation(ValidationError::EmptyCombinator { .. }))
    ));

    let hand_built = Expr::Atomic {
        predicate: PredicateKind::InContact,
        operands: vec![Operand::object("milk_1")],
    };
    assert!(matches!(
        evaluator.evaluate(&hand_built, &scene),
        Err(GoalError::Validation(ValidationError::ArityMismatch { .. }))
    ));
    assert_eq!(evaluator.tick(), 0);
}

#[test]
fn goal_json_round_trip_evaluates_the_same() {
    let goal = authored_goal();
    let text = to_json_pretty(&goal).unwrap();
    let restored = from_json(&text).unwrap();
    assert_eq!(restored, goal);

    let mut scene = kitchen();
    put_in_basket(&mut scene, "ketchup_1");
    let mut a = GoalEvaluator::new();
    let mut b = GoalEvaluator::new();
    for _ in 0..3 {
        assert_eq!(
            a.evaluate_goal(&goal, &scene).unwrap(),
            b.evaluate_goal(&restored, &scene).unwrap()
        );
    }
}

#[test]
fn evaluators_run_on_worker_threads() {
    let goal = authored_goal();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let goal = goal.clone();
            std::thread::spawn(move || {
                let mut scene = kitchen();
                let mut evaluator = GoalEvaluator::new();
                if i % 2 == 0 {
                    put_in_basket(&mut scene, "ketchup_1");
                }
                evaluator.evaluate_goal(&goal, &scene).unwrap();
                evaluator
                    .registry()
                    .sequence(SequenceKind::Sequential, "[In(ketchup_1, basket_1), In(alphabet_soup_1, basket_1)]")
                    .map(|s| s.next_expected_index())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let expected = if i % 2 == 0 { 1 } else { 0 };
        assert_eq!(handle.join().unwrap(), Some(expected));
    }
}
