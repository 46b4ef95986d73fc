use sfxcost::*;
use std::sync::{Arc, Mutex};

/// Records structural events by field name.
#[derive(Default)]
struct Journal {
    events: Mutex<Vec<String>>,
}

impl Journal {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl FieldListener for Journal {
    fn added(&self, model: &CostModel, field: NodeId) {
        self.push(format!("added {}", model.name(field)));
    }

    fn replaced(&self, model: &CostModel, _old: NodeId, new: NodeId) {
        self.push(format!("replaced {}", model.name(new)));
    }

    fn removed(&self, model: &CostModel, field: NodeId) {
        self.push(format!("removed {}", model.name(field)));
    }
}

// ============================================================================
// End to end
// ============================================================================

/// Test the basic spell: effect and duration feed the mandatory cost.
#[test]
fn test_mandatory_pipeline() {
    let mut model = CostModel::standard();

    let effect = model.field("Effect");
    model.apply_delta(effect, 3);
    assert_eq!(model.value(effect), "3");
    assert_eq!(model.cost(effect), 3);

    let duration = model.field("Duration");
    model.apply_delta(duration, 5);
    assert_eq!(model.cost(duration), 5);
    assert_eq!(model.unit(duration), "seconds");

    // sub 8, casting 0, half 4
    let mandatory = model.field("Mandatory");
    assert_eq!(model.cost(mandatory), 8);
    let half = model.field("HalfMandatory");
    assert_eq!(model.cost(half), 4);
}

/// Test that totals split the budget and take out the specific add-ons.
#[test]
fn test_totals_and_specific() {
    let mut model = CostModel::standard();
    model.build_all();

    let effect = model.field("Effect");
    let duration = model.field("Duration");
    model.apply_delta(effect, 6);
    model.apply_delta(duration, 4);

    let total = model.field("Total");
    assert_eq!(model.ledgers(total), (5, 5));
    assert_eq!(model.cost(total), 10);

    let lock = model.field("Lock");
    model.set_multiplier_index(lock, 2);
    let specific = model.field("Specific");
    assert_eq!(model.value(specific), "-2");
    assert_eq!(model.ledgers(specific), (6, 6));
}

/// Test that a derived field built after its inputs changed is current.
#[test]
fn test_late_construction_sees_inputs() {
    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    model.apply_delta(effect, 4);

    let total = model.field("Total");
    assert_eq!(model.ledgers(total), (2, 2));
}

/// Test that unit selection changes cost.
#[test]
fn test_units_change_cost() {
    let mut model = CostModel::standard();
    let range = model.field("Range");
    model.apply_delta(range, 2);
    assert_eq!(model.cost(range), 2);

    assert_eq!(model.set_multiplier_index(range, 1), Outcome::Applied);
    assert_eq!(model.unit(range), "kilometers");
    assert_eq!(model.cost(range), 17);

    assert_eq!(model.set_multiplier_index(range, 2), Outcome::Applied);
    assert_eq!(model.cost(range), -1);
}

// ============================================================================
// Registry
// ============================================================================

/// Test that resolving a name twice yields the same field.
#[test]
fn test_registry_idempotent() {
    let mut model = CostModel::standard();
    let first = model.field("Mandatory");
    let count = model.node_count();
    let second = model.field("Mandatory");
    assert_eq!(first, second);
    assert_eq!(model.node_count(), count);
}

/// Test that resolving everything leaves nothing pending.
#[test]
fn test_build_all_resolves_everything() {
    let mut model = CostModel::standard();
    assert_eq!(model.registry().pending(), 38);

    let built = model.build_all();
    assert_eq!(built.len(), 38);
    assert_eq!(model.registry().pending(), 0);
    assert!(model.validate().is_ok());
}

/// Test that unknown names are reported without panicking through try_field.
#[test]
fn test_unknown_name() {
    let mut model = CostModel::standard();
    assert!(model.try_field("Fireball").is_none());
}

/// Test that the dependency view orders inputs before totals.
#[test]
fn test_dependency_order() {
    let mut model = CostModel::standard();
    model.build_all();
    let effect = model.field("Effect");
    let total = model.field("Total");
    let charges = model.field("Charges");
    let mandatory = model.field("Mandatory");

    let graph = model.dependency_graph();
    let order = graph.topological_sort().unwrap();
    let pos = |id: NodeId| order.iter().position(|n| *n == id).unwrap();
    assert!(pos(effect) < pos(total));

    let upstream = graph.upstream_of(&[mandatory]);
    assert!(upstream.contains_node(effect));
    assert!(!upstream.contains_node(charges));
}

// ============================================================================
// Events
// ============================================================================

/// Test that a change notifies every field downstream of it.
#[test]
fn test_change_reaches_dependents() {
    #[derive(Default)]
    struct Changed(Mutex<Vec<String>>);

    impl FieldListener for Changed {
        fn changed(&self, model: &CostModel, field: NodeId) {
            self.0.lock().unwrap().push(model.name(field).to_string());
        }
    }

    let mut model = CostModel::standard();
    model.build_all();
    let changed = Arc::new(Changed::default());
    model.events().subscribe(changed.clone());

    let effect = model.field("Effect");
    model.apply_delta(effect, 1);

    let names = changed.0.lock().unwrap();
    for expected in ["Effect", "SubMandatory", "Mandatory", "Focus", "Unreal", "Total"] {
        assert!(names.iter().any(|n| n == expected), "{expected} not notified");
    }
}

/// Test that a listener can subscribe another listener mid-notification.
#[test]
fn test_subscribe_during_notification() {
    struct Recruiter {
        bus: EventBus,
        recruit: Arc<Counter>,
        done: Mutex<bool>,
    }

    #[derive(Default)]
    struct Counter(Mutex<usize>);

    impl FieldListener for Counter {
        fn changed(&self, _model: &CostModel, _field: NodeId) {
            *self.0.lock().unwrap() += 1;
        }
    }

    impl FieldListener for Recruiter {
        fn changed(&self, _model: &CostModel, _field: NodeId) {
            let mut done = self.done.lock().unwrap();
            if !*done {
                self.bus.subscribe(self.recruit.clone());
                *done = true;
            }
        }
    }

    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    let counter = Arc::new(Counter::default());
    model.events().subscribe(Arc::new(Recruiter {
        bus: model.events().clone(),
        recruit: counter.clone(),
        done: Mutex::new(false),
    }));

    model.apply_delta(effect, 1);
    assert_eq!(*counter.0.lock().unwrap(), 0);

    model.apply_delta(effect, 1);
    assert_eq!(*counter.0.lock().unwrap(), 1);
    assert_eq!(model.events().len(), 2);
}

/// Test the event order of a bulk reload.
#[test]
fn test_reset_event_order() {
    let mut model = CostModel::standard();
    model.build_all();
    let old_generation = model.generation();

    let journal = Arc::new(Journal::default());
    model.events().subscribe(journal.clone());
    model.reset();

    let events = journal.events();
    let removed = events.iter().filter(|e| e.starts_with("removed")).count();
    let replaced = events.iter().filter(|e| e.starts_with("replaced")).count();
    let added = events.iter().filter(|e| e.starts_with("added")).count();
    assert_eq!((removed, replaced, added), (10, 38, 10));

    assert_eq!(events[0], "removed Area");
    let last_removed = events.iter().rposition(|e| e.starts_with("removed")).unwrap();
    let first_replaced = events.iter().position(|e| e.starts_with("replaced")).unwrap();
    assert!(last_removed < first_replaced);

    let pos = |event: &str| events.iter().position(|e| e == event).unwrap();
    assert!(pos("replaced AreaEffect") < pos("added Area"));
    assert!(pos("added Area") < pos("replaced MultiTarget"));

    assert_ne!(model.generation(), old_generation);
    assert_eq!(model.events().len(), 1);
}

/// Test that reset restores every field to its starting state.
#[test]
fn test_reset_restores_defaults() {
    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    model.apply_delta(effect, 9);

    model.reset();
    let effect = model.field("Effect");
    assert_eq!(model.cost(effect), 0);
}

/// Test that handles from before a reload are detected.
#[test]
#[should_panic(expected = "stale or foreign")]
fn test_stale_handle_after_reset() {
    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    model.reset();
    model.cost(effect);
}

/// Test that replacing content adopts the loaded model's configuration.
#[test]
fn test_replace_content_with_loaded_model() {
    let mut model = CostModel::standard();
    let config = ModelConfig::from_json(r#"{ "fraction_default": 0.25 }"#).unwrap();
    let mut loaded = CostModel::configured(config).unwrap();
    let effect = loaded.field("Effect");
    loaded.apply_delta(effect, 7);

    model.replace_content(loaded);
    let effect = model.field("Effect");
    assert_eq!(model.cost(effect), 7);
    assert_eq!(model.config().fraction_default, 0.25);
}

/// Test that fields missing from the loaded model are reported removed.
#[test]
fn test_replace_content_drops_missing_fields() {
    let mut model = CostModel::new();
    model.register("Bead", |model| {
        model.add_node("Bead", FieldKind::Scalar(field::Scalar::new(field::ScalarRule::Plain)))
    });
    model.register("Extras", |model| {
        let extras = model.add_node(
            "Extras",
            FieldKind::Composite(field::Composite::new(field::CompositeRule::Plain)),
        );
        let bead = model.field("Bead");
        model.add_child(extras, bead);
        extras
    });
    model.build_all();

    let journal = Arc::new(Journal::default());
    model.events().subscribe(journal.clone());
    model.replace_content(CostModel::new());

    assert_eq!(journal.events(), vec!["removed Bead", "removed Extras"]);
    assert!(model.try_field("Extras").is_none());
}

// ============================================================================
// Budgets and modifiers
// ============================================================================

/// Test that the components budget flag is set and cleared.
#[test]
fn test_components_budget_flag() {
    let mut model = CostModel::standard();
    model.build_all();
    let effect = model.field("Effect");
    let components = model.field("Components");
    let entry = model.children(components)[0];

    // mandatory 4, split 2/2, ceiling 1
    model.apply_delta(effect, 4);
    assert!(!model.is_limited(components));

    model.apply_delta(entry, 2);
    assert!(model.is_limited(components));

    model.apply_text(entry, "FV").unwrap();
    assert_eq!(model.reduction(components), 2);
    assert!(model.is_limited(components));

    model.apply_delta(entry, 1);
    assert!(!model.is_limited(components));

    // mandatory 14, split 7/7, ceiling 4
    model.apply_delta(effect, 10);
    model.apply_delta(entry, 3);
    assert!(!model.is_limited(components));
}

/// Test that a modifier's cost goes to exactly one ledger.
#[test]
fn test_modifier_routes_to_one_ledger() {
    let mut model = CostModel::standard();
    model.build_all();
    let skill = model.field("RelatedSkill");
    let modifiers = model.field("Modifiers");

    model.apply_delta(skill, 3);
    assert_eq!((model.cost(skill), model.reduction(skill)), (3, 0));
    assert_eq!(model.ledgers(modifiers), (3, 0));

    model.apply_text(skill, "FV").unwrap();
    assert_eq!((model.cost(skill), model.reduction(skill)), (0, 3));
    assert_eq!(model.ledgers(modifiers), (0, 3));
    // nothing mandatory to reduce
    assert!(model.is_limited(modifiers));
}

/// Test community entries: row cost scaled by difficulty.
#[test]
fn test_community_entries() {
    let mut model = CostModel::standard();
    let community = model.field("Community");
    let first = model.children(community)[0];

    model.apply_delta(first, 4);
    assert_eq!(model.cost(first), 2);
    assert_eq!(model.table_content(first)[4], "5-6");

    model.set_multiplier_index(first, 2);
    assert_eq!(model.cost(first), 6);

    let second = model.add_entry(community);
    model.apply_delta(second, 2);
    assert_eq!(model.cost(community), 7);

    model.remove_child(community, second);
    assert_eq!(model.cost(community), 6);
}

/// Test incantation flags and component destruction.
#[test]
fn test_incantation_and_components() {
    let mut model = CostModel::standard();
    let incantation = model.field("Incantation");
    model.apply_delta(incantation, 2);
    model.apply_text(incantation, "LOUD").unwrap();
    model.apply_text(incantation, "PROFANE").unwrap();
    assert_eq!(model.cost(incantation), 4);
    assert_eq!(model.bonus(incantation), 6);

    let components = model.field("Components");
    let entry = model.children(components)[0];
    model.apply_delta(entry, 1);
    model.set_multiplier_index(entry, 2);
    model.apply_text(entry, "DESTROY").unwrap();
    assert_eq!(model.cost(entry), 6);
    assert_eq!(model.bonus(entry), 1);
    assert_eq!(model.comment(entry), "<None>");
}

/// Test that disbelief prices a share of the effect.
#[test]
fn test_unreal_disbelief() {
    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    let unreal = model.field("Unreal");
    model.apply_delta(effect, 10);

    assert_eq!(model.apply_text(unreal, "LEVEL 25").unwrap(), Outcome::Applied);
    assert_eq!(model.cost(unreal), 3);
    assert_eq!(model.disbelief(unreal), Some(25));
}

/// Test that warded charges carry a bonus and cost more.
#[test]
fn test_charges() {
    let mut model = CostModel::standard();
    let charges = model.field("Charges");
    model.apply_text(charges, "12 true").unwrap();
    assert_eq!(model.value(charges), "10");
    assert_eq!(model.cost(charges), 22);
    assert_eq!(model.bonus(charges), 1);
}

// ============================================================================
// Errors and rejections
// ============================================================================

/// Test that malformed text leaves the model unchanged.
#[test]
fn test_parse_errors_leave_state() {
    let mut model = CostModel::standard();
    let effect = model.field("Effect");
    model.apply_delta(effect, 2);

    let err = model.apply_text(effect, "two").unwrap_err();
    match err {
        FieldError::Parse { field, input, .. } => {
            assert_eq!(field, FieldId::from_str("Effect"));
            assert_eq!(input, "two");
        }
        other => panic!("Expected Parse error, got {other:?}"),
    }
    assert_eq!(model.cost(effect), 2);

    let charges = model.field("Charges");
    assert!(model.apply_text(charges, "12 maybe").is_err());
    assert_eq!(model.cost(charges), 0);

    let area = model.field("AreaEffect");
    assert!(model.apply_text(area, "1").is_err());
}

/// Test that an absurd charge count is refused before any cost is pulled.
#[test]
fn test_huge_charge_count_refused() {
    let mut model = CostModel::standard();
    model.build_all();
    let charges = model.field("Charges");
    model.apply_text(charges, "10 false").unwrap();

    let err = model.apply_text(charges, "1e30 true").unwrap_err();
    assert!(matches!(err, FieldError::Parse { .. }));
    assert_eq!(model.value(charges), "10");
    assert_eq!(model.cost(charges), 20);

    let optional = model.field("Optional");
    assert!(model.cost(optional) >= 20);
}

/// Test that out-of-range requests are rejected without side effects.
#[test]
fn test_range_rejections() {
    let mut model = CostModel::standard();
    let duration = model.field("Duration");
    model.apply_delta(duration, 3);

    assert_eq!(model.apply_delta(duration, 200), Outcome::Rejected);
    assert_eq!(model.apply_delta(duration, -4), Outcome::Rejected);
    assert_eq!(model.set_multiplier_index(duration, 99), Outcome::Rejected);
    assert_eq!(model.apply_text(duration, "1e30").unwrap(), Outcome::Rejected);
    assert_eq!(model.cost(duration), 3);

    let unreal = model.field("Unreal");
    assert_eq!(model.apply_text(unreal, "LEVEL 150").unwrap(), Outcome::Rejected);
    assert_eq!(model.disbelief(unreal), Some(0));
}

/// Test that typed commands the field does not support are errors.
#[test]
fn test_unsupported_commands() {
    let mut model = CostModel::standard();
    let skill = model.field("RelatedSkill");
    let err = model
        .apply_command(skill, Command::Destroyed(true))
        .unwrap_err();
    assert!(matches!(err, FieldError::UnsupportedCommand { .. }));

    let fraction = model.field("Fraction");
    assert!(model.apply_command(fraction, Command::Level(10)).is_err());
}
