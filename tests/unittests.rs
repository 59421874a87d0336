use std::collections::HashSet;
use std::time::{Duration, Instant};

use egui::{Pos2, Vec2};
use proptest::prelude::*;
use sim_family_tree::graph_utils::graph::{FamilyGraph, Gender, Relationship, RelationshipKind, SimFields};
use sim_family_tree::graph_utils::layout;
use sim_family_tree::graph_utils::snapshot::Snapshot;
use sim_family_tree::gui::graph_view::{GraphView, ViewEvent};
use sim_family_tree::gui::interaction::PointerButton;
use sim_family_tree::gui::render::Scene;
use sim_family_tree::gui::viewport::{MAX_SCALE, MIN_SCALE};

fn sim_at(view: &mut GraphView, id: &str, x: f32, y: f32) {
    view.add_sim(SimFields { id: Some(id.into()), ..SimFields::named(id) }.at(x, y));
}

#[test]
fn graph_add_sim_defaults_and_staggered_positions() {
    let mut g = FamilyGraph::new();
    let a = g.add_sim(SimFields::named("Bella Goth").with_gender(Gender::Female)).expect("named");
    let b = g.add_sim(SimFields::named("Mortimer Goth")).expect("named");
    assert_ne!(a, b);
    assert!(a.starts_with("sim_"));

    let first = g.get_sim(&a).expect("first sim");
    assert_eq!((first.x, first.y), (400.0, 200.0));
    assert_eq!(first.gender, Some(Gender::Female));
    let second = g.get_sim(&b).expect("second sim");
    assert_eq!((second.x, second.y), (450.0, 230.0));
    assert_eq!(second.gender, None);
}

#[test]
fn graph_cascade_delete_removes_touching_relationships() {
    let mut g = FamilyGraph::new();
    for id in ["a", "b", "c"] {
        g.add_sim(SimFields { id: Some(id.into()), ..SimFields::named(id) });
    }
    assert!(g.add_relationship(Relationship::new("a", "b", RelationshipKind::Spouse)));
    assert!(g.add_relationship(Relationship::new("a", "c", RelationshipKind::Parent)));
    assert!(g.add_relationship(Relationship::new("b", "c", RelationshipKind::Parent)));

    assert!(g.remove_sim("a"));
    assert!(!g.remove_sim("a"));
    assert_eq!(g.relationships(), &[Relationship::new("b", "c", RelationshipKind::Parent)]);
    assert!(g.relationships_for("a").is_empty());
}

#[test]
fn graph_rejects_reverse_duplicates_for_every_kind() {
    let mut g = FamilyGraph::new();
    assert!(g.add_relationship(Relationship::new("a", "b", RelationshipKind::Sibling)));
    assert!(!g.add_relationship(Relationship::new("b", "a", RelationshipKind::Sibling)));
    assert!(g.add_relationship(Relationship::new("a", "b", RelationshipKind::Parent)));
    // Reverse parent edge counts as the same pair too
    assert!(!g.add_relationship(Relationship::new("b", "a", RelationshipKind::Parent)));
    // Endpoints are not validated
    assert!(g.add_relationship(Relationship::new("ghost", "b", RelationshipKind::Spouse)));
    assert_eq!(g.relationships().len(), 3);
    assert_eq!(g.relationships()[1].from, "a");
}

#[test]
fn graph_update_merges_only_given_fields() {
    let mut g = FamilyGraph::new();
    let id = g.add_sim(SimFields {
        occupation: Some("Astronaut".into()),
        ..SimFields::named("Bella")
    }).expect("named");
    assert!(g.update_sim(&id, SimFields { traits: Some("Romantic".into()), ..Default::default() }));
    let sim = g.get_sim(&id).expect("sim");
    assert_eq!(sim.name, "Bella");
    assert_eq!(sim.occupation.as_deref(), Some("Astronaut"));
    assert_eq!(sim.traits.as_deref(), Some("Romantic"));
    assert!(!g.update_sim("nope", SimFields::named("x")));
}

#[test]
fn search_matches_name_traits_and_occupation() {
    let mut g = FamilyGraph::new();
    let a = g.add_sim(SimFields { traits: Some("Genius".into()), ..SimFields::named("Bella") }).expect("named");
    let b = g.add_sim(SimFields { occupation: Some("Scientist".into()), ..SimFields::named("Mortimer") }).expect("named");
    assert_eq!(g.find_sim_ids_matching("GENIUS"), vec![a.clone()]);
    assert_eq!(g.find_sim_ids_matching("sci"), vec![b.clone()]);
    assert_eq!(g.find_sim_ids_matching(""), vec![a, b]);
    assert!(g.find_sim_ids_matching("zzz").is_empty());
}

#[test]
fn layout_places_generations_on_rows() {
    let mut g = FamilyGraph::new();
    for id in ["a", "b", "c", "d"] {
        g.add_sim(SimFields { id: Some(id.into()), ..SimFields::named(id) }.at(7.0, 7.0));
    }
    g.add_relationship(Relationship::new("a", "c", RelationshipKind::Parent));
    g.add_relationship(Relationship::new("b", "c", RelationshipKind::Parent));
    g.add_relationship(Relationship::new("c", "d", RelationshipKind::Parent));

    let gens = layout::compute_generations(&g);
    assert_eq!(gens["a"], 0);
    assert_eq!(gens["b"], 0);
    assert_eq!(gens["c"], 1);
    assert_eq!(gens["d"], 2);

    assert_eq!(layout::apply_layout(&mut g), 4);
    let pos = |id: &str| g.get_sim(id).expect("sim").pos();
    assert_eq!(pos("a"), Pos2::new(100.0, 100.0));
    assert_eq!(pos("b"), Pos2::new(300.0, 100.0));
    assert_eq!(pos("c"), Pos2::new(100.0, 250.0));
    assert_eq!(pos("d"), Pos2::new(100.0, 400.0));
    assert_eq!(pos("d").y - pos("c").y, 150.0);
}

#[test]
fn layout_leaves_unreachable_sims_alone() {
    let mut g = FamilyGraph::new();
    for id in ["x", "y"] {
        g.add_sim(SimFields { id: Some(id.into()), ..SimFields::named(id) }.at(42.0, 24.0));
    }
    // Mutual parents: neither is a root
    g.set_relationships(vec![
        Relationship::new("x", "y", RelationshipKind::Parent),
        Relationship::new("y", "x", RelationshipKind::Parent),
    ]);
    assert_eq!(layout::apply_layout(&mut g), 0);
    assert_eq!(g.get_sim("x").expect("x").pos(), Pos2::new(42.0, 24.0));
}

#[test]
fn snapshot_round_trip_keeps_sims_and_relationship_sequence() {
    let json = r#"{
        "version": "1.0",
        "sims": [
            {"id": "s1", "name": "Ann", "gender": "female", "x": 10, "y": 20},
            {"id": "s2", "name": "Bob", "gender": "male", "x": 30, "y": 40}
        ],
        "relationships": [
            {"from": "s1", "to": "s2", "type": "spouse"},
            {"from": "s1", "to": "s2", "type": "spouse"},
            {"from": "s2", "to": "s2", "type": "sibling"},
            {"from": "s1", "to": "missing", "type": "parent"}
        ],
        "metadata": {"created": "2024-01-01T00:00:00Z", "simCount": 2}
    }"#;
    let mut view = GraphView::new();
    view.import_snapshot(Snapshot::from_json(json).expect("parse"));

    let exported = view.export_snapshot();
    assert_eq!(exported.version, "1.0");
    assert_eq!(exported.metadata.sim_count, 2);
    assert_eq!(exported.relationships.len(), 4);

    let mut again = GraphView::new();
    again.import_snapshot(exported.clone());
    let ids = |v: &GraphView| v.all_sims().into_iter().map(|s| s.id).collect::<HashSet<_>>();
    assert_eq!(ids(&view), ids(&again));
    assert_eq!(again.all_sims(), view.all_sims());
    assert_eq!(again.relationships(), exported.relationships.as_slice());
}

#[test]
fn import_keeps_last_sim_for_duplicate_ids() {
    let json = r#"{"sims": [
        {"id": "s1", "name": "First", "x": 0, "y": 0},
        {"id": "s2", "name": "Other", "x": 0, "y": 0},
        {"id": "s1", "name": "Second", "x": 5, "y": 5}
    ]}"#;
    let mut view = GraphView::new();
    view.import_snapshot(Snapshot::from_json(json).expect("parse"));
    assert_eq!(view.graph().sim_count(), 2);
    assert_eq!(view.get_sim("s1").expect("s1").name, "Second");
}

#[test]
fn import_replaces_existing_tree_and_selection() {
    let mut view = GraphView::new();
    sim_at(&mut view, "old", 0.0, 0.0);
    view.select("old");
    view.import_snapshot(Snapshot::example_family());
    assert!(view.get_sim("old").is_none());
    assert_eq!(view.graph().sim_count(), 5);
    assert_eq!(view.relationships().len(), 7);
    assert_eq!(view.selected(), None);
}

#[test]
fn empty_store_renders_welcome() {
    let mut view = GraphView::new();
    assert_eq!(view.scene(), &Scene::Welcome);
    sim_at(&mut view, "a", 0.0, 0.0);
    assert!(view.scene().canvas().is_some());
    view.clear();
    assert_eq!(view.scene(), &Scene::Welcome);
}

#[test]
fn zoom_is_clamped_and_reset_restores_identity() {
    let mut view = GraphView::new();
    for _ in 0..40 {
        view.zoom(1.2);
    }
    assert_eq!(view.viewport().scale(), MAX_SCALE);
    for _ in 0..40 {
        view.zoom(0.8);
    }
    assert_eq!(view.viewport().scale(), MIN_SCALE);
    view.reset_view();
    assert_eq!(view.viewport().scale(), 1.0);
    assert_eq!(view.viewport().offset, Vec2::ZERO);
}

#[test]
fn wheel_follows_dom_direction() {
    let mut view = GraphView::new();
    view.wheel(100.0);
    assert!((view.viewport().scale() - 0.9).abs() < 1e-6);
    view.reset_view();
    view.wheel(-100.0);
    assert!((view.viewport().scale() - 1.1).abs() < 1e-6);
    view.wheel(0.0);
    assert!((view.viewport().scale() - 1.1).abs() < 1e-6);
}

#[test]
fn background_drag_pans_the_view() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 500.0, 500.0);
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(10.0, 10.0), PointerButton::Primary, t0);
    assert!(view.interaction().is_panning());
    view.pointer_move(Pos2::new(40.0, 30.0));
    assert_eq!(view.viewport().offset, Vec2::new(30.0, 20.0));
    view.pointer_up(Pos2::new(40.0, 30.0), t0 + Duration::from_millis(500));
    assert!(view.interaction().is_idle());
    // Sims do not move when panning
    assert_eq!(view.get_sim("a").expect("a").pos(), Pos2::new(500.0, 500.0));
}

#[test]
fn node_drag_uses_incremental_path_then_full_render() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 100.0, 100.0);
    sim_at(&mut view, "b", 400.0, 100.0);
    view.add_relationship(Relationship::new("a", "b", RelationshipKind::Spouse));
    let t0 = Instant::now();

    view.pointer_down(Pos2::new(110.0, 110.0), PointerButton::Primary, t0);
    assert_eq!(view.interaction().dragged_sim(), Some("a"));
    let before = view.render_stats();

    view.pointer_move(Pos2::new(160.0, 140.0));
    assert_eq!(view.get_sim("a").expect("a").pos(), Pos2::new(150.0, 130.0));
    assert!(view.has_pending_frame());
    assert_eq!(view.render_stats(), before);

    assert!(view.on_frame());
    assert!(!view.has_pending_frame());
    let after = view.render_stats();
    assert_eq!(after.full_renders, before.full_renders);
    assert_eq!(after.incremental_updates, before.incremental_updates + 1);
    let layer = view.scene().canvas().expect("canvas");
    assert_eq!(layer.node("a").expect("node").pos, Pos2::new(150.0, 130.0));
    assert_eq!(layer.connectors[0].origin, Pos2::new(230.0, 180.0));

    view.pointer_up(Pos2::new(160.0, 140.0), t0 + Duration::from_millis(400));
    assert!(view.interaction().is_idle());
    assert_eq!(view.render_stats().full_renders, before.full_renders + 1);
    assert_eq!(view.selected(), None);
}

#[test]
fn node_drag_delta_is_divided_by_scale() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 100.0, 100.0);
    view.zoom(2.0);
    assert_eq!(view.viewport().scale(), 2.0);
    // Canvas centered on the origin: model (100, 100) is at screen (200, 200)
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(200.0, 200.0), PointerButton::Primary, t0);
    assert_eq!(view.interaction().dragged_sim(), Some("a"));
    view.pointer_move(Pos2::new(260.0, 240.0));
    assert_eq!(view.get_sim("a").expect("a").pos(), Pos2::new(130.0, 120.0));
}

#[test]
fn quick_release_on_node_selects_and_notifies() {
    let mut view = GraphView::new();
    let rx = view.subscribe();
    sim_at(&mut view, "a", 100.0, 100.0);
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(120.0, 120.0), PointerButton::Primary, t0);
    view.pointer_up(Pos2::new(122.0, 121.0), t0 + Duration::from_millis(50));

    assert_eq!(view.selected(), Some("a"));
    assert_eq!(rx.try_recv().expect("event"), ViewEvent::SimSelected("a".into()));
    assert!(view.scene().canvas().expect("canvas").node("a").expect("node").selected);
}

#[test]
fn long_move_is_a_drag_not_a_click() {
    let mut view = GraphView::new();
    let rx = view.subscribe();
    sim_at(&mut view, "a", 100.0, 100.0);
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(120.0, 120.0), PointerButton::Primary, t0);
    view.pointer_move(Pos2::new(170.0, 120.0));
    view.pointer_up(Pos2::new(170.0, 120.0), t0 + Duration::from_millis(50));
    assert_eq!(view.selected(), None);
    assert!(rx.try_recv().is_err());
}

#[test]
fn deleting_selected_sim_clears_selection() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 0.0, 0.0);
    sim_at(&mut view, "b", 300.0, 0.0);
    view.add_relationship(Relationship::new("a", "b", RelationshipKind::Sibling));
    view.select("a");
    view.delete_sim("a");
    assert_eq!(view.selected(), None);
    assert!(view.relationships().is_empty());
    assert!(view.scene().canvas().expect("canvas").connectors.is_empty());
}

#[test]
fn hit_test_prefers_topmost_node() {
    let mut view = GraphView::new();
    sim_at(&mut view, "under", 0.0, 0.0);
    sim_at(&mut view, "over", 50.0, 50.0);
    assert_eq!(view.hit_test(Pos2::new(60.0, 60.0)).as_deref(), Some("over"));
    assert_eq!(view.hit_test(Pos2::new(10.0, 10.0)).as_deref(), Some("under"));
    assert_eq!(view.hit_test(Pos2::new(-5.0, -5.0)), None);
}

#[test]
fn graph_rejects_sims_without_a_name() {
    let mut g = FamilyGraph::new();
    assert_eq!(g.add_sim(SimFields::default()), None);
    assert_eq!(g.add_sim(SimFields::named("   ").at(1.0, 1.0)), None);
    assert!(g.is_empty());

    let mut view = GraphView::new();
    assert_eq!(view.add_sim(SimFields::default()), None);
    assert_eq!(view.scene(), &Scene::Welcome);
}

#[test]
fn non_finite_zoom_factor_keeps_scale() {
    let mut view = GraphView::new();
    view.zoom(2.5);
    view.zoom(f32::NAN);
    assert_eq!(view.viewport().scale(), 2.5);
    view.zoom(f32::INFINITY);
    assert_eq!(view.viewport().scale(), 2.5);
}

#[test]
fn reset_view_after_pan_and_zoom() {
    let mut view = GraphView::new();
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(10.0, 10.0), PointerButton::Middle, t0);
    view.pointer_move(Pos2::new(40.0, 30.0));
    view.pointer_up(Pos2::new(40.0, 30.0), t0 + Duration::from_millis(300));
    view.zoom(2.0);
    assert_eq!(view.viewport().offset, Vec2::new(30.0, 20.0));

    view.reset_view();
    assert_eq!(view.viewport().scale(), 1.0);
    assert_eq!(view.viewport().offset, Vec2::ZERO);
}

#[test]
fn pan_move_triggers_full_render() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 500.0, 500.0);
    let t0 = Instant::now();
    view.pointer_down(Pos2::new(10.0, 10.0), PointerButton::Primary, t0);
    let before = view.render_stats();
    view.pointer_move(Pos2::new(25.0, 10.0));
    view.pointer_move(Pos2::new(35.0, 10.0));
    let after = view.render_stats();
    assert_eq!(after.full_renders, before.full_renders + 2);
    assert_eq!(after.incremental_updates, before.incremental_updates);
    assert!(!view.has_pending_frame());
    assert_eq!(view.scene().canvas().expect("canvas").offset, Vec2::new(25.0, 0.0));
}

#[test]
fn rapid_drag_moves_coalesce_into_one_update() {
    let mut view = GraphView::new();
    sim_at(&mut view, "a", 100.0, 100.0);
    sim_at(&mut view, "b", 400.0, 100.0);
    view.add_relationship(Relationship::new("a", "b", RelationshipKind::Parent));
    let other = view.scene().canvas().expect("canvas").node("b").expect("b").clone();
    let t0 = Instant::now();

    view.pointer_down(Pos2::new(110.0, 110.0), PointerButton::Primary, t0);
    let before = view.render_stats();
    view.pointer_move(Pos2::new(130.0, 110.0));
    view.pointer_move(Pos2::new(145.0, 125.0));
    view.pointer_move(Pos2::new(160.0, 140.0));

    assert!(view.on_frame());
    assert!(!view.on_frame());
    let after = view.render_stats();
    assert_eq!(after.incremental_updates, before.incremental_updates + 1);
    assert_eq!(after.full_renders, before.full_renders);

    let layer = view.scene().canvas().expect("canvas");
    assert_eq!(layer.node("a").expect("a").pos, Pos2::new(150.0, 130.0));
    // Only the dragged node moves on the incremental path
    assert_eq!(layer.node("b").expect("b"), &other);
    assert_eq!(layer.connectors.len(), 1);
    assert_eq!(layer.connectors[0].origin, Pos2::new(230.0, 180.0));
}

proptest! {
    #[test]
    fn ids_stay_unique_and_count_tracks_adds_minus_deletes(ops in prop::collection::vec(any::<bool>(), 1..60)) {
        let mut g = FamilyGraph::new();
        let mut live: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for add in ops {
            if add || live.is_empty() {
                let id = g.add_sim(SimFields::named("sim")).expect("named");
                prop_assert!(seen.insert(id.clone()));
                live.push(id);
            } else {
                let id = live.remove(0);
                prop_assert!(g.remove_sim(&id));
            }
            prop_assert_eq!(g.sim_count(), live.len());
        }
    }

    #[test]
    fn scale_never_leaves_bounds(factors in prop::collection::vec(0.05f32..20.0, 1..40)) {
        let mut view = GraphView::new();
        for f in factors {
            view.zoom(f);
            let s = view.viewport().scale();
            prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&s));
        }
    }
}
