use lumen_engine::geometry::{GraphObject, Material, Polygon};
use lumen_engine::math::{transform, Vect3};
use lumen_engine::scene::{DrawTarget, Instances, Kernel, Light, LightState, SceneComposer};
use lumen_engine::{EngineConfig, EngineError};

/// Quad centred on its own origin, facing -z.
fn pane(scene: &SceneComposer, alpha: f64) -> GraphObject {
    let mut quad = Polygon::unit_quad();
    quad.change_matrix(&transform::translation(Vect3::new(-0.5, -0.5, 0.0)));
    quad.set_material(Material {
        alpha,
        ..Material::default()
    });

    let mut object = scene.new_object();
    object.add_polygon(quad);
    object.set_center();
    object
}

fn at(object: &mut GraphObject, z: f64) {
    object.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, z)), 0);
}

fn scene() -> SceneComposer {
    let mut scene = SceneComposer::new(&EngineConfig::default(), 16.0 / 9.0);
    scene.camera_mut().position = Vect3::zero();
    scene
}

// ── draw order ────────────────────────────────────────────────────────────

#[test]
fn markers_then_opaque_then_transparent_back_to_front() {
    let mut scene = scene();
    scene.set_light(1, Some(Light::point(Vect3::new(0.0, 4.0, 0.0))));

    let mut solid = pane(&scene, 1.0);
    at(&mut solid, 10.0);
    solid.add_matrix(transform::translation(Vect3::new(2.0, 0.0, 10.0))).unwrap();
    solid.border = true;
    let solid = scene.add_object(solid);

    // Distances 5 and 1 in one object, 3 in another.
    let mut near_far = pane(&scene, 0.5);
    near_far.transparent = true;
    at(&mut near_far, 5.0);
    near_far.add_matrix(transform::translation(Vect3::new(0.0, 0.0, 1.0))).unwrap();
    let near_far = scene.add_object(near_far);

    let mut middle = pane(&scene, 0.5);
    middle.transparent = true;
    at(&mut middle, 3.0);
    let middle = scene.add_object(middle);

    let plan = scene.compose();

    assert_eq!(plan.draws[0].target, DrawTarget::Marker(1));
    assert_eq!(plan.draws[0].instances, Instances::All(1));
    assert_eq!(plan.draws[0].stencil_ref, 0);

    let order: Vec<_> = plan.object_draws().collect();
    assert_eq!(
        order,
        vec![
            (solid, Instances::All(2)),
            (near_far, Instances::One(0)),
            (middle, Instances::One(0)),
            (near_far, Instances::One(1)),
        ]
    );

    assert!(plan.draws.iter().skip(2).all(|d| d.transparent));
    assert!(!plan.draws[1].transparent);
}

#[test]
fn outlined_object_gets_one_outline_per_instance() {
    let mut scene = scene();

    let mut object = pane(&scene, 1.0);
    at(&mut object, 4.0);
    object.add_matrix(transform::translation(Vect3::new(1.0, 0.0, 4.0))).unwrap();
    object.add_matrix(transform::translation(Vect3::new(-1.0, 0.0, 4.0))).unwrap();
    object.border = true;
    object.border_color = Vect3::new(0.0, 1.0, 0.0);
    scene.add_object(object);

    let plain = pane(&scene, 1.0);
    scene.add_object(plain);

    let plan = scene.compose();
    assert_eq!(plan.draws.len(), 2);
    assert_eq!(plan.outlines.len(), 3);
    assert_eq!(plan.draws[0].outline, Some(0..3));
    assert_ne!(plan.draws[0].stencil_ref, 0);
    assert_eq!(plan.draws[1].outline, None);
    assert_eq!(plan.draws[1].stencil_ref, 0);
    assert!(plan.outlines.iter().all(|o| o.color == Vect3::new(0.0, 1.0, 0.0)));
}

// ── frame state ───────────────────────────────────────────────────────────

#[test]
fn every_light_slot_is_uploaded() {
    let mut scene = scene();
    let light = Light::directional(Vect3::new(0.0, -1.0, 0.0));
    scene.set_light(-1, Some(light.clone()));

    let plan = scene.compose();
    assert_eq!(plan.lights.len(), scene.light_slots());

    let last = scene.light_slots() - 1;
    assert_eq!(plan.lights[last], light.state());
    assert!(plan.lights[..last].iter().all(|s| *s == LightState::neutral()));
}

#[test]
fn post_settings_and_colors_follow_setters() {
    let mut scene = scene();
    let edge: Kernel = "1 1 1  1 -8 1  1 1 1".parse().unwrap();
    scene.set_kernel(edge);
    scene.set_kernel_offset(0.01);
    scene.set_grayscale(true);
    scene.set_gamma(1.0);
    scene.set_clear_color(Vect3::new(0.0, 0.0, 0.0));

    let plan = scene.compose();
    assert_eq!(plan.post.kernel, edge);
    assert_eq!(plan.post.offset, 0.01);
    assert!(plan.post.grayscale);
    assert_eq!(plan.gamma, 1.0);
    assert_eq!(plan.clear_color, Vect3::zero());
}

// ── removal ───────────────────────────────────────────────────────────────

#[test]
fn removed_objects_leave_the_plan() {
    let mut scene = scene();
    let a = scene.add_object(pane(&scene, 1.0));
    let b = scene.add_object(pane(&scene, 1.0));

    let removed = scene.remove_object(a).unwrap();
    assert_eq!(removed.id(), Some(a));

    let ids: Vec<_> = scene.compose().object_draws().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![b]);

    assert!(matches!(scene.remove_object(a), Err(EngineError::NotFound { .. })));
}
