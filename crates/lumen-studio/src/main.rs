use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use lumen_engine::core::{App, AppControl, FrameCtx};
use lumen_engine::device::GpuInit;
use lumen_engine::geometry::{GraphObject, Material, ObjectId, Polygon, TextureSet};
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::math::{transform, Vect3};
use lumen_engine::render::{Texture, Wrap};
use lumen_engine::scene::{Attenuation, Kernel, Light, SceneComposer};
use lumen_engine::window::{Runtime, RuntimeConfig};
use lumen_engine::{Engine, EngineConfig};

/// Camera turn rate, radians per second.
const TURN_SPEED: f64 = 1.2;
/// Spin of the outlined cube, radians per second.
const SPIN_SPEED: f64 = 0.8;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let studio = Studio::new(std::env::args().nth(1))?;

    let runtime = RuntimeConfig {
        title: "lumen studio".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(runtime, GpuInit::default(), studio)
}

#[derive(Default)]
struct Held {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

struct Studio {
    engine: Engine,
    kernels: Vec<(String, Kernel)>,
    kernel_index: usize,
    held: Held,
    spinner: ObjectId,
}

impl Studio {
    /// `kernel_path` adds a `.kernel` file to the cycle.
    fn new(kernel_path: Option<String>) -> Result<Self> {
        let mut engine = Engine::new(&EngineConfig::default(), (1280, 720));
        let spinner = build_scene(engine.scene_mut())?;

        let mut kernels = vec![
            ("identity".to_string(), Kernel::identity()),
            ("edge detect".to_string(), "1 1 1  1 -8 1  1 1 1".parse::<Kernel>()?),
            ("sharpen".to_string(), "0 -1 0  -1 5 -1  0 -1 0".parse::<Kernel>()?),
            (
                "blur".to_string(),
                Kernel::new([
                    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
                    [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
                    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
                ]),
            ),
        ];

        if let Some(path) = kernel_path {
            let kernel = Kernel::load(&path).with_context(|| format!("loading kernel {path}"))?;
            kernels.push((path, kernel));
        }

        log::info!("arrows: turn camera | G: grayscale | K: next kernel | Esc: quit");

        Ok(Self {
            engine,
            kernels,
            kernel_index: 0,
            held: Held::default(),
            spinner,
        })
    }

    fn on_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> AppControl {
        match code {
            KeyCode::ArrowLeft => self.held.left = pressed,
            KeyCode::ArrowRight => self.held.right = pressed,
            KeyCode::ArrowUp => self.held.up = pressed,
            KeyCode::ArrowDown => self.held.down = pressed,

            KeyCode::KeyG if pressed && !repeat => {
                let scene = self.engine.scene_mut();
                let on = !scene.post().grayscale;
                scene.set_grayscale(on);
                log::info!("grayscale {}", if on { "on" } else { "off" });
            }

            KeyCode::KeyK if pressed && !repeat => {
                self.kernel_index = (self.kernel_index + 1) % self.kernels.len();
                let (name, kernel) = &self.kernels[self.kernel_index];
                self.engine.scene_mut().set_kernel(*kernel);
                log::info!("kernel: {name}");
            }

            KeyCode::Escape if pressed => return AppControl::Exit,

            _ => {}
        }
        AppControl::Continue
    }

    fn update(&mut self, dt: f64) {
        let scene = self.engine.scene_mut();

        let yaw = (self.held.left as i32 - self.held.right as i32) as f64;
        if yaw != 0.0 {
            scene.rotate_camera(Vect3::new(0.0, 1.0, 0.0), yaw * TURN_SPEED * dt);
        }

        let pitch = (self.held.up as i32 - self.held.down as i32) as f64;
        if pitch != 0.0 {
            let axis = scene.camera().horizontal();
            scene.rotate_camera(axis, -pitch * TURN_SPEED * dt);
        }

        let spinner = scene.object_mut(self.spinner);
        let Some(&(pivot, _)) = spinner.instance_centers().first() else { return };
        let spin = transform::translation(pivot)
            * transform::rotation(Vect3::new(0.3, 1.0, 0.0).normalize(), SPIN_SPEED * dt)
            * transform::translation(-pivot);
        spinner.change_matrix(&spin, 0);
    }
}

impl App for Studio {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat,
                    ..
                },
            ..
        } = event
        else {
            return AppControl::Continue;
        };

        self.on_key(*code, *state == ElementState::Pressed, *repeat)
    }

    fn on_resize(&mut self, _window_id: WindowId, size: (u32, u32)) {
        self.engine.resize(size);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.update(ctx.time.dt);

        if ctx.time.frame_index % 120 == 0 && ctx.time.dt > 0.0 {
            ctx.window
                .set_title(&format!("lumen studio ({:.0} fps)", 1.0 / ctx.time.dt));
        }

        let engine = &mut self.engine;
        ctx.render(|rctx, target| {
            engine.draw(rctx, target);
        })
    }
}

// ── scene ─────────────────────────────────────────────────────────────────

/// Populates `scene` and returns the outlined, spinning cube.
fn build_scene(scene: &mut SceneComposer) -> Result<ObjectId> {
    scene.camera_mut().position = Vect3::new(0.0, 1.0, -6.0);

    // Floor with a repeating checker.
    let mut floor = scene.new_object();
    let mut quad = Polygon::new(vec![
        Vect3::new(-10.0, -1.0, -10.0),
        Vect3::new(10.0, -1.0, -10.0),
        Vect3::new(10.0, -1.0, 10.0),
        Vect3::new(-10.0, -1.0, 10.0),
    ])?;
    quad.set_tex_coords(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])?;
    quad.set_material(Material {
        specular: Vect3::new(0.2, 0.2, 0.2),
        shininess: 16.0,
        ..Material::default()
    });
    quad.set_textures(TextureSet::diffuse(Arc::new(checker()?.with_wrapping(Wrap::Repeat))));
    floor.add_polygon(quad);
    scene.add_object(floor);

    // Opaque cubes, one object, four instances.
    let mut cubes = cube(scene, Material::solid(Vect3::new(0.8, 0.35, 0.2)))?;
    cubes.change_matrix(&transform::translation(Vect3::new(-3.0, 0.0, 4.0)), 0);
    for at in [
        Vect3::new(3.0, 0.0, 4.0),
        Vect3::new(-1.5, 0.0, 8.0),
        Vect3::new(1.5, 1.0, 9.0),
    ] {
        cubes.add_matrix(transform::translation(at))?;
    }
    scene.add_object(cubes);

    // Outlined cube in the middle.
    let mut spinner = cube(scene, Material::solid(Vect3::new(0.2, 0.5, 0.9)))?;
    spinner.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, 3.0)), 0);
    spinner.border = true;
    spinner.border_color = Vect3::new(1.0, 0.8, 0.1);
    let spinner = scene.add_object(spinner);

    // Glass panes, sorted back-to-front every frame.
    let mut panes = scene.new_object();
    panes.transparent = true;
    let mut pane = Polygon::unit_quad();
    pane.change_matrix(&transform::translation(Vect3::new(-0.5, -0.5, 0.0)));
    pane.set_material(Material {
        alpha: 0.45,
        ..Material::solid(Vect3::new(0.3, 0.8, 0.6))
    });
    panes.add_polygon(pane);
    panes.set_center();
    panes.change_matrix(&transform::translation(Vect3::new(-1.0, 0.0, 1.0)), 0);
    for at in [Vect3::new(0.5, 0.2, 1.8), Vect3::new(1.2, -0.2, 0.5)] {
        panes.add_matrix(transform::translation(at))?;
    }
    scene.add_object(panes);

    // Lights.
    scene.set_light(
        0,
        Some(
            Light::directional(Vect3::new(-0.2, -1.0, 0.3).normalize()).with_colors(
                Vect3::new(0.05, 0.05, 0.05),
                Vect3::new(0.4, 0.4, 0.4),
                Vect3::new(0.5, 0.5, 0.5),
            ),
        ),
    );
    scene.set_light(
        1,
        Some(
            Light::point(Vect3::new(2.0, 2.0, 2.0))
                .with_colors(
                    Vect3::new(0.05, 0.05, 0.05),
                    Vect3::new(0.8, 0.8, 0.8),
                    Vect3::new(1.0, 1.0, 1.0),
                )
                .with_attenuation(Attenuation {
                    constant: 1.0,
                    linear: 0.09,
                    quadratic: 0.032,
                }),
        ),
    );
    scene.set_light(
        2,
        Some(
            Light::spot(
                Vect3::new(0.0, 3.0, 3.0),
                Vect3::new(0.0, -1.0, 0.0),
                12.5f64.to_radians(),
                17.5f64.to_radians(),
            )
            .with_colors(Vect3::zero(), Vect3::new(1.0, 1.0, 0.9), Vect3::new(1.0, 1.0, 1.0)),
        ),
    );

    Ok(spinner)
}

/// Unit cube centred on the origin: one face turned five times.
fn cube(scene: &SceneComposer, material: Material) -> Result<GraphObject> {
    let mut face = Polygon::new(vec![
        Vect3::new(0.5, 0.5, 0.5),
        Vect3::new(0.5, -0.5, 0.5),
        Vect3::new(-0.5, -0.5, 0.5),
        Vect3::new(-0.5, 0.5, 0.5),
    ])?;
    face.set_material(material);

    let y = Vect3::new(0.0, 1.0, 0.0);
    let z = Vect3::new(0.0, 0.0, 1.0);

    let mut object = scene.new_object();
    object.add_polygon(face.clone());
    for turn in [
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(z, FRAC_PI_2),
        transform::rotation(z, PI),
    ] {
        face.change_matrix(&turn);
        object.add_polygon(face.clone());
    }
    Ok(object)
}

/// 8×8 two-tone checker.
fn checker() -> Result<Texture> {
    let mut pixels = Vec::with_capacity(8 * 8 * 4);
    for y in 0..8u32 {
        for x in 0..8u32 {
            let v = if (x + y) % 2 == 0 { 200 } else { 60 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Ok(Texture::from_rgba(8, 8, pixels, true)?)
}
