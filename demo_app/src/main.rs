//! Spinning cubes demo
//!
//! Two scenes share the same shader sources. `Tab` switches between them and
//! `V` toggles the visibility of the cubes marked toggleable. Runs headless by
//! default; build with `--features glfw-window` for a desktop window.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use rand::Rng;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use scene_engine::render::api::TextureData;
use thiserror::Error;

const VERTEX_SHADER: &str = "#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 2) in vec2 a_tex_coord;
uniform mat4 u_model;
uniform mat4 u_view_projection;
out vec2 v_tex_coord;
void main() {
    v_tex_coord = a_tex_coord;
    gl_Position = u_view_projection * u_model * vec4(a_position, 1.0);
}
";

const FRAGMENT_SHADER: &str = "#version 330 core
in vec2 v_tex_coord;
uniform sampler2D u_texture;
out vec4 color;
void main() {
    color = texture(u_texture, v_tex_coord);
}
";

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] scene_engine::config::ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A field of randomly placed spinning cubes
struct CubeField {
    cubes: usize,
    spread: f32,
    next_scene: &'static str,
}

impl SceneScript for CubeField {
    fn load(&mut self, scene: &mut SceneContent, _ctx: &mut ResourceContext<'_>) -> Result<(), ResourceError> {
        let shader = scene
            .shaders
            .insert(Shader::from_files("textured", "shaders/textured.vert", "shaders/textured.frag"));
        let texture = scene
            .textures
            .insert(Texture::from_file("checker", "textures/checker.png"));
        let mesh = scene.objects.insert(Mesh::new("cube", MeshData::cube()));

        let world = &mut scene.world;
        world.add_system(SpinSystem);
        world.add_system(VisibilityToggleSystem::new(KeyCode::V));
        world.add_system(RenderingSystem::new());

        let camera = world.create_entity();
        world.add_component(
            camera,
            CameraComponent::perspective(Vec3::new(0.0, self.spread, self.spread * 2.5), 60.0, 4.0 / 3.0, 0.1, 100.0)
                .looking_at(Vec3::zeros()),
        );

        let mut rng = rand::thread_rng();
        for i in 0..self.cubes {
            let position = Vec3::new(
                rng.gen_range(-self.spread..self.spread),
                rng.gen_range(-self.spread..self.spread),
                rng.gen_range(-self.spread..self.spread),
            );
            let axis = Vec3::new(rng.gen(), rng.gen(), rng.gen()) + Vec3::y();
            let cube = world.create_entity();
            world.add_component(cube, TransformComponent::from_position(position).with_uniform_scale(0.5));
            world.add_component(cube, SpinComponent::new(axis.normalize(), rng.gen_range(0.5..2.0)));
            world.add_component(cube, MeshComponent(mesh.clone()));
            world.add_component(cube, ShaderComponent(shader.clone()));
            world.add_component(cube, TextureComponent(texture.clone()));
            world.add_component(cube, Visible);
            if i % 2 == 0 {
                world.add_component(cube, Toggleable);
            }
        }
        Ok(())
    }

    fn update(&mut self, scene: &mut SceneContent, input: &InputState, _delta_time: f32) -> SystemResult {
        if input.is_key_pressed(KeyCode::Tab) {
            log::info!("Switching to scene '{}'", self.next_scene);
            scene.request_scene(self.next_scene);
        }
        Ok(())
    }
}

fn checker_texture() -> TextureData {
    let (width, height) = (8u32, 8u32);
    let pixels = (0..width * height)
        .flat_map(|i| {
            let (x, y) = (i % width, i / width);
            if (x + y) % 2 == 0 {
                [230, 230, 230, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect();
    TextureData { width, height, pixels }
}

fn load_config() -> Result<EngineConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig {
            render: RenderSettings::new("Scene Engine - Cubes", 1024, 768).with_clear_color([0.05, 0.05, 0.1, 1.0]),
            ..EngineConfig::default()
        },
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.render.log_level);

    let loader = MemoryAssetLoader::new()
        .with_text("shaders/textured.vert", VERTEX_SHADER)
        .with_text("shaders/textured.frag", FRAGMENT_SHADER)
        .with_image("textures/checker.png", checker_texture());

    #[cfg(not(feature = "glfw-window"))]
    let headless = config.headless.clone();
    let mut engine = Engine::with_config(config, loader);
    engine.add_scene(Scene::new(
        "small",
        CubeField {
            cubes: 8,
            spread: 3.0,
            next_scene: "large",
        },
    ));
    engine.add_scene(Scene::new(
        "large",
        CubeField {
            cubes: 64,
            spread: 8.0,
            next_scene: "small",
        },
    ));

    #[cfg(feature = "glfw-window")]
    {
        let device = scene_engine::render::HeadlessDevice::new();
        let mut window = scene_engine::window::GlfwWindow::new(Box::new(device));
        engine.run_window(&mut window)?;
    }

    #[cfg(not(feature = "glfw-window"))]
    {
        let third = headless.frames / 3;
        let mut window = HeadlessWindow::from_settings(&headless)
            .press_key_at(third, KeyCode::Tab)
            .press_key_at(third * 2, KeyCode::V);
        engine.run_window(&mut window)?;
        let stats = window.device().stats();
        log::info!(
            "Headless run: {} frames, {} draw calls, {} bytes uploaded, {} live handles left",
            window.frames_run(),
            stats.draw_calls,
            stats.bytes_uploaded,
            window.device().live_handle_count()
        );
    }

    let stats = engine.renderer().stats();
    log::info!(
        "Rendered {} frames in {:.2}s ({:.1} fps)",
        stats.frames,
        stats.elapsed,
        stats.average_fps()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        logging::init();
        log::error!("scene_demo failed: {e}");
        std::process::exit(1);
    }
}
