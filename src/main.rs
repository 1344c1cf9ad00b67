//! Bouncing boxes demo
//!
//! Two boxes move across an 800x400 field, bouncing off its edges and off
//! each other. `R` rebuilds the scene, `Escape` quits. An optional first
//! argument names a RON engine configuration file.

use sprout::prelude::*;

const FIELD_WIDTH: u32 = 800;
const FIELD_HEIGHT: u32 = 400;
const BOX_SIZE: f64 = 50.0;

fn bouncing_box(name: &str, position: Vector, velocity: Vector, color: Color) -> Result<Entity, EngineError> {
    let field = Rect::new(0.0, 0.0, f64::from(FIELD_WIDTH), f64::from(FIELD_HEIGHT));
    Entity::new(name)
        .with_tag("box")
        .with_layer(Layer::Middle)
        .with_position(position)
        .with_dim(Vector::new(BOX_SIZE, BOX_SIZE))
        .with_component(
            Body::new()
                .with_velocity(velocity)
                .with_field(field)
                .with_bounce_on_collision(true),
        )?
        .with_component(Collider::new())?
        .with_component(Shape::new().with_color(color))?
        .with_component(Hover::new())
}

/// Demo game with two bouncing boxes
struct BoxesGame;

impl Game for BoxesGame {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        log::info!("Initializing bouncing boxes demo");

        let scene = Scene::new("boxes")
            .with_collision_mode(CollisionMode::BoundingBox)
            .with_builder(|ctx, id| {
                let a = bouncing_box("a", Vector::new(50.0, 50.0), Vector::new(10.0, 10.0), Color::RED)?;
                let b = bouncing_box("b", Vector::new(50.0, 350.0), Vector::new(9.0, -9.0), Color::GREEN)?;
                if let Some(scene) = ctx.scenes.scene_mut(id) {
                    scene.add_entity(a);
                    scene.add_entity(b);
                }
                Ok(())
            });
        ctx.scenes.add_scene(scene);

        let on_collision = ctx.on_collision();
        let engine = ctx.object().id();
        ctx.delegates.register(engine, on_collision, |ctx, event: &CollisionEvent| {
            log::debug!("boxes collided: frame={} a={} b={}", ctx.frame(), event.a, event.b);
            Ok(())
        });
        Ok(())
    }

    fn frame_start(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        if ctx.input.is_key_just_pressed(KeyCode::Escape) {
            ctx.quit();
        }
        if ctx.input.is_key_just_pressed(KeyCode::KeyR) {
            ctx.scenes.restart_scene();
        }
        Ok(())
    }
}

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load_ron(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Engine error: {e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default()
            .with_title("Bouncing boxes")
            .with_size(FIELD_WIDTH, FIELD_HEIGHT)
            .with_vsync(true),
    };

    let mut engine = Engine::new(config, BoxesGame);
    if let Err(e) = engine.run() {
        eprintln!("Engine error: {e}");
        std::process::exit(1);
    }
}
