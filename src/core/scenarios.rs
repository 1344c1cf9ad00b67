//! End-to-end runs of the engine on the headless platform

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::components::{Body, Collider, Sprite, Timer, TimerEvent};
use crate::delegate::{CollisionEvent, Delegate, DestroyEvent};
use crate::ecs::{Component, ComponentBase, Entity, EntityRef};
use crate::math::{Rect, Vector};
use crate::platform::HeadlessPlatform;
use crate::scene::{CollisionMode, Scene};

use super::{Engine, EngineConfig, EngineContext, EngineError, EntityId, Game, SceneId};

type Hook = Box<dyn FnMut(&mut EngineContext) -> Result<(), EngineError>>;
type Journal = Rc<RefCell<Vec<String>>>;

/// Game whose setup and per-frame actions are closures
#[derive(Default)]
struct Script {
    setup: Option<Hook>,
    actions: Vec<(u64, Hook)>,
}

impl Script {
    fn new(setup: impl FnMut(&mut EngineContext) -> Result<(), EngineError> + 'static) -> Self {
        Self {
            setup: Some(Box::new(setup)),
            actions: Vec::new(),
        }
    }

    /// Run `action` at the start of frame `frame`, before the scene passes
    fn at(
        mut self,
        frame: u64,
        action: impl FnMut(&mut EngineContext) -> Result<(), EngineError> + 'static,
    ) -> Self {
        self.actions.push((frame, Box::new(action)));
        self
    }
}

impl Game for Script {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        match self.setup.as_mut() {
            Some(setup) => setup(ctx),
            None => Ok(()),
        }
    }

    fn frame_start(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        let frame = ctx.frame();
        for (at, action) in &mut self.actions {
            if *at == frame {
                action(ctx)?;
            }
        }
        Ok(())
    }
}

fn engine(script: Script) -> Engine<Script, HeadlessPlatform> {
    let config = EngineConfig::default().with_size(800, 400).with_target_fps(0);
    let mut engine = Engine::with_platform(config, script, HeadlessPlatform::new());
    engine.start().unwrap();
    engine
}

fn run(engine: &mut Engine<Script, HeadlessPlatform>, frames: u64) {
    for _ in 0..frames {
        assert!(engine.frame().unwrap());
    }
}

fn find(ctx: &EngineContext, name: &str) -> Option<EntityRef> {
    let scene = ctx.active_scene()?;
    let entity = scene.entity_by_name(name)?;
    Some(EntityRef::new(scene.id(), entity.id()))
}

fn scene_id(ctx: &EngineContext, name: &str) -> Option<SceneId> {
    ctx.scenes.scene_by_name(name).map(Scene::id)
}

/// Writes `label:hook` into a journal for each lifecycle hook
struct Witness {
    base: ComponentBase,
    label: &'static str,
    journal: Journal,
}

impl Witness {
    fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            base: ComponentBase::new(label),
            label,
            journal: Rc::clone(journal),
        }
    }

    fn note(&self, hook: &str) {
        self.journal.borrow_mut().push(format!("{}:{hook}", self.label));
    }
}

impl Component for Witness {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.note("start");
        Ok(())
    }

    fn on_unload(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.note("unload");
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.note("destroy");
        Ok(())
    }
}

fn count(journal: &Journal, entry: &str) -> usize {
    journal.borrow().iter().filter(|e| *e == entry).count()
}

// Bouncing boxes

fn bouncing_box(name: &str, position: Vector, velocity: Vector) -> Result<Entity, EngineError> {
    let body = Body::new()
        .with_velocity(velocity)
        .with_field(Rect::new(0.0, 0.0, 800.0, 400.0))
        .with_bounce_on_collision(true);
    Entity::new(name)
        .with_tag("box")
        .with_position(position)
        .with_dim(Vector::new(50.0, 50.0))
        .with_component(body)?
        .with_component(Collider::new())
}

fn state(ctx: &EngineContext, name: &str) -> (Vector, Vector) {
    let owner = find(ctx, name).unwrap();
    let position = ctx.entity(owner).unwrap().transform().position();
    let velocity = ctx.component::<Body>(owner).unwrap().velocity();
    (position, velocity)
}

#[test]
fn test_bouncing_boxes() {
    let mut engine = engine(Script::new(|ctx| {
        let field = Scene::new("field")
            .with_collision_mode(CollisionMode::BoundingBox)
            .with_builder(|ctx, id| {
                let a = bouncing_box("a", Vector::new(50.0, 50.0), Vector::new(10.0, 10.0))?;
                let b = bouncing_box("b", Vector::new(50.0, 350.0), Vector::new(9.0, -9.0))?;
                if let Some(scene) = ctx.scenes.scene_mut(id) {
                    scene.add_entity(a);
                    scene.add_entity(b);
                }
                Ok(())
            });
        ctx.scenes.add_scene(field);
        Ok(())
    }));

    run(&mut engine, 1);
    let ctx = engine.context();
    assert_eq!(state(ctx, "a"), (Vector::new(60.0, 60.0), Vector::new(10.0, 10.0)));
    assert_eq!(state(ctx, "b"), (Vector::new(59.0, 341.0), Vector::new(9.0, -9.0)));
    assert_eq!(ctx.active_scene().unwrap().entities_by_tag("box").count(), 2);

    // frame 14: overlap (190, 224, 36, 16) is wider than tall, vertical components flip
    run(&mut engine, 12);
    assert_eq!(state(engine.context(), "a"), (Vector::new(180.0, 180.0), Vector::new(10.0, 10.0)));
    run(&mut engine, 1);
    assert_eq!(state(engine.context(), "a"), (Vector::new(190.0, 190.0), Vector::new(10.0, -10.0)));
    assert_eq!(state(engine.context(), "b"), (Vector::new(176.0, 224.0), Vector::new(9.0, 9.0)));

    // frame 70: a reaches the right edge
    run(&mut engine, 55);
    assert_eq!(state(engine.context(), "a").1.x, 10.0);
    run(&mut engine, 1);
    assert_eq!(state(engine.context(), "a"), (Vector::new(750.0, 330.0), Vector::new(-10.0, -10.0)));

    let mut previous = [state(engine.context(), "a"), state(engine.context(), "b")];
    for _ in 70..300 {
        run(&mut engine, 1);
        let current = [state(engine.context(), "a"), state(engine.context(), "b")];
        for ((before, _), (after, velocity)) in previous.iter().zip(&current) {
            let step = *after - *before;
            assert_eq!(step.abs(), velocity.abs());
            assert_eq!(after.fract(), Vector::ZERO);
        }
        assert_eq!(current[0].1.abs(), Vector::new(10.0, 10.0));
        assert_eq!(current[1].1.abs(), Vector::new(9.0, 9.0));
        previous = current;
    }
}

// Deferred destruction

/// Requests destruction of whatever it collides with
struct Hunter {
    base: ComponentBase,
    seen_after_request: Rc<RefCell<Vec<bool>>>,
}

impl Component for Hunter {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_start(&mut self, ctx: &mut EngineContext, owner: EntityRef) -> Result<(), EngineError> {
        let seen = Rc::clone(&self.seen_after_request);
        let on_collision = ctx.on_collision();
        self.base.register(ctx, on_collision, move |ctx, event: &CollisionEvent| {
            let Some(other) = event.other(owner.entity).filter(|_| event.scene == owner.scene) else {
                return Ok(());
            };
            let peer = EntityRef::new(owner.scene, other);
            ctx.destroy_entity(peer)?;
            seen.borrow_mut().push(ctx.entity(peer).is_some());
            Ok(())
        });
        Ok(())
    }
}

/// Counts its entity's updates
struct Pulse {
    base: ComponentBase,
    updates: Rc<Cell<u32>>,
}

impl Component for Pulse {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_update(&mut self, _ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.updates.set(self.updates.get() + 1);
        Ok(())
    }
}

#[test]
fn test_deferred_destruction() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let updates = Rc::new(Cell::new(0));
    let destroyed: Journal = Rc::default();

    let (seen_in, updates_in, destroyed_in) = (Rc::clone(&seen), Rc::clone(&updates), Rc::clone(&destroyed));
    let mut engine = engine(Script::new(move |ctx| {
        let engine_id = ctx.object().id();
        let on_destroy = ctx.on_destroy();
        let destroyed = Rc::clone(&destroyed_in);
        ctx.delegates.register(engine_id, on_destroy, move |_, event: &DestroyEvent| {
            destroyed.borrow_mut().push(event.name.clone());
            Ok(())
        });

        let (seen, updates) = (Rc::clone(&seen_in), Rc::clone(&updates_in));
        let arena = Scene::new("arena")
            .with_collision_mode(CollisionMode::BoundingBox)
            .with_builder(move |ctx, id| {
                let hunter = Entity::new("hunter")
                    .with_dim(Vector::new(10.0, 10.0))
                    .with_component(Collider::new())?
                    .with_component(Hunter {
                        base: ComponentBase::new("hunter"),
                        seen_after_request: Rc::clone(&seen),
                    })?;
                let prey = Entity::new("prey")
                    .with_position(Vector::new(5.0, 5.0))
                    .with_dim(Vector::new(10.0, 10.0))
                    .with_component(Collider::new())?
                    .with_component(Pulse {
                        base: ComponentBase::new("pulse"),
                        updates: Rc::clone(&updates),
                    })?;
                if let Some(scene) = ctx.scenes.scene_mut(id) {
                    scene.add_entity(hunter);
                    scene.add_entity(prey);
                }
                Ok(())
            });
        ctx.scenes.add_scene(arena);
        Ok(())
    }));
    assert!(find(engine.context(), "prey").is_some());

    run(&mut engine, 1);
    assert_eq!(*seen.borrow(), [true]);
    assert_eq!(updates.get(), 1);
    assert_eq!(*destroyed.borrow(), ["prey"]);
    assert!(find(engine.context(), "prey").is_none());
    engine.context().active_scene().unwrap().assert_consistent();

    run(&mut engine, 2);
    assert_eq!(updates.get(), 1);
    assert_eq!(destroyed.borrow().len(), 1);
    assert!(find(engine.context(), "hunter").is_some());
}

// Swap scene and return

#[test]
fn test_swap_scene_and_return() {
    let journal: Journal = Rc::default();

    let setup_journal = Rc::clone(&journal);
    let script = Script::new(move |ctx| {
        let journal = Rc::clone(&setup_journal);
        ctx.scenes.add_scene(Scene::new("s1").with_builder(move |ctx, id| {
            let hero = Entity::new("hero").with_component(Witness::new("hero", &journal))?;
            let mut spark = Entity::new("spark").with_component(Witness::new("spark", &journal))?;
            spark.destroy_on_unload = true;
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(hero);
                scene.add_entity(spark);
            }
            Ok(())
        }));

        let journal = Rc::clone(&setup_journal);
        ctx.scenes.add_scene(Scene::new("s2").with_builder(move |ctx, id| {
            let guard = Entity::new("guard").with_component(Witness::new("guard", &journal))?;
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(guard);
            }
            Ok(())
        }));
        Ok(())
    })
    .at(5, |ctx| {
        let s2 = scene_id(ctx, "s2").unwrap();
        assert!(ctx.scenes.swap_to(s2));
        assert_eq!(ctx.active_scene().map(Scene::name), Some("s1"));
        Ok(())
    })
    .at(10, |ctx| {
        assert!(ctx.scenes.swap_back());
        Ok(())
    });

    let mut engine = engine(script);
    let s1 = scene_id(engine.context(), "s1").unwrap();
    let s2 = scene_id(engine.context(), "s2").unwrap();
    let hero = find(engine.context(), "hero").unwrap();

    run(&mut engine, 5);
    let ctx = engine.context();
    assert_eq!(ctx.scenes.active_id(), Some(s2));
    assert_eq!(ctx.scenes.standby_id(), Some(s1));
    let retained = ctx.scene(s1).unwrap();
    assert!(retained.loaded().is_empty());
    assert_eq!(retained.unloaded(), &[hero.entity]);
    assert!(!ctx.entity(hero).unwrap().is_loaded());
    assert!(retained.entity_by_name("spark").is_none());
    assert_eq!(count(&journal, "hero:unload"), 1);
    assert_eq!(count(&journal, "spark:destroy"), 1);
    assert_eq!(count(&journal, "guard:start"), 1);
    retained.assert_consistent();

    run(&mut engine, 5);
    let ctx = engine.context();
    assert_eq!(ctx.scenes.active_id(), Some(s1));
    assert_eq!(ctx.scenes.standby_id(), None);
    assert!(ctx.entity(hero).unwrap().is_loaded());
    assert_eq!(ctx.scene(s1).unwrap().len(), 1);
    assert!(ctx.scene(s2).unwrap().is_empty());
    assert_eq!(count(&journal, "hero:start"), 2);
    assert_eq!(count(&journal, "hero:destroy"), 0);
    assert_eq!(count(&journal, "guard:destroy"), 1);
    ctx.scene(s1).unwrap().assert_consistent();
}

// Pending register resolution

/// Records the timer events it hears
struct Listener {
    base: ComponentBase,
}

impl Listener {
    fn new(target: Option<EntityId>, heard: &Rc<RefCell<Vec<u32>>>) -> Self {
        let mut base = ComponentBase::new("listener");
        let heard = Rc::clone(heard);
        base.subscribe::<Timer, TimerEvent, _>(target, move |_, event| {
            heard.borrow_mut().push(event.fired);
            Ok(())
        });
        Self { base }
    }
}

impl Component for Listener {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}

#[test]
fn test_pending_register_resolves_once() {
    let far: Rc<RefCell<Vec<u32>>> = Rc::default();
    let near: Rc<RefCell<Vec<u32>>> = Rc::default();

    let late = Entity::new("f").with_component(Timer::new(1)).unwrap();
    let late_id = late.id();
    let mut late = Some(late);

    let (far_in, near_in) = (Rc::clone(&far), Rc::clone(&near));
    let script = Script::new(move |ctx| {
        let (far, near) = (Rc::clone(&far_in), Rc::clone(&near_in));
        ctx.scenes.add_scene(Scene::new("s").with_builder(move |ctx, id| {
            let e = Entity::new("e").with_component(Listener::new(Some(late_id), &far))?;
            let g = Entity::new("g")
                .with_component(Timer::new(1))?
                .with_component(Listener::new(None, &near))?;
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(e);
                scene.add_entity(g);
            }
            Ok(())
        }));
        Ok(())
    })
    .at(3, move |ctx| {
        if let (Some(f), Some(scene)) = (late.take(), ctx.scenes.active_mut()) {
            scene.add_entity(f);
        }
        Ok(())
    });

    let mut engine = engine(script);
    let e = find(engine.context(), "e").unwrap();
    let listener = engine.context().component::<Listener>(e).unwrap();
    assert_eq!(listener.base().pending_count(), 0);
    assert!(listener.base().registers().is_empty());

    run(&mut engine, 6);
    let ctx = engine.context();
    let f = find(ctx, "f").unwrap();
    assert_eq!(f.entity, late_id);
    assert_eq!(ctx.component::<Timer>(f).unwrap().fired(), 4);
    assert!(far.borrow().is_empty());
    assert_eq!(*near.borrow(), [1, 2, 3, 4, 5, 6]);
    let g = find(ctx, "g").unwrap();
    assert_eq!(ctx.component::<Listener>(g).unwrap().base().registers().len(), 1);
}

#[test]
fn test_subscriptions_survive_swap_and_return() {
    let heard: Rc<RefCell<Vec<u32>>> = Rc::default();

    let heard_in = Rc::clone(&heard);
    let script = Script::new(move |ctx| {
        let heard = Rc::clone(&heard_in);
        ctx.scenes.add_scene(Scene::new("s1").with_builder(move |ctx, id| {
            let g = Entity::new("g")
                .with_component(Timer::new(1))?
                .with_component(Listener::new(None, &heard))?;
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(g);
            }
            Ok(())
        }));
        ctx.scenes.add_scene(Scene::new("s2"));
        Ok(())
    })
    .at(3, |ctx| {
        let s2 = scene_id(ctx, "s2").unwrap();
        assert!(ctx.scenes.swap_to(s2));
        Ok(())
    })
    .at(6, |ctx| {
        assert!(ctx.scenes.swap_back());
        Ok(())
    });

    let mut engine = engine(script);
    run(&mut engine, 5);
    assert_eq!(*heard.borrow(), [1, 2, 3]);
    let s1 = scene_id(engine.context(), "s1").unwrap();
    let g = engine.context().scene(s1).unwrap().entity_by_name("g").unwrap().id();
    let g = EntityRef::new(s1, g);
    let listener = engine.context().component::<Listener>(g).unwrap();
    assert!(listener.base().registers().is_empty());
    assert_eq!(listener.base().subscription_count(), 1);

    run(&mut engine, 4);
    assert_eq!(engine.context().scenes.active_id(), Some(s1));
    assert_eq!(*heard.borrow(), [1, 2, 3, 4, 5, 6]);
    let listener = engine.context().component::<Listener>(g).unwrap();
    assert_eq!(listener.base().registers().len(), 1);
}

// Resource sharing

#[test]
fn test_resource_sharing_across_entities() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
        .save(&path)
        .unwrap();

    let file = path.clone();
    let script = Script::new(move |ctx| {
        let file = file.clone();
        ctx.scenes.add_scene(Scene::new("gallery").with_builder(move |ctx, id| {
            for name in ["s0", "s1", "s2"] {
                let entity = Entity::new(name)
                    .with_dim(Vector::new(4.0, 4.0))
                    .with_component(Sprite::new(&file))?;
                if let Some(scene) = ctx.scenes.scene_mut(id) {
                    scene.add_entity(entity);
                }
            }
            Ok(())
        }));
        Ok(())
    })
    .at(2, |ctx| {
        for name in ["s0", "s1"] {
            let owner = find(ctx, name).unwrap();
            assert!(ctx.destroy_entity(owner)?);
        }
        Ok(())
    })
    .at(3, |ctx| {
        let owner = find(ctx, "s2").unwrap();
        ctx.destroy_entity(owner)?;
        Ok(())
    });

    let mut engine = engine(script);
    let id = engine.context().images.get_by_filename(&path).unwrap().id();
    assert_eq!(engine.context().images.len(), 1);
    assert_eq!(engine.context().images.ref_count(id), 3);

    run(&mut engine, 2);
    let images = &engine.context().images;
    assert_eq!(images.ref_count(id), 1);
    assert_eq!(images.payload(id).map(image::RgbaImage::dimensions), Some((4, 4)));

    run(&mut engine, 1);
    let images = &engine.context().images;
    assert!(images.is_empty());
    assert!(images.get(id).is_none());
    assert_eq!(images.ref_count(id), 0);
}

// Deferred scene-change request

/// Asks for the next scene during frame 7 and publishes the frame number,
/// once from its update and once from its cycle end
struct Switch {
    base: ComponentBase,
    delegate: Option<Delegate<u64>>,
}

impl Component for Switch {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn on_awake(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        self.delegate = Some(self.base.create_delegate(ctx, "on-switch"));
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        let frame = ctx.frame();
        if let Some(delegate) = self.delegate.filter(|_| frame == 7) {
            assert!(ctx.scenes.set_active_next());
            ctx.trigger(delegate, frame, false)?;
        }
        Ok(())
    }

    fn on_cycle_end(&mut self, ctx: &mut EngineContext, _owner: EntityRef) -> Result<(), EngineError> {
        let frame = ctx.frame();
        if let Some(delegate) = self.delegate.filter(|_| frame == 7) {
            ctx.trigger(delegate, frame * 100, false)?;
        }
        Ok(())
    }
}

/// Records what the switch publishes
struct Relay {
    base: ComponentBase,
}

impl Component for Relay {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}

#[test]
fn test_deferred_scene_change() {
    let heard: Rc<RefCell<Vec<u64>>> = Rc::default();
    let heard_in = Rc::clone(&heard);
    let script = Script::new(move |ctx| {
        let heard = Rc::clone(&heard_in);
        ctx.scenes.add_scene(Scene::new("s1").with_builder(move |ctx, id| {
            let mut relay = Relay {
                base: ComponentBase::new("relay"),
            };
            let heard = Rc::clone(&heard);
            relay.base.subscribe::<Switch, u64, _>(None, move |_, frame| {
                heard.borrow_mut().push(*frame);
                Ok(())
            });
            let switch = Entity::new("switch")
                .with_component(Switch {
                    base: ComponentBase::new("switch"),
                    delegate: None,
                })?
                .with_component(relay)?;
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(switch);
            }
            Ok(())
        }));
        ctx.scenes.add_scene(Scene::new("s2").with_builder(|ctx, id| {
            if let Some(scene) = ctx.scenes.scene_mut(id) {
                scene.add_entity(Entity::new("idle"));
            }
            Ok(())
        }));
        Ok(())
    });

    let mut engine = engine(script);
    let s1 = scene_id(engine.context(), "s1").unwrap();
    let s2 = scene_id(engine.context(), "s2").unwrap();
    let switch = find(engine.context(), "switch").unwrap();
    let delegate = engine.context().component::<Switch>(switch).unwrap().delegate.unwrap();

    run(&mut engine, 6);
    assert!(heard.borrow().is_empty());
    assert_eq!(engine.context().scenes.active_id(), Some(s1));

    run(&mut engine, 1);
    let ctx = engine.context();
    assert_eq!(*heard.borrow(), [7]);
    assert_eq!(ctx.scenes.active_id(), Some(s2));
    assert!(ctx.scene(s1).unwrap().is_empty());
    assert!(!ctx.delegates.contains(delegate.id()));
    assert_eq!(ctx.delegates.queued(), 1);

    run(&mut engine, 1);
    let ctx = engine.context();
    assert_eq!(*heard.borrow(), [7]);
    assert_eq!(ctx.delegates.queued(), 0);
    assert!(find(ctx, "idle").is_some_and(|idle| ctx.entity(idle).unwrap().is_loaded()));
}
