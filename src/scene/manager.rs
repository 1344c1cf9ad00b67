//! Scene manager
//!
//! Holds the ordered scene list, the active scene and a single standby slot
//! used by swap-and-return. Transition requests are queued on a private
//! event pool and applied by [`super::systems::frame_end`], at most one per
//! frame.

use crate::core::{Event, EventPool, Object, SceneId};

use super::Scene;

/// A queued change of the active scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTransition {
    /// Destroy and rebuild the active scene
    Restart,
    /// Activate the first scene of the list
    First,
    /// Activate the last scene of the list
    Last,
    /// Activate the scene after the active one, wrapping around
    Next,
    /// Activate the scene before the active one, wrapping around
    Prev,
    /// Activate a scene by ID
    Activate(SceneId),
    /// Keep the active scene as standby and activate another one
    SwapTo(SceneId),
    /// Destroy the active scene and restore the standby one
    SwapBack,
}

/// Owns every scene and decides which one runs
pub struct SceneManager {
    object: Object,
    scenes: Vec<Scene>,
    active: Option<SceneId>,
    standby: Option<SceneId>,
    transitions: EventPool<SceneTransition>,
}

impl SceneManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            object: Object::new("scene-manager"),
            scenes: Vec::new(),
            active: None,
            standby: None,
            transitions: EventPool::new("scene-transitions"),
        }
    }

    /// Called once by the engine after construction
    pub fn on_start(&mut self) {
        log::debug!("{} started scenes={}", self.object, self.scenes.len());
    }

    /// Append a scene to the list
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = scene.id();
        log::debug!("scene added: scene={}", scene.object());
        self.scenes.push(scene);
        id
    }

    /// Remove a scene from the list without running any entity hook. The
    /// active scene cannot be removed. [`super::systems::delete_scene`]
    /// destroys the entities first.
    pub(crate) fn remove_scene(&mut self, id: SceneId) -> Option<Scene> {
        if self.active == Some(id) {
            log::warn!("refusing to delete the active scene: scene={id}");
            return None;
        }
        let index = self.index_of(id)?;
        if self.standby == Some(id) {
            self.standby = None;
        }
        Some(self.scenes.remove(index))
    }

    /// Get a scene by ID
    #[must_use]
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id() == id)
    }

    /// Get a scene by ID, mutably
    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id() == id)
    }

    /// Get the first scene with this name
    #[must_use]
    pub fn scene_by_name(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name() == name)
    }

    /// All scenes in list order
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// ID of the active scene
    #[must_use]
    pub const fn active_id(&self) -> Option<SceneId> {
        self.active
    }

    /// The active scene
    #[must_use]
    pub fn active(&self) -> Option<&Scene> {
        self.active.and_then(|id| self.scene(id))
    }

    /// The active scene, mutably
    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        let id = self.active?;
        self.scene_mut(id)
    }

    /// Position of the active scene in the list
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.index_of(id))
    }

    /// ID of the scene kept by the last swap
    #[must_use]
    pub const fn standby_id(&self) -> Option<SceneId> {
        self.standby
    }

    /// The scene kept by the last swap
    #[must_use]
    pub fn standby(&self) -> Option<&Scene> {
        self.standby.and_then(|id| self.scene(id))
    }

    /// Queue a rebuild of the active scene. False if none is active.
    pub fn restart_scene(&mut self) -> bool {
        self.active.is_some() && self.request(SceneTransition::Restart)
    }

    /// Queue activation of the first scene. False if there are no scenes.
    pub fn set_active_first(&mut self) -> bool {
        !self.scenes.is_empty() && self.request(SceneTransition::First)
    }

    /// Queue activation of the last scene. False if there are no scenes.
    pub fn set_active_last(&mut self) -> bool {
        !self.scenes.is_empty() && self.request(SceneTransition::Last)
    }

    /// Queue activation of the next scene. False if there are no scenes.
    pub fn set_active_next(&mut self) -> bool {
        !self.scenes.is_empty() && self.request(SceneTransition::Next)
    }

    /// Queue activation of the previous scene. False if there are no scenes.
    pub fn set_active_prev(&mut self) -> bool {
        !self.scenes.is_empty() && self.request(SceneTransition::Prev)
    }

    /// Queue activation of a scene. False if the scene is unknown.
    pub fn set_active_scene(&mut self, id: SceneId) -> bool {
        self.index_of(id).is_some() && self.request(SceneTransition::Activate(id))
    }

    /// Queue a swap to another scene, keeping the active one as standby.
    /// False if the scene is unknown or already active.
    pub fn swap_to(&mut self, id: SceneId) -> bool {
        self.index_of(id).is_some()
            && self.active != Some(id)
            && self.request(SceneTransition::SwapTo(id))
    }

    /// Queue a return to the standby scene. False if there is none.
    pub fn swap_back(&mut self) -> bool {
        self.standby.is_some() && self.request(SceneTransition::SwapBack)
    }

    /// Number of queued transitions
    #[must_use]
    pub fn pending_transitions(&self) -> usize {
        self.transitions.len()
    }

    fn request(&mut self, transition: SceneTransition) -> bool {
        log::debug!("scene transition requested: {transition:?}");
        self.transitions.add(Event::new("scene-transition", transition));
        true
    }

    pub(crate) fn pop_transition(&mut self) -> Option<SceneTransition> {
        self.transitions.pop().map(Event::into_payload)
    }

    /// Scene a list-relative transition points at, evaluated now
    pub(crate) fn target_of(&self, transition: SceneTransition) -> Option<SceneId> {
        let len = self.scenes.len();
        if len == 0 {
            return None;
        }
        let index = match transition {
            SceneTransition::First => 0,
            SceneTransition::Last => len - 1,
            SceneTransition::Next => self.active_index().map_or(0, |i| (i + 1) % len),
            SceneTransition::Prev => self.active_index().map_or(len - 1, |i| (i + len - 1) % len),
            SceneTransition::Restart => self.active_index()?,
            SceneTransition::Activate(id) | SceneTransition::SwapTo(id) => self.index_of(id)?,
            SceneTransition::SwapBack => self.standby.and_then(|id| self.index_of(id))?,
        };
        Some(self.scenes[index].id())
    }

    pub(crate) fn set_active_id(&mut self, id: Option<SceneId>) {
        self.active = id;
    }

    pub(crate) fn set_standby_id(&mut self, id: Option<SceneId>) {
        self.standby = id;
    }

    fn index_of(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id() == id)
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("scenes", &self.scenes)
            .field("active", &self.active)
            .field("standby", &self.standby)
            .field("pending", &self.transitions.len())
            .finish()
    }
}
