//! Component type registry
//!
//! Maps component names to factories so entities can be assembled from
//! data: `registry.attach(&mut entity, "Body", &bag)` builds a `Body`, runs
//! its `unmarshal` hook with the bag and attaches it.

use rustc_hash::FxHashMap;

use crate::core::EngineError;

use super::{Component, ComponentType, DataBag, Entity};

type Factory = Box<dyn Fn() -> Box<dyn Component>>;

/// Name → factory table for components
#[derive(Default)]
pub struct ComponentRegistry {
    factories: FxHashMap<String, (ComponentType, Factory)>,
}

impl ComponentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under a name. Re-registering a name
    /// replaces the previous factory.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F)
    where
        T: Component,
        F: Fn() -> T + 'static,
    {
        let name = name.into();
        log::trace!("component registered: name={name} type={}", ComponentType::of::<T>().name());
        self.factories.insert(
            name,
            (
                ComponentType::of::<T>(),
                Box::new(move || Box::new(factory()) as Box<dyn Component>),
            ),
        );
    }

    /// Whether a name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, unordered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a component by name and apply a data bag to it
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownComponent`] for unregistered names and
    /// whatever the component's `unmarshal` hook reports
    pub fn create(
        &self,
        name: &str,
        data: &DataBag,
    ) -> Result<(ComponentType, Box<dyn Component>), EngineError> {
        let (kind, factory) = self
            .factories
            .get(name)
            .ok_or_else(|| EngineError::UnknownComponent(name.to_string()))?;
        let mut component = factory();
        component.unmarshal(data)?;
        Ok((*kind, component))
    }

    /// Build a component by name and attach it to an entity
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create) and [`Entity::add_boxed`]
    pub fn attach(&self, entity: &mut Entity, name: &str, data: &DataBag) -> Result<usize, EngineError> {
        let (kind, component) = self.create(name, data)?;
        entity.add_boxed(kind, component)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ComponentRegistry").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ecs::ComponentBase;

    struct Speed {
        base: ComponentBase,
        value: f64,
    }

    impl Component for Speed {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn unmarshal(&mut self, data: &DataBag) -> Result<(), EngineError> {
            if let Some(value) = data.get("value") {
                self.value = value
                    .as_f64()
                    .ok_or_else(|| EngineError::ComponentData(format!("value: {value}")))?;
            }
            Ok(())
        }
    }

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register("Speed", || Speed {
            base: ComponentBase::new("speed"),
            value: 1.0,
        });
        registry
    }

    #[test]
    fn test_attach_applies_data_bag() {
        let registry = registry();
        let mut entity = Entity::new("runner");
        let mut bag = DataBag::default();
        bag.insert("value".into(), json!(4.5));

        registry.attach(&mut entity, "Speed", &bag).unwrap();
        assert_eq!(entity.get_component::<Speed>().map(|s| s.value), Some(4.5));

        assert!(matches!(
            registry.attach(&mut entity, "Speed", &DataBag::default()),
            Err(EngineError::DuplicateComponent { .. })
        ));
    }

    #[test]
    fn test_unknown_name_and_bad_data() {
        let registry = registry();
        assert!(matches!(
            registry.create("Nope", &DataBag::default()),
            Err(EngineError::UnknownComponent(name)) if name == "Nope"
        ));

        let mut bag = DataBag::default();
        bag.insert("value".into(), json!("fast"));
        assert!(matches!(
            registry.create("Speed", &bag),
            Err(EngineError::ComponentData(_))
        ));
    }
}
