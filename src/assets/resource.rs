//! Reference-counted named resource caches
//!
//! A [`ResourceManager`] keeps one decoded payload per distinct source
//! filename. Creating a resource whose file is already loaded bumps its
//! reference count instead of decoding again; deleting decrements, and the
//! payload is released when the count reaches zero.
//!
//! The same manager is instantiated for images, fonts and sounds, each with
//! its own [`ResourceLoader`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::{AssetError, Object, ObjectId};

/// Handle to a cached resource
pub type ResourceId = ObjectId;

/// Decodes files into payloads for a [`ResourceManager`]
pub trait ResourceLoader {
    /// Decoded payload type
    type Payload;
    /// Format tag passed through to the decoder
    type Format: Copy + fmt::Debug;

    /// Decode a file
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the file cannot be read or decoded
    fn load(&mut self, filename: &Path, format: Self::Format) -> Result<Self::Payload, AssetError>;

    /// Release a payload whose reference count reached zero
    fn release(&mut self, payload: Self::Payload) {
        drop(payload);
    }
}

/// A cached, reference-counted asset
#[derive(Debug)]
pub struct Resource<T, F> {
    object: Object,
    filename: PathBuf,
    payload: T,
    refs: usize,
    format: F,
}

impl<T, F: Copy> Resource<T, F> {
    /// Resource ID
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.object.id()
    }

    /// Name given at creation
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Source filename
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Decoded payload
    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// Current reference count
    #[must_use]
    pub const fn ref_count(&self) -> usize {
        self.refs
    }

    /// Format tag
    #[must_use]
    pub const fn format(&self) -> F {
        self.format
    }
}

/// Named cache of reference-counted resources keyed by filename
pub struct ResourceManager<L: ResourceLoader> {
    object: Object,
    loader: L,
    entries: Vec<Resource<L::Payload, L::Format>>,
}

impl<L: ResourceLoader> ResourceManager<L> {
    /// Create an empty manager using the given loader
    pub fn new(name: impl Into<String>, loader: L) -> Self {
        Self {
            object: Object::new(name),
            loader,
            entries: Vec::new(),
        }
    }

    /// Called once by the engine after construction
    pub fn on_start(&mut self) {
        log::debug!("{} started", self.object);
    }

    /// Create a resource, or share the existing one loaded from the same file.
    ///
    /// Filename identity is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns the loader's [`AssetError`] if decoding a new file fails
    pub fn create(
        &mut self,
        name: &str,
        filename: impl AsRef<Path>,
        format: L::Format,
    ) -> Result<ResourceId, AssetError> {
        let filename = filename.as_ref();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.filename == filename) {
            entry.refs += 1;
            log::trace!(
                "resource shared: manager={} filename={} refs={}",
                self.object.name(),
                filename.display(),
                entry.refs
            );
            return Ok(entry.object.id());
        }

        let payload = self.loader.load(filename, format).inspect_err(|err| {
            log::error!("{err} manager={}", self.object.name());
        })?;

        let resource = Resource {
            object: Object::new(name),
            filename: filename.to_path_buf(),
            payload,
            refs: 1,
            format,
        };
        let id = resource.id();
        log::debug!(
            "resource loaded: manager={} name={name} filename={} format={format:?}",
            self.object.name(),
            filename.display()
        );
        self.entries.push(resource);
        Ok(id)
    }

    /// Take another share of an existing resource. Returns false if unknown.
    pub fn acquire(&mut self, id: ResourceId) -> bool {
        match self.entries.iter_mut().find(|e| e.object.id() == id) {
            Some(entry) => {
                entry.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Give up one share. The payload is released when no shares remain.
    ///
    /// Returns true if the handle existed.
    pub fn delete(&mut self, id: ResourceId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.object.id() == id) else {
            return false;
        };

        let entry = &mut self.entries[index];
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            let resource = self.entries.remove(index);
            log::debug!(
                "resource released: manager={} filename={}",
                self.object.name(),
                resource.filename.display()
            );
            self.loader.release(resource.payload);
        }
        true
    }

    /// Release every resource regardless of its reference count
    pub fn clear(&mut self) {
        for resource in self.entries.drain(..) {
            self.loader.release(resource.payload);
        }
    }

    /// Look up a resource by ID
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&Resource<L::Payload, L::Format>> {
        self.entries.iter().find(|e| e.object.id() == id)
    }

    /// Look up a resource by source filename
    #[must_use]
    pub fn get_by_filename(
        &self,
        filename: impl AsRef<Path>,
    ) -> Option<&Resource<L::Payload, L::Format>> {
        let filename = filename.as_ref();
        self.entries.iter().find(|e| e.filename == filename)
    }

    /// Look up a resource by name
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Resource<L::Payload, L::Format>> {
        self.entries.iter().find(|e| e.object.name() == name)
    }

    /// Borrow the payload of a resource
    #[must_use]
    pub fn payload(&self, id: ResourceId) -> Option<&L::Payload> {
        self.get(id).map(Resource::payload)
    }

    /// Reference count of a resource (0 if unknown)
    #[must_use]
    pub fn ref_count(&self, id: ResourceId) -> usize {
        self.get(id).map_or(0, Resource::ref_count)
    }

    /// Iterate over all resources
    pub fn iter(&self) -> impl Iterator<Item = &Resource<L::Payload, L::Format>> {
        self.entries.iter()
    }

    /// Number of cached resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the loader
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }
}

impl<L: ResourceLoader> fmt::Debug for ResourceManager<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("name", &self.object.name())
            .field("entries", &self.entries.len())
            .finish()
    }
}
