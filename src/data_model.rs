use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::RwLock;

use crate::controller::VisualProxy;
use crate::scene::SceneObject;

/// Shared, render-facing copy of the scene graph.
///
/// The frame loop writes into it and the renderer reads snapshots from
/// it; it never feeds back into the simulation.
#[derive(Debug, Default)]
pub struct DataModel {
    objects: Arc<RwLock<Vec<SceneObject>>>,
}

impl Clone for DataModel {
    fn clone(&self) -> Self {
        Self {
            objects: Arc::clone(&self.objects),
        }
    }
}

impl DataModel {
    /// Creates an empty data model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a data model from an initial set of objects.
    pub fn from_objects(objects: Vec<SceneObject>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(objects)),
        }
    }

    /// Appends an object to the scene.
    pub fn push(&self, object: SceneObject) {
        self.objects.write().push(object);
    }

    /// Returns a snapshot of all stored objects.
    pub fn all_objects(&self) -> Vec<SceneObject> {
        self.objects.read().clone()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Returns a clone of the requested object.
    pub fn get(&self, name: &str) -> Option<SceneObject> {
        self.objects
            .read()
            .iter()
            .find(|object| object.name == name)
            .cloned()
    }

    /// Applies a mutation to the requested object.
    pub fn update<F, R>(&self, name: &str, mut updater: F) -> Option<R>
    where
        F: FnMut(&mut SceneObject) -> R,
    {
        let mut guard = self.objects.write();
        let object = guard.iter_mut().find(|object| object.name == name)?;
        Some(updater(object))
    }

    pub fn set_position(&self, name: &str, position: Vec3) -> bool {
        self.update(name, |obj| obj.position = position).is_some()
    }

    pub fn set_transform(&self, name: &str, position: Vec3, rotation: Quat) -> bool {
        self.update(name, |obj| {
            obj.position = position;
            obj.rotation = rotation;
        })
        .is_some()
    }

    /// Handle that mirrors a physical body onto the named object.
    pub fn proxy<'a>(&'a self, name: &'a str) -> SceneObjectProxy<'a> {
        SceneObjectProxy { model: self, name }
    }
}

/// [`VisualProxy`] writing into one named entry of a [`DataModel`].
#[derive(Debug)]
pub struct SceneObjectProxy<'a> {
    model: &'a DataModel,
    name: &'a str,
}

impl VisualProxy for SceneObjectProxy<'_> {
    fn set_transform(&mut self, position: Vec3, rotation: Quat) {
        if !self.model.set_transform(self.name, position, rotation) {
            log::warn!("visual proxy target `{}` is missing", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    fn make_object(name: &str) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            ..SceneObject::default()
        }
    }

    #[test]
    fn push_and_get_object() {
        let model = DataModel::from_objects(vec![make_object("Cube")]);
        assert!(model.get("Cube").is_some());
        model.push(make_object("Wall"));
        assert_eq!(model.len(), 2);
        assert!(model.get("Sphere").is_none());
    }

    #[test]
    fn clones_share_storage() {
        let model = DataModel::from_objects(vec![make_object("Floor")]);
        let view = model.clone();
        model.set_position("Floor", Vec3::new(1.0, -1.0, 2.0));
        assert_eq!(view.get("Floor").unwrap().position, Vec3::new(1.0, -1.0, 2.0));
    }

    #[test]
    fn proxy_writes_transform() {
        let model = DataModel::from_objects(vec![make_object("Player")]);
        let rotation = Quat::from_rotation_x(0.3);
        model
            .proxy("Player")
            .set_transform(Vec3::new(0.0, 2.0, 0.0), rotation);
        let player = model.get("Player").unwrap();
        assert_eq!(player.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(player.rotation, rotation);
    }

    #[test]
    fn update_returns_false_for_missing_object() {
        let model = DataModel::new();
        assert!(model.is_empty());
        assert!(!model.set_position("Unknown", Vec3::ONE));
    }
}
