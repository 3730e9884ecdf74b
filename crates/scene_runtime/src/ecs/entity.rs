//! Entity implementation
//!
//! An entity is a named, identified object with a world transform, an
//! aggregate bounding volume and an ordered list of owned components. It is
//! the unit placed into a world. Kind-specific behavior (lights, static
//! meshes) is plugged in through [`EntityBehavior`].
//!
//! # Bounds
//!
//! The aggregate bounds are always the entity's own bounds merged with the
//! bounds of every attached component. The own bounds are whatever was last
//! passed to [`Entity::set_bounds`]; components report changes through
//! [`OwnerRequest::BoundsChanged`] and the entity re-merges.
//!
//! # Mobility
//!
//! A [`Mobility::Static`] entity accepts transform edits only until it is
//! placed in a world; afterwards every setter returns `false` and leaves the
//! transform untouched.

use super::component::{Component, ComponentId, OwnerRequest};
use super::properties::{self, Property, PropertyContext, PropertyError, PropertyInfo, PropertyKind, PropertyValue};
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::world::WorldLink;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Entity identifier; 0 is the "no entity" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// The "no entity" sentinel
    pub const NONE: Self = Self(0);

    /// Create an id from its raw value
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True for the sentinel
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Map a raw id where 0 means none
    pub const fn from_raw(id: u32) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self(id))
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to an entity
pub type EntityRef = Rc<RefCell<Entity>>;

/// How an entity may move and how long it lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mobility {
    /// Never moves once placed
    Static,
    /// Moves freely
    #[default]
    Movable,
    /// Moves freely; streamed in and out by the host
    Deferred,
    /// Moves freely; never spatially recorded, always considered relevant
    Global,
}

impl Mobility {
    /// Name used by the property table
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Movable => "Movable",
            Self::Deferred => "Deferred",
            Self::Global => "Global",
        }
    }

    /// Parse a property-table name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Static" => Some(Self::Static),
            "Movable" => Some(Self::Movable),
            "Deferred" => Some(Self::Deferred),
            "Global" => Some(Self::Global),
            _ => None,
        }
    }
}

/// Reference-counted update request state for one pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateRequests {
    count: u32,
    interval: f32,
}

impl UpdateRequests {
    /// Outstanding requests
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Smallest interval requested since the count last left zero
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// True while at least one request is outstanding
    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Add a request; returns the new effective interval when it changed
    fn add(&mut self, interval: f32) -> Option<f32> {
        let first = self.count == 0;
        self.count += 1;
        if first || interval < self.interval {
            self.interval = interval;
            Some(interval)
        } else {
            None
        }
    }

    /// Drop a request; returns true when none remain
    fn remove(&mut self) -> bool {
        assert!(self.count > 0, "update requests released more often than made");
        self.count -= 1;
        self.count == 0
    }
}

/// Kind-specific entity behavior
///
/// Hooks receive the entity they are plugged into. While a hook runs the
/// behavior is detached from the entity, so the hook must not look itself
/// up through [`Entity::behavior`].
pub trait EntityBehavior: 'static {
    /// Type tag
    fn type_name(&self) -> &'static str;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Kind-specific property entries, appended to the entity's own
    fn properties(&self) -> &'static [Property<Entity>] {
        &[]
    }

    /// The entity was placed in a world
    fn on_add_to_world(&mut self, _entity: &mut Entity, _world: &WorldLink) {}

    /// The entity is leaving its world
    fn on_remove_from_world(&mut self, _entity: &mut Entity, _world: &WorldLink) {}

    /// The entity transform changed
    fn on_transform_change(&mut self, _entity: &mut Entity) {}

    /// Sync update pass
    fn update(&mut self, _entity: &mut Entity, _delta_time: f32) {}

    /// Async update pass
    fn update_async(&mut self, _entity: &mut Entity, _delta_time: f32) {}

    /// The entity is being dropped
    fn on_destroy(&mut self, _entity: &mut Entity) {}
}

/// A placed, identified game object composed of components
pub struct Entity {
    id: EntityId,
    name: String,
    mobility: Mobility,
    transform: Transform,
    own_box: AABB,
    own_sphere: BoundingSphere,
    bounding_box: AABB,
    bounding_sphere: BoundingSphere,
    components: Vec<(ComponentId, Box<dyn Component>)>,
    next_component_id: u32,
    world: Option<WorldLink>,
    world_slot: Option<usize>,
    sync_updates: UpdateRequests,
    async_updates: UpdateRequests,
    behavior: Option<Box<dyn EntityBehavior>>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.type_name())
            .field("mobility", &self.mobility)
            .field("transform", &self.transform)
            .field("bounding_box", &self.bounding_box)
            .field("components", &self.components.len())
            .field("in_world", &self.world.is_some())
            .finish_non_exhaustive()
    }
}

impl Entity {
    /// Create a detached entity with id 0 and empty bounds
    pub fn new(mobility: Mobility) -> Self {
        Self {
            id: EntityId::NONE,
            name: String::new(),
            mobility,
            transform: Transform::identity(),
            own_box: AABB::empty(),
            own_sphere: BoundingSphere::empty(),
            bounding_box: AABB::empty(),
            bounding_sphere: BoundingSphere::empty(),
            components: Vec::new(),
            next_component_id: 1,
            world: None,
            world_slot: None,
            sync_updates: UpdateRequests::default(),
            async_updates: UpdateRequests::default(),
            behavior: None,
        }
    }

    /// Create a detached entity driven by a behavior
    pub fn with_behavior(mobility: Mobility, behavior: Box<dyn EntityBehavior>) -> Self {
        let mut entity = Self::new(mobility);
        entity.behavior = Some(behavior);
        entity
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> EntityRef {
        Rc::new(RefCell::new(self))
    }

    /// Assign identity
    pub fn initialize(&mut self, id: EntityId, name: impl Into<String>) {
        self.set_id(id);
        self.name = name.into();
    }

    /// Entity id; 0 until assigned
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        debug_assert!(self.world.is_none(), "entity identity changed while in a world");
        self.id = id;
        for (_, component) in &mut self.components {
            component.base_mut().rebind_owner(id);
        }
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Type tag: the behavior's, or `"Entity"`
    pub fn type_name(&self) -> &'static str {
        self.behavior.as_ref().map_or("Entity", |b| b.type_name())
    }

    /// Mobility class
    pub fn mobility(&self) -> Mobility {
        self.mobility
    }

    /// Change mobility; refused while placed
    pub fn set_mobility(&mut self, mobility: Mobility) -> bool {
        if self.world.is_some() {
            return false;
        }
        self.mobility = mobility;
        true
    }

    /// True while placed in a world
    pub fn is_in_world(&self) -> bool {
        self.world.is_some()
    }

    /// World handle while placed
    pub fn world(&self) -> Option<&WorldLink> {
        self.world.as_ref()
    }

    /// Per-world scratch slot
    pub fn world_slot(&self) -> Option<usize> {
        self.world_slot
    }

    /// Set the per-world scratch slot
    pub fn set_world_slot(&mut self, slot: Option<usize>) {
        self.world_slot = slot;
    }

    /// World transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// World rotation
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// World scale
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// True when transform edits are currently refused
    pub fn is_transform_locked(&self) -> bool {
        self.world.is_some() && self.mobility == Mobility::Static
    }

    /// Replace the transform. Returns false, without changing anything, for a
    /// static entity that is in a world.
    pub fn set_transform(&mut self, transform: Transform) -> bool {
        if self.is_transform_locked() {
            return false;
        }
        self.transform = transform;
        self.on_transform_change();
        true
    }

    /// Move to a position
    pub fn set_position(&mut self, position: Vec3) -> bool {
        let transform = self.transform.clone().with_position(position);
        self.set_transform(transform)
    }

    /// Rotate
    pub fn set_rotation(&mut self, rotation: Quat) -> bool {
        let transform = self.transform.clone().with_rotation(rotation);
        self.set_transform(transform)
    }

    /// Rescale
    pub fn set_scale(&mut self, scale: Vec3) -> bool {
        let transform = self.transform.clone().with_scale(scale);
        self.set_transform(transform)
    }

    fn on_transform_change(&mut self) {
        let transform = self.transform.clone();
        for (_, component) in &mut self.components {
            component.on_entity_transform_change(&transform);
        }
        if let Some(mut behavior) = self.behavior.take() {
            behavior.on_transform_change(self);
            self.behavior = Some(behavior);
        }
        self.process_component_requests();
    }

    /// Aggregate world-space box
    pub fn bounding_box(&self) -> AABB {
        self.bounding_box
    }

    /// Aggregate world-space sphere
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// The entity's own contribution to its bounds
    pub fn own_bounds(&self) -> (AABB, BoundingSphere) {
        (self.own_box, self.own_sphere)
    }

    /// Merge of every component's bounds, starting from the first component.
    /// `None` when there are no components.
    pub fn get_component_bounds(&self) -> Option<(AABB, BoundingSphere)> {
        let mut components = self.components.iter().map(|(_, c)| c.base());
        let first = components.next()?;
        Some(components.fold((first.bounding_box(), first.bounding_sphere()), |(b, s), c| {
            (b.merge(&c.bounding_box()), s.merge(&c.bounding_sphere()))
        }))
    }

    /// Set the entity's own bounds, merged with component bounds when
    /// `merge_with_components` is set and there are components. Returns true
    /// if the aggregate changed; a change refreshes the world's spatial record.
    pub fn set_bounds(&mut self, bounding_box: AABB, bounding_sphere: BoundingSphere, merge_with_components: bool) -> bool {
        self.own_box = bounding_box;
        self.own_sphere = bounding_sphere;

        let (merged_box, merged_sphere) = match (merge_with_components, self.get_component_bounds()) {
            (true, Some((component_box, component_sphere))) => {
                (bounding_box.merge(&component_box), bounding_sphere.merge(&component_sphere))
            }
            _ => (bounding_box, bounding_sphere),
        };

        if merged_box == self.bounding_box && merged_sphere == self.bounding_sphere {
            return false;
        }
        self.bounding_box = merged_box;
        self.bounding_sphere = merged_sphere;
        if let Some(world) = &self.world {
            world.move_entity(self.id, &self.bounding_box, self.mobility);
        }
        true
    }

    /// Re-merge using the current own bounds
    pub fn on_component_bounds_change(&mut self) {
        self.set_bounds(self.own_box, self.own_sphere, true);
    }

    /// Attach a component, returning its entity-scoped id
    ///
    /// # Panics
    /// If the component is already attached to an entity.
    pub fn add_component(&mut self, mut component: Box<dyn Component>) -> ComponentId {
        assert!(
            !component.base().is_attached(),
            "{} is already attached to an entity",
            component.type_name()
        );
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;

        component.on_add_to_entity(self.id, &self.transform);
        if let Some(world) = &self.world {
            component.on_add_to_world(world);
        }
        self.components.push((id, component));
        self.set_bounds(self.own_box, self.own_sphere, true);
        self.process_component_requests();
        id
    }

    /// Detach a component and hand it back
    ///
    /// # Panics
    /// If no component with this id is attached.
    pub fn remove_component(&mut self, id: ComponentId) -> Box<dyn Component> {
        let index = self
            .components
            .iter()
            .position(|(cid, _)| *cid == id)
            .unwrap_or_else(|| panic!("component {} is not attached to entity {}", id, self.id));

        let (_, mut component) = self.components.remove(index);
        if self.world.is_some() {
            component.on_remove_from_world();
        }
        // Requests queued here (update releases) must be applied before the
        // back-reference is cleared, after which nothing is queued.
        let releases = component.base_mut().take_requests();
        component.on_remove_from_entity();
        for request in releases.into_iter().chain(component.base_mut().take_requests()) {
            self.apply_request(request);
        }
        self.on_component_bounds_change();
        self.process_component_requests();
        component
    }

    /// Attached components in order
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> {
        self.components.iter().map(|(id, c)| (*id, c.as_ref()))
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Component by id as its concrete type
    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.components
            .iter()
            .find(|(cid, _)| *cid == id)
            .and_then(|(_, c)| c.as_any().downcast_ref::<T>())
    }

    /// Component by id for mutation. Bounds and other owner requests are
    /// applied when the guard drops.
    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<ComponentMut<'_, T>> {
        let index = self
            .components
            .iter()
            .position(|(cid, c)| *cid == id && c.as_any().is::<T>())?;
        Some(ComponentMut {
            entity: self,
            index,
            _marker: PhantomData,
        })
    }

    /// First component of a type
    pub fn find_component<T: Component>(&self) -> Option<(ComponentId, &T)> {
        self.components
            .iter()
            .find_map(|(id, c)| c.as_any().downcast_ref::<T>().map(|t| (*id, t)))
    }

    /// Id of the first component of a type
    pub fn find_component_id<T: Component>(&self) -> Option<ComponentId> {
        self.find_component::<T>().map(|(id, _)| id)
    }

    /// Read a component property
    pub fn get_component_property(&self, id: ComponentId, name: &str) -> Result<PropertyValue, PropertyError> {
        let (_, component) = self
            .components
            .iter()
            .find(|(cid, _)| *cid == id)
            .ok_or_else(|| PropertyError::Rejected(format!("no component {id}")))?;
        component.get_property(name)
    }

    /// Write a component property through its table
    pub fn set_component_property(
        &mut self,
        id: ComponentId,
        name: &str,
        value: &PropertyValue,
        context: &PropertyContext<'_>,
    ) -> Result<(), PropertyError> {
        let index = self
            .components
            .iter()
            .position(|(cid, _)| *cid == id)
            .ok_or_else(|| PropertyError::Rejected(format!("no component {id}")))?;
        let result = self.components[index].1.set_property(name, value, context);
        self.process_component_requests();
        if let Err(err @ (PropertyError::UnknownProperty(_) | PropertyError::TypeMismatch { .. })) = &result {
            log::warn!("Entity {} component {} property write rejected: {}", self.id, id, err);
        }
        result
    }

    /// Behavior as its concrete type
    pub fn behavior<B: EntityBehavior>(&self) -> Option<&B> {
        self.behavior.as_ref().and_then(|b| b.as_any().downcast_ref::<B>())
    }

    /// Run `f` with the behavior and the entity both mutably borrowed
    pub fn with_behavior_mut<B: EntityBehavior, R>(&mut self, f: impl FnOnce(&mut B, &mut Entity) -> R) -> Option<R> {
        let mut behavior = self.behavior.take()?;
        let result = behavior.as_any_mut().downcast_mut::<B>().map(|b| f(b, self));
        self.behavior = Some(behavior);
        self.process_component_requests();
        result
    }

    /// Entity-level and behavior property entries
    fn property_tables(&self) -> [&'static [Property<Entity>]; 2] {
        [&ENTITY_PROPERTIES, self.behavior.as_ref().map(|b| b.properties()).unwrap_or(&[])]
    }

    /// Read an entity property
    pub fn get_property(&self, name: &str) -> Result<PropertyValue, PropertyError> {
        self.property_tables()
            .into_iter()
            .find_map(|table| properties::find(table, name))
            .map(|p| (p.get)(self))
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))
    }

    /// Write an entity property through its table
    pub fn set_property(&mut self, name: &str, value: &PropertyValue, context: &PropertyContext<'_>) -> Result<(), PropertyError> {
        let table = self
            .property_tables()
            .into_iter()
            .find(|table| properties::find(table, name).is_some())
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()));
        let result = table.and_then(|table| properties::set(table, self, name, value, context));
        if let Err(err @ (PropertyError::UnknownProperty(_) | PropertyError::TypeMismatch { .. })) = &result {
            log::warn!("Entity {} property write rejected: {}", self.id, err);
        }
        result
    }

    /// Names and types of every entity property
    pub fn property_info(&self) -> Vec<PropertyInfo> {
        self.property_tables().into_iter().flatten().map(Property::info).collect()
    }

    /// Add one sync update request
    pub fn register_for_updates(&mut self, interval: f32) {
        if let Some(interval) = self.sync_updates.add(interval) {
            if let Some(world) = &self.world {
                world.register_entity_for_update(self.id, interval);
            }
        }
    }

    /// Release one sync update request
    ///
    /// # Panics
    /// If there is no outstanding request.
    pub fn unregister_for_updates(&mut self) {
        if self.sync_updates.remove() {
            if let Some(world) = &self.world {
                world.unregister_entity_for_update(self.id);
            }
        }
    }

    /// Add one async update request
    pub fn register_for_async_updates(&mut self, interval: f32) {
        if let Some(interval) = self.async_updates.add(interval) {
            if let Some(world) = &self.world {
                world.register_entity_for_async_update(self.id, interval);
            }
        }
    }

    /// Release one async update request
    ///
    /// # Panics
    /// If there is no outstanding request.
    pub fn unregister_for_async_updates(&mut self) {
        if self.async_updates.remove() {
            if let Some(world) = &self.world {
                world.unregister_entity_for_async_update(self.id);
            }
        }
    }

    /// Sync update request state
    pub fn sync_update_requests(&self) -> UpdateRequests {
        self.sync_updates
    }

    /// Async update request state
    pub fn async_update_requests(&self) -> UpdateRequests {
        self.async_updates
    }

    /// Called by a world when the entity is placed
    pub fn on_add_to_world(&mut self, world: &WorldLink) {
        assert!(self.world.is_none(), "entity {} is already in a world", self.id);
        self.world = Some(world.clone());

        if self.sync_updates.is_active() {
            world.register_entity_for_update(self.id, self.sync_updates.interval());
        }
        if self.async_updates.is_active() {
            world.register_entity_for_async_update(self.id, self.async_updates.interval());
        }

        for (_, component) in &mut self.components {
            component.on_add_to_world(world);
        }
        if let Some(mut behavior) = self.behavior.take() {
            behavior.on_add_to_world(self, world);
            self.behavior = Some(behavior);
        }
        self.process_component_requests();
        world.move_entity(self.id, &self.bounding_box, self.mobility);
    }

    /// Called by a world when the entity is removed
    pub fn on_remove_from_world(&mut self) {
        let Some(world) = self.world.clone() else {
            return;
        };
        for (_, component) in &mut self.components {
            component.on_remove_from_world();
        }
        if let Some(mut behavior) = self.behavior.take() {
            behavior.on_remove_from_world(self, &world);
            self.behavior = Some(behavior);
        }
        self.process_component_requests();

        // Request counts survive so a later placement re-registers
        if self.sync_updates.is_active() {
            world.unregister_entity_for_update(self.id);
        }
        if self.async_updates.is_active() {
            world.unregister_entity_for_async_update(self.id);
        }
        world.remove_spatial(self.id);
        self.world = None;
    }

    /// Ask the world to remove this entity at the end of the frame
    pub fn queue_remove_from_world(&self) -> bool {
        self.world
            .as_ref()
            .is_some_and(|world| world.queue_remove_entity(self.id))
    }

    /// Sync update pass: behavior first, then components in order
    pub fn update(&mut self, delta_time: f32) {
        if let Some(mut behavior) = self.behavior.take() {
            behavior.update(self, delta_time);
            self.behavior = Some(behavior);
        }
        for index in 0..self.components.len() {
            self.components[index].1.update(delta_time);
            self.process_component_requests();
        }
    }

    /// Async update pass: behavior first, then components in order
    pub fn update_async(&mut self, delta_time: f32) {
        if let Some(mut behavior) = self.behavior.take() {
            behavior.update_async(self, delta_time);
            self.behavior = Some(behavior);
        }
        for index in 0..self.components.len() {
            self.components[index].1.update_async(delta_time);
            self.process_component_requests();
        }
    }

    fn apply_request(&mut self, request: OwnerRequest) -> bool {
        match request {
            OwnerRequest::BoundsChanged => return true,
            OwnerRequest::SetTransform(transform) => {
                self.set_transform(transform);
            }
            OwnerRequest::RegisterForUpdates(interval) => self.register_for_updates(interval),
            OwnerRequest::UnregisterForUpdates => self.unregister_for_updates(),
            OwnerRequest::RegisterForAsyncUpdates(interval) => self.register_for_async_updates(interval),
            OwnerRequest::UnregisterForAsyncUpdates => self.unregister_for_async_updates(),
        }
        false
    }

    fn process_component_requests(&mut self) {
        while self.components.iter().any(|(_, c)| c.base().has_requests()) {
            let pending: Vec<OwnerRequest> = self
                .components
                .iter_mut()
                .flat_map(|(_, c)| c.base_mut().take_requests())
                .collect();
            let mut bounds_changed = false;
            for request in pending {
                bounds_changed |= self.apply_request(request);
            }
            if bounds_changed {
                self.on_component_bounds_change();
            }
        }
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        debug_assert!(self.world.is_none(), "entity {} dropped while in a world", self.id);
        if let Some(mut behavior) = self.behavior.take() {
            behavior.on_destroy(self);
        }
        for (_, component) in &mut self.components {
            if component.base().is_in_world() {
                component.on_remove_from_world();
            }
            component.on_remove_from_entity();
        }
    }
}

/// Mutable access to one component; owner requests are applied on drop
pub struct ComponentMut<'a, T: Component> {
    entity: &'a mut Entity,
    index: usize,
    _marker: PhantomData<T>,
}

impl<T: Component> Deref for ComponentMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.entity.components[self.index]
            .1
            .as_any()
            .downcast_ref::<T>()
            .expect("component type checked when the guard was created")
    }
}

impl<T: Component> DerefMut for ComponentMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.entity.components[self.index]
            .1
            .as_any_mut()
            .downcast_mut::<T>()
            .expect("component type checked when the guard was created")
    }
}

impl<T: Component> Drop for ComponentMut<'_, T> {
    fn drop(&mut self) {
        self.entity.process_component_requests();
    }
}

static ENTITY_PROPERTIES: [Property<Entity>; 5] = [
    Property::<Entity>::new(
        "Name",
        PropertyKind::String,
        |e| PropertyValue::String(e.name.clone()),
        |e, value, _| {
            e.set_name(value.as_str()?);
            Ok(())
        },
    ),
    Property::<Entity>::new(
        "Mobility",
        PropertyKind::String,
        |e| PropertyValue::String(e.mobility.as_str().to_string()),
        |e, value, _| {
            let name = value.as_str()?;
            let mobility = Mobility::parse(name).ok_or_else(|| PropertyError::Rejected(format!("unknown mobility '{name}'")))?;
            if e.set_mobility(mobility) {
                Ok(())
            } else {
                Err(PropertyError::Rejected("mobility is fixed while in a world".to_string()))
            }
        },
    ),
    Property::<Entity>::new(
        "Position",
        PropertyKind::Vec3,
        |e| PropertyValue::Vec3(e.position()),
        |e, value, _| transform_result(e.set_position(value.as_vec3()?)),
    ),
    Property::<Entity>::new(
        "Rotation",
        PropertyKind::Quat,
        |e| PropertyValue::Quat(e.rotation()),
        |e, value, _| transform_result(e.set_rotation(value.as_quat()?)),
    ),
    Property::<Entity>::new(
        "Scale",
        PropertyKind::Vec3,
        |e| PropertyValue::Vec3(e.scale()),
        |e, value, _| transform_result(e.set_scale(value.as_vec3()?)),
    ),
];

fn transform_result(accepted: bool) -> Result<(), PropertyError> {
    if accepted {
        Ok(())
    } else {
        Err(PropertyError::Rejected("static entity is in a world".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::test_support::BoxComponent;
    use crate::assets::ResourceManager;
    use approx::assert_relative_eq;

    fn unit_box_at(center: Vec3) -> AABB {
        AABB::from_center_extents(center, Vec3::repeat(1.0))
    }

    #[test]
    fn test_new_entity_is_detached_with_sentinel_id() {
        let entity = Entity::new(Mobility::Movable);
        assert!(entity.id().is_none());
        assert!(!entity.is_in_world());
        assert!(entity.bounding_box().is_empty());
        assert_eq!(entity.type_name(), "Entity");
    }

    #[test]
    fn test_component_bounds_none_without_components() {
        let entity = Entity::new(Mobility::Movable);
        assert!(entity.get_component_bounds().is_none());
    }

    #[test]
    fn test_set_bounds_without_merge_uses_incoming() {
        let mut entity = Entity::new(Mobility::Movable);
        entity.add_component(BoxComponent::boxed(Vec3::repeat(5.0)));
        let own = unit_box_at(Vec3::new(20.0, 0.0, 0.0));
        assert!(entity.set_bounds(own, BoundingSphere::from_aabb(&own), false));
        assert_eq!(entity.bounding_box(), own);
    }

    #[test]
    fn test_bounds_follow_entity_transform() {
        let mut entity = Entity::new(Mobility::Movable);
        entity.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        assert!(entity.set_position(Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(entity.bounding_box().center(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_component_mut_guard_reaggregates() {
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        {
            let mut component = entity.component_mut::<BoxComponent>(id).unwrap();
            component.set_local_position(Vec3::new(0.0, 4.0, 0.0));
        }
        assert_relative_eq!(entity.bounding_box().center(), Vec3::new(0.0, 4.0, 0.0));
        assert!(entity.find_component::<BoxComponent>().is_some());
    }

    #[test]
    #[should_panic(expected = "not attached")]
    fn test_remove_unknown_component_panics() {
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        let _component = entity.remove_component(id);
        entity.remove_component(id);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut entity = Entity::new(Mobility::Movable);
        let a = entity.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        let b = entity.add_component(BoxComponent::boxed(Vec3::repeat(2.0)));
        let c = entity.add_component(BoxComponent::boxed(Vec3::repeat(3.0)));
        let removed = entity.remove_component(a);
        assert!(!removed.base().is_attached());
        let order: Vec<ComponentId> = entity.components().map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, c]);
    }

    #[test]
    fn test_registration_interval_is_minimum() {
        let mut entity = Entity::new(Mobility::Movable);
        entity.register_for_updates(0.5);
        entity.register_for_updates(1.0);
        entity.register_for_updates(0.25);
        assert_eq!(entity.sync_update_requests().count(), 3);
        assert_relative_eq!(entity.sync_update_requests().interval(), 0.25);

        entity.unregister_for_updates();
        entity.unregister_for_updates();
        entity.unregister_for_updates();
        assert!(!entity.sync_update_requests().is_active());

        entity.register_for_updates(2.0);
        assert_relative_eq!(entity.sync_update_requests().interval(), 2.0);
    }

    #[test]
    #[should_panic(expected = "released more often")]
    fn test_unbalanced_unregister_panics() {
        let mut entity = Entity::new(Mobility::Movable);
        entity.unregister_for_async_updates();
    }

    #[test]
    fn test_property_table_matches_direct_setters() {
        let resources = ResourceManager::new();
        let context = PropertyContext::new(&resources);
        let mut direct = Entity::new(Mobility::Movable);
        let mut generic = Entity::new(Mobility::Movable);
        direct.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        generic.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));

        direct.set_position(Vec3::new(1.0, 2.0, 3.0));
        generic
            .set_property("Position", &PropertyValue::Vec3(Vec3::new(1.0, 2.0, 3.0)), &context)
            .unwrap();
        assert_eq!(direct.transform(), generic.transform());
        assert_eq!(direct.bounding_box(), generic.bounding_box());

        generic.set_property("Name", &PropertyValue::String("crate".into()), &context).unwrap();
        assert_eq!(generic.get_property("Name").unwrap(), PropertyValue::String("crate".into()));
        assert!(generic.property_info().iter().any(|p| p.name == "Mobility"));
    }

    #[test]
    fn test_component_property_through_entity() {
        let resources = ResourceManager::new();
        let context = PropertyContext::new(&resources);
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));

        entity
            .set_component_property(id, "LocalPosition", &PropertyValue::Vec3(Vec3::new(0.0, 0.0, 6.0)), &context)
            .unwrap();
        assert_relative_eq!(entity.bounding_box().center(), Vec3::new(0.0, 0.0, 6.0));
        assert!(entity.get_component_property(id, "Missing").is_err());
    }
}
