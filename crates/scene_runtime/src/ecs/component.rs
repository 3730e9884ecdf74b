//! Component trait and shared component state
//!
//! A component is a behavior unit with a local offset from its owning
//! entity and a world-space bounding volume. It is built detached, attached
//! to exactly one entity at a time, and may own a render proxy and a
//! collision object that follow it into and out of the owner's world.
//!
//! Components never hold a reference to their owner. Anything they need the
//! owner to do (re-aggregate bounds, move, change update registration) is
//! queued as an [`OwnerRequest`] and applied by the entity as soon as the
//! component call returns.

use super::entity::EntityId;
use super::properties::{Property, PropertyKind, PropertyValue, Reflect};
use crate::assets::{ResourceError, ResourceProvider};
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::CollisionObject;
use crate::render::RenderProxy;
use crate::world::WorldLink;
use bitflags::bitflags;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Entity-scoped component identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Presence flags of a component
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u32 {
        /// Render proxy is registered while placed
        const VISIBLE = 1 << 0;
        /// Collision object is registered while placed
        const COLLIDABLE = 1 << 1;
        /// Mesh proxies cast shadows
        const CAST_SHADOWS = 1 << 2;
    }
}

impl Default for ComponentFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::COLLIDABLE | Self::CAST_SHADOWS
    }
}

/// Work a component asks of its owning entity
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerRequest {
    /// Re-aggregate entity bounds
    BoundsChanged,
    /// Replace the owner's transform (rejected silently for placed static owners)
    SetTransform(Transform),
    /// Add one sync update request with this interval
    RegisterForUpdates(f32),
    /// Drop one sync update request
    UnregisterForUpdates,
    /// Add one async update request with this interval
    RegisterForAsyncUpdates(f32),
    /// Drop one async update request
    UnregisterForAsyncUpdates,
}

/// Component construction errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComponentError {
    /// A named resource could not be resolved
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The operation needs an owning entity
    #[error("Component is not attached to an entity")]
    NotAttached,
}

/// State shared by every component kind
pub struct ComponentBase {
    owner: Option<EntityId>,
    owner_transform: Transform,
    world: Option<WorldLink>,
    local_transform: Transform,
    world_transform: Transform,
    bounding_box: AABB,
    bounding_sphere: BoundingSphere,
    flags: ComponentFlags,
    render_proxy: Option<Arc<RenderProxy>>,
    collision_object: Option<Arc<CollisionObject>>,
    requests: Vec<OwnerRequest>,
}

impl fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBase")
            .field("owner", &self.owner)
            .field("in_world", &self.world.is_some())
            .field("local_transform", &self.local_transform)
            .field("bounding_box", &self.bounding_box)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentBase {
    /// Detached state at the identity offset with empty bounds
    pub fn new() -> Self {
        Self {
            owner: None,
            owner_transform: Transform::identity(),
            world: None,
            local_transform: Transform::identity(),
            world_transform: Transform::identity(),
            bounding_box: AABB::empty(),
            bounding_sphere: BoundingSphere::empty(),
            flags: ComponentFlags::default(),
            render_proxy: None,
            collision_object: None,
            requests: Vec::new(),
        }
    }

    /// Owning entity while attached
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// True while attached to an entity
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    /// World handle while the owner is placed
    pub fn world(&self) -> Option<&WorldLink> {
        self.world.as_ref()
    }

    /// True while the owner is placed in a world
    pub fn is_in_world(&self) -> bool {
        self.world.is_some()
    }

    /// Offset relative to the owner
    pub fn local_transform(&self) -> &Transform {
        &self.local_transform
    }

    /// Owner transform combined with the local offset
    pub fn world_transform(&self) -> &Transform {
        &self.world_transform
    }

    /// World-space bounding box
    pub fn bounding_box(&self) -> AABB {
        self.bounding_box
    }

    /// World-space bounding sphere
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// Presence flags
    pub fn flags(&self) -> ComponentFlags {
        self.flags
    }

    /// Owner transform as of the last notification; identity when detached
    pub fn owner_transform(&self) -> &Transform {
        &self.owner_transform
    }

    /// Render proxy, if the kind owns one
    pub fn render_proxy(&self) -> Option<&Arc<RenderProxy>> {
        self.render_proxy.as_ref()
    }

    /// Collision object, if the kind owns one
    pub fn collision_object(&self) -> Option<&Arc<CollisionObject>> {
        self.collision_object.as_ref()
    }

    /// `local` when detached, otherwise the owner transform combined with `local`
    pub fn calculate_world_transform(&self) -> Transform {
        if self.owner.is_some() {
            self.owner_transform.combine(&self.local_transform)
        } else {
            self.local_transform.clone()
        }
    }

    /// Queue work for the owner; dropped when detached
    pub fn request(&mut self, request: OwnerRequest) {
        if self.owner.is_some() {
            self.requests.push(request);
        }
    }

    pub(crate) fn take_requests(&mut self) -> Vec<OwnerRequest> {
        std::mem::take(&mut self.requests)
    }

    pub(crate) fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Cache new bounds. Returns true if they changed; a change is reported
    /// to the owner when `notify_entity` is set.
    pub fn set_bounds(&mut self, bounding_box: AABB, bounding_sphere: BoundingSphere, notify_entity: bool) -> bool {
        if self.bounding_box == bounding_box && self.bounding_sphere == bounding_sphere {
            return false;
        }
        self.bounding_box = bounding_box;
        self.bounding_sphere = bounding_sphere;
        if let Some(proxy) = &self.render_proxy {
            proxy.set_bounds(bounding_box);
        }
        if notify_entity {
            self.request(OwnerRequest::BoundsChanged);
        }
        true
    }

    fn proxy_registered(&self) -> bool {
        self.world.is_some() && self.flags.contains(ComponentFlags::VISIBLE)
    }

    fn object_registered(&self) -> bool {
        self.world.is_some() && self.flags.contains(ComponentFlags::COLLIDABLE)
    }

    fn owner_raw_id(&self) -> u32 {
        self.owner.map_or(0, EntityId::get)
    }

    /// Install or drop the render proxy, keeping render-world registration consistent
    pub fn set_render_proxy(&mut self, proxy: Option<Arc<RenderProxy>>) {
        let registered = self.proxy_registered();
        if let Some(old) = self.render_proxy.take() {
            if registered {
                if let Some(world) = &self.world {
                    world.remove_renderable(&old);
                }
            }
            old.set_entity_id(0);
        }
        if let Some(proxy) = &proxy {
            proxy.set_transform(&self.world_transform);
            proxy.set_bounds(self.bounding_box);
            proxy.set_entity_id(self.owner_raw_id());
            if registered {
                if let Some(world) = &self.world {
                    world.add_renderable(Arc::clone(proxy));
                }
            }
        }
        self.render_proxy = proxy;
    }

    /// Install or drop the collision object, keeping physics-world registration consistent
    pub fn set_collision_object(&mut self, object: Option<Arc<CollisionObject>>) {
        let registered = self.object_registered();
        if let Some(old) = self.collision_object.take() {
            if registered {
                if let Some(world) = &self.world {
                    world.remove_collision_object(&old);
                }
            }
            old.set_entity_id(0);
        }
        if let Some(object) = &object {
            object.set_transform(&self.world_transform);
            object.set_entity_id(self.owner_raw_id());
            if registered {
                if let Some(world) = &self.world {
                    world.add_collision_object(Arc::clone(object));
                }
            }
        }
        self.collision_object = object;
    }

    /// Set or clear one flag, registering or unregistering proxies while placed
    pub fn set_flag(&mut self, flag: ComponentFlags, enabled: bool) {
        if self.flags.contains(flag) == enabled {
            return;
        }
        let proxy_before = self.proxy_registered();
        let object_before = self.object_registered();
        self.flags.set(flag, enabled);

        if let Some(world) = &self.world {
            if let Some(proxy) = &self.render_proxy {
                match (proxy_before, self.proxy_registered()) {
                    (false, true) => world.add_renderable(Arc::clone(proxy)),
                    (true, false) => world.remove_renderable(proxy),
                    _ => {}
                }
            }
            if let Some(object) = &self.collision_object {
                match (object_before, self.object_registered()) {
                    (false, true) => world.add_collision_object(Arc::clone(object)),
                    (true, false) => world.remove_collision_object(object),
                    _ => {}
                }
            }
        }
        if let Some(proxy) = &self.render_proxy {
            proxy.set_visible(self.flags.contains(ComponentFlags::VISIBLE));
        }
    }

    /// Bind to an owner
    ///
    /// # Panics
    /// If the component is already attached.
    pub fn attach(&mut self, owner: EntityId, owner_transform: &Transform) {
        assert!(
            self.owner.is_none(),
            "component is already attached to entity {}",
            self.owner_raw_id()
        );
        self.owner = Some(owner);
        self.owner_transform = owner_transform.clone();
        let raw = owner.get();
        if let Some(proxy) = &self.render_proxy {
            proxy.set_entity_id(raw);
        }
        if let Some(object) = &self.collision_object {
            object.set_entity_id(raw);
        }
    }

    /// Follow an owner whose id changed
    pub(crate) fn rebind_owner(&mut self, owner: EntityId) {
        if self.owner.is_none() {
            return;
        }
        self.owner = Some(owner);
        if let Some(proxy) = &self.render_proxy {
            proxy.set_entity_id(owner.get());
        }
        if let Some(object) = &self.collision_object {
            object.set_entity_id(owner.get());
        }
    }

    /// Clear the owner binding
    pub fn detach(&mut self) {
        debug_assert!(self.world.is_none(), "component detached while still in a world");
        self.owner = None;
        self.owner_transform = Transform::identity();
        if let Some(proxy) = &self.render_proxy {
            proxy.set_entity_id(0);
        }
        if let Some(object) = &self.collision_object {
            object.set_entity_id(0);
        }
    }

    /// Register proxies with a world according to the flags
    pub fn enter_world(&mut self, world: &WorldLink) {
        debug_assert!(self.world.is_none(), "component added to a world twice");
        self.world = Some(world.clone());
        if let Some(proxy) = &self.render_proxy {
            proxy.set_visible(self.flags.contains(ComponentFlags::VISIBLE));
            if self.proxy_registered() {
                world.add_renderable(Arc::clone(proxy));
            }
        }
        if let Some(object) = &self.collision_object {
            if self.object_registered() {
                world.add_collision_object(Arc::clone(object));
            }
        }
    }

    /// Unregister proxies from the current world
    pub fn leave_world(&mut self) {
        let proxy_registered = self.proxy_registered();
        let object_registered = self.object_registered();
        let Some(world) = self.world.take() else {
            return;
        };
        if let (true, Some(proxy)) = (proxy_registered, &self.render_proxy) {
            world.remove_renderable(proxy);
        }
        if let (true, Some(object)) = (object_registered, &self.collision_object) {
            world.remove_collision_object(object);
        }
    }

    pub(crate) fn set_owner_transform(&mut self, owner_transform: &Transform) {
        self.owner_transform = owner_transform.clone();
    }

    /// Recompute the world transform and push it to the proxies
    pub fn update_world_transform(&mut self) {
        self.world_transform = self.calculate_world_transform();
        if let Some(proxy) = &self.render_proxy {
            proxy.set_transform(&self.world_transform);
        }
        if let Some(object) = &self.collision_object {
            object.set_transform(&self.world_transform);
        }
    }

    pub(crate) fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.local_transform
    }
}

impl Drop for ComponentBase {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(self.owner.is_none(), "component dropped while attached");
        }
    }
}

/// A behavior unit attachable to one entity
///
/// Kinds implement the accessors and override the hooks they care about.
/// Overrides of the lifecycle hooks call the matching [`ComponentBase`]
/// method first (`attach`, `detach`, `enter_world`, `leave_world`), the
/// way the provided implementations do.
pub trait Component: Reflect + 'static {
    /// Shared state
    fn base(&self) -> &ComponentBase;

    /// Shared state, mutably
    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Type tag
    fn type_name(&self) -> &'static str;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Resolve resources and build proxies. All-or-nothing: on error the
    /// component is unchanged and may be initialized again.
    fn initialize(&mut self, _resources: &dyn ResourceProvider) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Payload bounds in component-local space
    fn local_bounds(&self) -> AABB {
        AABB::empty()
    }

    /// World-space bounds of the payload at the current world transform
    fn calculate_world_bounds(&self) -> (AABB, BoundingSphere) {
        let bounds = self.local_bounds().transformed(self.base().world_transform());
        (bounds, BoundingSphere::from_aabb(&bounds))
    }

    /// Recompute bounds and report a change to the owner
    fn refresh_bounds(&mut self) {
        let (bounding_box, bounding_sphere) = self.calculate_world_bounds();
        self.base_mut().set_bounds(bounding_box, bounding_sphere, true);
    }

    /// Bind to an owning entity
    fn on_add_to_entity(&mut self, owner: EntityId, owner_transform: &Transform) {
        self.base_mut().attach(owner, owner_transform);
        self.on_local_transform_change();
    }

    /// Unbind from the owning entity
    fn on_remove_from_entity(&mut self) {
        self.base_mut().detach();
        self.on_local_transform_change();
    }

    /// Register proxies with the owner's world
    fn on_add_to_world(&mut self, world: &WorldLink) {
        self.base_mut().enter_world(world);
    }

    /// Unregister proxies from the owner's world
    fn on_remove_from_world(&mut self) {
        self.base_mut().leave_world();
    }

    /// The local offset changed
    fn on_local_transform_change(&mut self) {
        self.base_mut().update_world_transform();
        self.refresh_bounds();
    }

    /// The owner's transform changed
    fn on_entity_transform_change(&mut self, owner_transform: &Transform) {
        self.base_mut().set_owner_transform(owner_transform);
        self.on_local_transform_change();
    }

    /// Sync update pass
    fn update(&mut self, _delta_time: f32) {}

    /// Async update pass
    fn update_async(&mut self, _delta_time: f32) {}

    /// Set the whole local offset
    fn set_local_transform(&mut self, transform: Transform) {
        *self.base_mut().local_transform_mut() = transform;
        self.on_local_transform_change();
    }

    /// Set the local position
    fn set_local_position(&mut self, position: Vec3) {
        self.base_mut().local_transform_mut().position = position;
        self.on_local_transform_change();
    }

    /// Set the local rotation
    fn set_local_rotation(&mut self, rotation: Quat) {
        self.base_mut().local_transform_mut().rotation = rotation;
        self.on_local_transform_change();
    }

    /// Set the local scale
    fn set_local_scale(&mut self, scale: Vec3) {
        self.base_mut().local_transform_mut().scale = scale;
        self.on_local_transform_change();
    }

    /// Show or hide the render proxy
    fn set_visible(&mut self, visible: bool) {
        self.base_mut().set_flag(ComponentFlags::VISIBLE, visible);
    }

    /// Enable or disable the collision object
    fn set_collidable(&mut self, collidable: bool) {
        self.base_mut().set_flag(ComponentFlags::COLLIDABLE, collidable);
    }
}

/// Property entries every component kind includes in its table
pub mod common_properties {
    use super::{Component, Property, PropertyKind, PropertyValue};

    /// `LocalPosition`
    pub const fn local_position<C: Component>() -> Property<C> {
        Property::<C>::new(
            "LocalPosition",
            PropertyKind::Vec3,
            |c| PropertyValue::Vec3(c.base().local_transform().position),
            |c, value, _| {
                c.set_local_position(value.as_vec3()?);
                Ok(())
            },
        )
    }

    /// `LocalRotation`
    pub const fn local_rotation<C: Component>() -> Property<C> {
        Property::<C>::new(
            "LocalRotation",
            PropertyKind::Quat,
            |c| PropertyValue::Quat(c.base().local_transform().rotation),
            |c, value, _| {
                c.set_local_rotation(value.as_quat()?);
                Ok(())
            },
        )
    }

    /// `LocalScale`
    pub const fn local_scale<C: Component>() -> Property<C> {
        Property::<C>::new(
            "LocalScale",
            PropertyKind::Vec3,
            |c| PropertyValue::Vec3(c.base().local_transform().scale),
            |c, value, _| {
                c.set_local_scale(value.as_vec3()?);
                Ok(())
            },
        )
    }

    /// `Visible`
    pub const fn visible<C: Component>() -> Property<C> {
        Property::<C>::new(
            "Visible",
            PropertyKind::Bool,
            |c| PropertyValue::Bool(c.base().flags().contains(super::ComponentFlags::VISIBLE)),
            |c, value, _| {
                c.set_visible(value.as_bool()?);
                Ok(())
            },
        )
    }

    /// `Collidable`
    pub const fn collidable<C: Component>() -> Property<C> {
        Property::<C>::new(
            "Collidable",
            PropertyKind::Bool,
            |c| PropertyValue::Bool(c.base().flags().contains(super::ComponentFlags::COLLIDABLE)),
            |c, value, _| {
                c.set_collidable(value.as_bool()?);
                Ok(())
            },
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A minimal component kind with a fixed local box.

    use super::*;
    use crate::ecs::properties::PropertyTable;

    pub struct BoxComponent {
        base: ComponentBase,
        pub half_extents: Vec3,
        pub updates: Vec<f32>,
        pub async_updates: Vec<f32>,
    }

    impl BoxComponent {
        pub fn new(half_extents: Vec3) -> Self {
            let mut component = Self {
                base: ComponentBase::new(),
                half_extents,
                updates: Vec::new(),
                async_updates: Vec::new(),
            };
            component.refresh_bounds();
            component
        }

        pub fn boxed(half_extents: Vec3) -> Box<dyn Component> {
            Box::new(Self::new(half_extents))
        }
    }

    static BOX_PROPERTIES: [Property<BoxComponent>; 5] = [
        common_properties::local_position(),
        common_properties::local_rotation(),
        common_properties::local_scale(),
        common_properties::visible(),
        common_properties::collidable(),
    ];

    impl PropertyTable for BoxComponent {
        fn property_table() -> &'static [Property<Self>] {
            &BOX_PROPERTIES
        }
    }

    impl Component for BoxComponent {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn type_name(&self) -> &'static str {
            "BoxComponent"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn local_bounds(&self) -> AABB {
            AABB::from_center_extents(Vec3::zeros(), self.half_extents)
        }

        fn update(&mut self, delta_time: f32) {
            self.updates.push(delta_time);
        }

        fn update_async(&mut self, delta_time: f32) {
            self.async_updates.push(delta_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::BoxComponent;
    use super::*;
    use crate::physics::{CollisionLayers, CollisionShape};
    use approx::assert_relative_eq;

    #[test]
    fn test_detached_world_transform_is_local() {
        let mut component = BoxComponent::new(Vec3::repeat(1.0));
        component.set_local_position(Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(component.base().world_transform().position, Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(component.base().bounding_box().min, Vec3::new(2.0, -1.0, -1.0));
    }

    #[test]
    fn test_attach_combines_owner_transform() {
        let mut component = BoxComponent::new(Vec3::repeat(1.0));
        component.set_local_position(Vec3::new(1.0, 0.0, 0.0));
        let owner = Transform::from_position(Vec3::new(0.0, 10.0, 0.0));
        component.on_add_to_entity(EntityId::new(4), &owner);

        assert_eq!(component.base().owner(), Some(EntityId::new(4)));
        assert_relative_eq!(component.base().world_transform().position, Vec3::new(1.0, 10.0, 0.0));
        assert!(component.base().has_requests());

        component.on_remove_from_entity();
        assert_relative_eq!(component.base().world_transform().position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn test_double_attach_panics() {
        let mut component = BoxComponent::new(Vec3::repeat(1.0));
        component.on_add_to_entity(EntityId::new(1), &Transform::identity());
        component.on_add_to_entity(EntityId::new(2), &Transform::identity());
    }

    #[test]
    fn test_collision_object_follows_owner_id() {
        let mut component = BoxComponent::new(Vec3::repeat(1.0));
        let object = CollisionObject::new(CollisionShape::Box(Vec3::repeat(1.0)), CollisionLayers::DYNAMIC);
        component.base_mut().set_collision_object(Some(Arc::clone(&object)));
        assert_eq!(object.entity_id(), 0);

        component.on_add_to_entity(EntityId::new(9), &Transform::identity());
        assert_eq!(object.entity_id(), 9);
        component.on_remove_from_entity();
        assert_eq!(object.entity_id(), 0);
    }
}
