//! Interpolator component
//!
//! Moves its owner from the transform it had when the interpolator was
//! activated to that transform offset by a fixed position, rotation and scale
//! over `move_time` seconds, optionally holds for `pause_time` seconds, and
//! then stops, restarts or reverses depending on the [`InterpolatorMode`].
//!
//! The interpolator only holds update registration while it is active. Each
//! tick it hands the owner a new transform; a static owner already placed in
//! a world ignores it.

use crate::ecs::component::{common_properties, Component, ComponentBase, OwnerRequest};
use crate::ecs::entity::EntityId;
use crate::ecs::properties::{Property, PropertyError, PropertyKind, PropertyTable, PropertyValue};
use crate::foundation::math::{utils, Quat, Transform, Vec3};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// What happens at the end of a move (and pause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolatorMode {
    /// Stop at the target
    #[default]
    Once,
    /// Jump back to the start and move again
    Loop,
    /// Move back towards the start, then forward again
    PingPong,
}

impl InterpolatorMode {
    /// Name used by the property table
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "Once",
            Self::Loop => "Loop",
            Self::PingPong => "PingPong",
        }
    }

    /// Parse a property-table name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Once" => Some(Self::Once),
            "Loop" => Some(Self::Loop),
            "PingPong" => Some(Self::PingPong),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Moving,
    Paused,
}

/// Component animating its owner's transform along a fixed offset
pub struct InterpolatorComponent {
    base: ComponentBase,
    mode: InterpolatorMode,
    move_time: f32,
    pause_time: f32,
    offset_position: Vec3,
    offset_rotation: Quat,
    offset_scale: Vec3,
    active: bool,
    registered: bool,
    start: Option<Transform>,
    phase: Phase,
    elapsed: f32,
    forward: bool,
}

impl Default for InterpolatorComponent {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl InterpolatorComponent {
    /// Create an inactive interpolator with a zero offset
    pub fn new(move_time: f32) -> Self {
        Self {
            base: ComponentBase::new(),
            mode: InterpolatorMode::Once,
            move_time,
            pause_time: 0.0,
            offset_position: Vec3::zeros(),
            offset_rotation: Quat::identity(),
            offset_scale: Vec3::repeat(1.0),
            active: false,
            registered: false,
            start: None,
            phase: Phase::Moving,
            elapsed: 0.0,
            forward: true,
        }
    }

    /// Builder: end-of-move behavior
    #[must_use]
    pub fn with_mode(mut self, mode: InterpolatorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: hold time after each move
    #[must_use]
    pub fn with_pause_time(mut self, pause_time: f32) -> Self {
        self.pause_time = pause_time;
        self
    }

    /// Builder: target offset
    #[must_use]
    pub fn with_offset(mut self, position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.offset_position = position;
        self.offset_rotation = rotation;
        self.offset_scale = scale;
        self
    }

    /// End-of-move behavior
    pub fn mode(&self) -> InterpolatorMode {
        self.mode
    }

    /// Change the end-of-move behavior
    pub fn set_mode(&mut self, mode: InterpolatorMode) {
        self.mode = mode;
    }

    /// Seconds per move
    pub fn move_time(&self) -> f32 {
        self.move_time
    }

    /// Change the move duration
    pub fn set_move_time(&mut self, move_time: f32) {
        self.move_time = move_time.max(0.0);
    }

    /// Seconds held after each move
    pub fn pause_time(&self) -> f32 {
        self.pause_time
    }

    /// Change the hold duration
    pub fn set_pause_time(&mut self, pause_time: f32) {
        self.pause_time = pause_time.max(0.0);
    }

    /// Position offset of the target
    pub fn offset_position(&self) -> Vec3 {
        self.offset_position
    }

    /// Change the position offset
    pub fn set_offset_position(&mut self, offset: Vec3) {
        self.offset_position = offset;
    }

    /// Rotation offset of the target
    pub fn offset_rotation(&self) -> Quat {
        self.offset_rotation
    }

    /// Change the rotation offset
    pub fn set_offset_rotation(&mut self, offset: Quat) {
        self.offset_rotation = offset;
    }

    /// Scale factors of the target
    pub fn offset_scale(&self) -> Vec3 {
        self.offset_scale
    }

    /// Change the scale factors
    pub fn set_offset_scale(&mut self, offset: Vec3) {
        self.offset_scale = offset;
    }

    /// True while the interpolator drives its owner
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the interpolator holds an update registration
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Start or stop. Starting captures the owner's transform on the next
    /// update as the start of the move.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if active {
            self.start = None;
            self.phase = Phase::Moving;
            self.elapsed = 0.0;
            self.forward = true;
            self.register();
        } else {
            self.unregister();
        }
    }

    /// Transform the current move ends at
    pub fn target(&self, start: &Transform) -> Transform {
        Transform {
            position: start.position + self.offset_position,
            rotation: start.rotation * self.offset_rotation,
            scale: start.scale.component_mul(&self.offset_scale),
        }
    }

    fn register(&mut self) {
        if self.active && !self.registered && self.base.is_attached() {
            self.base.request(OwnerRequest::RegisterForUpdates(0.0));
            self.registered = true;
        }
    }

    fn unregister(&mut self) {
        if self.registered {
            self.base.request(OwnerRequest::UnregisterForUpdates);
            self.registered = false;
        }
    }

    fn progress(&self) -> f32 {
        let t = if self.move_time > 0.0 {
            utils::clamp(self.elapsed / self.move_time, 0.0, 1.0)
        } else {
            1.0
        };
        if self.forward {
            t
        } else {
            1.0 - t
        }
    }

    fn finish_cycle(&mut self, leftover: f32) {
        match self.mode {
            InterpolatorMode::Once => {
                self.active = false;
                self.unregister();
            }
            InterpolatorMode::Loop => {
                self.phase = Phase::Moving;
                self.elapsed = leftover;
            }
            InterpolatorMode::PingPong => {
                self.phase = Phase::Moving;
                self.elapsed = leftover;
                self.forward = !self.forward;
            }
        }
    }
}

static INTERPOLATOR_PROPERTIES: [Property<InterpolatorComponent>; 12] = [
    common_properties::local_position(),
    common_properties::local_rotation(),
    common_properties::local_scale(),
    common_properties::visible(),
    common_properties::collidable(),
    Property::<InterpolatorComponent>::new(
        "MoveTime",
        PropertyKind::Float,
        |c| PropertyValue::Float(c.move_time),
        |c, value, _| {
            c.set_move_time(value.as_float()?);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "PauseTime",
        PropertyKind::Float,
        |c| PropertyValue::Float(c.pause_time),
        |c, value, _| {
            c.set_pause_time(value.as_float()?);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "Mode",
        PropertyKind::String,
        |c| PropertyValue::String(c.mode.as_str().to_string()),
        |c, value, _| {
            let name = value.as_str()?;
            let mode = InterpolatorMode::parse(name)
                .ok_or_else(|| PropertyError::Rejected(format!("unknown interpolator mode '{name}'")))?;
            c.set_mode(mode);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "OffsetPosition",
        PropertyKind::Vec3,
        |c| PropertyValue::Vec3(c.offset_position),
        |c, value, _| {
            c.set_offset_position(value.as_vec3()?);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "OffsetRotation",
        PropertyKind::Quat,
        |c| PropertyValue::Quat(c.offset_rotation),
        |c, value, _| {
            c.set_offset_rotation(value.as_quat()?);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "OffsetScale",
        PropertyKind::Vec3,
        |c| PropertyValue::Vec3(c.offset_scale),
        |c, value, _| {
            c.set_offset_scale(value.as_vec3()?);
            Ok(())
        },
    ),
    Property::<InterpolatorComponent>::new(
        "Active",
        PropertyKind::Bool,
        |c| PropertyValue::Bool(c.active),
        |c, value, _| {
            c.set_active(value.as_bool()?);
            Ok(())
        },
    ),
];

impl PropertyTable for InterpolatorComponent {
    fn property_table() -> &'static [Property<Self>] {
        &INTERPOLATOR_PROPERTIES
    }
}

impl Component for InterpolatorComponent {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "InterpolatorComponent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_add_to_entity(&mut self, owner: EntityId, owner_transform: &Transform) {
        self.base.attach(owner, owner_transform);
        self.register();
        self.on_local_transform_change();
    }

    fn on_remove_from_entity(&mut self) {
        self.unregister();
        self.start = None;
        self.base.detach();
        self.on_local_transform_change();
    }

    fn update(&mut self, delta_time: f32) {
        if !self.active || !self.base.is_attached() {
            return;
        }
        let start = self
            .start
            .get_or_insert_with(|| self.base.owner_transform().clone())
            .clone();

        self.elapsed += delta_time;
        match self.phase {
            Phase::Moving => {
                let transform = start.interpolate(&self.target(&start), self.progress());
                self.base.request(OwnerRequest::SetTransform(transform));
                if self.elapsed >= self.move_time {
                    let leftover = self.elapsed - self.move_time;
                    if self.pause_time > 0.0 {
                        self.phase = Phase::Paused;
                        self.elapsed = leftover;
                    } else {
                        self.finish_cycle(leftover);
                    }
                }
            }
            Phase::Paused => {
                if self.elapsed >= self.pause_time {
                    let leftover = self.elapsed - self.pause_time;
                    self.finish_cycle(leftover);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::{Entity, Mobility};
    use approx::assert_relative_eq;

    fn slide(mode: InterpolatorMode) -> InterpolatorComponent {
        InterpolatorComponent::new(1.0).with_mode(mode).with_offset(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::identity(),
            Vec3::repeat(1.0),
        )
    }

    #[test]
    fn test_inactive_interpolator_does_not_register() {
        let mut entity = Entity::new(Mobility::Movable);
        entity.add_component(Box::new(slide(InterpolatorMode::Once)));
        assert!(!entity.sync_update_requests().is_active());
    }

    #[test]
    fn test_once_moves_owner_and_releases_registration() {
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(Box::new(slide(InterpolatorMode::Once)));
        entity.component_mut::<InterpolatorComponent>(id).unwrap().set_active(true);
        assert_eq!(entity.sync_update_requests().count(), 1);

        entity.update(0.5);
        assert_relative_eq!(entity.position(), Vec3::new(5.0, 0.0, 0.0));
        entity.update(0.5);
        assert_relative_eq!(entity.position(), Vec3::new(10.0, 0.0, 0.0));
        assert!(!entity.sync_update_requests().is_active());
        assert!(!entity.component::<InterpolatorComponent>(id).unwrap().is_active());
    }

    #[test]
    fn test_ping_pong_returns_to_start() {
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(Box::new(slide(InterpolatorMode::PingPong)));
        entity.component_mut::<InterpolatorComponent>(id).unwrap().set_active(true);

        entity.update(1.0);
        assert_relative_eq!(entity.position(), Vec3::new(10.0, 0.0, 0.0));
        entity.update(0.5);
        assert_relative_eq!(entity.position(), Vec3::new(5.0, 0.0, 0.0));
        entity.update(0.5);
        assert_relative_eq!(entity.position(), Vec3::zeros());
        assert!(entity.sync_update_requests().is_active());
    }

    #[test]
    fn test_removal_releases_registration() {
        let mut entity = Entity::new(Mobility::Movable);
        let id = entity.add_component(Box::new(slide(InterpolatorMode::Loop)));
        entity.component_mut::<InterpolatorComponent>(id).unwrap().set_active(true);
        let removed = entity.remove_component(id);
        assert!(!entity.sync_update_requests().is_active());
        let removed = removed.as_any().downcast_ref::<InterpolatorComponent>().unwrap();
        assert!(!removed.is_registered());
    }
}
