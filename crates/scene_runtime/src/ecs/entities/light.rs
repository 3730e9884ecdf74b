//! Light entity
//!
//! A light is an entity whose own bounds are the volume it illuminates: a
//! sphere of `range` around its position for point and spot lights, and the
//! infinite sentinel for directional lights. Components added to a light
//! merge into those bounds like on any other entity.

use crate::ecs::entity::{Entity, EntityBehavior, Mobility};
use crate::ecs::properties::{Property, PropertyError, PropertyKind, PropertyValue};
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::foundation::math::Vec3;
use crate::render::{LightParams, LightType, RenderProxy, RenderProxyKind};
use crate::world::WorldLink;
use std::any::Any;
use std::sync::Arc;

/// Entity behavior for a light source
#[derive(Debug)]
pub struct LightEntity {
    params: LightParams,
    proxy: Arc<RenderProxy>,
}

impl LightEntity {
    /// Build a detached light entity
    pub fn create(params: LightParams, mobility: Mobility) -> Entity {
        let proxy = RenderProxy::new(RenderProxyKind::Light(params.clone()));
        let mut entity = Entity::with_behavior(mobility, Box::new(Self { params, proxy }));
        entity.with_behavior_mut::<Self, _>(|light, entity| light.sync(entity));
        entity
    }

    /// Light parameters
    pub fn params(&self) -> &LightParams {
        &self.params
    }

    /// Render proxy drawn for this light
    pub fn proxy(&self) -> &Arc<RenderProxy> {
        &self.proxy
    }

    /// Replace the parameters of a light entity; false if it is not a light
    pub fn set_params(entity: &mut Entity, params: LightParams) -> bool {
        Self::modify(entity, |current| *current = params).is_ok()
    }

    fn modify(entity: &mut Entity, f: impl FnOnce(&mut LightParams)) -> Result<(), PropertyError> {
        entity
            .with_behavior_mut::<Self, _>(|light, entity| {
                f(&mut light.params);
                light.sync(entity);
            })
            .ok_or_else(|| PropertyError::Rejected("entity is not a light".to_string()))
    }

    fn read(entity: &Entity, f: impl Fn(&LightParams) -> PropertyValue) -> PropertyValue {
        entity
            .behavior::<Self>()
            .map_or_else(|| f(&LightParams::default()), |light| f(&light.params))
    }

    fn sync(&self, entity: &mut Entity) {
        let (bounding_box, bounding_sphere) = if self.params.is_unbounded() {
            (AABB::infinite(), BoundingSphere::infinite())
        } else {
            let position = entity.position();
            (
                AABB::from_center_extents(position, Vec3::repeat(self.params.range)),
                BoundingSphere::new(position, self.params.range),
            )
        };
        self.proxy.set_transform(entity.transform());
        self.proxy.update(|state| {
            state.kind = RenderProxyKind::Light(self.params.clone());
            state.bounds = bounding_box;
        });
        entity.set_bounds(bounding_box, bounding_sphere, true);
    }
}

impl EntityBehavior for LightEntity {
    fn type_name(&self) -> &'static str {
        "LightEntity"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn properties(&self) -> &'static [Property<Entity>] {
        &LIGHT_PROPERTIES
    }

    fn on_add_to_world(&mut self, entity: &mut Entity, world: &WorldLink) {
        self.proxy.set_entity_id(entity.id().get());
        world.add_renderable(Arc::clone(&self.proxy));
    }

    fn on_remove_from_world(&mut self, _entity: &mut Entity, world: &WorldLink) {
        world.remove_renderable(&self.proxy);
        self.proxy.set_entity_id(0);
    }

    fn on_transform_change(&mut self, entity: &mut Entity) {
        self.sync(entity);
    }
}

static LIGHT_PROPERTIES: [Property<Entity>; 7] = [
    Property::<Entity>::new(
        "LightType",
        PropertyKind::String,
        |e| LightEntity::read(e, |p| PropertyValue::String(p.light_type.as_str().to_string())),
        |e, value, _| {
            let name = value.as_str()?;
            let light_type =
                LightType::parse(name).ok_or_else(|| PropertyError::Rejected(format!("unknown light type '{name}'")))?;
            LightEntity::modify(e, |p| p.light_type = light_type)
        },
    ),
    Property::<Entity>::new(
        "Color",
        PropertyKind::Vec3,
        |e| LightEntity::read(e, |p| PropertyValue::Vec3(p.color)),
        |e, value, _| {
            let color = value.as_vec3()?;
            LightEntity::modify(e, |p| p.color = color)
        },
    ),
    Property::<Entity>::new(
        "Intensity",
        PropertyKind::Float,
        |e| LightEntity::read(e, |p| PropertyValue::Float(p.intensity)),
        |e, value, _| {
            let intensity = value.as_float()?;
            LightEntity::modify(e, |p| p.intensity = intensity)
        },
    ),
    Property::<Entity>::new(
        "Range",
        PropertyKind::Float,
        |e| LightEntity::read(e, |p| PropertyValue::Float(p.range)),
        |e, value, _| {
            let range = value.as_float()?;
            LightEntity::modify(e, |p| p.range = range)
        },
    ),
    Property::<Entity>::new(
        "InnerConeAngle",
        PropertyKind::Float,
        |e| LightEntity::read(e, |p| PropertyValue::Float(p.inner_cone_angle)),
        |e, value, _| {
            let angle = value.as_float()?;
            LightEntity::modify(e, |p| p.inner_cone_angle = angle)
        },
    ),
    Property::<Entity>::new(
        "OuterConeAngle",
        PropertyKind::Float,
        |e| LightEntity::read(e, |p| PropertyValue::Float(p.outer_cone_angle)),
        |e, value, _| {
            let angle = value.as_float()?;
            LightEntity::modify(e, |p| p.outer_cone_angle = angle)
        },
    ),
    Property::<Entity>::new(
        "CastShadows",
        PropertyKind::Bool,
        |e| LightEntity::read(e, |p| PropertyValue::Bool(p.cast_shadows)),
        |e, value, _| {
            let cast_shadows = value.as_bool()?;
            LightEntity::modify(e, |p| p.cast_shadows = cast_shadows)
        },
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::ecs::component::test_support::BoxComponent;
    use crate::ecs::properties::PropertyContext;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_light_bounds_follow_range_and_position() {
        let mut light = LightEntity::create(LightParams::point(Vec3::repeat(1.0), 1.0, 5.0), Mobility::Movable);
        assert_eq!(light.type_name(), "LightEntity");
        assert_relative_eq!(light.bounding_sphere().radius, 5.0);

        light.set_position(Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(light.bounding_box().min, Vec3::new(5.0, -5.0, -5.0));
        assert_relative_eq!(light.bounding_sphere().center, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_directional_light_is_unbounded_even_with_components() {
        let mut light = LightEntity::create(LightParams::directional(Vec3::repeat(1.0), 1.0), Mobility::Movable);
        let id = light.add_component(BoxComponent::boxed(Vec3::repeat(1.0)));
        assert!(light.bounding_box().is_infinite());
        assert!(light.bounding_sphere().is_infinite());
        let _component = light.remove_component(id);
        assert!(light.bounding_box().is_infinite());
    }

    #[test]
    fn test_range_property_matches_direct_setter() {
        let resources = ResourceManager::new();
        let context = PropertyContext::new(&resources);
        let mut direct = LightEntity::create(LightParams::default(), Mobility::Movable);
        let mut generic = LightEntity::create(LightParams::default(), Mobility::Movable);

        let mut params = LightParams::default();
        params.range = 2.5;
        assert!(LightEntity::set_params(&mut direct, params));
        generic.set_property("Range", &PropertyValue::Float(2.5), &context).unwrap();

        assert_eq!(direct.bounding_box(), generic.bounding_box());
        assert_eq!(generic.get_property("Range").unwrap(), PropertyValue::Float(2.5));
        let proxy_kind = generic.behavior::<LightEntity>().unwrap().proxy().kind();
        assert!(matches!(proxy_kind, RenderProxyKind::Light(p) if p.range == 2.5));
    }

    #[test]
    fn test_light_properties_listed_with_entity_properties() {
        let light = LightEntity::create(LightParams::default(), Mobility::Movable);
        let names: Vec<&str> = light.property_info().iter().map(|p| p.name).collect();
        assert!(names.contains(&"Position"));
        assert!(names.contains(&"Range"));
        assert!(!LightEntity::set_params(&mut Entity::new(Mobility::Movable), LightParams::default()));
    }
}
