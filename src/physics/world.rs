//! The physics world: owns every body and shape and advances them each tick

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use rapier2d::prelude::{
    CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderSet, DefaultBroadPhase, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, Isometry, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, Point, Real, RigidBodySet, Rotation,
};

use super::body::{BodyDef, BodyHandle, BodyKind, BodyState};
use super::shape::{CollisionType, ShapeDef, ShapeHandle};
use super::{from_point, from_vector, to_point, to_vector};
use crate::error::{Result, SimError};

/// Tag bit marking a present owner reference in collider user data
const USER_DATA_PRESENT: u128 = 1 << 64;

/// A resolved contact between two shapes whose collision types have a
/// registered handler. `shapes.0` carries the handler's first type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub shapes: (ShapeHandle, ShapeHandle),
    pub types: (CollisionType, CollisionType),
    pub point: Vec2,
    /// Unit normal from `shapes.0` toward `shapes.1`
    pub normal: Vec2,
}

pub struct PhysicsWorld {
    pub gravity: Vec2,
    /// Integration + contact passes per `step`
    pub substeps: u32,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    handlers: BTreeSet<(CollisionType, CollisionType)>,
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("substeps", &self.substeps)
            .field("bodies", &self.bodies.len())
            .field("shapes", &self.colliders.len())
            .field("handlers", &self.handlers)
            .finish()
    }
}

fn pack_user_data(user_data: Option<u64>) -> u128 {
    user_data.map_or(0, |bits| USER_DATA_PRESENT | u128::from(bits))
}

fn unpack_user_data(raw: u128) -> Option<u64> {
    (raw & USER_DATA_PRESENT != 0).then_some(raw as u64)
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2, substeps: u32) -> Self {
        Self {
            gravity,
            substeps: substeps.max(1),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            handlers: BTreeSet::new(),
        }
    }

    /// Typical object size in world units; scales contact tolerances
    pub fn with_length_unit(mut self, unit: f32) -> Self {
        if unit.is_finite() && unit > 0.0 {
            self.params.length_unit = unit;
        }
        self
    }

    /// Register a body. Dynamic bodies need a finite positive mass.
    pub fn add_body(&mut self, def: BodyDef) -> Result<BodyHandle> {
        if def.kind == BodyKind::Dynamic {
            if !(def.mass.is_finite() && def.mass > 0.0) {
                return Err(SimError::InvalidMass(def.mass));
            }
            if !(def.inertia.is_finite() && def.inertia > 0.0) {
                return Err(SimError::InvalidMass(def.inertia));
            }
        }
        Ok(BodyHandle(self.bodies.insert(def.build())))
    }

    /// Attach a shape to a live body
    pub fn add_shape(
        &mut self,
        body: BodyHandle,
        def: ShapeDef,
        user_data: Option<u64>,
    ) -> Result<ShapeHandle> {
        if def.vertices.len() < 3 {
            return Err(SimError::DegenerateGeometry(format!(
                "shape has {} vertices",
                def.vertices.len()
            )));
        }
        if !self.bodies.contains(body.0) {
            return Err(SimError::MissingBody);
        }
        let points: Vec<Point<Real>> = def.vertices.iter().map(|v| to_point(*v)).collect();
        let collider = ColliderBuilder::convex_hull(&points)
            .ok_or_else(|| SimError::DegenerateGeometry("shape has no convex hull".into()))?
            .restitution(def.elasticity)
            .restitution_combine_rule(CoefficientCombineRule::Multiply)
            .friction(def.friction)
            .friction_combine_rule(CoefficientCombineRule::Multiply)
            .density(0.0)
            .collision_groups(InteractionGroups::new(
                CollisionType::group(def.collision_type),
                Group::ALL,
            ))
            .user_data(pack_user_data(user_data))
            .build();
        Ok(ShapeHandle(self.colliders.insert_with_parent(
            collider,
            body.0,
            &mut self.bodies,
        )))
    }

    /// Remove a shape if present; returns whether anything was removed
    pub fn remove_shape(&mut self, handle: ShapeHandle) -> bool {
        self.colliders
            .remove(handle.0, &mut self.islands, &mut self.bodies, true)
            .is_some()
    }

    /// Remove a body and all of its shapes if present
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies
            .remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(handle.0).map(BodyState::of)
    }

    /// Shapes attached to a body, in attachment order
    pub fn body_shapes(&self, handle: BodyHandle) -> Vec<ShapeHandle> {
        self.bodies
            .get(handle.0)
            .map(|b| b.colliders().iter().map(|c| ShapeHandle(*c)).collect())
            .unwrap_or_default()
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        body.set_linvel(to_vector(velocity), true);
        true
    }

    pub fn translate(&mut self, handle: BodyHandle, delta: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        let moved = body.translation() + to_vector(delta);
        body.set_translation(moved, true);
        true
    }

    /// Turn a body by `delta` radians about its origin
    pub fn rotate(&mut self, handle: BodyHandle, delta: f32) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        let angle = body.rotation().angle() + delta;
        body.set_rotation(Rotation::new(angle), true);
        true
    }

    pub fn shape_body(&self, handle: ShapeHandle) -> Option<BodyHandle> {
        self.colliders.get(handle.0)?.parent().map(BodyHandle)
    }

    pub fn collision_type(&self, handle: ShapeHandle) -> Option<CollisionType> {
        CollisionType::from_group(self.colliders.get(handle.0)?.collision_groups().memberships)
    }

    /// Opaque owner reference (e.g. a packed block id)
    pub fn user_data(&self, handle: ShapeHandle) -> Option<u64> {
        unpack_user_data(self.colliders.get(handle.0)?.user_data)
    }

    /// Re-point a shape's owner reference
    pub fn set_user_data(&mut self, handle: ShapeHandle, user_data: Option<u64>) -> bool {
        match self.colliders.get_mut(handle.0) {
            Some(collider) => {
                collider.user_data = pack_user_data(user_data);
                true
            }
            None => false,
        }
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn contains_shape(&self, handle: ShapeHandle) -> bool {
        self.colliders.contains(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.colliders.len()
    }

    /// Route contacts between these two collision types to `step`'s output
    pub fn add_collision_handler(&mut self, a: CollisionType, b: CollisionType) {
        self.handlers.insert((a, b));
    }

    /// Shape vertices in body space
    pub fn shape_local_vertices(&self, handle: ShapeHandle) -> Option<Vec<Vec2>> {
        let collider = self.colliders.get(handle.0)?;
        let polygon = collider.shape().as_convex_polygon()?;
        let offset = collider.position_wrt_parent().copied().unwrap_or_else(Isometry::identity);
        Some(
            polygon
                .points()
                .iter()
                .map(|p| from_point(&offset.transform_point(p)))
                .collect(),
        )
    }

    /// Shape vertices in world space, from the parent body's current pose
    pub fn shape_world_vertices(&self, handle: ShapeHandle) -> Option<Vec<Vec2>> {
        let collider = self.colliders.get(handle.0)?;
        let polygon = collider.shape().as_convex_polygon()?;
        let pose = match (collider.parent(), collider.position_wrt_parent()) {
            (Some(parent), Some(offset)) => self.bodies.get(parent)?.position() * offset,
            _ => *collider.position(),
        };
        Some(
            polygon
                .points()
                .iter()
                .map(|p| from_point(&pose.transform_point(p)))
                .collect(),
        )
    }

    /// Horizontal world-space extent `(min_x, max_x)` over a set of shapes
    pub fn x_extent(&self, shapes: &[ShapeHandle]) -> Option<(f32, f32)> {
        shapes
            .iter()
            .filter_map(|s| self.shape_world_vertices(*s))
            .flatten()
            .fold(None, |acc, v| match acc {
                None => Some((v.x, v.x)),
                Some((lo, hi)) => Some((f32::min(lo, v.x), f32::max(hi, v.x))),
            })
    }

    /// Advance the simulation, returning handled contacts in resolution order
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        if dt <= 0.0 {
            return events;
        }
        self.params.dt = dt / self.substeps as f32;
        let gravity = to_vector(self.gravity);
        for _ in 0..self.substeps {
            self.pipeline.step(
                &gravity,
                &self.params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            self.collect_contacts(&mut events);
        }
        events
    }

    /// Handled pairs the solver pushed apart during the last pass
    fn collect_contacts(&self, events: &mut Vec<ContactEvent>) {
        for pair in self.narrow_phase.contact_pairs() {
            let Some(manifold) = pair.manifolds.iter().find(|m| !m.data.solver_contacts.is_empty())
            else {
                continue;
            };
            let (a, b) = (ShapeHandle(pair.collider1), ShapeHandle(pair.collider2));
            let (Some(ta), Some(tb)) = (self.collision_type(a), self.collision_type(b)) else {
                continue;
            };
            let contacts = &manifold.data.solver_contacts;
            let point = contacts.iter().map(|c| from_point(&c.point)).sum::<Vec2>() / contacts.len() as f32;
            let normal = from_vector(&manifold.data.normal);

            if self.handlers.contains(&(ta, tb)) {
                events.push(ContactEvent {
                    shapes: (a, b),
                    types: (ta, tb),
                    point,
                    normal,
                });
            } else if self.handlers.contains(&(tb, ta)) {
                events.push(ContactEvent {
                    shapes: (b, a),
                    types: (tb, ta),
                    point,
                    normal: -normal,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::new(0.0, 900.0), 1)
    }

    fn crate_body(world: &mut PhysicsWorld, at: Vec2, ty: Option<CollisionType>) -> (BodyHandle, ShapeHandle) {
        let def = ShapeDef::box_shape(Vec2::splat(20.0)).unwrap().with_material(0.0, 0.5);
        let def = match ty {
            Some(t) => def.with_collision_type(t),
            None => def,
        };
        let inertia = crate::physics::moment_for_poly(10.0, &def.vertices);
        let body = world.add_body(BodyDef::dynamic(10.0, inertia).at(at)).unwrap();
        let shape = world.add_shape(body, def, None).unwrap();
        (body, shape)
    }

    fn floor(world: &mut PhysicsWorld, at: Vec2, ty: Option<CollisionType>) -> ShapeHandle {
        let def = ShapeDef::box_shape(Vec2::new(200.0, 20.0)).unwrap().with_material(0.0, 0.5);
        let def = match ty {
            Some(t) => def.with_collision_type(t),
            None => def,
        };
        let body = world.add_body(BodyDef::fixed().at(at)).unwrap();
        world.add_shape(body, def, Some(99)).unwrap()
    }

    #[test]
    fn zero_mass_is_rejected() {
        let mut w = world();
        assert!(matches!(
            w.add_body(BodyDef::dynamic(0.0, 1.0)),
            Err(SimError::InvalidMass(_))
        ));
        assert!(w.add_body(BodyDef::dynamic(f32::NAN, 1.0)).is_err());
        assert!(w.add_body(BodyDef::fixed()).is_ok());
    }

    #[test]
    fn removal_is_idempotent() {
        let mut w = world();
        let (body, shape) = crate_body(&mut w, Vec2::ZERO, None);
        assert!(w.remove_body(body));
        assert!(!w.contains_shape(shape));
        assert!(!w.remove_body(body));
        assert!(!w.remove_shape(shape));
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn shape_on_missing_body_fails() {
        let mut w = world();
        let (body, _) = crate_body(&mut w, Vec2::ZERO, None);
        w.remove_body(body);
        let def = ShapeDef::box_shape(Vec2::ONE).unwrap();
        assert!(matches!(w.add_shape(body, def, None), Err(SimError::MissingBody)));
    }

    #[test]
    fn gravity_accelerates_dynamic_bodies_only() {
        let mut w = world();
        let (body, _) = crate_body(&mut w, Vec2::ZERO, None);
        let ground = floor(&mut w, Vec2::new(0.0, 5000.0), None);
        w.step(0.1);
        assert!(w.body(body).unwrap().velocity.y > 0.0);
        let ground_body = w.shape_body(ground).unwrap();
        assert_eq!(w.body(ground_body).unwrap().position, Vec2::new(0.0, 5000.0));
    }

    #[test]
    fn resting_contact_is_reported_for_handled_pair() {
        let mut w = world();
        w.add_collision_handler(CollisionType::TOOL, CollisionType::BLOCK);
        let (body, shape) = crate_body(&mut w, Vec2::new(0.0, -19.0), Some(CollisionType::TOOL));
        let ground = floor(&mut w, Vec2::ZERO, Some(CollisionType::BLOCK));

        let events = w.step(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shapes, (shape, ground));
        assert_eq!(events[0].types, (CollisionType::TOOL, CollisionType::BLOCK));
        // Held up by the floor instead of falling freely (15 = g * dt)
        assert!(w.body(body).unwrap().velocity.y < 15.0 - 1.0);
        assert_eq!(w.user_data(ground), Some(99));
        assert!(events[0].normal.y > 0.9);
    }

    #[test]
    fn handler_order_is_normalized() {
        let mut w = world();
        w.add_collision_handler(CollisionType::EXPLOSIVE, CollisionType::BLOCK);
        // Dynamic shape is the block-typed one here; event must still lead with EXPLOSIVE
        let (_, dynamic) = crate_body(&mut w, Vec2::new(0.0, -19.0), Some(CollisionType::BLOCK));
        let fixed = floor(&mut w, Vec2::ZERO, Some(CollisionType::EXPLOSIVE));
        let events = w.step(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shapes, (fixed, dynamic));
        assert!(events[0].normal.y < -0.9);
    }

    #[test]
    fn untyped_shapes_collide_silently() {
        let mut w = world();
        w.add_collision_handler(CollisionType::TOOL, CollisionType::BLOCK);
        let (body, _) = crate_body(&mut w, Vec2::new(0.0, -19.0), None);
        floor(&mut w, Vec2::ZERO, Some(CollisionType::BLOCK));
        assert!(w.step(1.0 / 60.0).is_empty());
        assert!(w.body(body).unwrap().position.y < -19.0 + 1.0);
    }

    #[test]
    fn substeps_multiply_contact_reports() {
        let mut w = PhysicsWorld::new(Vec2::new(0.0, 900.0), 4);
        w.add_collision_handler(CollisionType::TOOL, CollisionType::BLOCK);
        crate_body(&mut w, Vec2::new(0.0, -19.0), Some(CollisionType::TOOL));
        floor(&mut w, Vec2::ZERO, Some(CollisionType::BLOCK));
        let events = w.step(1.0 / 60.0);
        assert!(events.len() > 1);
    }

    #[test]
    fn x_extent_spans_all_shapes() {
        let mut w = world();
        let (body, a) = crate_body(&mut w, Vec2::new(100.0, 0.0), None);
        let b = w
            .add_shape(
                body,
                ShapeDef::polygon(&[Vec2::new(20.0, 0.0), Vec2::new(40.0, 0.0), Vec2::new(30.0, 10.0)]).unwrap(),
                None,
            )
            .unwrap();
        let (lo, hi) = w.x_extent(&[a, b]).unwrap();
        assert!((lo - 90.0).abs() < 1e-4);
        assert!((hi - 140.0).abs() < 1e-4);
        assert!(w.x_extent(&[]).is_none());
    }

    #[test]
    fn user_data_distinguishes_zero_from_absent() {
        let mut w = world();
        let (_, shape) = crate_body(&mut w, Vec2::ZERO, None);
        assert_eq!(w.user_data(shape), None);
        assert!(w.set_user_data(shape, Some(0)));
        assert_eq!(w.user_data(shape), Some(0));
        assert!(w.set_user_data(shape, Some(u64::MAX)));
        assert_eq!(w.user_data(shape), Some(u64::MAX));
        assert!(w.set_user_data(shape, None));
        assert_eq!(w.user_data(shape), None);
    }

    #[test]
    fn pose_edits_show_up_in_world_vertices() {
        let mut w = world();
        let (body, shape) = crate_body(&mut w, Vec2::ZERO, None);
        assert!(w.translate(body, Vec2::new(50.0, 0.0)));
        let (lo, hi) = w.x_extent(&[shape]).unwrap();
        assert!((lo - 40.0).abs() < 1e-4 && (hi - 60.0).abs() < 1e-4);

        assert!(w.rotate(body, std::f32::consts::FRAC_PI_4));
        let (lo, hi) = w.x_extent(&[shape]).unwrap();
        let half_diagonal = 10.0 * std::f32::consts::SQRT_2;
        assert!((lo - (50.0 - half_diagonal)).abs() < 1e-3);
        assert!((hi - (50.0 + half_diagonal)).abs() < 1e-3);
        assert_eq!(w.body_shapes(body), vec![shape]);
    }

    #[test]
    fn fast_bodies_with_ccd_stop_at_thin_floors() {
        let mut w = world();
        let def = ShapeDef::box_shape(Vec2::splat(20.0)).unwrap();
        let inertia = crate::physics::moment_for_poly(10.0, &def.vertices);
        let body = w
            .add_body(
                BodyDef::dynamic(10.0, inertia)
                    .at(Vec2::new(0.0, -100.0))
                    .with_velocity(Vec2::new(0.0, 30000.0), 0.0)
                    .with_ccd(),
            )
            .unwrap();
        w.add_shape(body, def, None).unwrap();
        floor(&mut w, Vec2::ZERO, None);

        for _ in 0..5 {
            w.step(1.0 / 60.0);
        }
        assert!(w.body(body).unwrap().position.y < 0.0);
    }
}
