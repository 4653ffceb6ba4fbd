//! 2D rigid-body physics on top of rapier
//!
//! `PhysicsWorld` owns the rapier sets and exposes the handful of operations
//! the simulation needs: bodies carrying convex polygon shapes, opaque owner
//! data per shape, collision-type handlers and a substepped `step` that
//! returns handled contacts before any post-step update runs.

pub mod body;
pub mod shape;
pub mod world;

use glam::Vec2;
use rapier2d::prelude::{Point, Real, Vector};

pub use body::{BodyDef, BodyHandle, BodyKind, BodyState};
pub use shape::{CollisionType, ShapeDef, ShapeHandle, moment_for_poly, polygon_area};
pub use world::{ContactEvent, PhysicsWorld};

pub(crate) fn to_vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

pub(crate) fn to_point(v: Vec2) -> Point<Real> {
    Point::new(v.x, v.y)
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub(crate) fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}
