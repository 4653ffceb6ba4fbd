//! Convex polygon shapes and their mass properties

use glam::Vec2;
use rapier2d::parry::shape::ConvexPolygon;
use rapier2d::prelude::{ColliderHandle, Group};
use serde::{Deserialize, Serialize};

use super::{from_point, to_point};
use crate::error::{Result, SimError};

/// Smallest polygon area accepted as non-degenerate
const MIN_AREA: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) ColliderHandle);

/// Discrete tag used to route contacts to handlers (1..=31)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionType(pub u32);

impl CollisionType {
    pub const TOOL: CollisionType = CollisionType(1);
    pub const BLOCK: CollisionType = CollisionType(2);
    pub const EXPLOSIVE: CollisionType = CollisionType(3);

    /// Membership bit carried by the collider. Untagged shapes use the last group.
    pub(crate) fn group(tag: Option<CollisionType>) -> Group {
        match tag {
            Some(CollisionType(n)) => Group::from_bits_truncate(1 << (n.clamp(1, 31) - 1)),
            None => Group::GROUP_32,
        }
    }

    pub(crate) fn from_group(memberships: Group) -> Option<CollisionType> {
        if memberships.is_empty() || memberships.contains(Group::GROUP_32) {
            return None;
        }
        Some(CollisionType(memberships.bits().trailing_zeros() + 1))
    }
}

/// Shape template: geometry in body space plus surface material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDef {
    /// Convex hull, counter-clockwise
    pub vertices: Vec<Vec2>,
    pub elasticity: f32,
    pub friction: f32,
    /// `None` shapes collide physically but never reach a handler
    pub collision_type: Option<CollisionType>,
}

impl ShapeDef {
    /// Polygon from an arbitrary point set (reduced to its convex hull)
    pub fn polygon(points: &[Vec2]) -> Result<Self> {
        let points: Vec<_> = points.iter().filter(|p| p.is_finite()).map(|p| to_point(*p)).collect();
        if points.len() < 3 {
            return Err(SimError::DegenerateGeometry(format!("polygon has {} points", points.len())));
        }
        let hull = ConvexPolygon::from_convex_hull(&points).ok_or_else(|| {
            SimError::DegenerateGeometry(format!("no convex hull through {} points", points.len()))
        })?;
        let vertices: Vec<Vec2> = hull.points().iter().map(from_point).collect();
        let area = polygon_area(&vertices);
        if !(area.is_finite() && area > MIN_AREA) {
            return Err(SimError::DegenerateGeometry(format!("polygon area {area}")));
        }
        Ok(Self {
            vertices,
            elasticity: 0.0,
            friction: 0.0,
            collision_type: None,
        })
    }

    /// Axis-aligned box centred on the body origin
    pub fn box_shape(size: Vec2) -> Result<Self> {
        let h = size / 2.0;
        Self::polygon(&[
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ])
    }

    pub fn with_material(mut self, elasticity: f32, friction: f32) -> Self {
        self.elasticity = elasticity;
        self.friction = friction;
        self
    }

    pub fn with_collision_type(mut self, collision_type: CollisionType) -> Self {
        self.collision_type = Some(collision_type);
        self
    }

    /// Copy with every vertex scaled about the body origin
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v * factor).collect(),
            ..self.clone()
        }
    }

    pub fn area(&self) -> f32 {
        polygon_area(&self.vertices)
    }
}

/// Unsigned polygon area (shoelace)
pub fn polygon_area(vertices: &[Vec2]) -> f32 {
    edges(vertices).map(|(a, b)| a.perp_dot(b)).sum::<f32>().abs() / 2.0
}

/// Moment of inertia of a solid polygon about the body origin
pub fn moment_for_poly(mass: f32, vertices: &[Vec2]) -> f32 {
    let (mut num, mut den) = (0.0f32, 0.0f32);
    for (a, b) in edges(vertices) {
        let c = b.perp_dot(a);
        num += c * (a.dot(a) + a.dot(b) + b.dot(b));
        den += c;
    }
    if den == 0.0 {
        return 0.0;
    }
    mass * num / (6.0 * den)
}

/// Consecutive vertex pairs, wrapping back to the first
pub fn edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}
