//! Physics-engine-free backend over static convex polygons.
//!
//! Level geometry is kept in the [`StaticGeometry`] resource. Actors carry a
//! [`KinematicBox`] next to their `Transform`, and the backend's resolve system
//! moves them through the ray-grid collider every fixed step.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastBackend, RaycastRequest};
use crate::collision::{CollisionData, CollisionMask, SurfaceKind};
use crate::controller::RaycastController;
use crate::systems::{apply_resolution, MoveRequest};
use crate::RaycastControllerSet;

/// A convex polygon of static level geometry.
///
/// Vertices are stored counter-clockwise; the constructors fix up clockwise
/// input.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct StaticBody {
    vertices: Vec<Vec2>,
    /// How the collider treats this body.
    pub surface: SurfaceKind,
    /// Layers this body is on.
    pub layers: CollisionMask,
}

impl StaticBody {
    /// A convex polygon from its vertices, in either winding order.
    pub fn polygon(mut vertices: Vec<Vec2>) -> Self {
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        Self {
            vertices,
            surface: SurfaceKind::Solid,
            layers: CollisionMask::ALL,
        }
    }

    /// An axis-aligned solid box.
    pub fn rect(rect: Rect) -> Self {
        Self::polygon(vec![
            rect.min,
            Vec2::new(rect.max.x, rect.min.y),
            rect.max,
            Vec2::new(rect.min.x, rect.max.y),
        ])
    }

    /// A right-triangle ramp with its low end at `foot`.
    ///
    /// A positive `run` rises to the right, a negative one to the left.
    pub fn ramp(foot: Vec2, run: f32, rise: f32) -> Self {
        Self::polygon(vec![
            foot,
            foot + Vec2::new(run, 0.0),
            foot + Vec2::new(run, rise),
        ])
    }

    /// An axis-aligned one-way platform.
    pub fn one_way(rect: Rect) -> Self {
        Self::rect(rect).with_surface(SurfaceKind::OneWay)
    }

    /// Builder: set the surface kind.
    pub fn with_surface(mut self, surface: SurfaceKind) -> Self {
        self.surface = surface;
        self
    }

    /// Builder: set the layers this body is on.
    pub fn with_layers(mut self, layers: CollisionMask) -> Self {
        self.layers = layers;
        self
    }

    /// Vertices in counter-clockwise order.
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Clip the ray against every edge (Cyrus-Beck).
    ///
    /// Returns the entry distance and the normal of the entry edge. An origin
    /// inside or on the polygon returns distance zero and a normal facing back
    /// along the ray.
    fn cast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        if self.vertices.len() < 3 {
            return None;
        }

        let mut t_enter = 0.0_f32;
        let mut t_exit = max_distance;
        let mut entry_normal = None;

        for (i, &a) in self.vertices.iter().enumerate() {
            let b = self.vertices[(i + 1) % self.vertices.len()];
            let edge = b - a;
            let normal = Vec2::new(edge.y, -edge.x).normalize_or_zero();
            if normal == Vec2::ZERO {
                continue;
            }

            // Positive when the origin is on the inner side of this edge.
            let inside = normal.dot(a - origin);
            let approach = normal.dot(direction);

            if approach == 0.0 {
                if inside < 0.0 {
                    return None;
                }
                continue;
            }

            let t = inside / approach;
            if approach < 0.0 {
                if t > t_enter {
                    t_enter = t;
                    entry_normal = Some(normal);
                }
            } else if t < t_exit {
                t_exit = t;
            }

            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, entry_normal.unwrap_or(-direction)))
    }
}

/// Twice the signed area; positive for counter-clockwise polygons.
fn signed_area(vertices: &[Vec2]) -> f32 {
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum()
}

/// Static level geometry queried by [`StaticGeometryBackend`].
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct StaticGeometry {
    bodies: Vec<StaticBody>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a body.
    pub fn with_body(mut self, body: StaticBody) -> Self {
        self.bodies.push(body);
        self
    }

    /// Add a body.
    pub fn insert(&mut self, body: StaticBody) {
        self.bodies.push(body);
    }

    /// Remove every body.
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn bodies(&self) -> &[StaticBody] {
        &self.bodies
    }
}

impl RayCaster for StaticGeometry {
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData> {
        self.bodies
            .iter()
            .filter(|body| request.mask.matches(body.layers))
            .filter_map(|body| {
                body.cast(request.origin, request.direction, request.max_distance)
                    .map(|(distance, normal)| (distance, normal, body.surface))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, normal, surface)| {
                CollisionData::new(distance, normal, request.point_at(distance), None)
                    .with_surface(surface)
            })
    }
}

/// Axis-aligned collision box of an actor, centered on its `Transform`.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct KinematicBox {
    pub half_extents: Vec2,
}

impl KinematicBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(width, height) * 0.5,
        }
    }

    /// World-space bounds for an actor at `transform`.
    pub fn bounds(&self, transform: &Transform) -> Rect {
        Rect::from_center_half_size(transform.translation.truncate(), self.half_extents)
    }
}

impl Default for KinematicBox {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// An actor's box and the transform that carries it.
pub struct BoxBody<'a> {
    pub shape: &'a KinematicBox,
    pub transform: &'a mut Transform,
}

impl KinematicBody for BoxBody<'_> {
    fn bounding_box(&self) -> Rect {
        self.shape.bounds(self.transform)
    }

    fn translate(&mut self, displacement: Vec2) {
        self.transform.translation += displacement.extend(0.0);
    }
}

/// Backend that resolves against the [`StaticGeometry`] resource.
pub struct StaticGeometryBackend;

impl RaycastBackend for StaticGeometryBackend {
    fn plugin() -> impl Plugin {
        StaticGeometryBackendPlugin
    }
}

/// Plugin that sets up the static geometry backend.
pub struct StaticGeometryBackendPlugin;

impl Plugin for StaticGeometryBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StaticGeometry>();
        app.register_type::<StaticGeometry>();
        app.register_type::<KinematicBox>();

        app.add_systems(
            FixedUpdate,
            resolve_static_moves.in_set(RaycastControllerSet::Resolve),
        );
    }
}

/// Resolve every pending [`MoveRequest`] against [`StaticGeometry`].
pub fn resolve_static_moves(
    time: Res<Time<Fixed>>,
    geometry: Res<StaticGeometry>,
    mut q_actors: Query<(
        &mut RaycastController,
        &mut MoveRequest,
        &KinematicBox,
        &mut Transform,
    )>,
) {
    let now = time.elapsed_secs();

    for (mut controller, mut request, shape, mut transform) in &mut q_actors {
        let mut body = BoxBody {
            shape,
            transform: &mut *transform,
        };
        apply_resolution(&mut controller, &mut request, &mut body, &*geometry, now);
    }
}
