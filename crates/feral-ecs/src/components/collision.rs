//! Bounds, terrain and obstacle queries shared by every creature in a world.
//!
//! All queries are read-only. Obstacles are passed in per call as a slice so the
//! same list can be shared by every creature during a tick. Malformed obstacles
//! (non-finite or inverted bounds) are skipped rather than reported.

use crate::Component;
use crate::errors::{SimulationError, SimulationResult};
use cgmath::{Vector2, Vector3};
use feral_core::config::{Pond, WorldConfig};
use feral_macro::Component;
use log::trace;
use rand::Rng;
use std::f32::consts::TAU;
use std::fmt::Debug;

/// How far above the entity a ground probe starts.
pub const GROUND_RAY_HEADROOM: f32 = 2.0;

const UNSTUCK_ATTEMPTS: usize = 8;
const UNSTUCK_MIN_RADIUS: f32 = 1.0;
const UNSTUCK_MAX_RADIUS: f32 = 4.0;
const RAY_PARALLEL_EPSILON: f32 = 1e-6;

/// Collision participation of an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    /// Rocks, trunks, walls. Blocks movement and can be stood on.
    Hard,
    /// Bushes, tall grass. Never blocks.
    Soft,
    /// Walkable meshes such as bridges and platforms. Only raises the ground.
    Ground,
    /// Other creatures' hit volumes. Ignored by movement.
    Creature,
}

impl ObstacleKind {
    /// Whether this kind takes part in box collision tests.
    pub fn blocks_movement(self) -> bool {
        matches!(self, ObstacleKind::Hard)
    }
}

/// Shape of an obstacle projected onto the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Footprint {
    /// The XZ extent of the bounding box.
    Box,
    /// A circle around the bounding box centre.
    Circle { radius: f32 },
}

/// World-space axis aligned bounding box.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AABBCollisionBox {
    /// Minimum point - front lower left corner of the box
    pub min: Vector3<f32>,
    /// Maximum point - back upper right corner of the box
    pub max: Vector3<f32>,
}

impl AABBCollisionBox {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Creates a box from its centre and full size.
    pub fn from_center_size(center: Vector3<f32>, size: Vector3<f32>) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box occupied by an entity whose feet are at `pos`.
    ///
    /// # Arguments
    ///
    /// * `pos` - Feet position, the box is centred on its x and z.
    /// * `size` - Full width, height and depth of the entity.
    pub fn for_entity(pos: Vector3<f32>, size: Vector3<f32>) -> Self {
        Self {
            min: Vector3::new(pos.x - size.x * 0.5, pos.y, pos.z - size.z * 0.5),
            max: Vector3::new(pos.x + size.x * 0.5, pos.y + size.y, pos.z + size.z * 0.5),
        }
    }

    /// Whether the bounds are finite and not inverted.
    pub fn is_valid(&self) -> bool {
        let finite = [self.min, self.max]
            .iter()
            .all(|v| v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
        finite && self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Strict overlap test. Boxes that only touch do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Whether the point lies inside the XZ projection of the box.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    /// Whether a vertical span strictly overlaps the box's height range.
    pub fn overlaps_y(&self, bottom: f32, top: f32) -> bool {
        bottom < self.max.y && top > self.min.y
    }

    /// Copy of the box grown on the X and Z axes.
    pub fn inflated_xz(&self, half_x: f32, half_z: f32) -> Self {
        Self {
            min: Vector3::new(self.min.x - half_x, self.min.y, self.min.z - half_z),
            max: Vector3::new(self.max.x + half_x, self.max.y, self.max.z + half_z),
        }
    }

    /// Slab test of a horizontal segment against the XZ projection of the box.
    ///
    /// # Arguments
    ///
    /// * `origin` - Start of the segment.
    /// * `dir_x`, `dir_z` - Unit direction of the segment.
    /// * `length` - Length of the segment.
    ///
    /// # Returns
    ///
    /// `true` if the segment passes through the interior of the box. Segments
    /// that only graze a face do not count.
    pub fn segment_hits_xz(
        &self,
        origin: Vector3<f32>,
        dir_x: f32,
        dir_z: f32,
        length: f32,
    ) -> bool {
        let mut t_min = 0.0_f32;
        let mut t_max = length;

        for (o, d, lo, hi) in [
            (origin.x, dir_x, self.min.x, self.max.x),
            (origin.z, dir_z, self.min.z, self.max.z),
        ] {
            if d.abs() < RAY_PARALLEL_EPSILON {
                if o <= lo || o >= hi {
                    return false;
                }
                continue;
            }
            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min >= t_max {
                return false;
            }
        }

        t_min < t_max
    }
}

/// A static piece of geometry creatures have to respect.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// World-space bounds.
    pub bounds: AABBCollisionBox,
    /// Collision participation.
    pub kind: ObstacleKind,
    /// Shape used when the obstacle raises the ground.
    pub footprint: Footprint,
    /// Landmarks attract patrol waypoints.
    pub landmark: bool,
}

impl Obstacle {
    pub fn new(bounds: AABBCollisionBox, kind: ObstacleKind) -> Self {
        Self {
            bounds,
            kind,
            footprint: Footprint::Box,
            landmark: false,
        }
    }

    /// A hard box resting on `base_y`.
    pub fn hard_box(center: Vector2<f32>, size: Vector3<f32>, base_y: f32) -> Self {
        let bounds = AABBCollisionBox::new(
            Vector3::new(center.x - size.x * 0.5, base_y, center.y - size.z * 0.5),
            Vector3::new(center.x + size.x * 0.5, base_y + size.y, center.y + size.z * 0.5),
        );
        Self::new(bounds, ObstacleKind::Hard)
    }

    /// A hard cylinder such as a tree trunk or a boulder, resting on `base_y`.
    pub fn hard_cylinder(center: Vector2<f32>, radius: f32, height: f32, base_y: f32) -> Self {
        let bounds = AABBCollisionBox::new(
            Vector3::new(center.x - radius, base_y, center.y - radius),
            Vector3::new(center.x + radius, base_y + height, center.y + radius),
        );
        Self {
            footprint: Footprint::Circle { radius },
            ..Self::new(bounds, ObstacleKind::Hard)
        }
    }

    /// A walkable platform whose top surface is at `top_y`.
    pub fn ground_platform(
        center: Vector2<f32>,
        width: f32,
        depth: f32,
        top_y: f32,
        thickness: f32,
    ) -> Self {
        let bounds = AABBCollisionBox::new(
            Vector3::new(center.x - width * 0.5, top_y - thickness, center.y - depth * 0.5),
            Vector3::new(center.x + width * 0.5, top_y, center.y + depth * 0.5),
        );
        Self::new(bounds, ObstacleKind::Ground)
    }

    pub fn with_kind(mut self, kind: ObstacleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn as_landmark(mut self) -> Self {
        self.landmark = true;
        self
    }

    /// Whether the XZ point lies on the obstacle's footprint.
    pub fn footprint_contains(&self, x: f32, z: f32) -> bool {
        match self.footprint {
            Footprint::Box => self.bounds.contains_xz(x, z),
            Footprint::Circle { radius } => {
                let center = self.bounds.center();
                let dx = x - center.x;
                let dz = z - center.z;
                dx * dx + dz * dz <= radius * radius
            }
        }
    }

    /// Rough XZ radius of the footprint, used to place points around landmarks.
    pub fn footprint_radius(&self) -> f32 {
        match self.footprint {
            Footprint::Box => {
                let dx = self.bounds.max.x - self.bounds.min.x;
                let dz = self.bounds.max.z - self.bounds.min.z;
                0.5 * (dx * dx + dz * dz).sqrt()
            }
            Footprint::Circle { radius } => radius,
        }
    }
}

/// Source of the analytic terrain height.
pub trait Terrain: Debug + Send + Sync {
    /// Height of the terrain surface at the XZ point.
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Terrain at a constant height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain(pub f32);

impl Terrain for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// Flat terrain with paraboloid depressions for ponds.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticTerrain {
    pub base_height: f32,
    pub ponds: Vec<Pond>,
}

impl AnalyticTerrain {
    pub fn new(base_height: f32, ponds: Vec<Pond>) -> Self {
        Self { base_height, ponds }
    }

    fn pond_depression(pond: &Pond, x: f32, z: f32) -> f32 {
        if pond.radius <= 0.0 {
            return 0.0;
        }
        let dx = x - pond.center.x;
        let dz = z - pond.center.y;
        let normalized = (dx * dx + dz * dz) / (pond.radius * pond.radius);
        if normalized >= 1.0 {
            0.0
        } else {
            pond.depth * (1.0 - normalized)
        }
    }
}

impl From<&WorldConfig> for AnalyticTerrain {
    fn from(config: &WorldConfig) -> Self {
        Self::new(config.base_height, config.ponds.clone())
    }
}

impl Terrain for AnalyticTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        // overlapping ponds do not stack, the deepest one wins
        let depression = self
            .ponds
            .iter()
            .map(|pond| Self::pond_depression(pond, x, z))
            .fold(0.0_f32, f32::max);
        self.base_height - depression
    }
}

/// Playable area on the XZ plane.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldBounds {
    /// Square centred on the origin.
    Square { half_extent: f32 },
    /// Closed land polygon, vertices in order.
    Polygon(Vec<Vector2<f32>>),
}

impl WorldBounds {
    /// Builds and validates the bounds described by a world configuration.
    ///
    /// # Returns
    ///
    /// The bounds, or [`SimulationError::InvalidBounds`] when the square is
    /// empty or the polygon is degenerate.
    pub fn from_config(config: &WorldConfig) -> SimulationResult<Self> {
        match &config.land {
            Some(vertices) => {
                if vertices.len() < 3 {
                    return Err(SimulationError::InvalidBounds(format!(
                        "land polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
                    return Err(SimulationError::InvalidBounds(
                        "land polygon has non-finite vertices".to_string(),
                    ));
                }
                Ok(WorldBounds::Polygon(vertices.clone()))
            }
            None => {
                if !(config.half_extent.is_finite() && config.half_extent > 0.0) {
                    return Err(SimulationError::InvalidBounds(format!(
                        "half extent must be positive, got {}",
                        config.half_extent
                    )));
                }
                Ok(WorldBounds::Square {
                    half_extent: config.half_extent,
                })
            }
        }
    }

    /// Whether the XZ point is inside the area and at least `margin` from its edge.
    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        if !x.is_finite() || !z.is_finite() {
            return false;
        }
        match self {
            WorldBounds::Square { half_extent } => {
                let limit = half_extent - margin;
                x.abs() <= limit && z.abs() <= limit
            }
            WorldBounds::Polygon(vertices) => {
                point_in_polygon(vertices, x, z)
                    && (margin <= 0.0 || distance_to_polygon_edges(vertices, x, z) >= margin)
            }
        }
    }

    /// Axis aligned XZ rectangle enclosing the area, as `(min, max)`.
    pub fn extent(&self) -> (Vector2<f32>, Vector2<f32>) {
        match self {
            WorldBounds::Square { half_extent } => (
                Vector2::new(-half_extent, -half_extent),
                Vector2::new(*half_extent, *half_extent),
            ),
            WorldBounds::Polygon(vertices) => vertices.iter().fold(
                (
                    Vector2::new(f32::INFINITY, f32::INFINITY),
                    Vector2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
                ),
                |(lo, hi), v| {
                    (
                        Vector2::new(lo.x.min(v.x), lo.y.min(v.y)),
                        Vector2::new(hi.x.max(v.x), hi.y.max(v.y)),
                    )
                },
            ),
        }
    }

    /// Uniformly samples a point inside the area by rejection.
    pub fn sample_point(&self, rng: &mut impl Rng, margin: f32) -> Option<Vector2<f32>> {
        let (lo, hi) = self.extent();
        if !(lo.x < hi.x && lo.y < hi.y) {
            return None;
        }
        for _ in 0..32 {
            let x = rng.random_range(lo.x..hi.x);
            let z = rng.random_range(lo.y..hi.y);
            if self.contains(x, z, margin) {
                return Some(Vector2::new(x, z));
            }
        }
        None
    }
}

fn point_in_polygon(vertices: &[Vector2<f32>], x: f32, z: f32) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > z) != (b.y > z) {
            let cross_x = (b.x - a.x) * (z - a.y) / (b.y - a.y) + a.x;
            if x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn distance_to_polygon_edges(vertices: &[Vector2<f32>], x: f32, z: f32) -> f32 {
    let p = Vector2::new(x, z);
    let mut best = f32::INFINITY;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let ab = b - a;
        let len2 = ab.x * ab.x + ab.y * ab.y;
        let t = if len2 > 0.0 {
            (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = a + ab * t;
        let d = ((p.x - closest.x).powi(2) + (p.y - closest.y).powi(2)).sqrt();
        best = best.min(d);
    }
    best
}

/// Half of the larger horizontal dimension of an entity, used as bounds margin.
pub fn footprint_margin(size: Vector3<f32>) -> f32 {
    0.5 * size.x.max(size.z)
}

/// Bounds, terrain and obstacle queries for one world.
#[derive(Debug)]
pub struct CollisionQuery {
    bounds: WorldBounds,
    terrain: Box<dyn Terrain>,
}

impl CollisionQuery {
    /// Creates a query over the given bounds and terrain.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The playable area.
    /// * `terrain` - The analytic height source.
    ///
    /// # Returns
    ///
    /// A new [`CollisionQuery`] instance.
    pub fn new(bounds: WorldBounds, terrain: Box<dyn Terrain>) -> Self {
        Self { bounds, terrain }
    }

    /// Creates a query from a world configuration, with [`AnalyticTerrain`].
    pub fn from_config(config: &WorldConfig) -> SimulationResult<Self> {
        let bounds = WorldBounds::from_config(config)?;
        Ok(Self::new(bounds, Box::new(AnalyticTerrain::from(config))))
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Analytic terrain height, without obstacles.
    pub fn terrain_height(&self, x: f32, z: f32) -> f32 {
        self.terrain.height_at(x, z)
    }

    /// Checks if a position is inside the world, at least `margin` away from the edge.
    pub fn is_within_bounds(&self, pos: Vector3<f32>, margin: f32) -> bool {
        self.bounds.contains(pos.x, pos.z, margin)
    }

    /// Checks if an entity box at `pos` overlaps any blocking obstacle.
    ///
    /// # Arguments
    ///
    /// * `pos` - Feet position of the entity.
    /// * `size` - Full size of the entity box.
    /// * `obstacles` - Obstacles to test. Soft, ground and creature obstacles never block.
    ///
    /// # Returns
    ///
    /// `true` if the box intersects a hard obstacle.
    pub fn check_box_collision(
        &self,
        pos: Vector3<f32>,
        size: Vector3<f32>,
        obstacles: &[Obstacle],
    ) -> bool {
        let entity_box = AABBCollisionBox::for_entity(pos, size);
        obstacles
            .iter()
            .filter(|o| o.kind.blocks_movement() && o.bounds.is_valid())
            .any(|o| o.bounds.intersects(&entity_box))
    }

    /// Resolves the height of the ground under a position.
    ///
    /// Starts from the analytic terrain, then raises it to the top of any ground
    /// mesh or hard obstacle a downward probe from [`GROUND_RAY_HEADROOM`] above
    /// `pos` would hit. Anything topping out above the probe start is overhead.
    pub fn get_ground_height(&self, pos: Vector3<f32>, obstacles: &[Obstacle]) -> f32 {
        let mut height = self.terrain.height_at(pos.x, pos.z);
        let probe_start = pos.y + GROUND_RAY_HEADROOM;

        for obstacle in obstacles.iter().filter(|o| o.bounds.is_valid()) {
            let top = obstacle.bounds.max.y;
            if top > probe_start {
                continue;
            }
            match obstacle.kind {
                ObstacleKind::Ground => {
                    if obstacle.bounds.contains_xz(pos.x, pos.z) {
                        height = height.max(top);
                    }
                }
                ObstacleKind::Hard => {
                    if obstacle.footprint_contains(pos.x, pos.z) {
                        height = height.max(top);
                    }
                }
                ObstacleKind::Soft | ObstacleKind::Creature => {}
            }
        }

        height
    }

    /// Casts a horizontal sensor ray from an entity and reports whether it is blocked.
    ///
    /// The ray is swept with the entity's half extent, so a clear ray means the
    /// whole body fits along it.
    pub fn ray_blocked(
        &self,
        origin: Vector3<f32>,
        heading: f32,
        size: Vector3<f32>,
        obstacles: &[Obstacle],
        distance: f32,
    ) -> bool {
        if distance <= 0.0 || !distance.is_finite() {
            return false;
        }
        let (dir_x, dir_z) = (heading.sin(), heading.cos());
        let top = origin.y + size.y;

        let blocked_by_obstacle = obstacles
            .iter()
            .filter(|o| o.kind.blocks_movement() && o.bounds.is_valid())
            .filter(|o| o.bounds.overlaps_y(origin.y, top))
            .any(|o| {
                o.bounds
                    .inflated_xz(size.x * 0.5, size.z * 0.5)
                    .segment_hits_xz(origin, dir_x, dir_z, distance)
            });
        if blocked_by_obstacle {
            return true;
        }

        let end = Vector3::new(origin.x + dir_x * distance, origin.y, origin.z + dir_z * distance);
        !self.is_within_bounds(end, footprint_margin(size))
    }

    /// Searches for a free spot near `origin` for an entity that cannot move.
    ///
    /// # Arguments
    ///
    /// * `origin` - Current feet position.
    /// * `size` - Full size of the entity box.
    /// * `obstacles` - Obstacles to respect.
    /// * `rng` - Random source for the sampled offsets.
    ///
    /// # Returns
    ///
    /// The first valid candidate with its ground height resolved, if any of the
    /// sampled offsets fits.
    pub fn find_unstuck_position(
        &self,
        origin: Vector3<f32>,
        size: Vector3<f32>,
        obstacles: &[Obstacle],
        rng: &mut impl Rng,
    ) -> Option<Vector3<f32>> {
        let margin = footprint_margin(size);

        for attempt in 0..UNSTUCK_ATTEMPTS {
            let angle = rng.random_range(0.0..TAU);
            let radius = rng.random_range(UNSTUCK_MIN_RADIUS..=UNSTUCK_MAX_RADIUS);
            let mut candidate = Vector3::new(
                origin.x + angle.sin() * radius,
                origin.y,
                origin.z + angle.cos() * radius,
            );

            if !self.is_within_bounds(candidate, margin) {
                continue;
            }
            let ground = self.get_ground_height(candidate, obstacles);
            if !ground.is_finite() {
                continue;
            }
            candidate.y = ground;
            if self.check_box_collision(candidate, size, obstacles) {
                continue;
            }

            trace!("Unstuck candidate found on attempt {attempt}: {candidate:?}");
            return Some(candidate);
        }

        None
    }
}
