use crate::Dt;
use cgmath::Vector2;
use log::warn;
use std::str::FromStr;

const DEFAULT_TICK_RATE_HZ: u32 = 60;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_TICKS: u32 = 1800;
const DEFAULT_HALF_EXTENT: f32 = 60.0;

/// Runtime configuration of a simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed tick rate of the simulation loop.
    pub tick_rate_hz: u32,
    /// Seed for every random source in the world.
    pub seed: u64,
    /// Number of ticks the headless runner executes.
    pub ticks: u32,
    /// Static description of the world.
    pub world: WorldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            seed: DEFAULT_SEED,
            ticks: DEFAULT_TICKS,
            world: WorldConfig::default(),
        }
    }
}

impl Config {
    /// Builds a configuration from `FERAL_*` environment variables.
    ///
    /// Recognised variables are `FERAL_SEED`, `FERAL_TICKS` and `FERAL_TICK_HZ`.
    /// Missing variables keep their defaults, malformed ones are reported and ignored.
    ///
    /// # Returns
    ///
    /// A new [`Config`] instance.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.seed = env_or("FERAL_SEED", config.seed);
        config.ticks = env_or("FERAL_TICKS", config.ticks);
        config.tick_rate_hz = env_or("FERAL_TICK_HZ", config.tick_rate_hz).max(1);
        config
    }

    /// Duration of a single simulation tick.
    pub fn dt(&self) -> Dt {
        Dt::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed {key}={raw:?}");
            default
        }),
        Err(_) => default,
    }
}

/// A circular pond carved into the terrain as a paraboloid depression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pond {
    /// Centre of the pond on the XZ plane.
    pub center: Vector2<f32>,
    /// Radius at which the depression meets the surrounding terrain.
    pub radius: f32,
    /// Depth at the centre.
    pub depth: f32,
}

impl Pond {
    pub fn new(center: Vector2<f32>, radius: f32, depth: f32) -> Self {
        Self {
            center,
            radius,
            depth,
        }
    }
}

/// Static description of the playable area.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Half of the side length of the square world, centred on the origin.
    pub half_extent: f32,
    /// Optional land polygon on the XZ plane. When present it replaces the square.
    pub land: Option<Vec<Vector2<f32>>>,
    /// Height of the flat terrain outside of ponds.
    pub base_height: f32,
    /// Ponds carved into the terrain.
    pub ponds: Vec<Pond>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            half_extent: DEFAULT_HALF_EXTENT,
            land: None,
            base_height: 0.0,
            ponds: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// Square world of the given half extent with flat terrain.
    pub fn square(half_extent: f32) -> Self {
        WorldConfig {
            half_extent,
            ..Default::default()
        }
    }

    pub fn with_land(mut self, land: Vec<Vector2<f32>>) -> Self {
        self.land = Some(land);
        self
    }

    pub fn with_pond(mut self, pond: Pond) -> Self {
        self.ponds.push(pond);
        self
    }
}
