//! Terminal demo: carve a random terraced terrain, load it chunk by chunk,
//! and answer a handful of path queries, logging costs and search counters.
//!
//! Run with `RUST_LOG=debug` to watch chunks register and seams connect.

use rand::{RngExt, SeedableRng, rngs::StdRng};
use strata_core::{Point, Point3, VoxelWorld, WorldDims};
use strata_nav::{NavConfig, Pathfinder};

const CHUNKS_X: i32 = 4;
const CHUNKS_Z: i32 = 4;
const CHUNK_SIZE: i32 = 16;
const WORLD_HEIGHT: i32 = 16;

/// Heightmap terrain: every column is solid up to its height. A bounded
/// random walk over rows keeps neighboring columns within one step of each
/// other, so most of the map stays mutually walkable.
struct Terraces {
    width: i32,
    depth: i32,
    heights: Vec<i32>,
}

impl Terraces {
    fn generate(width: i32, depth: i32, rng: &mut StdRng) -> Self {
        let mut heights = vec![0i32; (width * depth) as usize];
        for z in 0..depth {
            for x in 0..width {
                let west = (x > 0).then(|| heights[(z * width + x - 1) as usize]);
                let north = (z > 0).then(|| heights[((z - 1) * width + x) as usize]);
                let anchor = match (west, north) {
                    (Some(w), Some(n)) => {
                        if rng.random_range(0..2) == 0 {
                            w
                        } else {
                            n
                        }
                    }
                    (Some(w), None) => w,
                    (None, Some(n)) => n,
                    (None, None) => 4,
                };
                let h = (anchor + rng.random_range(-1..=1)).clamp(1, WORLD_HEIGHT - 3);
                heights[(z * width + x) as usize] = h;
            }
        }
        Self {
            width,
            depth,
            heights,
        }
    }

    fn surface_y(&self, x: i32, z: i32) -> i32 {
        self.heights[(z * self.width + x) as usize] - 1
    }
}

impl VoxelWorld for Terraces {
    fn is_solid(&self, p: Point3) -> bool {
        if p.x < 0 || p.z < 0 || p.x >= self.width || p.z >= self.depth {
            return true;
        }
        p.y < self.heights[(p.z * self.width + p.x) as usize]
    }

    fn height(&self) -> i32 {
        WORLD_HEIGHT
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xa11ce);
    let mut rng = StdRng::seed_from_u64(seed);

    let width = CHUNKS_X * CHUNK_SIZE;
    let depth = CHUNKS_Z * CHUNK_SIZE;
    let world = Terraces::generate(width, depth, &mut rng);

    let config = NavConfig {
        dims: WorldDims {
            chunk_width: CHUNK_SIZE,
            chunk_depth: CHUNK_SIZE,
            height: WORLD_HEIGHT,
        },
        ..NavConfig::default()
    };
    let mut pathfinder = Pathfinder::new(&world, config);
    for cz in 0..CHUNKS_Z {
        for cx in 0..CHUNKS_X {
            pathfinder.register_chunk(Point::new(cx, cz));
        }
    }

    println!("terraced world {width}x{depth}, seed {seed:#x}");
    let mut found = 0;
    for i in 0..10 {
        let (sx, sz) = (rng.random_range(0..width), rng.random_range(0..depth));
        let (gx, gz) = (rng.random_range(0..width), rng.random_range(0..depth));
        let start = Point3::new(sx, world.surface_y(sx, sz), sz);
        let goal = Point3::new(gx, world.surface_y(gx, gz), gz);

        let path = pathfinder.find_path(start, goal);
        let stats = pathfinder.last_stats();
        if path.is_valid() {
            found += 1;
            let cost = path.cost_with(|r| {
                pathfinder
                    .chunk(r.chunk)
                    .map(|c| c.surface(r.id).pos)
                    .unwrap_or(start)
            });
            log::info!(
                "query {i}: {start} -> {goal}: {} steps, cost {cost:.1} \
                 ({} nodes, {} cache hits, {} sub-paths spliced)",
                path.len(),
                stats.nodes_expanded,
                stats.cache_hits,
                stats.subpaths_spliced,
            );
        } else {
            log::info!(
                "query {i}: {start} -> {goal}: unreachable ({} nodes)",
                stats.nodes_expanded
            );
        }
    }
    println!("{found}/10 queries routed");
}
