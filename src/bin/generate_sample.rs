use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Centre of the generated crashes (Leeds).
const CENTER: [f64; 2] = [-1.5491, 53.8008];

const SEVERITIES: [(&str, f64); 3] = [("Slight", 0.8), ("Serious", 0.18), ("Fatal", 0.02)];
const CASUALTY_TYPES: [&str; 3] = ["Pedestrian", "Cyclist", "Driver"];
const SPEED_LIMITS: [f64; 5] = [20.0, 30.0, 40.0, 50.0, 70.0];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn severity(rng: &mut SimpleRng) -> &'static str {
    let mut r = rng.next_f64();
    for (name, p) in SEVERITIES {
        if r < p {
            return name;
        }
        r -= p;
    }
    SEVERITIES[0].0
}

fn crash(rng: &mut SimpleRng, id: usize) -> Value {
    // Crashes cluster around a few hot spots along the main roads.
    let hotspot = rng.next_u64() % 6;
    let lon = CENTER[0] + hotspot as f64 * 0.01 - 0.025 + rng.gauss(0.0, 0.008);
    let lat = CENTER[1] + (hotspot % 3) as f64 * 0.008 - 0.008 + rng.gauss(0.0, 0.005);
    let year = 2010 + rng.next_u64() % 10;
    let month = 1 + rng.next_u64() % 12;
    let day = 1 + rng.next_u64() % 28;

    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [(lon * 1e5).round() / 1e5, (lat * 1e5).round() / 1e5],
        },
        "properties": {
            "accident_index": format!("{year}13{id:06}"),
            "accident_severity": severity(rng),
            "date": format!("{year}-{month:02}-{day:02}"),
            "casualty_type": rng.pick(&CASUALTY_TYPES),
            "speed_limit": rng.pick(&SPEED_LIMITS),
            "number_of_vehicles": 1 + rng.next_u64() % 3,
        },
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let count: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("count must be a number")?,
        None => 2000,
    };

    let mut rng = SimpleRng::new(42);
    let features: Vec<Value> = (0..count).map(|i| crash(&mut rng, i)).collect();
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    let out_path = "sample_crashes.geojson";
    let file = File::create(out_path).with_context(|| format!("creating {out_path}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &collection)?;

    log::info!("Wrote {count} crashes to {out_path}");
    println!("Generated {out_path} ({count} crashes)");
    Ok(())
}
