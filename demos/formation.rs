//! Headless formation demo
//!
//! Drives the engine against a synthetic ring image and logs stage
//! transitions and metrics. Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example formation
//! ```

use anyhow::Result;
use log::info;
use stipple::prelude::*;

/// Builds a ring silhouette so the formed image is visually obvious even
/// in a numeric dump
fn ring_image(size: usize) -> Result<PixelGrid> {
    let mut rgb = Vec::with_capacity(size * size);
    let center = size as f32 / 2.0;
    let outer = size as f32 * 0.45;
    let inner = size as f32 * 0.30;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= outer && d >= inner {
                rgb.push([240, 196, 64]);
            } else {
                rgb.push([8, 8, 16]);
            }
        }
    }
    Ok(PixelGrid::new(size, size, rgb)?)
}

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::new()
        .with_density(DensityTier::Low)
        .with_speed(SpeedProfile::Normal)
        .with_burst_waves(3)
        .with_breathing_amplitude(0.02)
        .build()?;

    let grid = ring_image(128)?;
    let mut engine = SimulationEngine::new(settings);
    engine.init(&grid, 0.0)?;
    engine.start(0.0)?;

    let dt = 1.0 / 60.0;
    let mut now = 0.0;
    let mut last_stage = engine.stage();

    // 30 simulated seconds is enough to reach the final idle
    for frame in 0..1_800 {
        now += dt;
        let metrics = engine.step(now)?;

        if metrics.stage != last_stage {
            info!(
                "[{:7.2}s] {} -> {} (recognition {:.3}, energy {:.4})",
                now,
                last_stage.name(),
                metrics.stage.name(),
                metrics.recognition,
                metrics.chaos_energy
            );
            last_stage = metrics.stage;
        }

        if frame % 120 == 0 {
            println!(
                "t={:6.2}s stage={:<15} recognition={:.3} energy={:.4} fps={:.0} compute={:.2}ms",
                now,
                metrics.stage.name(),
                metrics.recognition,
                metrics.chaos_energy,
                metrics.fps,
                metrics.frame_compute_ms
            );
        }
    }

    let snapshot = engine.snapshot(Some(5))?;
    println!("final sample positions:");
    for (p, t) in snapshot.position.iter().zip(&snapshot.target) {
        println!(
            "  ({:.3}, {:.3}) -> target ({:.3}, {:.3})",
            p.x, p.y, t.x, t.y
        );
    }

    Ok(())
}
