//! Scripted demonstration of the Upland Hunt simulation.
//!
//! Run with: cargo run --example hunt_demo

use upland_sim::profiler::Profiler;
use upland_sim::{DogCommand, SimWorld};

fn main() {
    println!("=== Upland Hunt - Simulation Demo ===\n");

    let mut sim = SimWorld::new_default_hunt();
    let mut profiler = Profiler::new();

    println!("Initial state:");
    print_snapshot(&mut sim);

    // Walk toward the nearest cover with the dog quartering ahead.
    println!("\n--- Walking out with the dog searching ---\n");
    sim.set_movement(0.0, 1.0);
    sim.set_run(true);
    sim.command_dog(DogCommand::Search);

    for tick in 0..60 * 20 {
        profiler.time_section("step", || sim.step(1.0 / 60.0));
        profiler.tick();

        // Print state every 5 seconds.
        if (tick + 1) % (60 * 5) == 0 {
            println!(
                "--- Tick {} (t={:.1}s) ---",
                sim.current_tick(),
                sim.current_time()
            );
            print_snapshot(&mut sim);
        }
    }

    // Take a shot at whatever is airborne.
    println!("\n--- Firing at the flock ---\n");
    let target = {
        let snap = profiler.time_section("snapshot", || sim.snapshot());
        snap.birds.iter().find(|b| b.flying).map(|b| b.position)
    };
    if let Some([x, y, z]) = target {
        let eye = {
            let p = sim.snapshot().player.position;
            [p[0], p[1] + 1.7, p[2]]
        };
        let mut dir = [x - eye[0], y - eye[1], z - eye[2]];
        let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        if len > 0.0 {
            dir = [dir[0] / len, dir[1] / len, dir[2] / len];
        }
        sim.set_aim_ray(eye, dir);
        sim.request_shoot();
    } else {
        println!("(nothing flying yet)");
        sim.request_shoot();
    }
    sim.set_movement(0.0, 0.0);
    sim.set_run(false);

    // Give the dog time to retrieve and deliver.
    for _ in 0..60 * 15 {
        profiler.time_section("step", || sim.step(1.0 / 60.0));
        profiler.tick();
    }

    println!("Final score: {}", sim.score());
    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => println!("snapshot serialization failed: {}", e),
    }

    #[cfg(feature = "profile")]
    profiler.print_summary();
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();

    let p = &snapshot.player;
    println!(
        "  Player: pos=({:.1}, {:.1}, {:.1}) ammo={}/{} stamina={:.0} score={}",
        p.position[0], p.position[1], p.position[2], p.ammo, p.max_ammo, p.stamina, snapshot.score
    );
    let d = &snapshot.dog;
    println!(
        "  Dog:    pos=({:.1}, {:.1}, {:.1}) state={} carrying={}",
        d.position[0], d.position[1], d.position[2], d.state, d.carrying
    );
    println!("  Birds ({}):", snapshot.birds.len());
    for bird in &snapshot.birds {
        let phase = if bird.shot {
            "shot"
        } else if bird.flying {
            "flying"
        } else if bird.flushed {
            "landed"
        } else {
            "hidden"
        };
        println!(
            "    Bird {}: pos=({:.1}, {:.1}, {:.1}) [{}]",
            bird.id, bird.position[0], bird.position[1], bird.position[2], phase
        );
    }
}
