use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use saloon_core::SeededRandom;
use saloon_games::duel::{CHAMBERS, Seat, simulate};

fn share(count: u32, total: u32) -> String {
    format!("{:.1}%", f64::from(count) * 100.0 / f64::from(total))
}

pub fn run(duels: u32, seed: u64) -> Result<(), String> {
    if duels == 0 {
        return Err("nothing to simulate: --duels must be at least 1".into());
    }

    let mut rng = SeededRandom::from_seed(seed);
    let mut by_chamber = vec![0u32; CHAMBERS as usize];
    let mut challenger_first = 0u32;
    let mut challenger_eliminated = 0u32;
    let mut first_shooter_eliminated = 0u32;
    let mut rounds = 0u64;

    for _ in 0..duels {
        let sim = simulate(&mut rng);
        if let Some(slot) = by_chamber.get_mut(sim.bullet as usize - 1) {
            *slot += 1;
        }
        if sim.first == Seat::Challenger {
            challenger_first += 1;
        }
        if sim.eliminated() == Seat::Challenger {
            challenger_eliminated += 1;
        }
        if sim.eliminated() == sim.first {
            first_shooter_eliminated += 1;
        }
        rounds += sim.rounds.len() as u64;
    }

    println!(
        "  {} {}",
        "Simulation".bold(),
        format!("({duels} duels, seed={seed})").dimmed()
    );
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Bullet chamber", "Duels", "Share"]);
    for (i, count) in by_chamber.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            count.to_string(),
            share(*count, duels),
        ]);
    }
    println!("{table}");
    println!();

    let mut summary = Table::new();
    summary.set_content_arrangement(ContentArrangement::Dynamic);
    summary.set_header(vec!["Outcome", "Duels", "Share"]);
    summary.add_row(vec![
        "Challenger shot first".to_string(),
        challenger_first.to_string(),
        share(challenger_first, duels),
    ]);
    summary.add_row(vec![
        "Challenger eliminated".to_string(),
        challenger_eliminated.to_string(),
        share(challenger_eliminated, duels),
    ]);
    summary.add_row(vec![
        "First shooter eliminated".to_string(),
        first_shooter_eliminated.to_string(),
        share(first_shooter_eliminated, duels),
    ]);
    println!("{summary}");
    println!(
        "  Average rounds per duel: {:.2}",
        rounds as f64 / f64::from(duels)
    );
    Ok(())
}
