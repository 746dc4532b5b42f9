//! Headless session -- plays a seeded game with random intents and prints the
//! log tail, the final map and a snapshot hash.
//!
//! Run with:
//!   cargo run --example headless_session -p grotto-engine -- [seed] [turns]
//!
//! Set `RUST_LOG=grotto_engine=debug` for engine traces.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing_subscriber::EnvFilter;

use grotto_engine::prelude::*;

/// Pick something plausible for the player to do.
fn random_intent(game: &Game, rng: &mut Pcg64) -> Intent {
    let carrying = game
        .store()
        .inventory(game.player())
        .map_or(0, |inv| inv.items.len());

    match rng.gen_range(0..20) {
        0 => Intent::Wait,
        1 => Intent::PickUp,
        2 if carrying > 0 => {
            let index = rng.gen_range(0..carrying);
            // Aim area items at the nearest visible enemy.
            let target = game
                .store()
                .statuses()
                .ids()
                .filter(|&id| id != game.player() && game.store().alive(id))
                .filter_map(|id| game.store().position(id))
                .find(|&p| game.in_fov(p));
            Intent::Use { index, target }
        }
        _ => Intent::Move(Direction::ALL[rng.gen_range(0..Direction::ALL.len())]),
    }
}

fn render(game: &Game) -> String {
    let map = game.map();
    let mut out = String::new();
    for y in 0..map.height() {
        for x in 0..map.width() {
            let p = Point::new(x, y);
            let top = game
                .store()
                .entities_at(p)
                .filter(|_| game.in_fov(p))
                .max_by_key(|&id| game.render_order(id))
                .and_then(|id| game.display_style(id));
            let ch = match (top, map.cell(p)) {
                (Some(style), _) => style.glyph,
                (None, _) if !game.is_explored(p) => ' ',
                (None, Some(Cell::Wall)) => '#',
                (None, _) => '.',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(7);
    let turns: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(200);

    let mut game = Game::with_seed(seed)?;
    let mut rng = Pcg64::seed_from_u64(seed ^ 0x5eed);

    let mut outcome = TurnStatus::Ongoing;
    for _ in 0..turns {
        let intent = random_intent(&game, &mut rng);
        match game.act(intent) {
            Ok(TurnStatus::Ongoing) | Err(_) => {}
            Ok(done) => {
                outcome = done;
                break;
            }
        }
    }

    println!("{}", render(&game));
    for entry in game.log().entries().iter().rev().take(10).rev() {
        println!("  {entry}");
    }
    let (hp, max_hp) = game.player_hp().unwrap_or_default();
    println!(
        "\noutcome: {outcome:?}  turns: {}  kills: {}  hp: {hp}/{max_hp}",
        game.turn_count(),
        game.kills()
    );

    let snapshot = game.capture_snapshot();
    let restored = Game::restore(&snapshot, seed)?;
    anyhow::ensure!(
        restored.store() == game.store(),
        "restored store differs from the original"
    );
    println!("snapshot hash: {}", snapshot.hash);
    Ok(())
}
