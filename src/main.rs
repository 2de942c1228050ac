use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use solitaire_sort::{Card, Game, HandAccess, Rules, sort_sequence_observed, sort_sequence_with};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Cards to sort, e.g. "5291" or "K3A87"
    cards: String,
    /// Seed for the shuffles; random when omitted
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,
    /// Fresh deals to attempt before giving up
    #[arg(long, default_value_t = 3, value_name = "NUM")]
    retries: usize,
    /// Cards held in the hand after a draw
    #[arg(long, default_value_t = 3, value_name = "NUM")]
    hand_size: usize,
    /// Number of field piles to deal to
    #[arg(long, default_value_t = 8, value_name = "NUM")]
    field_stacks: usize,
    /// Only the most recently drawn hand card may be played
    #[arg(long)]
    top_only: bool,
    /// Print the game state after every move
    #[arg(short, long)]
    watch: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data = Card::parse_all(&cli.cards).context("Failed to parse input cards")?;
    let rules = Rules {
        hand_size_max: cli.hand_size.max(1),
        hand_access: if cli.top_only {
            HandAccess::TopOnly
        } else {
            HandAccess::RandomAccess
        },
        max_retries: cli.retries.max(1),
        field_stacks: cli.field_stacks.max(1),
    };
    let mut rng = StdRng::seed_from_u64(cli.seed.unwrap_or_else(rand::random));

    let sorted = if cli.watch {
        let mut print_snapshot = |game: &Game| {
            println!("{}\n", game.pretty_print());
        };
        sort_sequence_observed(&data, &rules, &mut rng, &mut print_snapshot)
    } else {
        sort_sequence_with(&data, &rules, &mut rng)
    }
    .context("Failed to sort the sequence")?;

    let output: String = sorted.iter().map(|c| c.as_char()).collect();
    println!("{output}");
    Ok(())
}
