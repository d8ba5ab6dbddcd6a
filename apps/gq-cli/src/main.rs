use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::IVec3;
use gq_common::{RandomSource, SeededRandom};
use gq_mapgen::{Generator, GeneratorConfig};
use gq_net::{LoopbackRelay, Session, SessionEvent};
use gq_tools::{WorldInspector, ascii_level, ascii_levels};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gq-cli", about = "Garbage Quest dungeon and sync tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with generator settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of levels
    #[arg(long, global = true)]
    levels: Option<i32>,

    /// Override the number of rooms per level
    #[arg(long, global = true)]
    rooms: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective generator settings
    Info,
    /// Generate a dungeon and print its summary and content hash
    Generate {
        #[arg(short, long, default_value = "42")]
        seed: u64,
        #[arg(short, long, default_value = "Garbage Quest")]
        name: String,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw a generated level as text
    Dump {
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Level to draw; all levels when omitted
        #[arg(short, long)]
        level: Option<i32>,
    },
    /// Two clients play one game through an in-memory relay
    Demo {
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Steps each player takes
        #[arg(short, long, default_value = "20")]
        ticks: u32,
    },
}

impl Cli {
    fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => GeneratorConfig::default(),
        };
        if let Some(levels) = self.levels {
            config.levels = levels;
        }
        if let Some(rooms) = self.rooms {
            config.rooms_per_level = rooms;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.generator_config()?;
    let generator = Generator::new(config.clone());

    match cli.command {
        Commands::Info => {
            println!("gq-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Generate { seed, name, json } => {
            let dungeon = generator.generate(&name, seed);
            let summary = WorldInspector::summary(&dungeon.world);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
                println!("rooms={}", dungeon.rooms.len());
                println!("hash={}", summary.hash);
            }
        }
        Commands::Dump { seed, level } => {
            let world = generator.generate("dump", seed).world;
            match level {
                Some(z) => {
                    let text = ascii_level(&world, z);
                    anyhow::ensure!(!text.is_empty(), "level {z} does not exist");
                    print!("{text}");
                }
                None => print!("{}", ascii_levels(&world)),
            }
        }
        Commands::Demo { seed, ticks } => demo(generator, seed, ticks)?,
    }

    Ok(())
}

fn demo(generator: Generator, seed: u64, ticks: u32) -> anyhow::Result<()> {
    const DIRECTIONS: [IVec3; 4] = [IVec3::X, IVec3::NEG_X, IVec3::Y, IVec3::NEG_Y];

    let mut relay = LoopbackRelay::new();
    let mut sessions = Vec::new();
    for _ in 0..2 {
        relay.connect();
        sessions.push(Session::new(generator.clone()));
    }

    sessions[0].create("Demo", seed)?;
    relay.pump(&mut sessions)?;
    sessions[1].join(1)?;
    for (client, event) in relay.pump(&mut sessions)? {
        if let SessionEvent::HashMismatch { advertised, computed } = event {
            tracing::warn!(client, advertised, computed, "layouts differ");
        }
    }

    let mut rng = SeededRandom::new(seed);
    for _ in 0..ticks {
        for session in sessions.iter_mut() {
            session.step(DIRECTIONS[rng.index(DIRECTIONS.len())])?;
            session.grab_underfoot()?;
            session.tick()?;
        }
        relay.pump(&mut sessions)?;
    }

    let mut agree = true;
    for session in &sessions {
        let world = session.world().context("session has no world")?;
        let me = session.local_actor().context("session has no avatar")?;
        let pos = world.actor(me).map(|a| a.position()).unwrap_or_default();
        println!(
            "{} {me} at ({}, {}, {}) hash={}",
            session.player_name(),
            pos.x,
            pos.y,
            pos.z,
            world.content_hash()
        );
        for other in &sessions {
            let seen = other.world().and_then(|w| w.actor(me)).map(|a| a.position());
            agree &= seen == Some(pos);
        }
    }
    println!("positions {}", if agree { "agree" } else { "DIVERGED" });
    Ok(())
}
