//! Headless swing simulator.
//!
//! Loads attack data, hit-detection settings and an arena from TOML, swings the attacker
//! through the arena tick by tick and logs every hit and its resolution.

mod error;
mod runner;
mod scene;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use hit_detection::{
    ActorId, ActorKind, AttackKey, CreatureData, DetectionMode, HitDetectionSettings,
    OwnerAttributes, OwnerInfo, TagSet, WeaponData, WeaponProfile,
};
use tracing::{error, info};

use crate::error::Result;
use crate::runner::{SwingPlan, run};
use crate::scene::SceneDef;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Trace,
    Ccd,
}

impl From<ModeArg> for DetectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Trace => DetectionMode::Trace,
            ModeArg::Ccd => DetectionMode::Ccd,
        }
    }
}

/// Swing a weapon or creature attack through an arena and report what it hits
#[derive(Parser, Debug)]
#[command(name = "swing_sim")]
struct Args {
    /// Weapon data file (ignored when --creature is given)
    #[arg(long, default_value = "swing_sim/data/longsword.toml")]
    weapon: PathBuf,

    /// Creature data file; attacks with the creature's own body
    #[arg(long)]
    creature: Option<PathBuf>,

    /// Weapon attack tags, comma separated
    #[arg(long, value_delimiter = ',', default_value = "Attack.Light")]
    tags: Vec<String>,

    /// Creature attack name
    #[arg(long, default_value = "bite")]
    attack: String,

    /// Arena file
    #[arg(long, default_value = "swing_sim/data/arena.toml")]
    scene: PathBuf,

    /// Hit-detection settings file (defaults when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the detection strategy
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Number of swings (combo steps advance every swing)
    #[arg(long, default_value_t = 3)]
    swings: usize,

    /// Wielder strength
    #[arg(long, default_value_t = 10.0)]
    strength: f32,

    /// Wielder dexterity
    #[arg(long, default_value_t = 10.0)]
    dexterity: f32,

    /// Record debug geometry
    #[arg(long)]
    debug_draw: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match simulate(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("swing simulation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(args: &Args) -> Result<HitDetectionSettings> {
    let mut settings = match &args.settings {
        Some(path) => HitDetectionSettings::load_from_file(path)?,
        None => HitDetectionSettings::default(),
    };
    if let Some(mode) = args.mode {
        settings.mode = mode.into();
    }
    if args.debug_draw {
        settings.debug.draw = true;
    }
    Ok(settings)
}

fn swing_plan(args: &Args, scene: &SceneDef) -> Result<SwingPlan> {
    let id = scene.attacker.id;
    let plan = match &args.creature {
        Some(path) => {
            let data = CreatureData::load_from_file(path)?;
            let combo_len = data.attacks.get(&args.attack).map_or(1, |a| a.combo.len());
            info!(creature = %data.name, attack = %args.attack, "attacker loaded");
            SwingPlan {
                source: Box::new(data),
                owner: OwnerInfo::creature(ActorId::new(id, ActorKind::Creature)),
                key: AttackKey::name(args.attack.clone()),
                combo_len,
                swings: args.swings,
            }
        }
        None => {
            let data = WeaponData::load_from_file(&args.weapon)?;
            let tags = TagSet::new(args.tags.iter().map(String::as_str));
            let combo_len = data.attack_by_tags(&tags).map_or(1, |a| a.combo.len());
            let profile = WeaponProfile::new(
                data,
                OwnerAttributes {
                    strength: args.strength,
                    dexterity: args.dexterity,
                },
            );
            info!(
                weapon = %profile.data().name,
                damage = profile.calculated_damage(),
                tags = %tags,
                "attacker loaded"
            );
            SwingPlan {
                source: Box::new(profile),
                owner: OwnerInfo::weapon(
                    ActorId::new(id, ActorKind::Weapon),
                    ActorId::new(id, ActorKind::Character),
                ),
                key: AttackKey::Tags(tags),
                combo_len,
                swings: args.swings,
            }
        }
    };
    Ok(plan)
}

fn simulate(args: &Args) -> Result<()> {
    let scene = SceneDef::load_from_file(&args.scene)?;
    let settings = load_settings(args)?;
    let plan = swing_plan(args, &scene)?;

    let report = run(&scene, plan, settings)?;

    info!(
        swings = report.swings,
        hits = report.hits,
        queries = report.queries,
        debug_shapes = report.debug_shapes,
        "simulation finished"
    );
    for target in &report.targets {
        info!(
            target_actor = %target.actor,
            target_name = %target.name,
            hits = target.hits,
            health = %format!("{:.1}/{:.1}", target.health, target.max_health),
            poise = target.poise,
            reaction = ?target.last_reaction,
            "target"
        );
    }
    Ok(())
}
