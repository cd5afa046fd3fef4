// ABOUTME: Command-line interface for the LitRPG rules engine.
// ABOUTME: Each command loads the character, applies one rule, saves, and prints one JSON object.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use litrpg::{
    Attribute, Catalog, DiceDescriptor, Engine, FastRng, GameConfig, RestKind, Resource,
    SessionLog, StateStore,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "litrpg")]
#[command(about = "Dice and combat rules for a LitRPG adventure")]
#[command(version)]
struct Cli {
    /// Data directory holding config.json, content/ and session/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Seed the dice for reproducible results
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log rule decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new character, replacing any existing one
    Init {
        #[arg(long)]
        name: String,

        /// Class from the config's class progression (unknown classes use "custom")
        #[arg(long = "class", default_value = "warrior")]
        class_name: String,
    },
    /// Attack an enemy
    Attack {
        /// Weapon damage dice (e.g., "2d6+3"); defaults to the equipped weapon
        #[arg(long)]
        weapon: Option<String>,

        /// Target armor value
        #[arg(long, default_value_t = 0)]
        armor: i64,

        /// Force a critical hit
        #[arg(long)]
        crit: bool,

        /// Sneak attack
        #[arg(long)]
        sneak: bool,
    },
    /// Take damage
    Damage {
        #[arg(long)]
        amount: i64,

        /// Damage type; only "physical" is reduced by armor
        #[arg(long = "type", default_value = "physical")]
        damage_type: String,
    },
    /// Restore HP, MP or stamina
    Heal {
        /// Heal amount or dice (e.g., "20", "2d4+2")
        #[arg(long)]
        amount: String,

        /// Resource to restore (hp, mp or stamina)
        #[arg(long, default_value = "hp")]
        resource: String,
    },
    /// Cast a spell
    Cast {
        /// Spell ID from the content catalog
        #[arg(long)]
        spell: Option<String>,

        /// Override the MP cost
        #[arg(long)]
        cost: Option<i64>,

        /// Override the spell power ("0" for none)
        #[arg(long)]
        power: Option<String>,
    },
    /// An enemy attacks the character
    EnemyAttack {
        /// Enemy damage dice
        #[arg(long, default_value = "1d4")]
        damage: String,
    },
    /// Apply a status effect or advance all effects by one turn
    #[command(group(ArgGroup::new("action").required(true).args(["apply", "tick"])))]
    StatusEffect {
        /// Effect to apply
        #[arg(long)]
        apply: Option<String>,

        /// Effect duration in turns
        #[arg(long, requires = "apply")]
        duration: Option<i64>,

        /// Process effects for one turn
        #[arg(long)]
        tick: bool,
    },
    /// Roll a d20 attribute check
    Check {
        #[arg(long)]
        attribute: String,

        /// Difficulty class
        #[arg(long, default_value_t = 15)]
        dc: i64,
    },
    /// Gain experience
    Xp {
        #[arg(long)]
        amount: i64,
    },
    /// Rest to recover resources
    Rest {
        #[arg(long = "type", value_enum, default_value_t = RestArg::Short)]
        rest_type: RestArg,
    },
    /// Add or spend gold
    Gold {
        /// Gold change (negative to spend)
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
    /// Add an item to the inventory
    AddItem {
        #[arg(long)]
        item: String,

        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Equip an item from the inventory
    Equip {
        #[arg(long)]
        item: String,
    },
    /// Use a consumable item
    UseItem {
        #[arg(long)]
        item: String,
    },
    /// Move to another area
    ChangeArea {
        #[arg(long)]
        area: String,
    },
    /// Show a bestiary monster scaled for the current area
    Monster {
        #[arg(long)]
        id: String,
    },
    /// Show character status
    Status,
    /// Get or set a story flag
    #[command(group(ArgGroup::new("op").required(true).args(["get", "set"])))]
    Flag {
        /// Flag key to retrieve
        #[arg(long)]
        get: Option<String>,

        /// Flag key to set
        #[arg(long, requires = "value")]
        set: Option<String>,

        /// Flag value; "true" and "false" are stored as booleans
        #[arg(long)]
        value: Option<String>,
    },
    /// Roll dice without touching the character
    Roll {
        /// Dice notation (e.g., "2d6+3")
        notation: String,
    },
    /// Simulate rolling dice many times
    Sim {
        /// Dice notation (e.g., "2d6")
        notation: String,

        /// Number of trials to run
        #[arg(short, long, default_value = "10000")]
        n: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RestArg {
    Short,
    Long,
}

impl From<RestArg> for RestKind {
    fn from(arg: RestArg) -> Self {
        match arg {
            RestArg::Short => RestKind::Short,
            RestArg::Long => RestKind::Long,
        }
    }
}

/// Where everything lives under the data root.
struct Paths {
    config: PathBuf,
    content: PathBuf,
    state: PathBuf,
    session_log: PathBuf,
}

impl Paths {
    fn new(root: &Path) -> Self {
        let session = root.join("session");
        Self {
            config: root.join("config.json"),
            content: root.join("content"),
            state: session.join("state").join("game_state.json"),
            session_log: session.join("narrative").join("session_log.md"),
        }
    }
}

type CliEngine = Engine<FastRng, SessionLog>;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{output:#}"),
        Err(e) => match e.reason() {
            Some(reason) => {
                tracing::debug!(reason, error = %e, "command refused");
                println!(
                    "{:#}",
                    json!({ "success": false, "reason": reason, "error": e.to_string() })
                );
            }
            None => {
                tracing::error!(error = %e, "command failed");
                println!("{:#}", json!({ "error": e.to_string() }));
                std::process::exit(1);
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn rng(seed: Option<u64>) -> FastRng {
    match seed {
        Some(seed) => FastRng::with_seed(seed),
        None => FastRng::new(),
    }
}

fn to_json(value: impl Serialize) -> litrpg::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn run(cli: Cli) -> litrpg::Result<Value> {
    let paths = Paths::new(&cli.root);
    let mut rng = rng(cli.seed);

    match cli.command {
        Commands::Roll { notation } => to_json(litrpg::roll_with_rng(&notation, &mut rng)?),
        Commands::Sim { notation, n } => {
            let dice = litrpg::parse(&notation)?;
            to_json(litrpg::sim::simulate_with_rng(&dice, n, &mut rng))
        }
        Commands::Init { name, class_name } => init(&paths, &name, &class_name, rng),
        command => {
            let store = StateStore::new(&paths.state);
            let mut engine = open_engine(&paths, &store, rng)?;
            let (output, mutated) = execute(&mut engine, command)?;
            if mutated {
                store.save(engine.state())?;
            }
            Ok(output)
        }
    }
}

fn open_engine(paths: &Paths, store: &StateStore, rng: FastRng) -> litrpg::Result<CliEngine> {
    let config = GameConfig::load(&paths.config)?;
    let catalog = Catalog::load(&paths.content)?;
    let state = store.load_existing()?;
    Ok(Engine::new(
        config,
        catalog,
        state,
        rng,
        SessionLog::new(&paths.session_log),
    ))
}

fn init(paths: &Paths, name: &str, class_name: &str, rng: FastRng) -> litrpg::Result<Value> {
    let config = GameConfig::load(&paths.config)?;
    let catalog = Catalog::load(&paths.content)?;
    let state = litrpg::create_character(&config, name, class_name);
    StateStore::new(&paths.state).save(&state)?;

    let engine = Engine::new(
        config,
        catalog,
        state,
        rng,
        SessionLog::new(&paths.session_log),
    );
    Ok(json!({
        "success": true,
        "message": format!("Created {name} the {class_name}"),
        "initial_stats": to_json(engine.status())?,
    }))
}

/// Run one command against a loaded character. The flag says whether the
/// state changed and needs saving.
fn execute(engine: &mut CliEngine, command: Commands) -> litrpg::Result<(Value, bool)> {
    let changed = |value: Value| (value, true);
    let unchanged = |value: Value| (value, false);

    let outcome = match command {
        Commands::Attack {
            weapon,
            armor,
            crit,
            sneak,
        } => {
            let weapon = weapon
                .as_deref()
                .map(str::parse::<DiceDescriptor>)
                .transpose()?;
            changed(to_json(engine.attack(weapon, armor, crit, sneak)?)?)
        }
        Commands::Damage {
            amount,
            damage_type,
        } => changed(to_json(engine.take_damage(amount, &damage_type))?),
        Commands::Heal { amount, resource } => {
            let resource: Resource = resource.parse()?;
            changed(to_json(engine.heal(&amount, resource)?)?)
        }
        Commands::Cast { spell, cost, power } => {
            changed(to_json(engine.cast_spell(cost, spell.as_deref(), power.as_deref())?)?)
        }
        Commands::EnemyAttack { damage } => {
            let damage: DiceDescriptor = damage.parse()?;
            changed(to_json(engine.enemy_attack(damage))?)
        }
        Commands::StatusEffect {
            apply,
            duration,
            tick,
        } => {
            if tick {
                changed(to_json(engine.tick_status_effects())?)
            } else if let Some(name) = apply {
                changed(to_json(engine.apply_status_effect(&name, duration, None)?)?)
            } else {
                unchanged(json!({ "error": "Specify --apply or --tick" }))
            }
        }
        Commands::Check { attribute, dc } => {
            let attribute: Attribute = attribute.parse()?;
            unchanged(to_json(engine.skill_check(attribute, dc))?)
        }
        Commands::Xp { amount } => changed(to_json(engine.gain_xp(amount))?),
        Commands::Rest { rest_type } => changed(to_json(engine.rest(rest_type.into()))?),
        Commands::Gold { amount } => changed(to_json(engine.modify_gold(amount))?),
        Commands::AddItem { item, quantity } => {
            changed(to_json(engine.add_item(&item, quantity)?)?)
        }
        Commands::Equip { item } => changed(to_json(engine.equip_item(&item)?)?),
        Commands::UseItem { item } => changed(to_json(engine.use_item(&item)?)?),
        Commands::ChangeArea { area } => changed(to_json(engine.change_area(&area)?)?),
        Commands::Monster { id } => unchanged(to_json(engine.area_monster(&id)?)?),
        Commands::Status => unchanged(to_json(engine.status())?),
        Commands::Flag { get, set, value } => match (get, set, value) {
            (Some(key), _, _) => unchanged(to_json(engine.get_flag(&key))?),
            (None, Some(key), Some(value)) => {
                changed(to_json(engine.set_flag(&key, flag_value(&value)))?)
            }
            _ => unchanged(json!({ "error": "Specify --get or --set with --value" })),
        },
        Commands::Init { .. } | Commands::Roll { .. } | Commands::Sim { .. } => {
            unchanged(json!({ "error": "command does not use a character" }))
        }
    };
    Ok(outcome)
}

fn flag_value(raw: &str) -> Value {
    match raw.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_value() {
        assert_eq!(flag_value("TRUE"), Value::Bool(true));
        assert_eq!(flag_value("false"), Value::Bool(false));
        assert_eq!(flag_value("elder"), Value::String("elder".to_string()));
    }

    #[test]
    fn test_paths_layout() {
        let paths = Paths::new(Path::new("/data"));
        assert_eq!(paths.config, Path::new("/data/config.json"));
        assert_eq!(
            paths.state,
            Path::new("/data/session/state/game_state.json")
        );
        assert_eq!(
            paths.session_log,
            Path::new("/data/session/narrative/session_log.md")
        );
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
