#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn litrpg(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("litrpg").unwrap();
    cmd.arg("--root").arg(root.path());
    cmd
}

/// Run a command that must succeed and parse its JSON output.
fn run_json(root: &TempDir, args: &[&str]) -> Value {
    let output = litrpg(root).args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

/// A data root with a warrior named Marcus and a small content catalog.
fn game() -> TempDir {
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(
        content.join("items.json"),
        r#"{
            "weapons": {"longsword": {"name": "Longsword", "damage": "1d8+1"}},
            "consumables": {
                "health_potion": {"name": "Health Potion", "heal": 25},
                "antidote": {"cure": "poison"}
            }
        }"#,
    )
    .unwrap();
    fs::write(
        content.join("spells.json"),
        r#"{"basic_spells": {"firebolt": {"mp_cost": 15, "damage": "2d6"}}}"#,
    )
    .unwrap();
    fs::write(
        content.join("bestiary.json"),
        r#"{"common_enemies": {"goblin": {"hp": "2d6", "damage": "1d6", "xp": 25}}}"#,
    )
    .unwrap();

    litrpg(&dir)
        .args(["init", "--name", "Marcus"])
        .assert()
        .success();
    dir
}

// ============================================================================
// init / status
// ============================================================================

#[test]
fn init_creates_character() {
    let dir = TempDir::new().unwrap();
    litrpg(&dir)
        .args(["init", "--name", "Lyra", "--class", "mage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created Lyra the mage"));

    assert!(dir
        .path()
        .join("session/state/game_state.json")
        .exists());
    let status = run_json(&dir, &["status"]);
    assert_eq!(status["hp"], "60/60");
    assert_eq!(status["mp"], "120/120");
    assert_eq!(status["current_area"], "tutorial_village");
}

#[test]
fn commands_need_a_character() {
    let dir = TempDir::new().unwrap();
    litrpg(&dir)
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\"").and(predicate::str::contains("init")));
}

// ============================================================================
// dice
// ============================================================================

#[test]
fn roll_prints_result() {
    let dir = TempDir::new().unwrap();
    let result = run_json(&dir, &["--seed", "7", "roll", "2d6+3"]);
    let total = result["total"].as_i64().unwrap();
    assert!((5..=15).contains(&total));
    assert_eq!(result["notation"], "2d6+3");
    assert_eq!(result["rolls"].as_array().unwrap().len(), 2);
}

#[test]
fn roll_is_reproducible_with_seed() {
    let dir = TempDir::new().unwrap();
    let first = run_json(&dir, &["--seed", "42", "roll", "4d8"]);
    let second = run_json(&dir, &["--seed", "42", "roll", "4d8"]);
    assert_eq!(first, second);
}

#[test]
fn roll_rejects_bad_notation() {
    let dir = TempDir::new().unwrap();
    litrpg(&dir)
        .args(["roll", "abc"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid dice notation"));
}

#[test]
fn sim_reports_distribution() {
    let dir = TempDir::new().unwrap();
    let result = run_json(&dir, &["--seed", "1", "sim", "1d6", "-n", "600"]);
    assert_eq!(result["n"], 600);
    assert_eq!(result["min"], 1);
    assert_eq!(result["max"], 6);
}

// ============================================================================
// combat
// ============================================================================

#[test]
fn attack_spends_stamina() {
    let dir = game();
    let result = run_json(&dir, &["--seed", "3", "attack", "--weapon", "2d6+3"]);
    assert!(result["damage"].as_i64().unwrap() >= 1);
    assert_eq!(result["stamina_remaining"], 70);
    assert_eq!(result["weapon_used"], "2d6+3");

    let status = run_json(&dir, &["status"]);
    assert_eq!(status["stamina"], "70/80");
}

#[test]
fn attack_with_bad_weapon_fails() {
    let dir = game();
    litrpg(&dir)
        .args(["attack", "--weapon", "sword"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid dice notation"));
    assert_eq!(run_json(&dir, &["status"])["stamina"], "80/80");
}

#[test]
fn damage_and_session_log() {
    let dir = game();
    let result = run_json(&dir, &["damage", "--amount", "10"]);
    assert_eq!(result["damage_taken"], 10);
    assert_eq!(result["hp_remaining"], 110);

    let log = fs::read_to_string(dir.path().join("session/narrative/session_log.md")).unwrap();
    assert!(log.contains("DAMAGE: Took 10 from physical"));
}

#[test]
fn cast_without_enough_mana_is_soft_failure() {
    let dir = game();
    let result = run_json(&dir, &["cast", "--cost", "100"]);
    assert_eq!(result["success"], false);
    assert_eq!(result["reason"], "insufficient_mp");
    assert_eq!(run_json(&dir, &["status"])["mp"], "30/30");
}

#[test]
fn cast_catalog_spell() {
    let dir = game();
    let result = run_json(&dir, &["--seed", "9", "cast", "--spell", "firebolt"]);
    assert_eq!(result["success"], true);
    assert_eq!(result["type"], "damage");
    assert_eq!(result["mp_remaining"], 15);

    let result = run_json(&dir, &["cast", "--spell", "wish"]);
    assert_eq!(result["reason"], "unknown_spell");
}

#[test]
fn check_reports_roll() {
    let dir = game();
    let result = run_json(&dir, &["--seed", "5", "check", "--attribute", "strength", "--dc", "12"]);
    assert_eq!(result["modifier"], 3);
    let roll = result["roll"].as_i64().unwrap();
    assert!((1..=20).contains(&roll));
}

#[test]
fn check_unknown_attribute_is_fatal() {
    let dir = game();
    litrpg(&dir)
        .args(["check", "--attribute", "luck"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("luck"));
}

#[test]
fn enemy_attack_hits_or_dodges() {
    let dir = game();
    let result = run_json(&dir, &["--seed", "11", "enemy-attack", "--damage", "1d6"]);
    assert_eq!(result["area_scaled"], false);
    if result["dodged"] == false {
        let taken = result["damage_taken"].as_i64().unwrap();
        assert!((1..=6).contains(&taken));
    }
}

// ============================================================================
// status effects
// ============================================================================

#[test]
fn apply_and_tick_poison() {
    let dir = game();
    let applied = run_json(&dir, &["status-effect", "--apply", "poisoned"]);
    assert_eq!(applied["duration"], 3);

    let report = run_json(&dir, &["status-effect", "--tick"]);
    assert_eq!(report["effects_processed"], 1);
    assert_eq!(report["hp_remaining"], 115);
    assert_eq!(report["log"][0]["type"], "damage");
}

#[test]
fn apply_unknown_effect_is_soft_failure() {
    let dir = game();
    let result = run_json(&dir, &["status-effect", "--apply", "cursed"]);
    assert_eq!(result["success"], false);
    assert_eq!(result["reason"], "unknown_effect");
}

#[test]
fn status_effect_needs_an_action() {
    let dir = game();
    litrpg(&dir).arg("status-effect").assert().failure();
}

#[test]
fn legacy_config_durations_are_migrated() {
    let dir = game();
    fs::write(
        dir.path().join("config.json"),
        r#"{"status_effects": {"poisoned": {"duration_base": 7}}}"#,
    )
    .unwrap();
    let applied = run_json(&dir, &["status-effect", "--apply", "poisoned"]);
    assert_eq!(applied["duration"], 7);
}

// ============================================================================
// progression and inventory
// ============================================================================

#[test]
fn heal_rest_and_xp() {
    let dir = game();
    run_json(&dir, &["damage", "--amount", "50"]);
    let healed = run_json(&dir, &["heal", "--amount", "20"]);
    assert_eq!(healed["healed"], 20);
    assert_eq!(healed["current"], 90);

    let rest = run_json(&dir, &["rest", "--type", "long"]);
    assert_eq!(rest["current_hp"], 120);

    let xp = run_json(&dir, &["xp", "--amount", "120"]);
    assert_eq!(xp["leveled_up"], true);
    assert_eq!(xp["new_level"], 2);
    assert_eq!(xp["current_xp"], 20);
}

#[test]
fn heal_unknown_resource_is_fatal() {
    let dir = game();
    litrpg(&dir)
        .args(["heal", "--amount", "5", "--resource", "mana"])
        .assert()
        .failure();
}

#[test]
fn gold_never_goes_negative() {
    let dir = game();
    let result = run_json(&dir, &["gold", "--amount", "-80"]);
    assert_eq!(result["gold_total"], 0);
    assert_eq!(result["transaction"], "spend");
}

#[test]
fn items_round_trip_through_inventory() {
    let dir = game();
    let added = run_json(&dir, &["add-item", "--item", "longsword"]);
    assert_eq!(added["inventory_size"], 1);

    let equipped = run_json(&dir, &["equip", "--item", "longsword"]);
    assert_eq!(equipped["slot"], "weapon");

    let attack = run_json(&dir, &["attack"]);
    assert_eq!(attack["weapon_used"], "1d8+1");

    run_json(&dir, &["damage", "--amount", "40"]);
    run_json(&dir, &["add-item", "--item", "health_potion"]);
    let used = run_json(&dir, &["use-item", "--item", "health_potion"]);
    assert_eq!(used["effects"][0], "Healed 25 HP");

    let missing = run_json(&dir, &["use-item", "--item", "health_potion"]);
    assert_eq!(missing["reason"], "item_not_in_inventory");
}

#[test]
fn unknown_area_and_monster() {
    let dir = game();
    assert_eq!(
        run_json(&dir, &["change-area", "--area", "atlantis"])["reason"],
        "unknown_area"
    );
    let goblin = run_json(&dir, &["monster", "--id", "goblin"]);
    assert_eq!(goblin["hp"], "2d6");
    assert_eq!(goblin["xp"], 25);
}

#[test]
fn flags_persist() {
    let dir = game();
    run_json(&dir, &["flag", "--set", "met_elder", "--value", "true"]);
    let flag = run_json(&dir, &["flag", "--get", "met_elder"]);
    assert_eq!(flag["exists"], true);
    assert_eq!(flag["value"], true);
}
