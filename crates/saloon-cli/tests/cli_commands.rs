//! Integration tests for the saloon CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory holding a three-member roster.
fn test_chat() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let roster = dir.path().join("roster.json");
    fs::write(
        &roster,
        r#"{
    "chat_id": -100,
    "members": [
        { "id": 1, "first_name": "Ada", "username": "ada" },
        { "id": 2, "first_name": "Bob", "username": "bob" },
        { "id": 3, "first_name": "Carol", "username": "carol", "role": "administrator" }
    ],
    "game": { "seed": 7 }
}"#,
    )
    .unwrap();
    (dir, roster)
}

fn saloon() -> Command {
    let mut cmd = Command::cargo_bin("saloon").unwrap();
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "warn");
    cmd
}

fn play(roster: &Path) -> Command {
    let mut cmd = saloon();
    cmd.args(["play", "--fast", "-c", roster.to_str().unwrap()]);
    cmd
}

// ---------------------------------------------------------------------------
// rules / simulate
// ---------------------------------------------------------------------------

#[test]
fn rules_print_without_markup() {
    saloon()
        .arg("rules")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/register")
                .and(predicate::str::contains("/lottery"))
                .and(predicate::str::contains("<b>").not()),
        );
}

#[test]
fn simulate_reports_chamber_distribution() {
    saloon()
        .args(["simulate", "--duels", "200", "--seed", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Bullet chamber")
                .and(predicate::str::contains("200 duels"))
                .and(predicate::str::contains("Average rounds per duel")),
        );
}

#[test]
fn simulate_rejects_zero_duels() {
    saloon()
        .args(["simulate", "--duels", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn simulate_is_reproducible() {
    let first = saloon()
        .args(["simulate", "--duels", "50", "--seed", "9"])
        .output()
        .unwrap();
    let second = saloon()
        .args(["simulate", "--duels", "50", "--seed", "9"])
        .output()
        .unwrap();
    assert_eq!(first.stdout, second.stdout);
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_fails_without_roster() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    saloon()
        .args(["play", "-c", missing.to_str().unwrap()])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn duel_plays_out_after_accept() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /duel @bob\nbob /accept\n/wait\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Bob! Ada challenges you to a duel!")
                .and(predicate::str::contains("Accept the challenge"))
                .and(predicate::str::contains("Duel! ")),
        );
}

#[test]
fn second_challenge_is_busy() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /duel @bob\ncarol /duel @ada\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("The duel is busy. Try again later."));
}

#[test]
fn declined_duel_is_announced() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /duel @bob\nbob /decline\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bob declined the duel."));
}

#[test]
fn self_challenge_is_rejected_in_chat() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /duel @ada\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("you can't challenge yourself"));
}

#[test]
fn only_administrators_kill() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /kill @bob\ncarol /kill @bob\ncarol /kill 2\nbob /duelstats\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Only chat administrators can do that.")
                .and(predicate::str::contains("Carol shot Bob."))
                .and(predicate::str::contains("respawn for 20 minutes"))
                .and(predicate::str::contains("Deaths: 2")),
        );
}

#[test]
fn pool_listing_is_private_and_for_administrators() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /register\nada /pool\ncarol /pool\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Only chat administrators can do that.")
                .and(predicate::str::contains("(private) 1. ada (1)")),
        );
}

#[test]
fn lottery_draws_once_per_day() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /register\nbob /register\nada /lottery\n/wait\nbob /lottery\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("You're now playing Winner of the Day")
                .and(predicate::str::contains("According to my info, today's winner is")),
        );
}

#[test]
fn empty_pool_lottery_explains_how_to_join() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /lottery\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Join with /register"));
}

#[test]
fn unknown_sender_and_command_are_reported() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("# a comment\nzed /duel @ada\nada /dance\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("unknown member: zed")
                .and(predicate::str::contains("unknown command: /dance")),
        );
}

#[test]
fn top_rejects_non_numeric_year() {
    let (_dir, roster) = test_chat();
    play(&roster)
        .write_stdin("ada /top soon\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Give the year as a number"));
}

#[test]
fn state_survives_between_sessions() {
    let (dir, roster) = test_chat();
    let state = dir.path().join("state.json");
    play(&roster)
        .args(["--state", state.to_str().unwrap()])
        .write_stdin("ada /register\n")
        .assert()
        .success();
    let saved = fs::read_to_string(&state).unwrap();
    assert!(saved.contains("\"pool\""));

    play(&roster)
        .args(["--state", state.to_str().unwrap()])
        .write_stdin("ada /register\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hey, you're already in the game!"));
}
