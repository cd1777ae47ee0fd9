use std::fs;

use assert_cmd::Command;
use assert_matches::assert_matches;
use tempfile::tempdir;

use hangr::accounts::{CredentialStore, UserDb};
use hangr::app_dirs::AppDirs;
use hangr::history::HistoryLog;
use hangr::words::{WordDb, WordSource};
use hangr::RegisterError;

#[test]
fn accounts_survive_reopen() {
    let dir = tempdir().unwrap();
    let dirs = AppDirs::with_data_dir(dir.path().join("state"));

    {
        let users = UserDb::open(dirs.users_db()).unwrap();
        users.register("ann", "Secret1").unwrap();
    }

    let users = UserDb::open(dirs.users_db()).unwrap();
    assert!(users.authenticate("ann", "Secret1"));
    assert_matches!(
        users.register("ann", "Secret2"),
        Err(RegisterError::UsernameTaken(_))
    );
}

#[test]
fn seeded_dictionary_survives_reopen() {
    let dir = tempdir().unwrap();
    let dirs = AppDirs::with_data_dir(dir.path());

    let seeded = {
        let mut words = WordDb::open(dirs.words_db()).unwrap();
        words.seed_defaults().unwrap()
    };
    assert!(seeded > 0);

    let mut words = WordDb::open(dirs.words_db()).unwrap();
    assert_eq!(words.count().unwrap(), seeded);
    assert_eq!(words.seed_defaults().unwrap(), 0);
    assert!(!words.draw_random_word().text.is_empty());
}

#[test]
fn history_export_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("history.txt");

    let mut log = HistoryLog::new();
    assert_eq!(log.export(&path).unwrap(), 0);
    assert!(!path.exists());

    log.push("Mode: Multiplayer | ann: 3, bob: 0");
    log.push("Mode: Singleplayer (Normal) | Player: ann | Score: 2");
    assert_eq!(log.export(&path).unwrap(), 2);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Mode: Multiplayer | ann: 3, bob: 0\nMode: Singleplayer (Normal) | Player: ann | Score: 2"
    );
}

#[test]
fn cli_import_and_seed_without_tty() {
    let dir = tempdir().unwrap();
    let list = dir.path().join("extra.txt");
    fs::write(&list, "quokka;animals\nbad line\nquokka;animals\n").unwrap();

    Command::cargo_bin("hangr")
        .unwrap()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--import")
        .arg(&list)
        .assert()
        .success()
        .stdout("Added 1 new words with categories.\n");

    Command::cargo_bin("hangr")
        .unwrap()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--seed")
        .assert()
        .success();

    let words = WordDb::open(dir.path().join("words.db")).unwrap();
    assert!(words.count().unwrap() > 1);
    assert!(dir.path().join("hangr.log").exists());
}
