//! End-to-end tests for layered settings persistence.

use std::fs;
use std::path::Path;

use horizon_lattice_registry::{Color, Registry, Settings, Tier};
use tempfile::TempDir;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn registry(system: &Path, user: &Path) -> Registry {
    let mut registry = Registry::new("testapp", "");
    registry.set_ascii_mode(true);
    registry.set_system_path(&system.to_string_lossy());
    registry.set_user_dir(user);
    registry
}

#[test]
fn test_written_value_survives_restart() {
    init_logging();
    let system = TempDir::new().unwrap();
    let user = TempDir::new().unwrap();

    let mut first = registry(system.path(), user.path());
    first.read();
    assert!(first.write_int("General", "width", 800));
    first.write().unwrap();
    assert!(!first.is_modified());

    let mut second = registry(system.path(), user.path());
    second.read();
    assert_eq!(second.read_int("General", "width", 0), 800);
}

#[test]
fn test_user_edits_beat_system_defaults() {
    init_logging();
    let system = TempDir::new().unwrap();
    let user = TempDir::new().unwrap();
    fs::write(
        system.path().join("testapp.rc"),
        "[Colors]\nbackground=white\nforeground=black\n",
    )
    .unwrap();

    let mut first = registry(system.path(), user.path());
    first.read();
    assert_eq!(
        first.read_color("Colors", "background", Color::TRANSPARENT),
        Color::rgb(255, 255, 255)
    );
    first.write_color("Colors", "background", Color::rgb(0x12, 0x34, 0x56));
    first.write().unwrap();

    let saved = fs::read_to_string(user.path().join("testapp.rc")).unwrap();
    assert_eq!(saved, "[Colors]\nbackground=#123456\n");

    let mut second = registry(system.path(), user.path());
    second.read();
    assert_eq!(
        second.read_color("Colors", "background", Color::TRANSPARENT),
        Color::rgb(0x12, 0x34, 0x56)
    );
    assert_eq!(
        second.read_color("Colors", "foreground", Color::TRANSPARENT),
        Color::rgb(0, 0, 0)
    );
}

#[test]
fn test_malformed_user_file_degrades_to_defaults() {
    init_logging();
    let system = TempDir::new().unwrap();
    let user = TempDir::new().unwrap();
    fs::write(
        user.path().join("testapp.rc"),
        "stray=1\n[Window\n[Window]\nwidth\nheight=600\n",
    )
    .unwrap();

    let mut registry = registry(system.path(), user.path());
    registry.read();
    assert_eq!(registry.read_int("Window", "width", 640), 640);
    assert_eq!(registry.read_int("Window", "height", 480), 600);
}

#[test]
fn test_deleted_entries_are_not_persisted() {
    init_logging();
    let system = TempDir::new().unwrap();
    let user = TempDir::new().unwrap();

    let mut first = registry(system.path(), user.path());
    first.write_string("Recent", "file1", "/tmp/a.txt");
    first.write_string("Recent", "file2", "/tmp/b.txt");
    first.write().unwrap();

    let mut second = registry(system.path(), user.path());
    second.read();
    assert!(second.delete_entry("Recent", "file1"));
    second.write().unwrap();

    let path = second.tier_file(Tier::UserApplication).unwrap();
    let mut reloaded = Settings::new();
    reloaded.parse_file(&path, true).unwrap();
    assert!(!reloaded.exists_entry("Recent", "file1"));
    assert_eq!(reloaded.read_string("Recent", "file2"), Some("/tmp/b.txt"));
}
