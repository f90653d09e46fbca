//! Cross-crate loading tests: graphs and run settings read from disk drive
//! the core engine and analyzer.

use std::fs;
use std::path::{Path, PathBuf};

use pulsenet_core::analyzer::presses_until_low;
use pulsenet_core::engine::count_pulses;
use pulsenet_core::test_utils::*;
use pulsenet_data::schema::GraphFile;
use pulsenet_data::{load_graph_file, load_run_config, DataLoadError};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pulsenet_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn exported_graph_loads_in_every_format() {
    let dir = make_test_dir("export");
    let file = GraphFile::from_graph(&counter_network(&[3, 5, 7]));

    let json = dir.join("net.json");
    fs::write(&json, serde_json::to_string_pretty(&file).unwrap()).unwrap();
    let ron_path = dir.join("net.ron");
    fs::write(&ron_path, ron::to_string(&file).unwrap()).unwrap();
    let toml_path = dir.join("net.toml");
    fs::write(&toml_path, toml::to_string(&file).unwrap()).unwrap();

    let expected = count_pulses(&counter_network(&[3, 5, 7]), 200).unwrap();
    for path in [&json, &ron_path, &toml_path] {
        let graph = load_graph_file(path).unwrap();
        assert_eq!(count_pulses(&graph, 200).unwrap(), expected, "{}", path.display());
    }

    cleanup(&dir);
}

#[test]
fn run_config_drives_both_modes() {
    let dir = make_test_dir("config");
    let graph_path = dir.join("modules.txt");
    fs::write(
        &graph_path,
        "broadcaster -> a\n%a -> inv, con\n&inv -> b\n%b -> con\n&con -> output\n",
    )
    .unwrap();
    let config_path = dir.join("run.toml");
    fs::write(
        &config_path,
        "counting_pushes = 4\nterminal = \"output\"\n\n[analyzer]\nmax_pushes = 10\n",
    )
    .unwrap();

    let graph = load_graph_file(&graph_path).unwrap();
    let config = load_run_config(&config_path).unwrap();

    let counters = count_pulses(&graph, config.counting_pushes).unwrap();
    assert_eq!((counters.low, counters.high), (17, 11));
    assert_eq!(
        presses_until_low(&graph, &config.terminal, &config.analyzer).unwrap(),
        1
    );

    cleanup(&dir);
}

#[test]
fn malformed_text_file_is_rejected_whole() {
    let dir = make_test_dir("malformed");
    let path = dir.join("modules.txt");
    fs::write(&path, "broadcaster -> a\n%a -> b\n&b ->\n").unwrap();

    let err = load_graph_file(&path).unwrap_err();
    assert!(matches!(err, DataLoadError::Declarations { .. }));
    assert!(err.to_string().contains("line 3"));

    cleanup(&dir);
}
