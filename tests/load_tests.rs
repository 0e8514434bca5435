//! Load pipeline integration tests

mod common;

use common::{
    MockProduct, MockTarget, latest_dir, mock_product_ctor, mock_settings, mock_target_ctor,
};
use dataimport::entity::{Product, Registry, Target};
use dataimport::pipeline::{AssembleStage, Assembler, LoadStage, Loader, stage_range};
use tempfile::TempDir;

fn mock_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_product("mock", mock_product_ctor);
    registry.register_target("mock", mock_target_ctor);
    registry
}

fn assemble_product(settings: &dataimport::Settings) {
    let mut products: Vec<Box<dyn Product>> =
        vec![Box::new(MockProduct::new(settings, "mockproduct"))];
    Assembler::new(settings)
        .assemble(&mut products, false, &AssembleStage::all())
        .unwrap();
}

fn mock_targets(settings: &dataimport::Settings) -> Vec<Box<dyn Target>> {
    vec![Box::new(MockTarget::new(settings, "mocktarget"))]
}

#[test]
fn test_prepare_stage_only() {
    let temp = TempDir::new().unwrap();
    let settings = mock_settings(temp.path());
    let registry = mock_registry();
    assemble_product(&settings);

    let stages = stage_range(&LoadStage::all(), Some(LoadStage::Prepare), true);
    let mut targets = mock_targets(&settings);
    Loader::new(&settings, &registry)
        .load(&mut targets, false, &stages)
        .unwrap();

    let latest = latest_dir(&settings, "mocktarget");
    assert!(latest.join("load.json").is_file());
    assert!(!settings.outgoing.as_ref().unwrap().exists());
}

#[test]
fn test_full_pipeline_delivers_feed() {
    let temp = TempDir::new().unwrap();
    let settings = mock_settings(temp.path());
    let registry = mock_registry();

    let mut targets = mock_targets(&settings);
    Loader::new(&settings, &registry)
        .load(&mut targets, false, &LoadStage::all())
        .unwrap();

    let delivered = settings.outgoing.as_ref().unwrap().join("mocktarget.json");
    assert!(delivered.is_file());

    let content = std::fs::read_to_string(&delivered).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0]["issns"],
        serde_json::json!(["1234-5678", "1234-567X"])
    );
}

#[test]
fn test_load_without_prepare_fails() {
    let temp = TempDir::new().unwrap();
    let settings = mock_settings(temp.path());
    let registry = mock_registry();

    let stages = stage_range(&LoadStage::all(), Some(LoadStage::Load), true);
    let mut targets = mock_targets(&settings);
    let err = Loader::new(&settings, &registry)
        .load(&mut targets, false, &stages)
        .unwrap_err();

    assert_eq!(err.entity(), Some("mocktarget"));
    assert_eq!(err.stage_name(), Some("load"));
}

#[test]
fn test_stage_major_iteration_prepares_all_before_load() {
    let temp = TempDir::new().unwrap();
    let settings = mock_settings(temp.path())
        .with_target("othertarget", "mock")
        .with_target_products("othertarget", vec!["mockproduct".to_string()]);
    let registry = mock_registry();
    assemble_product(&settings);

    let stages = stage_range(&LoadStage::all(), Some(LoadStage::Prepare), false);
    let mut targets: Vec<Box<dyn Target>> = vec![
        Box::new(MockTarget::new(&settings, "mocktarget")),
        Box::new(MockTarget::new(&settings, "othertarget")),
    ];
    Loader::new(&settings, &registry)
        .load(&mut targets, false, &stages)
        .unwrap();

    // both targets were prepared in the same pass
    assert!(latest_dir(&settings, "mocktarget").join("load.json").is_file());
    assert!(latest_dir(&settings, "othertarget").join("load.json").is_file());
}
