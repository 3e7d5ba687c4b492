//! End-to-end workflows across the loader, template and report layers

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use confweave_cli::report;
use confweave_domain::{PreferencesManager, SettingsLoader, TokenDataset};
use confweave_generation::Generator;
use confweave_settings::CsvSettingsLoader;
use confweave_templating::XmlTemplate;

#[test]
fn loader_and_template_compose_without_the_orchestrator() {
    let root = TempDir::new().unwrap();
    let settings = root.path().join("settings.csv");
    fs::write(
        &settings,
        "MachineName,Greeting\nAlpha,hello\nBeta,goodbye\n",
    )
    .unwrap();

    let configurations = CsvSettingsLoader::new().load(&settings).unwrap();
    let template = XmlTemplate::parse("<root><g>[%Greeting%]</g></root>").unwrap();

    let datasets: Vec<TokenDataset<'_>> = configurations.iter().map(TokenDataset::new).collect();
    let results = template.render_all(&datasets);

    assert_eq!(results[0].rendered.as_deref(), Some("<root><g>hello</g></root>"));
    assert_eq!(
        results[1].rendered.as_deref(),
        Some("<root><g>goodbye</g></root>")
    );
}

#[test]
fn report_summarises_a_real_run() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("template.xml"),
        "<root><v>[%MachineName%]</v></root>",
    )
    .unwrap();
    fs::write(
        root.path().join("settings.csv"),
        "MachineName\nAlpha\nBeta\n",
    )
    .unwrap();

    let result = Generator::new(preferences(root.path())).generate();
    let text = report::summary(&result);

    assert!(text.contains("Alpha"));
    assert!(text.contains("Beta"));
    assert!(text.contains("2 configuration(s), 2 changed, 0 issue(s)"));
}

fn preferences(root: &Path) -> PreferencesManager {
    let template = root.join("template.xml").display().to_string();
    let settings = root.join("settings.csv").display().to_string();
    let output = root.join("out").display().to_string();
    PreferencesManager::from_caller([
        ("TemplateFilePath", template.as_str()),
        ("SettingsFilePath", settings.as_str()),
        ("OutputDirectory", output.as_str()),
    ])
    .expect("preferences are valid")
}
