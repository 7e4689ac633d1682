use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use indash::{ChartKind, Dashboard, Error, Mode, Page, YearRange};

const DATA: &str = "\
country,year,Sector,activityName,Dimension,variableName,value,valueUSD,unidadMedida
Chile,2018,Mining,Copper,Output,Index of industrial production,90,,Index
Chile,2019,Mining,Copper,Output,Index of industrial production,100,,Index
Chile,2020,Mining,Copper,Output,Index of industrial production,110,,Index
Peru,2019,Mining,Copper,Output,Index of industrial production,70,,Index
Peru,2020,Mining,Copper,Output,Index of industrial production,80,,Index
Saudi Arabia,2020,Mining,Copper,Output,Index of industrial production,60,,Index
Chile,2020,Mining,Copper,Exports,Exports per employee,,1500,USD
Peru,2020,Manufacturing,Textiles,Output,MVA annual growth rate,2.5,,%
";

const CONFIG: &str = r##"
page_title = "Mining Indicators"
data_path = "data.csv"
highlight = "Saudi Arabia"
default_dimensions = ["Output", "Exports"]

[sector_indicators]
Mining = ["Index of industrial production", "Exports per employee"]

[theme]
textColor = "#222222"
"##;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

// Each test gets its own scratch directory so that tests can run in parallel.
fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "indash-pipeline-{}-{}",
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_fixture(dir: &Path, config: &str, data: &str) -> PathBuf {
    fs::write(dir.join("data.csv"), data).unwrap();
    let config_path = dir.join("config.toml");
    fs::write(&config_path, config).unwrap();
    config_path
}

#[test]
fn loads_and_renders_overview() {
    let dir = scratch_dir();
    let dashboard = Dashboard::load(write_fixture(&dir, CONFIG, DATA)).unwrap();
    assert_eq!(dashboard.dataset().len(), 8);
    assert_eq!(dashboard.config().options().data_path, dir.join("data.csv"));

    let selection = dashboard.default_selection(Mode::Overview);
    assert_eq!(selection.sector(), "Mining");
    assert_eq!(selection.activities(), ["Copper".to_string()]);
    assert_eq!(selection.years(), YearRange::new(2018, 2020).unwrap());

    let rendered = dashboard.render(&selection, Mode::Overview);
    let charts = rendered.charts().collect::<Vec<_>>();
    assert_eq!(charts.len(), 2);
    assert_eq!(charts[0].kind, ChartKind::Line);
    assert_eq!(charts[0].font_color, "#222222");
    assert_eq!(charts[1].kind, ChartKind::Bar);
    // One bar per country, labeled with the year of its latest record.
    let bars = charts[1]
        .series
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(bars, vec!["Chile", "Peru", "Saudi Arabia"]);

    let html = Page::new().unwrap().render(&dashboard, &rendered).unwrap();
    assert!(html.contains("Mining Indicators</title>"));
    assert!(html.contains("Chile (2020)"));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn indicators_mode_uses_configured_defaults() {
    let dir = scratch_dir();
    let dashboard = Dashboard::load(write_fixture(&dir, CONFIG, DATA)).unwrap();
    let selection = dashboard.default_selection(Mode::Indicators);
    assert_eq!(
        selection.variables(),
        [
            "Index of industrial production".to_string(),
            "Exports per employee".to_string()
        ]
    );

    let rendered = dashboard.render(&selection, Mode::Indicators);
    let charts = rendered.charts().collect::<Vec<_>>();
    assert_eq!(charts.len(), 2);
    let saudi = charts[0]
        .series
        .iter()
        .find(|s| s.name == "Saudi Arabia")
        .unwrap();
    assert_eq!(saudi.style.line_color.as_deref(), Some("green"));
    assert_eq!(charts[1].y_title, "USD");
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn narrowed_selection_can_match_nothing() {
    let dir = scratch_dir();
    let dashboard = Dashboard::load(write_fixture(&dir, CONFIG, DATA)).unwrap();
    let selection = dashboard
        .default_selection(Mode::Overview)
        .with_countries(vec!["Saudi Arabia"])
        .with_years(YearRange::new(2018, 2019).unwrap());
    let rendered = dashboard.render(&selection, Mode::Overview);
    assert!(rendered.data.is_empty());
    assert_eq!(rendered.charts().count(), 0);
    assert_eq!(
        rendered.notices().next().unwrap().message,
        "No data available for the selected filters."
    );
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn missing_column_fails_to_load() {
    let dir = scratch_dir();
    let data = "country,year,Sector,activityName,variableName,value,unidadMedida\n";
    let err = Dashboard::load(write_fixture(&dir, CONFIG, data)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::FailedToLoadDataset(_))
    ));
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<Error>(),
        Some(Error::MissingColumn(c)) if c == "Dimension"
    )));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn missing_config_fails_to_load() {
    let dir = scratch_dir();
    let err = Dashboard::load(dir.join("nope.toml")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::FailedToLoadConfig(_))
    ));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn unknown_default_sector_is_rejected() {
    let dir = scratch_dir();
    // Top-level keys must precede the tables.
    let config = format!("default_sector = \"Energy\"\n{}", CONFIG);
    let err = Dashboard::load(write_fixture(&dir, &config, DATA)).unwrap_err();
    assert!(err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::InvalidConfig(_)))));
    fs::remove_dir_all(dir).unwrap();
}
