use medalboard::chart::{ChartKind, ChartSpec};
use medalboard::dashboard::Dashboard;
use medalboard::data::{Dataset, Record};
use medalboard::filter::{filter, FilterSpec, Medal};
use medalboard::ir::Frame;
use medalboard::parser::parse_filter;
use medalboard::view::{ChartView, Scene};
use medalboard::{kpi, render, OutputFormat};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run the medalboard binary with optional stdin input
fn run_medalboard(args: &[&str], stdin: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_medalboard"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn is_svg(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).contains("<svg")
}

fn fixture(name: &str) -> Dataset {
    Dataset::load(Path::new("test").join(name).as_path()).expect("Failed to load fixture")
}

fn scenario() -> Dataset {
    vec![
        Record::new().with("country", "USA").with("gold", 40).with("silver", 40).with("bronze", 40).with("total", 120),
        Record::new().with("country", "CHN").with("gold", 30).with("silver", 20).with("bronze", 10).with("total", 60),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_end_to_end_bar_chart() {
    let result = run_medalboard(&["render", "--data", "test/medals.json", "--chart", "bar"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_stacked_bar_from_csv_stdin() {
    let csv = fs::read_to_string("test/medals.csv").expect("Failed to read test CSV");
    let result = run_medalboard(&["render", "--chart", "stacked-bar"], Some(&csv));
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_filtered_bubble() {
    let result = run_medalboard(
        &[
            "render",
            "--data",
            "test/medals.json",
            "--chart",
            "bubble",
            "--filter",
            "season(summer) | medals(gold, silver)",
            "--width",
            "600",
            "--height",
            "400",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_svg_output() {
    let result = run_medalboard(
        &["render", "--data", "test/medals.json", "--chart", "sunburst", "--format", "svg"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_svg(&result.unwrap()));
}

#[test]
fn test_end_to_end_config_file() {
    let result = run_medalboard(&["render", "--data", "test/athletes.json", "--config", "test/violin.json"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_svg(&result.unwrap()));
}

#[test]
fn test_end_to_end_athlete_charts() {
    for chart in ["violin", "matrix", "parallel"] {
        let result = run_medalboard(&["render", "--data", "test/athletes.json", "--chart", chart], None);
        assert!(result.is_ok(), "{} failed: {:?}", chart, result.err());
        assert!(is_valid_png(&result.unwrap()), "{} is not a valid PNG", chart);
    }
}

#[test]
fn test_end_to_end_unsupported_chart_renders_placeholder() {
    let result = run_medalboard(&["render", "--data", "test/medals.json", "--chart", "radar"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_empty_result_renders_placeholder() {
    let result = run_medalboard(
        &["render", "--data", "test/medals.json", "--filter", "countries(FRA)"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_output_file() {
    let out = std::env::temp_dir().join(format!("medalboard-{}.png", std::process::id()));
    let out_arg = out.to_string_lossy().to_string();
    let result = run_medalboard(&["render", "--data", "test/medals.json", "--out", &out_arg], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(result.unwrap().is_empty());
    let bytes = fs::read(&out).expect("Output file missing");
    assert!(is_valid_png(&bytes));
    let _ = fs::remove_file(&out);
}

#[test]
fn test_end_to_end_filter_json() {
    let result = run_medalboard(
        &["filter", "--data", "test/medals.json", "--filter", "medals(gold) | season(summer)"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let json: serde_json::Value = serde_json::from_slice(&result.unwrap()).expect("Invalid JSON");
    assert_eq!(json["records"].as_array().map(|a| a.len()), Some(5));
    assert_eq!(json["aggregates"]["totals"]["total"].as_f64(), Some(132.0));
    assert_eq!(json["aggregates"]["totals"]["silver"].as_f64(), Some(0.0));
    assert_eq!(json["activeFilters"].as_u64(), Some(2));
    assert!(json["summary"].as_str().unwrap().contains("Showing 5 filtered results"));
}

#[test]
fn test_end_to_end_filter_by_country_name() {
    let result = run_medalboard(
        &["filter", "--data", "test/medals.json", "--filter", r#"countries("United States", "Great Britain")"#],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let json: serde_json::Value = serde_json::from_slice(&result.unwrap()).expect("Invalid JSON");
    assert_eq!(json["aggregates"]["count"].as_u64(), Some(2));
}

#[test]
fn test_end_to_end_population_join() {
    let args = ["--data", "test/medals.json", "--population", "test/population.json", "--filter", "season(summer)"];
    let result = run_medalboard(&[&["filter"][..], &args[..]].concat(), None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let json: serde_json::Value = serde_json::from_slice(&result.unwrap()).expect("Invalid JSON");
    let joined = json["perMillion"].as_array().expect("missing join");
    assert_eq!(joined.len(), 5);
    assert_eq!(joined[4]["country"].as_str(), Some("Kenya"));
    assert_eq!(joined[4]["region"].as_str(), Some("Africa"));

    let result = run_medalboard(&[&["render", "--chart", "scatter"][..], &args[..]].concat(), None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_kpi_json() {
    let result = run_medalboard(
        &["kpi", "--data", "test/medals.json", "--participation", "test/participation.json"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let json: serde_json::Value = serde_json::from_slice(&result.unwrap()).expect("Invalid JSON");
    assert_eq!(json["totalMedals"].as_f64(), Some(401.0));
    assert_eq!(json["countryCount"].as_u64(), Some(7));
    assert_eq!(json["leader"].as_str(), Some("United States"));
    assert_eq!(json["latestYear"].as_i64(), Some(2020));
    assert_eq!(json["latestYearTotal"].as_f64(), Some(11656.0));
}

#[test]
fn test_end_to_end_bad_filter_fails() {
    let result = run_medalboard(&["filter", "--data", "test/medals.json", "--filter", "medals(platinum)"], None);
    let err = result.expect_err("Should fail on an unknown medal");
    assert!(err.contains("filter"), "unexpected stderr: {}", err);
}

#[test]
fn test_end_to_end_missing_data_file_fails() {
    let result = run_medalboard(&["kpi", "--data", "test/does_not_exist.json"], None);
    assert!(result.is_err());
}

#[test]
fn test_medal_filter_scenario() {
    let data = scenario();
    let filtered = filter(&data, &FilterSpec::default().medals([Medal::Gold]));
    let expected: Dataset = vec![
        Record::new().with("country", "USA").with("gold", 40).with("silver", 0).with("bronze", 0).with("total", 40),
        Record::new().with("country", "CHN").with("gold", 30).with("silver", 0).with("bronze", 0).with("total", 30),
    ]
    .into_iter()
    .collect();
    assert_eq!(filtered, expected);
    assert_eq!(data, scenario());
}

#[test]
fn test_country_filter_scenario_keeps_global_kpis() {
    let data = scenario();
    assert!(filter(&data, &FilterSpec::default().countries(["FRA"])).is_empty());
    assert_eq!(kpi::compute(&data).country_count, 2);
}

#[test]
fn test_filter_composition_equals_intersection() {
    let data = fixture("medals.json");
    let a = parse_filter("season(summer) | medals(gold, bronze)").unwrap();
    let b = parse_filter(r#"countries("United States", Japan, Kenya) | years(2016, 2020)"#).unwrap();
    let composed = filter(&filter(&data, &a), &b);
    assert_eq!(composed, filter(&data, &a.intersect(&b)));
    assert_eq!(composed.len(), 3);
}

#[test]
fn test_csv_and_json_fixtures_agree() {
    let json = fixture("medals.json");
    let csv = fixture("medals.csv");
    assert_eq!(csv.len(), 6);
    for (c, j) in csv.records()[..5].iter().zip(json.records()) {
        assert_eq!(c.text("code"), j.text("code"));
        assert_eq!(c.number("total"), j.number("total"));
        assert_eq!(c.number("year"), j.number("year"));
    }
    assert!(!csv.records()[5].has("total"));
}

#[test]
fn test_every_chart_renders_png() {
    let medals = fixture("medals.json");
    let frame = Frame::default();
    for kind in ChartKind::ALL {
        let mut view = ChartView::mount(ChartSpec::default_for(kind), frame);
        view.update(&medals);
        let bytes = render::render(view.scene(), view.frame(), &OutputFormat::Png)
            .unwrap_or_else(|e| panic!("{} failed to render: {}", kind, e));
        assert!(is_valid_png(&bytes), "{} is not a valid PNG", kind);
    }
}

#[test]
fn test_dashboard_round_trip() {
    let mut board = Dashboard::with_participation(fixture("medals.json"), Some(fixture("participation.json")));
    let index = board.mount(ChartView::mount_key("stacked_bar", Frame::default()));
    assert_eq!(board.kpis().latest_year_total, 11656.0);

    board.set_filters(parse_filter("season(winter)").unwrap());
    assert_eq!(board.filtered().len(), 2);
    let Scene::Chart { geometry, .. } = board.views()[index].scene() else {
        panic!("expected a chart scene");
    };
    // Three medal segments per country.
    assert_eq!(geometry.primitives.len(), 6);
    assert_eq!(board.kpis().total_medals, 401.0);

    let options = board.facet_options();
    assert_eq!(options.countries.len(), 7);
    assert_eq!((options.years.min, options.years.max), (2016, 2022));
}
