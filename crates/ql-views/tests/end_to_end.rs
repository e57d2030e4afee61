use ql_core::{Record, RenderContext};
use ql_data::{QueryResponse, VisualKind, VisualSpec, YSpec};
use ql_render::ChartKind;
use ql_views::plots::chart_kind;
use ql_views::{
    derive_series, ChartEngine, ExportAdapters, ExportOutcome, FileExporter, ResultCards, ResultView, Series,
    SeriesPoint, TableView, Window,
};
use serde_json::json;

fn sales() -> Vec<Record> {
    serde_json::from_value(json!([
        {"month": "Ocak", "sales": 120},
        {"month": "Şubat", "sales": 150},
        {"month": "Mart", "sales": 90}
    ]))
    .unwrap()
}

fn point(row: usize, category: &str, value: f64) -> SeriesPoint {
    SeriesPoint {
        row,
        category: category.to_string(),
        value,
    }
}

#[test]
fn monthly_sales_bar_chart_and_table() {
    let ctx = RenderContext::default();
    let batch = sales();

    let engine = ChartEngine::new(&batch, ChartKind::Bar, Some("month"), Some(&YSpec::from("sales")), &ctx);
    assert_eq!(
        engine.series(),
        &[Series {
            label: "sales".into(),
            points: vec![point(0, "Ocak", 120.0), point(1, "Şubat", 150.0), point(2, "Mart", 90.0)],
        }]
    );
    let spec = engine.spec(&ctx).unwrap();
    assert_eq!(spec.categories, vec!["Ocak", "Şubat", "Mart"]);
    assert_eq!(spec.title.as_deref(), Some("sales vs month"));

    let mut table = TableView::new("Results", batch, &ctx, 10);
    let projection = table.projection();
    assert_eq!(projection.visible_rows.len(), 3);
    assert_eq!(table.columns().len(), 2);
    assert!(table.state().sort().is_none());
    assert_eq!(table.state().filter(), "");
    assert_eq!(projection.page_index, 0);
    assert_eq!(projection.page_count, 1);
}

#[test]
fn empty_batch_has_no_results_and_no_chart_data() {
    let ctx = RenderContext::default();

    let table = TableView::new("Results", Vec::new(), &ctx, 10);
    assert!(!table.has_data());

    for kind in VisualKind::CHART_KINDS {
        let chart = chart_kind(kind).unwrap();
        let engine = ChartEngine::new(&[], chart, Some("month"), Some(&YSpec::from("sales")), &ctx);
        assert!(!engine.has_data(), "{} should have no chart data", kind.name());
        assert!(engine.spec(&ctx).is_none());
    }
}

#[test]
fn textual_first_value_columns_never_plot() {
    let batch: Vec<Record> = serde_json::from_value(json!([
        {"m": "Jan", "v": 10, "w": "20"},
        {"m": "Feb", "v": "20", "w": 30}
    ]))
    .unwrap();

    let series = derive_series(&batch, Some("m"), None);
    assert_eq!(
        series,
        vec![Series {
            label: "v".into(),
            points: vec![point(0, "Jan", 10.0)],
        }]
    );
}

#[test]
fn window_keeps_requested_rows() {
    let ctx = RenderContext::default();
    let batch: Vec<Record> = (0..5)
        .map(|i| serde_json::from_value(json!({"x": format!("r{}", i), "y": i})).unwrap())
        .collect();
    let mut engine = ChartEngine::new(&batch, ChartKind::Line, Some("x"), None, &ctx);

    engine.set_window(Window { start: 1, end: 3 });
    let spec = engine.spec(&ctx).unwrap();
    let values: Vec<f64> = spec.series[0].points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![1.0, 2.0]);

    engine.set_window(Window { start: -4, end: 2 });
    assert_eq!(engine.window(), Window { start: 0, end: 2 });
}

#[test]
fn window_with_dropped_rows_stays_aligned() {
    let ctx = RenderContext::default();
    let batch: Vec<Record> = serde_json::from_value(json!([
        {"r": "r0", "a": 0, "b": 10},
        {"r": "r1", "a": 1, "b": "11"},
        {"r": "r2", "a": 2, "b": 12},
        {"r": "r3", "a": 3, "b": 13}
    ]))
    .unwrap();
    let mut engine = ChartEngine::new(&batch, ChartKind::Bar, Some("r"), Some(&YSpec::from("a, b")), &ctx);
    engine.set_window(Window { start: 1, end: 3 });
    let spec = engine.spec(&ctx).unwrap();

    assert_eq!(spec.categories, vec!["r1", "r2"]);
    for series in &spec.series {
        for p in &series.points {
            assert!(p.category == "r1" || p.category == "r2", "{} plotted {}", series.label, p.category);
            assert_eq!(spec.categories[p.x as usize], p.category);
        }
    }
    let b: Vec<(&str, f64)> = spec.series[1].points.iter().map(|p| (p.category.as_str(), p.value)).collect();
    assert_eq!(b, vec![("r2", 12.0)]);
}

#[test]
fn repeated_x_values_get_one_slot_per_row() {
    let ctx = RenderContext::default();
    let batch: Vec<Record> = serde_json::from_value(json!([
        {"m": "Ocak", "v": 1},
        {"m": "Ocak", "v": 2},
        {"m": "Mart", "v": 3}
    ]))
    .unwrap();
    let spec = ChartEngine::new(&batch, ChartKind::Bar, Some("m"), None, &ctx)
        .spec(&ctx)
        .unwrap();

    assert_eq!(spec.categories, vec!["Ocak", "Ocak", "Mart"]);
    let bars: Vec<(f64, f64)> = spec.series[0].points.iter().map(|p| (p.x, p.value)).collect();
    assert_eq!(bars, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
}

#[test]
fn response_exports_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = RenderContext::default();
    let response = QueryResponse {
        sql: "SELECT month, sales FROM s".into(),
        visuals: vec![
            VisualSpec::table(sales()),
            VisualSpec {
                kind: VisualKind::Pie,
                x: Some("month".into()),
                y: Some("sales".into()),
                data: sales(),
            },
        ],
    };

    let cards = ResultCards::from_response(&response, &ctx, 10);
    let card = &cards.cards()[0];
    let exporter = FileExporter::new(dir.path(), 320, 240);

    let table = card.table().unwrap();
    match exporter.csv(&table.export_projection()).unwrap() {
        ExportOutcome::Written(path) => {
            let text = std::fs::read_to_string(path).unwrap();
            assert!(text.starts_with("\"month\",\"sales\"\n"));
            assert!(text.contains("\"Şubat\",\"150\""));
        }
        ExportOutcome::Skipped => panic!("table export skipped"),
    }

    let engine = card.chart().unwrap().engine();
    let spec = engine.spec(&ctx).unwrap();
    let snapshot = ql_views::ChartSnapshot {
        chart: &spec,
        bounds: engine.bounds(),
    };
    assert!(matches!(exporter.png_snapshot(&snapshot).unwrap(), ExportOutcome::Written(_)));
    assert!(dir.path().join("chart.png").exists());
}
