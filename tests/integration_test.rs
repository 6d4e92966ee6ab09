use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use label_generator::models::loaders::{load_orders, TemplateSource};
use label_generator::models::template::LabelTemplate;
use label_generator::{generate_all, App, AppError, Config, JobContext, LabelJob, Order};

const TEMPLATE: &str = r#"
name = "test"
width_mm = 100.0
height_mm = 60.0

[[text]]
content = "Order: {id}"
x_mm = 5.0
y_mm = 20.0

[barcode]
x_mm = 10.0
y_mm = 35.0
width_mm = 80.0
height_mm = 20.0
"#;

/// 创建工作目录：模板、订单、输出目录和配置文件
fn workspace(dir: &Path, orders: &str, thread_count: usize) -> std::path::PathBuf {
    fs::write(dir.join("template.toml"), TEMPLATE).unwrap();
    fs::write(dir.join("orders.json"), orders).unwrap();
    fs::create_dir_all(dir.join("output")).unwrap();
    let config_path = dir.join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "order_source_path": "orders.json",
                "template_path": "template.toml",
                "output_dir": "output",
                "barcode_format": "code39",
                "thread_count": {}
            }}"#,
            thread_count
        ),
    )
    .unwrap();
    config_path
}

fn pdf_files(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".pdf"))
        .collect()
}

#[tokio::test]
async fn test_example_scenario_one_valid_one_empty_code() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(
        dir.path(),
        r#"[{"id":"A1","code":"12345"}, {"id":"A2","code":""}]"#,
        2,
    );

    let config = Config::load(&config_path).await.unwrap();
    let batch = load_orders(&config.order_source_path).await.unwrap();
    let result = generate_all(Arc::new(config), batch.orders).unwrap();

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed, 1);
    assert_eq!(result.failures[0].order_id, "A2");
    assert_eq!(
        pdf_files(&dir.path().join("output")),
        BTreeSet::from(["A1.pdf".to_string()])
    );
}

#[tokio::test]
async fn test_output_count_matches_succeeded() {
    let dir = tempfile::tempdir().unwrap();
    let orders: Vec<String> = (1..=12)
        .map(|i| format!(r#"{{"id":"ORD{:03}","code":"{}"}}"#, i, 1000 + i))
        .collect();
    let config_path = workspace(dir.path(), &format!("[{}]", orders.join(",")), 4);

    let config = Config::load(&config_path).await.unwrap();
    let batch = load_orders(&config.order_source_path).await.unwrap();
    let result = generate_all(Arc::new(config), batch.orders).unwrap();

    assert_eq!(result.succeeded, 12);
    assert_eq!(result.failed, 0);
    assert_eq!(pdf_files(&dir.path().join("output")).len(), result.succeeded);
    for output in &result.outputs {
        let bytes = fs::read(&output.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

#[tokio::test]
async fn test_thread_count_does_not_change_outcome() {
    let orders = r#"[
        {"id":"A1","code":"111"},
        {"id":"A2","code":""},
        {"id":"A3","code":"abc#"},
        {"id":"A4","code":"444"},
        {"id":"A5","code":"555"},
        {"id":"A5","code":"556"},
        {"id":"../A7","code":"777"},
        {"id":"A8","code":"888"}
    ]"#;

    let mut outcomes = Vec::new();
    for threads in [1, 8] {
        let dir = tempfile::tempdir().unwrap();
        let config_path = workspace(dir.path(), orders, threads);
        let config = Config::load(&config_path).await.unwrap();
        let batch = load_orders(&config.order_source_path).await.unwrap();
        let result = generate_all(Arc::new(config), batch.orders).unwrap();

        let succeeded: Vec<String> = result.succeeded_ids().map(String::from).collect();
        let failed: Vec<String> = result.failed_ids().map(String::from).collect();
        assert_eq!(pdf_files(&dir.path().join("output")).len(), succeeded.len());
        outcomes.push((succeeded, failed));
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[0].0, vec!["A1", "A4", "A5", "A8"]);
    assert_eq!(outcomes[0].1, vec!["../A7", "A2", "A3", "A5"]);
}

#[tokio::test]
async fn test_missing_config_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("output")).unwrap();

    let err = Config::load(dir.path().join("config.json")).await.unwrap_err();
    let err: AppError = err.into();
    assert!(matches!(err, AppError::Config(_)));
    assert!(pdf_files(&dir.path().join("output")).is_empty());
}

#[tokio::test]
async fn test_broken_template_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(dir.path(), r#"[{"id":"A1","code":"1"}]"#, 2);
    fs::write(dir.path().join("template.toml"), "width_mm = \"wide\"").unwrap();

    let config = Config::load(&config_path).await.unwrap();
    assert!(App::initialize(config.clone()).await.is_err());
    let err = generate_all(Arc::new(config), vec![Order::new("A1", "1")]).unwrap_err();
    assert!(matches!(err, AppError::Template(_)));
    assert!(pdf_files(&dir.path().join("output")).is_empty());
}

#[tokio::test]
async fn test_rerun_reproduces_same_label_content() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(dir.path(), r#"[{"id":"A1","code":"12345"}]"#, 1);
    let config = Arc::new(Config::load(&config_path).await.unwrap());

    let templates = TemplateSource::open(&config.template_path).await.unwrap();
    let ctx = JobContext::new(Arc::clone(&config), templates);
    let job = LabelJob::new(1, Order::new("A1", "12345"));
    assert_eq!(job.layout(&ctx).unwrap(), job.layout(&ctx).unwrap());

    let first = generate_all(Arc::clone(&config), vec![Order::new("A1", "12345")]).unwrap();
    let second = generate_all(Arc::clone(&config), vec![Order::new("A1", "12345")]).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_app_run_with_write_back() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(
        dir.path(),
        r#"[
            {"id":"A1","code":"111"},
            {"id":"A2","code":""},
            {"id":"A3","code":"333","labels_created":true},
            {"code":"no id"}
        ]"#,
        2,
    );
    let mut config = Config::load(&config_path).await.unwrap();
    config.mark_processed = true;
    let orders_path = config.order_source_path.clone();

    let result = App::initialize(config).await.unwrap().run().await.unwrap();

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed, 2);
    assert_eq!(result.failed_ids().collect::<Vec<_>>(), vec!["#4", "A2"]);
    assert_eq!(
        pdf_files(&dir.path().join("output")),
        BTreeSet::from(["A1.pdf".to_string()])
    );

    // A1 已回写，再次加载时只剩 A2
    let batch = load_orders(&orders_path).await.unwrap();
    assert_eq!(batch.skipped, 2);
    assert_eq!(
        batch.orders.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
        vec!["A2"]
    );
}

#[tokio::test]
async fn test_write_back_skips_duplicate_and_unlabelled_records() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(
        dir.path(),
        r##"[
            {"id":"A5","code":"555"},
            {"id":"A5","code":"556"},
            {"code":"999"},
            {"id":"#3","code":"3"}
        ]"##,
        2,
    );
    let mut config = Config::load(&config_path).await.unwrap();
    config.mark_processed = true;
    let orders_path = config.order_source_path.clone();

    let result = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(result.succeeded_ids().collect::<Vec<_>>(), vec!["#3", "A5"]);
    assert_eq!(result.failed, 2);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&orders_path).unwrap()).unwrap();
    assert_eq!(raw[0]["labels_created"], true);
    assert!(raw[1].get("labels_created").is_none());
    assert!(raw[2].get("labels_created").is_none());
    assert_eq!(raw[3]["labels_created"], true);

    // 重复的 A5 在下次运行时仍会被处理
    let batch = load_orders(&orders_path).await.unwrap();
    assert_eq!(batch.skipped, 2);
    assert_eq!(batch.orders.len(), 1);
    assert_eq!(batch.orders[0].code.as_deref(), Some("556"));
}

#[tokio::test]
async fn test_per_sku_templates() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = workspace(
        dir.path(),
        r#"[
            {"id":"A1","code":"1","sku":"EMMA100-B"},
            {"id":"A2","code":"2","sku":"OTHER"},
            {"id":"A3","code":"3"}
        ]"#,
        2,
    );
    let templates = dir.path().join("templates");
    fs::create_dir_all(templates.join("EMMA1")).unwrap();
    fs::write(templates.join("EMMA1").join("Labels EMMA100-B.toml"), TEMPLATE).unwrap();

    let mut config = Config::load(&config_path).await.unwrap();
    config.template_path = templates;

    let result = generate_all(Arc::new(config), {
        let batch = load_orders(&dir.path().join("orders.json")).await.unwrap();
        batch.orders
    })
    .unwrap();

    assert_eq!(result.succeeded_ids().collect::<Vec<_>>(), vec!["A1"]);
    assert_eq!(result.failed_ids().collect::<Vec<_>>(), vec!["A2", "A3"]);
}

#[test]
fn test_starter_template_matches_documented_size() {
    let template = LabelTemplate::starter();
    assert_eq!((template.width_mm, template.height_mm), (100.0, 60.0));
}
