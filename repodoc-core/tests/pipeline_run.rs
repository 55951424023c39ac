// End-to-end pipeline runs against mocked transports and a mocked generator.

use repodoc_core::config::AnalysisConfig;
use repodoc_core::contract::{
    AcquisitionError, GenerationError, MockDocGenerator, MockTransport, PipelineError,
};
use repodoc_core::download::Acquirer;
use repodoc_core::pipeline::run_pipeline;
use repodoc_core::profile::{profile, Archetype};
use repodoc_core::tables::LanguageTables;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const REPO_URL: &str = "https://github.com/octo/shop";

/// Transport that materialises `files` at the target and remembers where it wrote them.
fn fixture_transport(files: &'static [(&'static str, &'static str)]) -> (MockTransport, Arc<Mutex<Option<PathBuf>>>) {
    let seen = Arc::new(Mutex::new(None));
    let seen_in_mock = Arc::clone(&seen);
    let mut transport = MockTransport::new();
    transport.expect_name().return_const("fixture");
    transport.expect_fetch().times(1).returning(move |_, target| {
        fs::create_dir_all(target)?;
        for (rel, body) in files {
            let path = target.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, body)?;
        }
        *seen_in_mock.lock().unwrap() = Some(target.to_path_buf());
        Ok(())
    });
    (transport, seen)
}

fn config() -> Arc<AnalysisConfig> {
    Arc::new(AnalysisConfig {
        workers: 2,
        generation_delay_ms: 0,
        ..AnalysisConfig::default()
    })
}

const FULL_STACK: &[(&str, &str)] = &[
    ("index.html", "<html><body>Shop</body></html>\n"),
    ("style.css", "body { margin: 0; }\n"),
    (
        "app.py",
        "import sqlite3\n\n# SQL storage\ndef main():\n    return sqlite3.connect(':memory:')\n",
    ),
    ("node_modules/left-pad/index.js", "module.exports = 1;\n"),
];

#[tokio::test]
async fn full_stack_repository_is_profiled_and_documented() {
    let (transport, seen) = fixture_transport(FULL_STACK);
    let acquirer = Acquirer::new(vec![Box::new(transport)]);

    let mut generator = MockDocGenerator::new();
    generator
        .expect_generate()
        .times(3)
        .returning(|record, context| {
            assert_eq!(context.file_count, 3);
            if record.relative_path == "style.css" {
                Err(GenerationError("quota exceeded".into()))
            } else {
                Ok(format!("# {}\n\nDescribes the file.", record.relative_path))
            }
        });

    let report = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        Some(&generator),
    )
    .await
    .unwrap();

    assert_eq!(report.repo_name, "shop");
    let paths: Vec<_> = report.files.iter().map(|r| r.relative_path.as_str()).collect();
    assert_eq!(paths, vec!["app.py", "index.html", "style.css"]);

    assert!(report.profile.has_frontend);
    assert!(report.profile.has_backend);
    assert!(report.profile.has_database);
    assert!(!report.profile.has_mobile);
    assert_eq!(report.profile.project_archetype, Archetype::FullStack);
    assert_eq!(
        serde_json::to_value(report.profile.project_archetype).unwrap(),
        "Full-Stack Web Application"
    );

    assert_eq!(report.documents.len(), 3);
    let css = &report.documents[2];
    assert_eq!(css.relative_path, "style.css");
    assert!(!css.generated);
    assert!(css.markdown.starts_with("## style.css"));
    assert!(report.documents[0].generated);

    let acquired = seen.lock().unwrap().clone().expect("transport ran");
    assert!(!acquired.exists(), "scratch directory must be removed after the run");

    // Profiling is a pure function of the records.
    let again = profile(&report.files);
    assert_eq!(
        serde_json::to_vec(&again).unwrap(),
        serde_json::to_vec(&report.profile).unwrap()
    );
}

#[tokio::test]
async fn without_generator_no_documents_are_produced() {
    let (transport, _) = fixture_transport(FULL_STACK);
    let acquirer = Acquirer::new(vec![Box::new(transport)]);

    let report = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.files.len(), 3);
    assert!(report.documents.is_empty());
}

#[tokio::test]
async fn too_short_generations_use_the_fallback() {
    let (transport, _) = fixture_transport(&[("main.go", "package main\n\nfunc main() {}\n")]);
    let acquirer = Acquirer::new(vec![Box::new(transport)]);
    let mut generator = MockDocGenerator::new();
    generator
        .expect_generate()
        .times(1)
        .returning(|_, _| Ok("  ok \n".to_string()));

    let report = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        Some(&generator),
    )
    .await
    .unwrap();

    assert!(!report.documents[0].generated);
    assert!(report.documents[0].markdown.contains("`func main`"));
}

#[tokio::test]
async fn acquisition_failure_is_fatal() {
    let mut transport = MockTransport::new();
    transport.expect_name().return_const("fixture");
    transport
        .expect_fetch()
        .returning(|_, _| Err(AcquisitionError::Download("connection reset".into())));
    let acquirer = Acquirer::new(vec![Box::new(transport)]);

    let err = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Acquisition(AcquisitionError::Exhausted { .. })
    ));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn empty_scan_is_fatal() {
    let (transport, _) = fixture_transport(&[
        ("node_modules/lib.js", "x"),
        (".git/HEAD", "ref: refs/heads/main"),
    ]);
    let acquirer = Acquirer::new(vec![Box::new(transport)]);

    let err = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NoFilesDiscovered));
}

#[tokio::test]
async fn nothing_analysable_is_fatal() {
    let (transport, _) = fixture_transport(&[("empty.py", ""), ("blank.md", "   \n")]);
    let acquirer = Acquirer::new(vec![Box::new(transport)]);

    let err = run_pipeline(
        REPO_URL,
        config(),
        Arc::new(LanguageTables::default()),
        &acquirer,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NoFilesAnalyzed { discovered: 2 }));
}
