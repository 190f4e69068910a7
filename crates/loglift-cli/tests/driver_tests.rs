/*!
# Batch Driver Integration Tests

Round trips serialized units through the driver using temporary directories.
*/

use std::path::{Path, PathBuf};

use loglift_cli::driver::{self, DriverOptions, EmitFormat, FileStatus, UnitInput};
use loglift_core::ast::types::{self, THROWABLE};
use loglift_core::ast::{CatchClause, ClassDecl, MethodDecl, MethodType, Modifiers};
use loglift_core::{CompilationUnit, Expr, JavaType, LogliftConfig, LoggingFramework, Statement};
use pretty_assertions::assert_eq;

fn unit_with_stack_trace(class: &str) -> CompilationUnit {
    let error = Expr::ident("e", JavaType::Class(types::exception()));
    let print = Expr::call(error, "printStackTrace", Vec::new(), MethodType::instance(THROWABLE, "printStackTrace"));
    let mut decl = ClassDecl::new(format!("com.example.{class}"));
    decl.methods.push(MethodDecl {
        name: "run".to_string(),
        modifiers: Modifiers::default(),
        return_type: None,
        params: Vec::new(),
        body: vec![Statement::Try {
            body: Vec::new(),
            catches: vec![CatchClause {
                param: "e".to_string(),
                ty: JavaType::Class(types::exception()),
                body: vec![Statement::Expr(print)],
            }],
            finally: None,
        }],
    });
    let mut unit = CompilationUnit::new();
    unit.package = Some("com.example".to_string());
    unit.classes.push(decl);
    unit
}

fn write_unit(dir: &Path, name: &str, unit: &CompilationUnit) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(unit)?)?;
    Ok(path)
}

#[test]
fn test_collect_inputs_walks_directories() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested)?;
    let unit = unit_with_stack_trace("Orders");
    let first = write_unit(dir.path(), "Orders.json", &unit)?;
    let second = write_unit(&nested, "Users.json", &unit)?;
    std::fs::write(dir.path().join("README.md"), "not a unit")?;

    let inputs = driver::collect_inputs(&[dir.path().to_path_buf(), first.clone()])?;
    let paths: Vec<&PathBuf> = inputs.iter().map(|input| &input.path).collect();
    assert_eq!(paths, vec![&first, &second]);
    assert_eq!(inputs[1].relative, PathBuf::from("nested/Users.json"));

    assert!(driver::collect_inputs(&[dir.path().join("missing")]).is_err());
    Ok(())
}

#[tokio::test]
async fn test_batch_writes_rendered_source() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_unit(input.path(), "Orders.json", &unit_with_stack_trace("Orders"))?;
    write_unit(input.path(), "Users.json", &unit_with_stack_trace("Users"))?;

    let inputs = driver::collect_inputs(&[input.path().to_path_buf()])?;
    let options = DriverOptions {
        output: Some(output.path().to_path_buf()),
        ..DriverOptions::default()
    };
    let report = driver::run(inputs, &options).await?;

    assert!(report.success());
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.summary.units_changed, 2);
    assert!(matches!(report.files[0].status, FileStatus::Changed { .. }));

    let orders = std::fs::read_to_string(output.path().join("Orders.java"))?;
    assert!(orders.contains("import org.slf4j.LoggerFactory;"));
    assert!(orders.contains("private static final Logger logger = LoggerFactory.getLogger(Orders.class);"));
    assert!(orders.contains("logger.error(\"Exception\", e);"));
    Ok(())
}

#[tokio::test]
async fn test_json_output_round_trips() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    let path = write_unit(input.path(), "Orders.json", &unit_with_stack_trace("Orders"))?;
    let options = DriverOptions {
        config: LogliftConfig {
            target: LoggingFramework::Jul,
            ..LogliftConfig::default()
        },
        emit: EmitFormat::Json,
        output: Some(output.path().to_path_buf()),
    };

    driver::run(vec![UnitInput::file(path)], &options).await?;
    let rewritten = driver::load_unit(&output.path().join("Orders.json"))?;
    assert!(rewritten.has_import("java.util.logging.Level"));
    assert_eq!(rewritten.classes[0].fields[0].name, "logger");

    // Running the output again changes nothing.
    let again = driver::rewrite_file(&output.path().join("Orders.json"), &options.config)?;
    assert_eq!(again.summary.rewrites, 0);
    Ok(())
}

#[tokio::test]
async fn test_failures_do_not_stop_the_batch() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    let good = write_unit(input.path(), "Orders.json", &unit_with_stack_trace("Orders"))?;
    let broken = input.path().join("Broken.json");
    std::fs::write(&broken, "{\"classes\": [")?;
    let options = DriverOptions {
        config: LogliftConfig {
            max_cycles: 1,
            ..LogliftConfig::default()
        },
        output: Some(output.path().to_path_buf()),
        ..DriverOptions::default()
    };

    let report = driver::run(vec![UnitInput::file(broken), UnitInput::file(good)], &options).await?;
    assert!(!report.success());
    assert_eq!(report.summary.errors.len(), 2);
    assert!(matches!(report.files[0].status, FileStatus::Failed(_)));
    assert_eq!(report.files[1].status, FileStatus::NonConvergent { cycles: 1 });
    assert!(!output.path().join("Orders.java").exists());
    Ok(())
}

#[tokio::test]
async fn test_same_named_units_keep_their_directories() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    let billing = input.path().join("billing");
    let shipping = input.path().join("shipping");
    std::fs::create_dir(&billing)?;
    std::fs::create_dir(&shipping)?;
    let first = write_unit(&billing, "Orders.json", &unit_with_stack_trace("Orders"))?;
    let second = write_unit(&shipping, "Orders.json", &unit_with_stack_trace("Shipments"))?;
    let options = DriverOptions {
        output: Some(output.path().to_path_buf()),
        ..DriverOptions::default()
    };

    let inputs = driver::collect_inputs(&[input.path().to_path_buf()])?;
    let report = driver::run(inputs, &options).await?;
    assert!(report.success());
    let billing_out = std::fs::read_to_string(output.path().join("billing/Orders.java"))?;
    let shipping_out = std::fs::read_to_string(output.path().join("shipping/Orders.java"))?;
    assert!(billing_out.contains("LoggerFactory.getLogger(Orders.class)"));
    assert!(shipping_out.contains("LoggerFactory.getLogger(Shipments.class)"));

    // Named one by one they would land on the same file, so nothing is written.
    let clean = tempfile::tempdir()?;
    let options = DriverOptions {
        output: Some(clean.path().to_path_buf()),
        ..DriverOptions::default()
    };
    let error = driver::run(vec![UnitInput::file(first), UnitInput::file(second)], &options)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("would both be written to"));
    assert!(!clean.path().join("Orders.java").exists());
    Ok(())
}

#[tokio::test]
async fn test_unknown_rule_rejected_up_front() {
    let options = DriverOptions {
        config: LogliftConfig {
            rules: vec!["rename-everything".to_string()],
            ..LogliftConfig::default()
        },
        ..DriverOptions::default()
    };
    assert!(driver::run(Vec::new(), &options).await.is_err());
}
