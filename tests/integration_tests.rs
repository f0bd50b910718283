use rubric_merge::{
    ExportFormat, RubricError, Sid, load_directory, load_directory_concurrent,
    output::write_merged_csv,
};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

const FOOTER: &str = ",,Point Values,,,\n,,Rubric Numbers,,,\n,,Rubric Type,,,\n,,Scoring Method,,,\n";

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/exports")
}

/// Writes a minimal export with one rubric column per entry of `rubrics`.
fn write_export(dir: &Path, name: &str, rubrics: &[&str], rows: &[&str]) {
    let mut csv = format!("SID,Score,Submission Time,{},Adjustment\n", rubrics.join(","));
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv.push_str(FOOTER);
    fs::write(dir.join(name), csv).unwrap();
}

#[test]
fn test_full_pipeline_worked_example() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "1_warmup.csv", &["correct"], &["42,3,t,true,0"]);
    write_export(
        dir.path(),
        "2_recursion.csv",
        &["base case", "inductive step"],
        &["42,5,t,true,true,0", "99,2,t,false,false,0"],
    );

    let compiled = load_directory(dir.path(), &ExportFormat::default()).unwrap();

    assert_eq!(
        compiled.report_for(Sid(42)).unwrap().as_str(),
        "Summary:\n - SID: 42\n - Total marks: 8\n\nwarmup (3 marks):\n - correct\n\n\
         recursion (5 marks):\n - base case\n - inductive step\n"
    );
    assert_eq!(
        compiled.report_for(Sid(99)).unwrap().as_str(),
        "Summary:\n - SID: 99\n - Total marks: 2\n\nwarmup (0 marks):\n\nrecursion (2 marks):\n"
    );
}

#[test]
fn test_gradescope_fixture_directory() {
    let compiled = load_directory(&fixtures(), &ExportFormat::default()).unwrap();

    let names: Vec<_> = compiled.problems().iter().map(|p| p.as_str()).collect();
    assert_eq!(names, vec!["warmup", "recursion"]);

    let sids: Vec<_> = compiled.reports.keys().copied().collect();
    assert_eq!(sids, vec![Sid(7), Sid(42), Sid(99)]);
    assert_eq!(compiled.table.rows.len(), 3);

    let turing = compiled.report_for(Sid(7)).unwrap().as_str();
    assert_eq!(
        turing,
        "Summary:\n - SID: 7\n - Total marks: 4\n\nwarmup (1.5 marks):\n - partially correct\n\n\
         recursion (2.5 marks):\n - base case\n - missing return\n"
    );
}

#[test]
fn test_every_sid_appears_once_in_table_and_reports() {
    let compiled = load_directory(&fixtures(), &ExportFormat::default()).unwrap();

    let mut table_sids: Vec<_> = compiled.table.rows.iter().map(|r| r.sid.unwrap()).collect();
    table_sids.dedup();
    assert_eq!(table_sids.len(), compiled.table.rows.len());
    assert!(table_sids.iter().all(|sid| compiled.reports.contains_key(sid)));
    assert_eq!(compiled.reports.len(), table_sids.len());
}

#[test]
fn test_declared_total_equals_sum_of_rendered_marks() {
    let compiled = load_directory(&fixtures(), &ExportFormat::default()).unwrap();

    for report in compiled.reports.values() {
        let text = report.as_str();
        let declared: Decimal = text
            .lines()
            .find_map(|l| l.strip_prefix(" - Total marks: "))
            .unwrap()
            .parse()
            .unwrap();
        let rendered: Decimal = text
            .lines()
            .filter_map(|l| l.strip_suffix(" marks):"))
            .map(|l| l.rsplit_once(" (").unwrap().1.parse::<Decimal>().unwrap())
            .sum();
        assert_eq!(declared, rendered, "{text}");
    }
}

#[test]
fn test_problem_order_is_numeric_not_alphabetical() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "10_alpha.csv", &["a"], &["1,1,t,true,0"]);
    write_export(dir.path(), "2_zeta.csv", &["z"], &["1,2,t,true,0"]);
    write_export(dir.path(), "1_middle_part.csv", &["m"], &["1,3,t,false,0"]);

    let compiled = load_directory(dir.path(), &ExportFormat::default()).unwrap();
    let report = compiled.report_for(Sid(1)).unwrap().as_str();

    let middle = report.find("middle part (3 marks):").unwrap();
    let zeta = report.find("zeta (2 marks):").unwrap();
    let alpha = report.find("alpha (1 marks):").unwrap();
    assert!(middle < zeta && zeta < alpha);
}

#[test]
fn test_malformed_file_fails_whole_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "1_ok.csv", &["a"], &["1,1,t,true,0"]);
    fs::write(
        dir.path().join("2_broken.csv"),
        format!("SID,Score,Submission Time,a\n1,1,t,true\n{FOOTER}"),
    )
    .unwrap();

    let err = load_directory(dir.path(), &ExportFormat::default()).unwrap_err();
    assert!(matches!(err, RubricError::MalformedExport { .. }));
}

#[test]
fn test_blank_sid_is_unresolved_student() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "1_p.csv", &["a"], &["1,1,t,true,0", ",2,t,false,0"]);

    let err = load_directory(dir.path(), &ExportFormat::default()).unwrap_err();
    assert!(matches!(err, RubricError::UnresolvedStudent { .. }));
}

#[test]
fn test_custom_footer_row_count() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("1_p.csv"),
        "SID,Score,Submission Time,a,Adjustment\n5,1,t,true,0\n,,Point Values,1,\n",
    )
    .unwrap();

    let format = ExportFormat::default().with_footer_rows(1);
    let compiled = load_directory(dir.path(), &format).unwrap();

    assert_eq!(compiled.reports.len(), 1);
    assert!(compiled.report_for(Sid(5)).unwrap().as_str().contains(" - a\n"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let out = tempfile::tempdir().unwrap();

    let first = load_directory(&fixtures(), &ExportFormat::default()).unwrap();
    let second = load_directory(&fixtures(), &ExportFormat::default()).unwrap();
    assert_eq!(first, second);

    write_merged_csv(&out.path().join("a.csv"), &first).unwrap();
    write_merged_csv(&out.path().join("b.csv"), &second).unwrap();
    assert_eq!(
        fs::read(out.path().join("a.csv")).unwrap(),
        fs::read(out.path().join("b.csv")).unwrap()
    );
}

#[tokio::test]
async fn test_concurrent_load_matches_sequential() {
    let sequential = load_directory(&fixtures(), &ExportFormat::default()).unwrap();
    let concurrent = load_directory_concurrent(fixtures(), ExportFormat::default(), 4)
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
}

#[test]
fn test_fractional_totals_match_rendered_marks() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "1_a.csv", &["x"], &["1,0.1,t,false,0"]);
    write_export(dir.path(), "2_b.csv", &["y"], &["1,0.2,t,false,0"]);

    let compiled = load_directory(dir.path(), &ExportFormat::default()).unwrap();
    let report = compiled.report_for(Sid(1)).unwrap().as_str();

    assert!(report.contains(" - Total marks: 0.3\n"), "{report}");
    assert!(report.contains("a (0.1 marks):"));
    assert!(report.contains("b (0.2 marks):"));
}

#[test]
fn test_rubric_lines_follow_column_order_not_alphabetical() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), "1_p.csv", &["zeta", "alpha"], &["1,2,t,true,true,0"]);

    let compiled = load_directory(dir.path(), &ExportFormat::default()).unwrap();
    let report = compiled.report_for(Sid(1)).unwrap().as_str();

    assert!(report.contains("p (2 marks):\n - zeta\n - alpha\n"), "{report}");
}
