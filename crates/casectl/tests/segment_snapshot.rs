use std::path::PathBuf;

use insta::assert_snapshot;

use casectl::app::scan::{SegmentScanner, render_overview};
use casectl::domain::model::TestDocument;

fn overview(name: &str, text: &str) -> String {
    let document = TestDocument {
        path: PathBuf::from(name),
        text: text.to_string(),
    };
    let map = SegmentScanner::new().scan(&document);
    render_overview(&document, &map)
}

#[test]
fn overview_renders_one_row_per_segment() {
    let text = "select 1;\n----\nselect 2;\n---- disabled: flaky\nselect 3;\n----\n";
    assert_snapshot!(overview("suite.test", text), @r"
    suite.test: 3 cases
     all  line 1  select 1;
       1  line 2  ----
       2  line 4  ---- disabled: flaky
       3  line 6  ----
    ");
}

#[test]
fn overview_of_an_empty_file_still_offers_run_all() {
    assert_snapshot!(overview("empty.test", ""), @r"
    empty.test: 0 cases
     all  line 1
    ");
}

#[test]
fn overview_uses_singular_for_one_case() {
    assert_snapshot!(overview("single.test", "select 1;\n----\n"), @r"
    single.test: 1 case
     all  line 1  select 1;
       1  line 2  ----
    ");
}
