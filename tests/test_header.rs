use csv_sieve::header::{HeaderState, HeaderTemplate};

fn process_all(template: &str, lines: &[&str]) -> Vec<String> {
    let parsed = HeaderTemplate::parse(Some(template)).unwrap();
    let mut state = HeaderState::default();
    lines
        .iter()
        .map(|line| parsed.process(&mut state, line))
        .collect()
}

#[test]
fn test_creates_header_with_splat() {
    assert_eq!(process_all("*,A,B", &["a;b;c"]), vec!["a;b;c;A;B"]);
}

#[test]
fn test_creates_header_from_column_refs() {
    assert_eq!(
        process_all(
            "A,c6,c1",
            &["a0;a1;a2;a3;a4;a5;a6", "x0;x1;x2;x3;x4;x5;x6"]
        ),
        vec!["A;a6;a1", "A;a6;a1"]
    );
}

#[test]
fn test_creates_header_from_concatenation() {
    assert_eq!(
        process_all("A,c1,c2+c3", &["a0;a1;a2;a3;a4;a5", "b0;b1;b2;b3;b4;b5"]),
        vec!["A;a1;a2a3", "A;a1;a2a3;b2b3"]
    );
}

#[test]
fn test_creates_header_from_concatenation_with_literal() {
    assert_eq!(
        process_all(
            "A,c1,c2+'-'+c3",
            &["a0;a1;a2;a3;a4;a5", "b0;b1;b2;b3;b4;b5"]
        ),
        vec!["A;a1;a2-a3", "A;a1;a2-a3;b2-b3"]
    );
}

#[test]
fn test_creates_header_from_pattern_extraction() {
    assert_eq!(
        process_all(
            "c4,A,c0=~/\\.(\\d{4})/,c1,B",
            &[
                "a0;a1;a2;a3;a4;a5",
                "1.1.2012;b1;b2;b3;b4;b5",
                "3.4.2013;c1;c2;c3;c4;c5",
            ]
        ),
        vec!["a4;A;a1;B", "a4;A;2012;a1;B", "a4;A;2012;2013;a1;B"]
    );
}

#[test]
fn test_dynamic_columns_keep_first_seen_positions() {
    let template = HeaderTemplate::parse(Some("Year,c0=~/(\\d{4})/")).unwrap();
    let mut state = HeaderState::default();
    template.process(&mut state, "2013;x");
    template.process(&mut state, "2011;y");
    template.process(&mut state, "2013;z");
    assert_eq!(template.render(&state), "Year;2013;2011");
}

#[test]
fn test_empty_template_renders_empty_line() {
    let template = HeaderTemplate::parse(None).unwrap();
    let mut state = HeaderState::default();
    assert_eq!(template.process(&mut state, "a;b;c"), "");
}

#[test]
fn test_state_is_per_output_not_per_template() {
    let template = HeaderTemplate::parse(Some("c0=~/(\\d{4})/")).unwrap();

    let mut first = HeaderState::default();
    template.process(&mut first, "2012;a");

    let mut second = HeaderState::default();
    template.process(&mut second, "2019;b");

    assert_eq!(template.render(&first), "2012");
    assert_eq!(template.render(&second), "2019");
}
