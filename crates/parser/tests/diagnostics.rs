use sift_parser::{Diagnostic, Diagnostics, Parser, WriterDiagnostics};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
struct Recording {
    reports: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics for Recording {
    fn report(&self, diagnostic: &Diagnostic) {
        self.reports.lock().unwrap().push(diagnostic.clone());
    }
}

#[test]
fn test_one_report_per_failure() {
    let sink = Arc::new(Recording::default());
    let parser = Parser::new().with_diagnostics(sink.clone());

    assert!(parser.parse("SELECT a FROM 'b'").is_ok());
    assert!(parser.parse("UPDATE 'a' SET b WHERE").is_err());
    assert!(parser.parse("  DELETE FROM 'a'  ").is_err());

    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 2);

    assert_eq!(reports[0].input, "UPDATE 'a' SET b WHERE");
    assert_eq!(reports[0].position, 17);
    assert_eq!(reports[0].message, "at UPDATE: expected '='");

    assert_eq!(reports[1].input, "DELETE FROM 'a'");
    assert_eq!(
        reports[1].message,
        "at WHERE: WHERE clause is mandatory for UPDATE & DELETE"
    );
}

#[test]
fn test_parse_many_reports_only_the_failing_statement() {
    let sink = Arc::new(Recording::default());
    let parser = Parser::new().with_diagnostics(sink.clone());

    let err = parser
        .parse_many(["SELECT a FROM 'b'", "SELECT FROM 'b'", "SELECT c FROM 'd'"])
        .unwrap_err();

    assert_eq!(err.index, 1);
    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].input, "SELECT FROM 'b'");
}

#[test]
fn test_shared_parser_across_threads() {
    let sink = Arc::new(WriterDiagnostics::new(Vec::new()));
    let parser = Arc::new(Parser::new().with_diagnostics(sink.clone()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                let ok = parser.parse(&format!("SELECT f{i} FROM 't{i}'"));
                let bad = parser.parse("SELECT");
                (ok.is_ok(), bad.is_err())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (true, true));
    }

    drop(parser);
    let sink = Arc::try_unwrap(sink).ok().unwrap();
    let written = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(written.matches("table name cannot be empty").count(), 4);
}
