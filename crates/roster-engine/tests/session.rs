use std::io::{Cursor, Read};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use roster_engine::{
    CommandError, Field, FilterOutcome, IngestOutcome, LoadStatus, QueryError, Record, Roster,
    RosterConfig, Source,
};

const PEOPLE: &str = "\
501,Ada,Lovelace,ada@example.com,Female,United Kingdom,example.com,1815-12-10
17,Alan,Turing,alan@example.com,Male,United Kingdom,example.com,1912-06-23
17,Grace,Hopper,grace@navy.mil,Female,United States,navy.mil,2015-06-15
-4,Edsger,Dijkstra,ewd@utexas.edu,Male,Netherlands,utexas.edu,2003-05-11
88,Barbara,Liskov,liskov@mit.edu,Female,United States,mit.edu,2010-12-31
3,Donald,Knuth,knuth@stanford.edu,Male,United States,stanford.edu,2000-01-01
42,Ken,Thompson,ken@bell-labs.com,Male,United States,bell-labs.com,2015-06-16
9,Dennis,Turing,dmr@bell-labs.com,Male,United States,bell-labs.com,1999-12-31
";

fn loaded() -> Roster {
    let mut roster = Roster::new(RosterConfig::default());
    let summary = roster
        .load_sources(vec![Source::from_bytes("people.csv", PEOPLE)])
        .expect("load");
    assert_eq!(summary.status, LoadStatus::Loaded);
    roster
}

fn ids(roster: &Roster) -> Vec<i64> {
    roster
        .current_view()
        .expect("view")
        .iter()
        .map(Record::id)
        .collect()
}

fn last_names(roster: &Roster) -> Vec<String> {
    roster
        .current_view()
        .expect("view")
        .iter()
        .map(|r| r.last_name().to_string())
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Sleeps before its first read so the load gives up on it.
struct SlowReader {
    delay: Duration,
    waited: bool,
    inner: Cursor<Vec<u8>>,
}

impl Read for SlowReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.waited {
            thread::sleep(self.delay);
            self.waited = true;
        }
        self.inner.read(buf)
    }
}

const SLOW_DELAY: Duration = Duration::from_millis(2500);

/// The first three people load immediately; the rest sit behind a reader that outlasts the
/// one-second ingest timeout.
fn fast_and_slow_sources() -> Vec<Source> {
    let lines: Vec<&str> = PEOPLE.lines().collect();
    let fast = lines[..3].join("\n");
    let slow = lines[3..].join("\n");
    vec![
        Source::from_bytes("fast.csv", fast),
        Source::reader(
            "slow.csv",
            SlowReader {
                delay: SLOW_DELAY,
                waited: false,
                inner: Cursor::new(slow.into_bytes()),
            },
        ),
    ]
}

fn impatient(fail_on_timeout: bool) -> Roster {
    Roster::new(RosterConfig {
        ingest_timeout_secs: 1,
        fail_on_timeout,
        ..RosterConfig::default()
    })
}

#[test]
fn commands_before_loading_are_rejected() {
    let mut roster = Roster::default();
    assert_eq!(roster.current_view().unwrap_err(), CommandError::NotLoaded);
    assert_eq!(
        roster.filter_by_date("2000-01-01", "").unwrap_err(),
        CommandError::NotLoaded
    );
    assert_eq!(
        roster.sort_by(Field::LastName, true).unwrap_err(),
        CommandError::NotLoaded
    );
    assert_eq!(CommandError::NotLoaded.kind(), "not_loaded");
    assert!(!roster.is_filtered());
    assert!(roster.store().is_empty());
}

#[test]
fn first_view_renumbers_contiguously() {
    let roster = loaded();
    assert!(!roster.store().is_sealed());
    assert_eq!(ids(&roster), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(roster.store().is_sealed());
    assert_eq!(&last_names(&roster)[..3], &["Lovelace", "Turing", "Hopper"]);
}

#[test]
fn loading_twice_is_a_no_op() {
    let mut roster = loaded();
    let again = roster
        .load_sources(vec![Source::from_bytes("more.csv", PEOPLE)])
        .expect("load");
    assert_eq!(again.status, LoadStatus::AlreadyLoaded);
    assert!(again.report.is_none());
    assert_eq!(roster.current_view().unwrap().len(), 8);
}

#[test]
fn inclusive_range_filter() {
    let mut roster = loaded();
    let outcome = roster.filter_by_date("2000-01-01", "2010-12-31").unwrap();
    assert_eq!(outcome, FilterOutcome::Applied { matched: 3 });

    let view = roster.current_view().unwrap();
    assert!(view.is_filtered());
    let births: Vec<NaiveDate> = view.iter().map(Record::birth_date).collect();
    assert_eq!(
        births,
        vec![date(2003, 5, 11), date(2010, 12, 31), date(2000, 1, 1)]
    );
    // Filtered rows carry the renumbered identifiers of the store.
    assert_eq!(view.iter().map(Record::id).collect::<Vec<_>>(), vec![4, 5, 6]);
}

#[test]
fn upper_bound_only_includes_the_boundary_day() {
    let mut roster = loaded();
    roster.filter_by_date("", "2015-06-15").unwrap();
    let names = last_names(&roster);
    assert!(names.contains(&"Hopper".to_string()), "boundary record missing");
    assert!(!names.contains(&"Thompson".to_string()));
    assert_eq!(names.len(), 7);
}

#[test]
fn lower_bound_only() {
    let mut roster = loaded();
    let outcome = roster.filter_by_date("2015-06-15", "").unwrap();
    assert_eq!(outcome, FilterOutcome::Applied { matched: 2 });
    assert_eq!(last_names(&roster), vec!["Hopper", "Thompson"]);
}

#[test]
fn inverted_range_keeps_the_previous_view() {
    let mut roster = loaded();
    roster.filter_by_date("", "1950-01-01").unwrap();
    let before = roster.current_view().unwrap();

    let err = roster.filter_by_date("2010-01-01", "2000-01-01").unwrap_err();
    assert_eq!(
        err,
        CommandError::Query(QueryError::InvalidDateRange {
            from: date(2010, 1, 1),
            to: date(2000, 1, 1),
        })
    );
    assert_eq!(err.kind(), "invalid_range");
    assert_eq!(roster.current_view().unwrap(), before);
}

#[test]
fn malformed_dates_are_distinguished_from_bad_ranges() {
    let mut roster = loaded();
    let err = roster.filter_by_date("2000-1-1", "").unwrap_err();
    assert_eq!(err.kind(), "invalid_format");
    assert!(err.to_string().contains("yyyy-MM-dd"), "{err}");
    assert!(!roster.is_filtered());
}

#[test]
fn blank_bounds_clear_the_filter() {
    let mut roster = loaded();
    roster.filter_by_date("2000-01-01", "2010-12-31").unwrap();
    assert_eq!(roster.filter_by_date("", "").unwrap(), FilterOutcome::Cleared);

    let view = roster.current_view().unwrap();
    assert!(!view.is_filtered());
    assert_eq!(view.iter().map(Record::id).collect::<Vec<_>>(), (1..=8).collect::<Vec<_>>());
}

#[test]
fn descending_sort_reverses_keys_and_keeps_ties_stable() {
    let mut roster = loaded();

    roster.sort_by("lastName", true).unwrap();
    let ascending = roster.current_view().unwrap();
    let asc_keys: Vec<&str> = ascending.iter().map(Record::last_name).collect();
    assert_eq!(
        asc_keys,
        vec!["Dijkstra", "Hopper", "Knuth", "Liskov", "Lovelace", "Thompson", "Turing", "Turing"]
    );
    // The two Turings keep their load order (Alan = 2, Dennis = 8).
    let turings: Vec<i64> = ascending
        .iter()
        .filter(|r| r.last_name() == "Turing")
        .map(Record::id)
        .collect();
    assert_eq!(turings, vec![2, 8]);

    roster.sort_by("lastName", false).unwrap();
    let descending = roster.current_view().unwrap();
    let mut desc_keys: Vec<&str> = descending.iter().map(Record::last_name).collect();
    desc_keys.reverse();
    assert_eq!(desc_keys, asc_keys);
    let turings: Vec<i64> = descending
        .iter()
        .filter(|r| r.last_name() == "Turing")
        .map(Record::id)
        .collect();
    assert_eq!(turings, vec![2, 8]);
}

#[test]
fn sorting_by_id_restores_the_renumbered_order() {
    let mut roster = loaded();
    let original = roster.current_view().unwrap();

    roster.sort_by(Field::BirthDate, false).unwrap();
    roster.sort_by(Field::Email, true).unwrap();
    roster.sort_by(0usize, true).unwrap();

    assert_eq!(roster.current_view().unwrap(), original);
}

#[test]
fn sorting_applies_to_the_active_view_only() {
    let mut roster = loaded();
    roster.filter_by_date("2000-01-01", "").unwrap();
    roster.sort_by(Field::BirthDate, true).unwrap();
    let filtered: Vec<NaiveDate> = roster
        .current_view()
        .unwrap()
        .iter()
        .map(Record::birth_date)
        .collect();
    let mut expected = filtered.clone();
    expected.sort();
    assert_eq!(filtered, expected);

    // The store underneath kept its load order.
    let store_ids: Vec<i64> = roster.store().snapshot().iter().map(|r| r.id()).collect();
    assert_eq!(store_ids, (1..=8).collect::<Vec<_>>());

    // Clearing the filter shows the store in its own (unsorted) order.
    roster.filter_by_date("", "").unwrap();
    assert_eq!(ids(&roster), (1..=8).collect::<Vec<_>>());
}

#[test]
fn sorting_the_store_does_not_reorder_a_filtered_view() {
    let mut roster = loaded();
    roster.filter_by_date("2000-01-01", "2010-12-31").unwrap();
    let filtered_before = roster.current_view().unwrap();

    roster.store().sort_in_place(Field::FirstName, false);
    assert_eq!(roster.current_view().unwrap(), filtered_before);

    // Re-running the filter picks up the new store order.
    roster.filter_by_date("2000-01-01", "2010-12-31").unwrap();
    let names: Vec<String> = roster
        .current_view()
        .unwrap()
        .iter()
        .map(|r| r.first_name().to_string())
        .collect();
    assert_eq!(names, vec!["Edsger", "Donald", "Barbara"]);
}

#[test]
fn unknown_sort_keys_are_rejected() {
    let mut roster = loaded();
    let before = roster.current_view().unwrap();

    let err = roster.sort_by(8usize, true).unwrap_err();
    assert_eq!(err, CommandError::Query(QueryError::InvalidColumn(8)));
    assert_eq!(err.kind(), "invalid_column");

    let err = roster.sort_by("salary", true).unwrap_err();
    assert_eq!(err.kind(), "invalid_field");

    assert_eq!(roster.current_view().unwrap(), before);
}

#[test]
fn column_indices_may_arrive_as_text() {
    let mut roster = loaded();
    roster.sort_by("2", true).unwrap();
    let by_text = roster.current_view().unwrap();

    roster.sort_by(Field::Id, true).unwrap();
    roster.sort_by(Field::LastName, true).unwrap();
    assert_eq!(roster.current_view().unwrap(), by_text);
    assert_eq!(by_text.iter().next().map(Record::last_name), Some("Dijkstra"));
}

#[test]
fn timed_out_load_can_be_reported_as_an_error() {
    let mut roster = impatient(true);
    let err = roster.load_sources(fast_and_slow_sources()).unwrap_err();

    assert_eq!(
        err,
        CommandError::IngestionTimedOut {
            still_running: vec!["slow.csv".to_string()]
        }
    );
    assert_eq!(err.kind(), "ingestion_timeout");
    assert!(err.to_string().contains("slow.csv"), "{err}");

    // The rows that arrived stay usable.
    assert!(roster.is_loaded());
    assert_eq!(ids(&roster), vec![1, 2, 3]);
    assert_eq!(
        roster.load_sources(Vec::new()).unwrap().status,
        LoadStatus::AlreadyLoaded
    );
}

#[test]
fn late_rows_after_a_timeout_are_fenced_out() {
    let mut roster = impatient(false);
    let summary = roster.load_sources(fast_and_slow_sources()).expect("load");
    let report = summary.report.expect("report");
    assert_eq!(
        report.outcome,
        IngestOutcome::TimedOut {
            still_running: vec!["slow.csv".to_string()]
        }
    );
    assert!(roster.store().is_sealed());

    // Let the slow worker wake up and try to append.
    thread::sleep(SLOW_DELAY + Duration::from_millis(500));

    let view = roster.current_view().unwrap();
    assert_eq!(view.len(), report.records);
    assert_eq!(roster.store().len(), report.records);
    assert_eq!(ids(&roster), (1..=report.records as i64).collect::<Vec<_>>());
    assert_eq!(last_names(&roster), vec!["Lovelace", "Turing", "Hopper"]);
}

#[test]
fn load_data_reads_configured_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut sources = Vec::new();
    for (n, chunk) in PEOPLE.lines().collect::<Vec<_>>().chunks(3).enumerate() {
        let path = dir.path().join(format!("MOCK_DATA{}.csv", n + 1));
        std::fs::write(&path, chunk.join("\n")).expect("write csv");
        sources.push(path);
    }

    let mut roster = Roster::new(RosterConfig {
        sources,
        ..RosterConfig::default()
    });
    let summary = roster.load_data().expect("load");
    let report = summary.report.expect("report");
    assert!(report.is_complete());
    assert_eq!(report.records, 8);

    let view = roster.current_view().unwrap();
    assert_eq!(view.iter().map(Record::id).collect::<Vec<_>>(), (1..=8).collect::<Vec<_>>());
}

#[test]
fn missing_configured_files_load_as_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut roster = Roster::new(RosterConfig {
        sources: vec![dir.path().join("nope.csv")],
        ..RosterConfig::default()
    });
    let summary = roster.load_data().expect("load");
    assert_eq!(summary.report.expect("report").failures().count(), 1);
    assert!(roster.current_view().unwrap().is_empty());
}

#[test]
fn view_renders_display_rows() {
    let roster = loaded();
    let view = roster.current_view().unwrap();
    assert_eq!(view.headers()[7], "Birth Date");
    let table = view.to_table();
    assert_eq!(
        table[0],
        [
            "1",
            "Ada",
            "Lovelace",
            "ada@example.com",
            "Female",
            "United Kingdom",
            "example.com",
            "1815-12-10"
        ]
        .map(String::from)
    );
}
