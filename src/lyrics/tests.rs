use super::*;

fn texts(parsed: &ParsedLyrics) -> Vec<&str> {
    parsed.slices.iter().map(|s| s.text.as_str()).collect()
}

#[test]
fn parses_timestamps_and_metadata_directives() {
    let text = "[ti:Song]\n[ar:Band]\n[al:Record]\n[by:someone]\n[00:01.50]first\n[01:02.25]second\n";
    let parsed = parse_lrc(text, &LrcOptions::default());

    assert_eq!(parsed.metadata.title.as_deref(), Some("Song"));
    assert_eq!(parsed.metadata.artist.as_deref(), Some("Band"));
    assert_eq!(parsed.metadata.album.as_deref(), Some("Record"));
    assert_eq!(parsed.metadata.by.as_deref(), Some("someone"));
    assert_eq!(
        parsed.slices,
        vec![
            LyricSlice::new(1500.0, "first"),
            LyricSlice::new(62_250.0, "second"),
        ]
    );
}

#[test]
fn multiple_leading_tags_produce_one_slice_each_sorted() {
    let text = "[00:10.00][00:02.00]chorus\n[00:05.00]verse\n";
    let parsed = parse_lrc(text, &LrcOptions::default());

    let stamps: Vec<f64> = parsed.slices.iter().map(|s| s.timestamp_ms).collect();
    assert_eq!(stamps, vec![2000.0, 5000.0, 10_000.0]);
    assert_eq!(texts(&parsed), vec!["chorus", "verse", "chorus"]);
}

#[test]
fn offset_directive_shifts_every_timestamp() {
    let text = "[offset:+500]\n[00:01.00]a\n[00:02.00]b\n";
    let parsed = parse_lrc(text, &LrcOptions::default());
    assert_eq!(parsed.metadata.offset_ms, 500);
    assert_eq!(parsed.slices[0].timestamp_ms, 1500.0);
    assert_eq!(parsed.slices[1].timestamp_ms, 2500.0);

    let negative = parse_lrc("[offset:-2000]\n[00:01.00]a\n", &LrcOptions::default());
    assert_eq!(negative.slices[0].timestamp_ms, 0.0);
}

#[test]
fn long_blank_run_between_lines_becomes_single_placeholder() {
    let text = "[00:01.00]a\n[00:03.00]\n[00:04.00]\n[00:20.00]b\n";
    let parsed = parse_lrc(text, &LrcOptions::default());

    assert_eq!(
        parsed.slices,
        vec![
            LyricSlice::new(1000.0, "a"),
            LyricSlice::new(3000.0, "•••"),
            LyricSlice::new(20_000.0, "b"),
        ]
    );
}

#[test]
fn short_or_unbounded_blank_runs_are_dropped() {
    let short = parse_lrc(
        "[00:01.00]a\n[00:02.00]\n[00:04.00]b\n",
        &LrcOptions::default(),
    );
    assert_eq!(texts(&short), vec!["a", "b"]);

    let leading = parse_lrc("[00:00.00]\n[00:30.00]a\n", &LrcOptions::default());
    assert_eq!(texts(&leading), vec!["a"]);

    let trailing = parse_lrc("[00:01.00]a\n[00:02.00]\n", &LrcOptions::default());
    assert_eq!(texts(&trailing), vec!["a"]);
}

#[test]
fn custom_placeholder_and_gap_are_honoured() {
    let opts = LrcOptions {
        blank_gap_ms: 1000.0,
        placeholder: "~".into(),
    };
    let parsed = parse_lrc("[00:01.00]a\n[00:02.00]\n[00:04.00]b\n", &opts);
    assert_eq!(texts(&parsed), vec!["a", "~", "b"]);
}

#[test]
fn untimed_and_malformed_lines_are_ignored() {
    let text = "plain text\n[xx:yy]nope\n[00:01.00]ok\n[00:0a.00]bad\n";
    let parsed = parse_lrc(text, &LrcOptions::default());
    assert_eq!(texts(&parsed), vec!["ok"]);
}

fn sync_with(stamps: &[f64]) -> LyricSynchronizer {
    let mut sync = LyricSynchronizer::new();
    sync.load(
        stamps
            .iter()
            .enumerate()
            .map(|(i, ms)| LyricSlice::new(*ms, format!("line {i}")))
            .collect(),
    );
    sync
}

#[test]
fn lookup_returns_last_slice_at_or_before_time() {
    let sync = sync_with(&[1000.0, 2000.0, 3000.0]);
    assert_eq!(sync.lookup(0.0), 0);
    assert_eq!(sync.lookup(999.0), 0);
    assert_eq!(sync.lookup(1000.0), 0);
    assert_eq!(sync.lookup(2500.0), 1);
    assert_eq!(sync.lookup(3000.0), 2);
    assert_eq!(sync.lookup(90_000.0), 2);
}

#[test]
fn update_reports_only_changes() {
    let mut sync = sync_with(&[0.0, 1000.0, 2000.0]);
    assert_eq!(sync.current_index(), Some(0));
    assert_eq!(sync.update(500.0), None);
    assert_eq!(sync.update(1200.0), Some(1));
    assert_eq!(sync.update(1300.0), None);
    assert_eq!(sync.update(100.0), Some(0));
    assert_eq!(sync.current_slice().map(|s| s.text.as_str()), Some("line 0"));
}

#[test]
fn empty_synchronizer_has_no_cursor() {
    let mut sync = LyricSynchronizer::new();
    assert_eq!(sync.current_index(), None);
    assert_eq!(sync.update(5000.0), None);

    let mut loaded = sync_with(&[0.0, 1000.0]);
    loaded.update(1500.0);
    loaded.clear();
    assert!(!loaded.is_loaded());
    assert_eq!(loaded.current_index(), None);
}
