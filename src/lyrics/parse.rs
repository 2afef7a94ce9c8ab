use super::LyricSlice;

/// Header directives found in an LRC file. None of these become slices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub by: Option<String>,
    /// Added to every timestamp.
    pub offset_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLyrics {
    pub metadata: LyricMetadata,
    /// Sorted ascending by `timestamp_ms`.
    pub slices: Vec<LyricSlice>,
}

#[derive(Debug, Clone)]
pub struct LrcOptions {
    /// Blank runs longer than this (ms) collapse into one placeholder slice.
    pub blank_gap_ms: f64,
    pub placeholder: String,
}

impl Default for LrcOptions {
    fn default() -> Self {
        Self {
            blank_gap_ms: 5000.0,
            placeholder: "•••".to_string(),
        }
    }
}

/// `mm:ss`, `mm:ss.x`, `mm:ss.xx` or `mm:ss.xxx` to milliseconds.
fn parse_timestamp(tag: &str) -> Option<f64> {
    let (min, sec) = tag.split_once(':')?;
    if min.is_empty() || !min.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if sec.is_empty() || !sec.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let minutes: f64 = min.parse().ok()?;
    let seconds: f64 = sec.parse().ok()?;
    Some(minutes * 60_000.0 + seconds * 1000.0)
}

fn apply_directive(meta: &mut LyricMetadata, key: &str, value: &str) {
    let value = value.trim();
    let text = || (!value.is_empty()).then(|| value.to_string());
    match key.trim().to_ascii_lowercase().as_str() {
        "offset" => {
            if let Ok(v) = value.trim_start_matches('+').parse::<i64>() {
                meta.offset_ms = v;
            }
        }
        "ti" => meta.title = text(),
        "ar" => meta.artist = text(),
        "al" => meta.album = text(),
        "by" => meta.by = text(),
        _ => {}
    }
}

/// Parse LRC text into sorted slices.
///
/// A line may carry several leading timestamps (a repeated phrase) and
/// produces one slice per timestamp. Runs of blank timed lines sitting
/// between two non-empty lines become a single placeholder at the run's
/// start when the run lasts longer than `blank_gap_ms`; otherwise they
/// are dropped.
pub fn parse_lrc(text: &str, opts: &LrcOptions) -> ParsedLyrics {
    let mut metadata = LyricMetadata::default();
    let mut entries: Vec<(f64, String)> = Vec::new();

    for raw in text.lines() {
        let mut rest = raw.trim();
        let mut stamps: Vec<f64> = Vec::new();

        while let Some(body) = rest.strip_prefix('[') {
            let Some(close) = body.find(']') else {
                break;
            };
            let tag = &body[..close];
            if let Some(ms) = parse_timestamp(tag) {
                stamps.push(ms);
                rest = body[close + 1..].trim_start();
                continue;
            }
            if stamps.is_empty() {
                if let Some((key, value)) = tag.split_once(':') {
                    apply_directive(&mut metadata, key, value);
                }
            }
            break;
        }

        let line_text = rest.trim();
        for ms in stamps {
            entries.push((ms, line_text.to_string()));
        }
    }

    let offset = metadata.offset_ms as f64;
    for entry in &mut entries {
        entry.0 = (entry.0 + offset).max(0.0);
    }
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut slices: Vec<LyricSlice> = Vec::with_capacity(entries.len());
    let mut i = 0;
    while i < entries.len() {
        if !entries[i].1.is_empty() {
            slices.push(LyricSlice::new(entries[i].0, entries[i].1.clone()));
            i += 1;
            continue;
        }

        let run_start = entries[i].0;
        let mut end = i;
        while end < entries.len() && entries[end].1.is_empty() {
            end += 1;
        }

        let has_prev = !slices.is_empty();
        let gap_to_next = entries.get(end).map(|(next_ms, _)| next_ms - run_start);
        if has_prev && gap_to_next.is_some_and(|gap| gap > opts.blank_gap_ms) {
            slices.push(LyricSlice::new(run_start, opts.placeholder.clone()));
        }
        i = end;
    }

    ParsedLyrics { metadata, slices }
}
