use std::time::{Duration, Instant};

use postsmith_core::{RenderOptions, W_TAG_UNCLOSED, W_TAG_UNMATCHED, render, render_markup};

// Far above what linear-time rendering needs even in a debug build, far below
// what a rescan per token costs at these sizes.
const BUDGET: Duration = Duration::from_secs(4);

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let started = Instant::now();
    let value = f();
    (value, started.elapsed())
}

#[test]
fn unclosed_raw_tags_render_in_linear_time() {
    for opener in ["[url]", "[img]", "[IMG]"] {
        let source = opener.repeat(50_000);
        let (rendered, elapsed) = timed(|| render(&source, &RenderOptions::default()));
        assert!(elapsed < BUDGET, "{} x50k took {:?}", opener, elapsed);
        assert_eq!(rendered.html, source);
        assert_eq!(rendered.diagnostics.len(), 50_000);
        assert!(rendered.diagnostics.iter().all(|diag| diag.code == W_TAG_UNCLOSED));
    }
}

#[test]
fn raw_tag_closed_far_away_still_matches() {
    let source = format!("{}[url]https://a.test[/url]", "[img]".repeat(20_000));
    let (html, elapsed) = timed(|| render_markup(&source));
    assert!(elapsed < BUDGET, "took {:?}", elapsed);
    assert!(html.ends_with("<a href=\"https://a.test\" target=\"_blank\" rel=\"noopener noreferrer\">https://a.test</a>"));
}

#[test]
fn diagnostics_on_one_long_line_stay_linear() {
    let source = "[/i]é".repeat(40_000);
    let (rendered, elapsed) = timed(|| render(&source, &RenderOptions::default()));
    assert!(elapsed < BUDGET, "took {:?}", elapsed);
    assert_eq!(rendered.diagnostics.len(), 40_000);
    let last = rendered.diagnostics.last().expect("diagnostic");
    assert_eq!(last.code, W_TAG_UNMATCHED);
    assert_eq!(last.range.start.line, 0);
    assert_eq!(last.range.start.character, 5 * 39_999);
    assert_eq!(last.range.end.character, 5 * 39_999 + 4);
}

#[test]
fn stray_closers_across_lines_stay_linear() {
    let source = "x[/i]\n".repeat(40_000);
    let (rendered, elapsed) = timed(|| render(&source, &RenderOptions::default()));
    assert!(elapsed < BUDGET, "took {:?}", elapsed);
    let unmatched = rendered
        .diagnostics
        .iter()
        .filter(|diag| diag.code == W_TAG_UNMATCHED)
        .count();
    assert_eq!(unmatched, 40_000);
}
