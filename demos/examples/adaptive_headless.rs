// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless responsive classification driven by a virtual clock.
//!
//! This example shows how to combine:
//! - `understory_breakpoints` for the rule set and the in-memory document,
//! - `understory_viewport_events` for the virtual clock,
//! - `understory_adaptive` for wiring events to classification passes.
//!
//! It plays back a short session (a window drag, then a phone rotation that takes a few
//! frames to settle) and prints the root element after each step.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example adaptive_headless`

use kurbo::Size;
use understory_adaptive::{Adaptive, TimerOutcome};
use understory_breakpoints::{BreakpointConfig, HeadlessLayout, HeadlessRoot};
use understory_viewport_events::timer::ManualTimers;

type Page = Adaptive<HeadlessLayout, HeadlessRoot, ManualTimers>;

const CONFIG: &str = r#"{
    "global": { "throttle": 17, "orientationTestCount": 10, "orientationChangeTimeout": 600 },
    "mobile:portrait": { "to": { "width": 450, "height": 1000 }, "base": { "width": 375 } },
    "mobile:landscape": { "to": { "width": 1000, "height": 450 }, "base": { "height": 375 } },
    "tablet": { "from": { "width": 450 }, "to": { "width": 1024 }, "rem": 12 },
    "desktop": { "from": { "width": 1024 }, "rem": 10 }
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = BreakpointConfig::from_json(CONFIG).expect("demo config is valid");
    let mut page = Adaptive::new(
        config,
        HeadlessLayout::new(Size::new(1280.0, 800.0)),
        HeadlessRoot::default(),
        ManualTimers::new(),
    )
    .expect("initial pass");
    report("initial", &page);

    // Drag the window narrower; the throttle folds the burst into one pass.
    for width in [1200.0, 1100.0, 900.0, 700.0] {
        page.measure_mut().set_viewport(Size::new(width, 800.0));
        page.on_resize();
    }
    run_until(&mut page, 100, |_, _| {});
    report("after drag", &page);

    // Rotate a phone. The browser reports the new size a few frames late.
    page.measure_mut().set_viewport(Size::new(375.0, 667.0));
    page.refresh().expect("refresh");
    report("phone portrait", &page);

    page.on_orientation_change();
    let start = page.timers().now();
    run_until(&mut page, start + 1_000, |page, now| {
        if now >= start + 51 {
            page.measure_mut().set_viewport(Size::new(667.0, 375.0));
        }
    });
    report("phone landscape", &page);
}

/// Fire due timers up to `until`, letting `step` adjust the page before each one.
fn run_until(page: &mut Page, until: u64, mut step: impl FnMut(&mut Page, u64)) {
    while let Some(id) = page.timers_mut().fire_next(until) {
        let now = page.timers().now();
        step(page, now);
        match page.on_timer(id) {
            Ok(TimerOutcome::Resized(pass) | TimerOutcome::Reoriented(pass)) => {
                println!(
                    "  t={now:>4}ms pass at {}x{}: {} class change(s)",
                    pass.viewport.width,
                    pass.viewport.height,
                    pass.class_changes.len()
                );
            }
            Ok(TimerOutcome::Settled) => println!("  t={now:>4}ms orientation settled"),
            Ok(TimerOutcome::TimedOut) => println!("  t={now:>4}ms orientation timed out"),
            Ok(TimerOutcome::Stable { .. } | TimerOutcome::Ignored) => {}
            Err(err) => println!("  t={now:>4}ms pass failed: {err}"),
        }
    }
}

fn report(label: &str, page: &Page) {
    let view = page.view();
    let classes: Vec<&str> = page.document().classes().collect();
    println!(
        "{label}: {}x{} rem={} classes=[{}]",
        view.width(),
        view.height(),
        view.rem(),
        classes.join(" ")
    );
}
