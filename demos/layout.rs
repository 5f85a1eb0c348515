//! Layout Example - Header override and footer transform
//!
//! A `card` component declares three slots with defaults. The caller fills
//! the header, wraps the footer, and leaves the body alone.
//!
//! Run with: cargo run --example layout
//!
//! Runnable examples live under `demos/` and are registered through
//! `[[example]]` entries in `Cargo.toml`.

use spark_slots::{
    fill_slot, resolve_slot, Cleanup, Content, SlotError, SlotScope, SlotValue,
};

fn text(s: &str) -> Content<String> {
    Content::new(s.to_string())
}

/// Renders the card. Knows nothing about who overrides what.
fn card() -> Result<Vec<String>, SlotError> {
    let mut lines = Vec::new();
    for (name, default) in [("header", "Untitled"), ("body", "(no content)"), ("footer", "v0.1")] {
        let content = resolve_slot(name, text(default))?;
        lines.push(format!(
            "{name:>6} | {}",
            content.get().map(String::as_str).unwrap_or("")
        ));
    }
    Ok(lines)
}

fn print_pass(label: &str, lines: &[String]) {
    println!("--- {label}");
    for line in lines {
        println!("{line}");
    }
}

fn main() -> Result<(), SlotError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== spark-slots Layout Example ===\n");

    let scope = SlotScope::<String>::builder().label("card").establish();

    let cleanups: Vec<Cleanup> = scope.enter(|| -> Result<Vec<Cleanup>, SlotError> {
        let header = fill_slot("header", SlotValue::content("Inbox".to_string()))?;
        let footer = fill_slot(
            "footer",
            SlotValue::transform(|c: Content<String>| {
                Content::new(format!("{} · 3 unread", c.get().map(String::as_str).unwrap_or("")))
            }),
        )?;
        Ok(vec![header.into(), footer.into()])
    })?;

    // Writes are queued; this pass still sees the defaults.
    print_pass("render (before commit)", &scope.enter(card)?);

    if let Some(report) = scope.commit() {
        println!("\ncommitted v{} {:?} {:?}\n", report.version, report.changes, report.names);
    }
    print_pass("render (after commit)", &scope.enter(card)?);

    for cleanup in cleanups {
        cleanup();
    }
    println!();
    print_pass("render (writers unmounted)", &scope.enter(card)?);

    Ok(())
}
