//! Demo 01: Basic Usage
//!
//! Adds, completes, edits, filters, and deletes tasks against a file-backed
//! store, then reopens the store to show the collection was persisted.
//!
//! Run with: cargo run --example 01_basic_usage

use chrono::{Duration, Utc};
use eyre::Result;
use taskboard::{FileKv, TaskFilter, TaskStore};

fn main() -> Result<()> {
    // Create a temporary directory for this demo
    let temp_dir = tempfile::tempdir()?;
    let store_path = temp_dir.path().to_path_buf();

    println!("taskboard Basic Usage Demo");
    println!("==========================\n");
    println!("Store path: {}\n", store_path.display());

    let mut store = TaskStore::open(FileKv::open(&store_path)?);

    // ADD
    println!("1. ADD - Creating three tasks...");
    let milk = store.add("Buy milk", None)?;
    let rent = store.add("Pay rent", Some(Utc::now() - Duration::hours(1)))?;
    let call = store.add("Call the plumber", Some(Utc::now() + Duration::days(1)))?;
    for task in store.tasks() {
        println!("   - {} ({})", task.text, task.id);
    }
    println!();

    // FILTER
    println!("2. FILTER - Views over the collection...");
    for filter in TaskFilter::ALL {
        let names: Vec<String> = store.list(filter).into_iter().map(|t| t.text).collect();
        println!("   {:<9} {:?}", filter.as_str(), names);
    }
    println!();

    // TOGGLE
    println!("3. TOGGLE - Completing '{}'...", rent.text);
    store.toggle_completed(rent.id)?;
    let stats = store.stats();
    println!(
        "   total={} completed={} pending={} overdue={}\n",
        stats.total, stats.completed, stats.pending, stats.overdue
    );

    // EDIT
    println!("4. EDIT - Renaming '{}' and clearing its deadline...", call.text);
    let edited = store.edit(call.id, "Call the plumber about the sink", None)?;
    println!("   Now: {} (due: {:?})\n", edited.text, edited.due_at);

    // DELETE
    println!("5. DELETE - Removing '{}'...", milk.text);
    store.delete(milk.id)?;
    println!("   Remaining: {}\n", store.stats().total);

    // RELOAD
    println!("6. RELOAD - Reopening the store from disk...");
    let reopened = TaskStore::open(FileKv::open(&store_path)?);
    for task in reopened.tasks() {
        let status = if task.completed { "done" } else { "pending" };
        println!("   - {} [{}]", task.text, status);
    }
    println!();

    println!("Demo complete!");
    Ok(())
}
