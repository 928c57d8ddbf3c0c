use anyhow::Result;
use outreach_core::QuotaTracker;
use std::path::Path;

/// Load the quota store the same way a run would.
pub fn load_quota(store: &Path, limit: u32) -> outreach_core::Result<QuotaTracker> {
    QuotaTracker::open(store, limit)
}

pub fn execute(store: &Path, limit: u32) -> Result<()> {
    tracing::info!("Reading quota store: {}", store.display());
    let tracker = load_quota(store, limit)?;

    println!("Quota store: {}", store.display());
    println!("  Daily limit:     {}", tracker.limit());
    println!("  Used today:      {}", tracker.used_today());
    println!("  Remaining today: {}", tracker.remaining());

    if tracker.remaining() == 0 {
        println!("🛑 Limit reached; the next run will skip every target");
    }

    Ok(())
}
