//! # XWFC Application (Binary)
//!
//! Main executable entry point.

fn main() -> anyhow::Result<()> {
    xwfc_app::run()
}
