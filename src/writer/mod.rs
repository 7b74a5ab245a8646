//! Component 3 – backfill positions and write the script back out.
pub mod positions;
pub mod python;
