use std::path::Path;

use sydata_result::Result;
use sydata_storage::pager::mem_pager::MemPager;

use pager_harness::{Persistence, run_crud_roundtrip, run_reopen_behavior};

fn make_mem(_path: &Path) -> Result<MemPager> {
    // MemPager ignores paths and is purely in-memory.
    Ok(MemPager::new())
}

#[test]
fn mem_crud_roundtrip() {
    run_crud_roundtrip::<MemPager, _>(make_mem);
}

#[test]
fn mem_reopen_behavior_is_ephemeral() {
    run_reopen_behavior::<MemPager, _>(make_mem, Persistence::Ephemeral);
}
