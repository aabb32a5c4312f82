#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use tune_shelf::guard::{AccessError, resolve_request};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let root = Path::new("/nonexistent/tune-shelf-fuzz");
    match resolve_request(raw, Some(root)) {
        Ok(path) => panic!("accepted {} under a missing root", path.display()),
        Err(AccessError::NotFound | AccessError::Forbidden) => {}
    }
});
