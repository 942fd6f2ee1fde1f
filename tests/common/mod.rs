// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

mod memory;

pub use memory::InMemoryRepository;
