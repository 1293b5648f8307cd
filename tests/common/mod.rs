#![allow(dead_code)]

pub use reloadctl_test_utils::builders;
pub use reloadctl_test_utils::{init_tracing, with_timeout, ChildBehaviour, FakeProcessBackend};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
