//! JUnit-style XML artifact parsing.
//!
//! Both CTest (`--output-junit`) and gtest (`--gtest_output=xml:`) write a
//! JUnit document whose outermost element carries the aggregate counters.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::core::{Error, Result};

/// Aggregate test counters from one artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub tests: u32,
    pub failures: u32,
    pub errors: u32,
    pub disabled: u32,
}

impl TestCounts {
    /// Tests that actually passed.
    pub fn passed(&self) -> u32 {
        self.tests
            .saturating_sub(self.failures + self.errors + self.disabled)
    }

    /// Whether the run counts as green: something ran and nothing failed.
    pub fn all_passed(&self) -> bool {
        self.tests > 0 && self.failures == 0 && self.errors == 0
    }
}

/// Read `tests` / `failures` / `errors` / `disabled` from the outermost
/// element of a JUnit XML document.
pub fn parse_junit_xml(path: impl AsRef<Path>) -> Result<TestCounts> {
    let path = path.as_ref();
    let mut reader = Reader::from_file(path).map_err(|err| Error::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let mut counts = TestCounts::default();
                for attr in element.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    let value: u32 = value.trim().parse().unwrap_or(0);
                    match attr.key.as_ref() {
                        b"tests" => counts.tests = value,
                        b"failures" => counts.failures = value,
                        b"errors" => counts.errors = value,
                        b"disabled" => counts.disabled = value,
                        _ => {}
                    }
                }
                return Ok(counts);
            }
            Ok(Event::Eof) => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    message: "no test suite element found".to_string(),
                });
            }
            Err(err) => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }
}
