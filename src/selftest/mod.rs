use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use serde::Serialize;

use crate::error::CryptoError;

mod peer;
mod scenarios;

pub use peer::{Peer, PeerError};

pub type TestFuture = BoxFuture<'static, Result<(), TestFailure>>;
pub type TestFn = fn(Arc<Peer>) -> TestFuture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestFailure {
    Mismatch {
        message: &'static str,
        got: String,
        want: String,
    },
    Crypto(CryptoError),
    Peer(PeerError),
}

impl TestFailure {
    pub fn mismatch<G, W>(message: &'static str, got: G, want: W) -> TestFailure where G: Into<String>, W: Into<String> {
        TestFailure::Mismatch { message, got: got.into(), want: want.into() }
    }
}

impl Display for TestFailure {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            TestFailure::Mismatch { message, got, want } => write!(f, "{}:\ngot: {}\nwant: {}", message, got, want),
            TestFailure::Crypto(err) => write!(f, "{}", err),
            TestFailure::Peer(err) => write!(f, "peer error: {}", err),
        }
    }
}

impl From<CryptoError> for TestFailure {
    fn from(err: CryptoError) -> TestFailure {
        TestFailure::Crypto(err)
    }
}

impl From<PeerError> for TestFailure {
    fn from(err: PeerError) -> TestFailure {
        TestFailure::Peer(err)
    }
}

pub fn expect_eq(message: &'static str, got: &str, want: &str) -> Result<(), TestFailure> {
    if got == want {
        Ok(())
    } else {
        Err(TestFailure::mismatch(message, got, want))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub is_ok: bool,
    pub error_message: String,
}

impl TestResult {
    fn new(name: &str, outcome: Result<(), TestFailure>) -> TestResult {
        match outcome {
            Ok(()) => TestResult { name: name.to_owned(), is_ok: true, error_message: String::new() },
            Err(failure) => TestResult { name: name.to_owned(), is_ok: false, error_message: failure.to_string() },
        }
    }
}

pub struct TestRunner {
    peer: Arc<Peer>,
    tests: Vec<(&'static str, TestFn)>,
}

impl TestRunner {
    pub fn new(peer: Peer) -> TestRunner {
        TestRunner { peer: Arc::new(peer), tests: Vec::new() }
    }

    pub fn with_default_tests(peer: Peer) -> TestRunner {
        let mut runner = TestRunner::new(peer);
        for &(name, test) in scenarios::DEFAULT_TESTS {
            runner.register(name, test);
        }
        runner
    }

    pub fn register(&mut self, name: &'static str, test: TestFn) -> &mut TestRunner {
        self.tests.push((name, test));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tests.iter().map(|(name, _)| *name).collect()
    }

    pub async fn run(&self) -> Vec<TestResult> {
        info!("Running {} tests", self.tests.len());
        let runs = self.tests.iter()
            .map(|(name, test)| {
                let outcome = test(Arc::clone(&self.peer));
                async move {
                    let result = TestResult::new(name, outcome.await);
                    if result.is_ok {
                        info!("{} passed", result.name);
                    } else {
                        warn!("{} failed: {}", result.name, result.error_message);
                    }
                    result
                }
            });
        join_all(runs).await
    }
}
