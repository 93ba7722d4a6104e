//! Shared fixtures for the proxy test suite.
//!
//! `ITest` is the contract under test, `FakeTest` a counting target, and the
//! interceptors below are small hand-written stand-ins for mocks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

pub use interpose::{
    CallEnvelope, Contract, ContractDescriptor, Dispatcher, Interceptor,
    InterceptorSource, MemberDescriptor, Next, Outcome, ProxyError, ProxyFactory, ProxyResult,
    Proxyable,
};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

// ============================================================================
// Contract
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("{0}")]
    Arithmetic(String),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

pub trait ITest: Send + Sync {
    fn direct(&self, foo: i32) -> String;
    fn intercepted(&self, foo: i32) -> Option<String>;
    fn intercepted_non_primitive(
        &self,
        foo: (String, i32),
        bar: Vec<SystemTime>,
    ) -> HashMap<String, i32>;
    fn intercepted_async(&self, foo: i32) -> BoxFuture<String>;
    fn return_int(&self, x: i32, y: i32) -> i32;
    fn return_void(&self);
    fn checked(&self, foo: i32) -> Result<String, TestError>;
}

static CONTRACT: Lazy<Arc<Contract<dyn ITest>>> = Lazy::new(|| {
    let contract = Contract::<dyn ITest>::builder("ITest")
        .method("direct", &["foo"], |t, (foo,): (i32,)| t.direct(foo))
        .method("intercepted", &["foo"], |t, (foo,): (i32,)| t.intercepted(foo))
        .method(
            "intercepted_non_primitive",
            &["foo", "bar"],
            |t, (foo, bar): ((String, i32), Vec<SystemTime>)| t.intercepted_non_primitive(foo, bar),
        )
        .method_future("intercepted_async", &["foo"], |t, (foo,): (i32,)| {
            t.intercepted_async(foo)
        })
        .method("return_int", &["x", "y"], |t, (x, y): (i32, i32)| t.return_int(x, y))
        .method_void("return_void", &[], |t, (): ()| t.return_void())
        .method_fallible("checked", &["foo"], |t, (foo,): (i32,)| t.checked(foo))
        .build()
        .expect("ITest contract");
    Arc::new(contract)
});

impl Proxyable for dyn ITest {
    fn contract() -> ProxyResult<Arc<Contract<Self>>> {
        Ok(Arc::clone(&CONTRACT))
    }

    fn from_dispatcher(dispatcher: Dispatcher<Self>) -> Arc<Self> {
        Arc::new(dispatcher)
    }
}

impl ITest for Dispatcher<dyn ITest> {
    fn direct(&self, foo: i32) -> String {
        self.dispatch(0, (foo,), |t, (foo,)| t.direct(foo)).unwrap()
    }

    fn intercepted(&self, foo: i32) -> Option<String> {
        self.dispatch(1, (foo,), |t, (foo,)| t.intercepted(foo)).unwrap()
    }

    fn intercepted_non_primitive(
        &self,
        foo: (String, i32),
        bar: Vec<SystemTime>,
    ) -> HashMap<String, i32> {
        self.dispatch(2, (foo, bar), |t, (foo, bar)| {
            t.intercepted_non_primitive(foo, bar)
        })
        .unwrap()
    }

    fn intercepted_async(&self, foo: i32) -> BoxFuture<String> {
        self.dispatch(3, (foo,), |t, (foo,)| t.intercepted_async(foo)).unwrap()
    }

    fn return_int(&self, x: i32, y: i32) -> i32 {
        self.dispatch(4, (x, y), |t, (x, y)| t.return_int(x, y)).unwrap()
    }

    fn return_void(&self) {
        self.dispatch_void(5, (), |t, ()| t.return_void()).unwrap()
    }

    fn checked(&self, foo: i32) -> Result<String, TestError> {
        self.dispatch_fallible(6, (foo,), |t, (foo,)| t.checked(foo))
    }
}

// ============================================================================
// Target
// ============================================================================

/// Counting target; every call is also appended to `log`
pub struct FakeTest {
    calls: Mutex<HashMap<&'static str, usize>>,
    pub log: Arc<Mutex<Vec<String>>>,
    intercepted_result: Option<String>,
}

impl FakeTest {
    pub fn new() -> Self {
        Self::with_log(Arc::default())
    }

    pub fn with_log(log: Arc<Mutex<Vec<String>>>) -> Self {
        FakeTest {
            calls: Mutex::new(HashMap::new()),
            log,
            intercepted_result: Some("test".to_string()),
        }
    }

    /// `intercepted` returns nothing
    pub fn returning_none() -> Self {
        FakeTest {
            intercepted_result: None,
            ..Self::new()
        }
    }

    pub fn calls(&self, member: &str) -> usize {
        self.calls.lock().get(member).copied().unwrap_or(0)
    }

    fn record(&self, member: &'static str) {
        *self.calls.lock().entry(member).or_insert(0) += 1;
        self.log.lock().push(format!("target:{}", member));
    }
}

impl ITest for FakeTest {
    fn direct(&self, _foo: i32) -> String {
        self.record("direct");
        "test".to_string()
    }

    fn intercepted(&self, _foo: i32) -> Option<String> {
        self.record("intercepted");
        self.intercepted_result.clone()
    }

    fn intercepted_non_primitive(
        &self,
        _foo: (String, i32),
        _bar: Vec<SystemTime>,
    ) -> HashMap<String, i32> {
        self.record("intercepted_non_primitive");
        HashMap::from([("a".to_string(), 1)])
    }

    fn intercepted_async(&self, _foo: i32) -> BoxFuture<String> {
        self.record("intercepted_async");
        Box::pin(async { "test".to_string() })
    }

    fn return_int(&self, x: i32, y: i32) -> i32 {
        self.record("return_int");
        x + y
    }

    fn return_void(&self) {
        self.record("return_void");
    }

    fn checked(&self, _foo: i32) -> Result<String, TestError> {
        self.record("checked");
        Err(TestError::Arithmetic("BOOM".to_string()))
    }
}

/// Target whose `intercepted` panics
pub struct Exploding;

impl ITest for Exploding {
    fn direct(&self, _foo: i32) -> String {
        "test".to_string()
    }
    fn intercepted(&self, _foo: i32) -> Option<String> {
        panic!("BOOM")
    }
    fn intercepted_non_primitive(
        &self,
        _foo: (String, i32),
        _bar: Vec<SystemTime>,
    ) -> HashMap<String, i32> {
        HashMap::new()
    }
    fn intercepted_async(&self, _foo: i32) -> BoxFuture<String> {
        Box::pin(async { String::new() })
    }
    fn return_int(&self, x: i32, y: i32) -> i32 {
        x + y
    }
    fn return_void(&self) {}
    fn checked(&self, _foo: i32) -> Result<String, TestError> {
        Ok(String::new())
    }
}

// ============================================================================
// Interceptor sources
// ============================================================================

/// Hands the same interceptors to every member it matches
pub struct TestSource {
    interceptors: Vec<Arc<dyn Interceptor<dyn ITest>>>,
    only: Option<&'static str>,
    match_nothing: bool,
    called: AtomicBool,
}

impl TestSource {
    pub fn all(interceptors: Vec<Arc<dyn Interceptor<dyn ITest>>>) -> Self {
        TestSource {
            interceptors,
            only: None,
            match_nothing: false,
            called: AtomicBool::new(false),
        }
    }

    pub fn only(member: &'static str, interceptors: Vec<Arc<dyn Interceptor<dyn ITest>>>) -> Self {
        TestSource {
            only: Some(member),
            ..Self::all(interceptors)
        }
    }

    pub fn nothing(interceptors: Vec<Arc<dyn Interceptor<dyn ITest>>>) -> Self {
        TestSource {
            match_nothing: true,
            ..Self::all(interceptors)
        }
    }

    pub fn called_find_matching(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

impl InterceptorSource<dyn ITest> for TestSource {
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor<dyn ITest>>> {
        self.interceptors.clone()
    }

    fn find_matching_interceptors(
        &self,
        _contract: &ContractDescriptor,
        member: &MemberDescriptor,
    ) -> Vec<Arc<dyn Interceptor<dyn ITest>>> {
        self.called.store(true, Ordering::SeqCst);
        let matches = !self.match_nothing && self.only.map_or(true, |only| only == member.name());
        if matches {
            self.interceptors.clone()
        } else {
            Vec::new()
        }
    }
}

pub fn factory<S: InterceptorSource<dyn ITest>>(source: &S) -> ProxyFactory<dyn ITest> {
    ProxyFactory::<dyn ITest>::new(source).expect("factory")
}

// ============================================================================
// Interceptors
// ============================================================================

fn single_pair(envelope: &CallEnvelope) -> ProxyResult<String> {
    let named = envelope.named_arguments()?;
    Ok(named
        .iter()
        .map(|(name, value)| format!("{}:{:?}", name, value))
        .collect::<Vec<_>>()
        .join(","))
}

/// Appends `_<method>_<param>:<value>` to the inner result
#[derive(Default)]
pub struct Concatenate {
    pub runs: AtomicUsize,
}

impl Interceptor<dyn ITest> for Concatenate {
    fn name(&self) -> &str {
        "concatenate"
    }

    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let suffix = format!("_{}_{}", method, single_pair(envelope)?);
        next.proceed(method, envelope, target)?
            .map(method, move |result: Option<String>| result.map(|s| s + &suffix))
    }
}

/// Reverses the characters of the inner result
#[derive(Default)]
pub struct Reverse {
    pub runs: AtomicUsize,
}

impl Interceptor<dyn ITest> for Reverse {
    fn name(&self) -> &str {
        "reverse"
    }

    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        next.proceed(method, envelope, target)?
            .map(method, |result: Option<String>| {
                result.map(|s| s.chars().rev().collect::<String>())
            })
    }
}

/// Appends `_<method>` to the inner result
pub struct MethodSuffix;

impl Interceptor<dyn ITest> for MethodSuffix {
    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        let suffix = format!("_{}", method);
        next.proceed(method, envelope, target)?
            .map(method, move |result: Option<String>| result.map(|s| s + &suffix))
    }
}

/// Doubles an `i32` result
pub struct Times2;

impl Interceptor<dyn ITest> for Times2 {
    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        next.proceed(method, envelope, target)?
            .map(method, |x: i32| x * 2)
    }
}

/// Implements only the value path and counts how often it ran
#[derive(Default)]
pub struct Passive {
    pub runs: AtomicUsize,
}

impl Interceptor<dyn ITest> for Passive {
    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        next.proceed(method, envelope, target)
    }
}

/// One observed interceptor call
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub label: String,
    pub method: String,
    pub args: String,
}

/// Logs its label on entry, records what it saw, then proceeds unchanged
pub struct Recorder {
    label: String,
    log: Arc<Mutex<Vec<String>>>,
    pub seen: Mutex<Vec<Observed>>,
    pub void_runs: AtomicUsize,
}

impl Recorder {
    pub fn new(label: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Recorder {
            label: label.to_string(),
            log: Arc::clone(log),
            seen: Mutex::new(Vec::new()),
            void_runs: AtomicUsize::new(0),
        }
    }

    pub fn detached(label: &str) -> Self {
        Self::new(label, &Arc::default())
    }

    pub fn runs(&self) -> usize {
        self.seen.lock().len()
    }

    fn observe(&self, method: &str, envelope: &CallEnvelope) -> ProxyResult<()> {
        self.log.lock().push(self.label.clone());
        self.seen.lock().push(Observed {
            label: self.label.clone(),
            method: method.to_string(),
            args: single_pair(envelope)?,
        });
        Ok(())
    }
}

impl Interceptor<dyn ITest> for Recorder {
    fn name(&self) -> &str {
        &self.label
    }

    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        self.observe(method, envelope)?;
        next.proceed(method, envelope, target)
    }

    fn intercept_void(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<()> {
        self.void_runs.fetch_add(1, Ordering::SeqCst);
        self.observe(method, envelope)?;
        next.proceed_void(method, envelope, target)
    }
}

pub fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::default()
}

/// Share a concrete interceptor as a chain link
pub fn link<I>(interceptor: &Arc<I>) -> Arc<dyn Interceptor<dyn ITest>>
where
    I: Interceptor<dyn ITest> + 'static,
{
    Arc::clone(interceptor) as Arc<dyn Interceptor<dyn ITest>>
}
