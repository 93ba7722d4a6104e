//! Chain registry and cursor behavior

use std::sync::Arc;

use interpose::{ChainRegistry, InterceptorManager, IntoArguments};

use crate::common::*;

/// Calls the rest of the chain twice and keeps the second result
struct Retry;

impl Interceptor<dyn ITest> for Retry {
    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        let _first = next.proceed(method, envelope, target)?;
        next.proceed(method, envelope, target)
    }
}

/// Answers without consulting the rest of the chain
struct ShortCircuit;

impl Interceptor<dyn ITest> for ShortCircuit {
    fn intercept(
        &self,
        _next: Next<'_, dyn ITest>,
        _method: &str,
        _envelope: &CallEnvelope,
        _target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        Ok(Outcome::new(-1i32))
    }
}

/// Replaces the first argument of `return_int` with 10
struct RewriteX;

impl Interceptor<dyn ITest> for RewriteX {
    fn intercept(
        &self,
        next: Next<'_, dyn ITest>,
        method: &str,
        envelope: &CallEnvelope,
        target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        let y = *envelope.argument::<i32>(1)?;
        let rewritten = envelope.with_arguments((10i32, y).into_arguments());
        next.proceed(method, &rewritten, target)
    }
}

/// Returns a value of the wrong type
struct WrongType;

impl Interceptor<dyn ITest> for WrongType {
    fn intercept(
        &self,
        _next: Next<'_, dyn ITest>,
        _method: &str,
        _envelope: &CallEnvelope,
        _target: &(dyn ITest + 'static),
    ) -> ProxyResult<Outcome> {
        Ok(Outcome::new("not an int"))
    }
}

fn contract() -> Arc<interpose::Contract<dyn ITest>> {
    <dyn ITest as Proxyable>::contract().unwrap()
}

#[test]
fn interceptor_may_proceed_more_than_once() {
    let factory = factory(&TestSource::only("return_int", vec![Arc::new(Retry)]));
    let target = Arc::new(FakeTest::new());
    let proxy = factory.generate_proxy(Arc::clone(&target) as Arc<dyn ITest>);

    assert_eq!(proxy.return_int(1, 2), 3);
    assert_eq!(target.calls("return_int"), 2);
}

#[test]
fn interceptor_may_skip_the_target() {
    let factory = factory(&TestSource::only("return_int", vec![Arc::new(ShortCircuit)]));
    let target = Arc::new(FakeTest::new());
    let proxy = factory.generate_proxy(Arc::clone(&target) as Arc<dyn ITest>);

    assert_eq!(proxy.return_int(1, 2), -1);
    assert_eq!(target.calls("return_int"), 0);
}

#[test]
fn rewritten_arguments_reach_the_target() {
    let factory = factory(&TestSource::only("return_int", vec![Arc::new(RewriteX)]));
    let proxy = factory.generate_proxy(Arc::new(FakeTest::new()));
    assert_eq!(proxy.return_int(1, 2), 12);
}

#[test]
fn wrong_result_type_is_reported_by_name() {
    let contract = contract();
    let member = contract.member_named("return_int").unwrap();
    let mut registry = ChainRegistry::<dyn ITest>::new();
    registry
        .register_chain(member, vec![Arc::new(WrongType)])
        .unwrap();

    let envelope = CallEnvelope::pack(
        Arc::clone(contract.descriptor()),
        member.identity().clone(),
        (1i32, 2i32),
    );
    let outcome = registry
        .invoke_chain(member.identity(), &envelope, &FakeTest::new())
        .unwrap();
    let err = outcome.downcast::<i32>("return_int").unwrap_err();
    assert!(matches!(err, ProxyError::ReturnTypeMismatch { ref method, .. } if method == "return_int"));
}

#[test]
fn duplicate_registration_is_rejected() {
    let contract = contract();
    let member = contract.member_named("intercepted").unwrap();
    let mut registry = ChainRegistry::<dyn ITest>::new();

    registry.register_chain(member, Vec::new()).unwrap();
    let err = registry
        .register_chain(member, vec![Arc::new(MethodSuffix)])
        .unwrap_err();
    assert!(matches!(err, ProxyError::DuplicateChain { .. }));
    assert_eq!(registry.len(), 1);
}

#[test]
fn unregistered_member_cannot_be_invoked() {
    let contract = contract();
    let member = contract.member_named("direct").unwrap();
    let registry = ChainRegistry::<dyn ITest>::new();

    let envelope = CallEnvelope::pack(
        Arc::clone(contract.descriptor()),
        member.identity().clone(),
        (1i32,),
    );
    let err = registry
        .invoke_chain(member.identity(), &envelope, &FakeTest::new())
        .unwrap_err();
    assert!(matches!(err, ProxyError::UnregisteredChain { .. }));
}

#[test]
fn registered_chain_ends_with_terminal() {
    let contract = contract();
    let member = contract.member_named("intercepted").unwrap();
    let mut registry = ChainRegistry::<dyn ITest>::new();
    registry
        .register_chain(
            member,
            vec![Arc::new(Concatenate::default()), Arc::new(Reverse::default())],
        )
        .unwrap();

    let chain = registry.chain(member.identity()).unwrap();
    assert_eq!(chain.method(), "intercepted");
    assert_eq!(chain.interceptor_count(), 2);
    let names: Vec<&str> = chain.links().iter().map(|link| link.name()).collect();
    assert_eq!(names, vec!["concatenate", "reverse", "terminal"]);
}

#[test]
fn empty_chain_still_calls_the_target() {
    let contract = contract();
    let member = contract.member_named("intercepted").unwrap();
    let mut registry = ChainRegistry::<dyn ITest>::new();
    registry.register_chain(member, Vec::new()).unwrap();

    let target = FakeTest::new();
    let envelope = CallEnvelope::pack(
        Arc::clone(contract.descriptor()),
        member.identity().clone(),
        (1i32,),
    );
    let result = registry
        .invoke_chain(member.identity(), &envelope, &target)
        .unwrap()
        .downcast::<Option<String>>("intercepted")
        .unwrap();
    assert_eq!(result, Some("test".to_string()));
    assert_eq!(target.calls("intercepted"), 1);
}
