use crate::{
    define_module, injectable, interface, CancelToken, ComponentBuilder,
    Consumer, Container, ContainerOptions, Criteria, Ctx, DependencyBuilder,
    InjectError, InjectResult, Module, Problem, Provider, Scope, Service, Svc,
    Symbol, Type,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn expect_error<T>(result: InjectResult<T>) -> InjectError {
    match result {
        Ok(_) => panic!("the request should have failed"),
        Err(error) => error,
    }
}

#[derive(Default)]
struct Counter(AtomicUsize);

impl Counter {
    fn next(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct Id(usize);

fn make_id(counter: Svc<Counter>) -> Id {
    Id(counter.next())
}

struct Pair(Svc<Id>, Svc<Id>);

fn make_pair(first: Svc<Id>, second: Svc<Id>) -> Pair {
    Pair(first, second)
}

trait Logger: Service {
    fn prefix(&self) -> &'static str;
}

struct ConsoleLogger;
impl Logger for ConsoleLogger {
    fn prefix(&self) -> &'static str {
        "console"
    }
}

struct FileLogger;
impl Logger for FileLogger {
    fn prefix(&self) -> &'static str {
        "file"
    }
}

interface!(Logger = [ConsoleLogger, FileLogger]);

injectable! {
    struct Handler {
        port: Svc<u16>,
        host: Option<Svc<String>>,
        plugins: Vec<Svc<u8>>,
    }
}

#[test]
fn exclusive_resolution() {
    init_logging();
    let module = Module::builder()
        .provide(Provider::value(42_i32).name("answer"))
        .build();
    let container = Container::new(module).unwrap();
    let ctx = Ctx::new();

    let answer: Svc<i32> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(42, *answer);

    let named: Svc<i32> = container
        .value_of(&ctx, Consumer::value().by_name("answer"))
        .unwrap();
    assert_eq!(42, *named);

    match expect_error(container.get::<Svc<String>>()) {
        InjectError::MissingDependency { .. } => {}
        error => panic!("unexpected error: {}", error),
    }
}

#[test]
fn collectors_see_every_component() {
    let module = Module::builder()
        .provide(Provider::value(1_i32).name("a"))
        .provide(Provider::value(2_i32).name("b"))
        .provide(Provider::value(3_i32).name("c"))
        .build();
    let container = Container::new(module).unwrap();

    let count = container.invoke(|numbers: Vec<Svc<i32>>| numbers.len()).unwrap();
    assert_eq!(3, *count);

    let numbers: Vec<Svc<i32>> = container.get().unwrap();
    let numbers: Vec<i32> = numbers.iter().map(|number| **number).collect();
    assert_eq!(vec![1, 2, 3], numbers);
}

#[test]
fn collectors_follow_module_order() {
    let inner = Module::builder()
        .provide(Provider::value(2_i32))
        .provide(Provider::value(3_i32))
        .build();
    let module = Module::builder()
        .provide(Provider::value(1_i32))
        .sub_module(inner)
        .provide(Provider::value(4_i32))
        .build();
    let container = Container::new(module).unwrap();

    let consumer = Consumer::value::<Vec<Svc<i32>>>().build(Scope::global());
    let plan = container.plan(&consumer).unwrap();
    for _ in 0..2 {
        let value = container.execute(&Ctx::new(), &plan).unwrap();
        let numbers: Vec<i32> = value
            .spread()
            .iter()
            .map(|value| *value.downcast::<i32>().unwrap())
            .collect();
        assert_eq!(vec![1, 2, 3, 4], numbers);
    }
}

#[test]
fn scopes_gate_visibility() {
    let parent = Scope::new("parent");
    let child = Scope::with_parents("child", [parent.clone()]);
    let module = Module::builder()
        .provide(Provider::value(1_i32).in_scope(parent.clone()))
        .provide(Provider::value("x".to_owned()).in_scope(child.clone()))
        .build();
    let container = Container::new(module).unwrap();

    let ctx = Ctx::new().enter_scope(&parent).unwrap();
    let one: Svc<i32> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(1, *one);

    let error = expect_error(container.value_of(&Ctx::new(), Consumer::value::<Svc<i32>>()));
    assert!(matches!(error, InjectError::MissingDependency { .. }));

    let error = expect_error(container.value_of(&ctx, Consumer::value::<Svc<String>>()));
    assert!(matches!(error, InjectError::MissingDependency { .. }));

    let ctx = container.enter_scope(&ctx, &child).unwrap();
    let text: Svc<String> = container.value_of(&ctx, Consumer::value()).unwrap();
    let one_again: Svc<i32> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!("x", text.as_str());
    assert!(Svc::ptr_eq(&one, &one_again));
}

#[test]
fn inactive_scopes_are_reported() {
    let left = Scope::new("left");
    let right = Scope::new("right");
    let joined = Scope::with_parents("joined", [left.clone(), right.clone()]);
    let module = Module::builder()
        .provide(Provider::value(1_u8).in_scope(left))
        .build();
    let container = Container::new(module).unwrap();

    let ctx = Ctx::new()
        .enter_scope(&right)
        .unwrap()
        .enter_scope(&joined)
        .unwrap();
    match expect_error(container.value_of(&ctx, Consumer::value::<Svc<u8>>())) {
        InjectError::ScopeNotActive { scope, .. } => assert_eq!("left", scope),
        error => panic!("unexpected error: {}", error),
    }
}

#[test]
fn hidden_components_need_qualifiers() {
    let module = Module::builder()
        .provide(Provider::value(1_i32).hide().name("k"))
        .build();
    let container = Container::new(module).unwrap();

    let error = expect_error(container.get::<Svc<i32>>());
    assert!(matches!(error, InjectError::MissingDependency { .. }));

    let one: Svc<i32> = container
        .value_of(&Ctx::new(), Consumer::value().by_name("k"))
        .unwrap();
    assert_eq!(1, *one);
}

#[test]
fn cycles_fail_unless_ignored() {
    let module = Module::builder()
        .provide(Provider::func(|number: Svc<i32>| number.to_string()))
        .provide(Provider::func(|text: Option<Svc<String>>| {
            text.map_or(0, |text| text.len() as i32)
        }))
        .build();

    let container = Container::new(module.clone()).unwrap();
    let error = expect_error(container.get::<Svc<String>>());
    assert!(matches!(error, InjectError::CyclicDependency { .. }));

    let options = ContainerOptions::new().ignore_cycle(true);
    let container = Container::with_options(module, options).unwrap();
    let text: Svc<String> = container.get().unwrap();
    assert_eq!("0", text.as_str());
}

#[test]
fn cut_cycles_are_missing() {
    let module = Module::builder()
        .provide(Provider::func(|number: Svc<i32>| number.to_string()))
        .provide(Provider::func(|text: Svc<String>| text.len() as i32))
        .build();

    let options = ContainerOptions::new().ignore_cycle(true);
    let container = Container::with_options(module.clone(), options).unwrap();
    let error = expect_error(container.get::<Svc<String>>());
    assert!(matches!(error, InjectError::MissingDependency { .. }));

    // The cut parameter resolves to nothing, which a required service
    // cannot be built from.
    let container =
        Container::with_options(module, options.ignore_missing(true)).unwrap();
    let error = expect_error(container.get::<Svc<String>>());
    assert!(matches!(error, InjectError::ProviderFailed { .. }));
    assert!(matches!(error.root_cause(), InjectError::TypeMismatch { .. }));
}

#[test]
fn collectors_drop_cyclic_candidates_when_ignored() {
    let module = Module::builder()
        .provide(Provider::func(|number: Svc<i32>| number.to_string()))
        .provide(Provider::func(|texts: Vec<Svc<String>>| texts.len() as i32))
        .build();

    let container = Container::new(module.clone()).unwrap();
    match expect_error(container.get::<Svc<String>>()) {
        InjectError::CyclicDependency { dependency, .. } => {
            assert!(dependency.starts_with("parameter 0"));
        }
        error => panic!("unexpected error: {}", error),
    }

    let options = ContainerOptions::new().ignore_cycle(true);
    let container = Container::with_options(module, options).unwrap();
    let text: Svc<String> = container.get().unwrap();
    assert_eq!("0", text.as_str());
}

#[test]
fn ambiguity_is_tolerated_on_request() {
    let module = Module::builder()
        .provide(Provider::value(1_i32).name("x"))
        .provide(Provider::value(2_i32).name("y"))
        .build();

    let container = Container::new(module.clone()).unwrap();
    match expect_error(container.get::<Svc<i32>>()) {
        InjectError::UncertainDependency { candidates, .. } => {
            assert_eq!(2, candidates.len());
        }
        error => panic!("unexpected error: {}", error),
    }

    let options = ContainerOptions::new().ignore_uncertain(true);
    let container = Container::with_options(module.clone(), options).unwrap();
    let error = expect_error(container.get::<Svc<i32>>());
    assert!(matches!(error, InjectError::MissingDependency { .. }));

    let container =
        Container::with_options(module, options.ignore_missing(true)).unwrap();
    let nothing: Option<Svc<i32>> = container
        .value_of(&Ctx::new(), Consumer::value().optional(true))
        .unwrap();
    assert!(nothing.is_none());
}

#[test]
fn interfaces_resolve_to_aliased_components() {
    let module = Module::builder()
        .provide(
            Provider::value(ConsoleLogger)
                .name("console")
                .alias::<dyn Logger>(),
        )
        .provide(Provider::value(FileLogger).alias::<dyn Logger>())
        .build();
    let container = Container::new(module).unwrap();

    let loggers: Vec<Svc<dyn Logger>> = container.get().unwrap();
    let prefixes: Vec<_> = loggers.iter().map(|logger| logger.prefix()).collect();
    assert_eq!(vec!["console", "file"], prefixes);

    let console: Svc<dyn Logger> = container
        .value_of(&Ctx::new(), Consumer::value().by_name("console"))
        .unwrap();
    assert_eq!("console", console.prefix());

    let error = expect_error(container.get::<Svc<dyn Logger>>());
    assert!(matches!(error, InjectError::UncertainDependency { .. }));

    let file: Svc<FileLogger> = container.get().unwrap();
    assert_eq!("file", file.prefix());
}

#[test]
fn structs_are_built_from_fields() {
    let plugin = Symbol::new("plugin");
    let module = Module::builder()
        .provide(Provider::value(8080_u16))
        .provide(Provider::value("localhost".to_owned()).name("host"))
        .provide(Provider::value("unused".to_owned()))
        .provide(Provider::value(1_u8).tag(plugin.clone()))
        .provide(Provider::value(2_u8))
        .provide(
            Provider::structure::<Handler>()
                .field("host", DependencyBuilder::new().by_name("host"))
                .field("plugins", DependencyBuilder::new().by_tag(plugin)),
        )
        .build();
    let container = Container::new(module).unwrap();

    let handler: Svc<Handler> = container.get().unwrap();
    assert_eq!(8080, *handler.port);
    assert_eq!(Some("localhost"), handler.host.as_deref().map(String::as_str));
    assert_eq!(vec![1], handler.plugins.iter().map(|p| **p).collect::<Vec<_>>());

    let bare = container
        .struct_of(
            &Ctx::new(),
            Consumer::structure::<Handler>()
                .ignore_fields(|name| name == "host" || name == "plugins"),
        )
        .unwrap();
    assert_eq!(8080, *bare.port);
    assert!(bare.host.is_none());
    assert!(bare.plugins.is_empty());
}

#[test]
fn components_are_memoised_per_frame() {
    let module = Module::builder()
        .provide(Provider::value(Counter::default()))
        .provide(Provider::func(make_id))
        .provide(Provider::func(make_pair))
        .build();
    let container = Container::new(module).unwrap();
    let counter: Svc<Counter> = container.get().unwrap();

    let ctx = Ctx::new();
    let pair: Svc<Pair> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert!(Svc::ptr_eq(&pair.0, &pair.1));
    assert_eq!(1, counter.count());

    let id: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert!(Svc::ptr_eq(&pair.0, &id));
    assert_eq!(1, counter.count());

    let other: Svc<Id> = container.value_of(&Ctx::new(), Consumer::value()).unwrap();
    assert_eq!(1, other.0);
    assert_eq!(2, counter.count());
}

#[test]
fn leaving_a_scope_discards_its_values() {
    let request = Scope::new("request");
    let module = Module::builder()
        .provide(Provider::value(Counter::default()))
        .provide(Provider::func(make_id).in_scope(request.clone()))
        .build();
    let container = Container::new(module).unwrap();
    let root = Ctx::new();

    let ctx = container.enter_scope(&root, &request).unwrap();
    let first: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
    let again: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert!(Svc::ptr_eq(&first, &again));

    let root = container.leave_scope(&ctx, &request).unwrap();
    let ctx = container.enter_scope(&root, &request).unwrap();
    let second: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(0, first.0);
    assert_eq!(1, second.0);
}

#[test]
fn cancelled_contexts_stop_resolving() {
    let module = Module::builder().provide(Provider::value(1_u8)).build();
    let container = Container::new(module).unwrap();
    let token = CancelToken::new();
    let ctx = Ctx::new().with_cancel(token.clone());

    let one: Svc<u8> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(1, *one);

    token.cancel();
    let error = expect_error(container.value_of(&ctx, Consumer::value::<Svc<u8>>()));
    assert!(matches!(error, InjectError::Cancelled));
}

#[test]
fn failures_are_not_memoised() {
    let module = Module::builder()
        .provide(Provider::value(Counter::default()))
        .provide(Provider::fallible(
            |attempts: Svc<Counter>| -> Result<u32, std::io::Error> {
                if attempts.next() == 0 {
                    Err(std::io::Error::new(std::io::ErrorKind::Other, "not yet"))
                } else {
                    Ok(7)
                }
            },
        ))
        .build();
    let container = Container::new(module).unwrap();
    let ctx = Ctx::new();

    let error = expect_error(container.value_of(&ctx, Consumer::value::<Svc<u32>>()));
    assert!(matches!(error, InjectError::ProviderFailed { .. }));
    assert!(matches!(error.root_cause(), InjectError::FunctionFailed { .. }));
    assert!(std::error::Error::source(&error).is_some());

    let seven: Svc<u32> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(7, *seven);
}

#[test]
fn panics_are_reported() {
    let module = Module::builder()
        .provide(Provider::func(|| -> u8 { panic!("boom") }))
        .build();
    let container = Container::new(module).unwrap();

    let error = expect_error(container.get::<Svc<u8>>());
    match error.root_cause() {
        InjectError::FunctionPanicked { message, .. } => assert_eq!("boom", message),
        error => panic!("unexpected error: {}", error),
    }
}

#[test]
fn multiple_outputs_become_components() {
    let module = Module::builder()
        .provide(
            Provider::multi(|| (1_u8, "two".to_owned()))
                .output(1, ComponentBuilder::new().name("second")),
        )
        .build();
    let container = Container::new(module).unwrap();

    let first: Svc<u8> = container.get().unwrap();
    let second: Svc<String> = container
        .value_of(&Ctx::new(), Consumer::value().by_name("second"))
        .unwrap();
    assert_eq!(1, *first);
    assert_eq!("two", second.as_str());
}

#[test]
fn func_of_returns_every_output() {
    let module = Module::builder()
        .provide(Provider::value(3_u32))
        .provide(Provider::value(4_u32).name("other").hide())
        .build();
    let container = Container::new(module).unwrap();

    let outputs = container
        .func_of(
            &Ctx::new(),
            Consumer::func(|a: Svc<u32>, b: Svc<u32>| *a * *b)
                .param(1, DependencyBuilder::new().by_name("other")),
        )
        .unwrap();
    assert_eq!(1, outputs.len());
    assert_eq!(12, *outputs[0].downcast::<u32>().unwrap());
}

fn needs_port(port: Svc<u16>) -> u32 {
    u32::from(*port)
}

#[test]
fn missing_dependencies_name_their_consumer() {
    let container = Container::new(Module::builder().build()).unwrap();

    let expected_line = line!() + 1;
    let error = expect_error(container.invoke(needs_port));
    match &error {
        InjectError::MissingDependency { dependency, location } => {
            assert!(dependency.contains("needs_port"));
            assert_eq!(expected_line, location.line());
            assert!(location.file().ends_with("tests.rs"));
        }
        error => panic!("unexpected error: {}", error),
    }
    assert!(error.to_string().contains("parameter 0 of func"));
}

#[test]
fn invalid_modules_are_rejected() {
    let module = Module::builder()
        .provide(
            Provider::func(|number: Svc<u8>| u16::from(*number))
                .param(3, DependencyBuilder::new()),
        )
        .provide(Provider::value(1_u8).name("same"))
        .provide(Provider::value(2_u8).name("same"))
        .build();

    let errors = match expect_error(Container::new(module)) {
        InjectError::Validation(errors) => errors,
        error => panic!("unexpected error: {}", error),
    };
    let problems: Vec<_> = errors.issues().map(|issue| issue.problem()).collect();
    assert_eq!(2, problems.len());
    assert!(matches!(problems[0], Problem::FakeParam { index: 3, arity: 1 }));
    assert!(matches!(problems[1], Problem::DuplicateComponent { .. }));
    assert_eq!(1, errors.groups().count());
}

#[test]
fn invalid_consumers_are_rejected() {
    let container = Container::new(Module::builder().build()).unwrap();
    let error = expect_error(container.func_of(
        &Ctx::new(),
        Consumer::func(|| 0_u8).param(0, DependencyBuilder::new()),
    ));
    assert!(matches!(error, InjectError::Validation(_)));
}

#[test]
fn criteria_and_scopes_can_be_loaded() {
    let request = Scope::new("request");
    let module = Module::builder()
        .provide(Provider::value(1_u8).name("a"))
        .provide(Provider::value("s".to_owned()))
        .provide(Provider::value(2_u8).in_scope(request.clone()))
        .build();
    let container = Container::new(module).unwrap();
    let ctx = Ctx::new();

    let values = container
        .load_criteria(
            &ctx,
            [
                Criteria::of(Type::of::<u8>()).named("a"),
                Criteria::of(Type::of::<String>()),
            ],
        )
        .unwrap();
    assert_eq!(2, values.len());
    assert_eq!(1, *values[0].downcast::<u8>().unwrap());
    assert_eq!("s", values[1].downcast::<String>().unwrap().as_str());

    assert_eq!(2, container.load_all(&ctx, None).unwrap().len());

    let scoped = ctx.enter_scope(&request).unwrap();
    let values = container.load_all(&scoped, None).unwrap();
    assert_eq!(1, values.len());
    assert_eq!(2, *values[0].downcast::<u8>().unwrap());

    let error = expect_error(container.load_all(&ctx, Some(&request)));
    assert!(matches!(error, InjectError::ScopeNotActive { .. }));
}

#[test]
fn modules_can_be_declared() {
    let request = Scope::new("request");
    let base = define_module! {
        providers = [Provider::value(8080_u16)],
    };
    let module = define_module! {
        modules = [base],
        providers = [Provider::func(|port: Svc<u16>| u32::from(*port) + 1)],
        scoped = {
            request.clone() => [Provider::func(|port: Svc<u32>| u64::from(*port))],
        },
    };

    let mut builder = Container::builder();
    builder.add_module(module);
    let container = builder.build().unwrap();

    let ctx = container.enter_scope(&Ctx::new(), &request).unwrap();
    let port: Svc<u64> = container.value_of(&ctx, Consumer::value()).unwrap();
    assert_eq!(8081, *port);
}

#[test]
fn rebuilt_modules_keep_their_components() {
    let module = Module::builder()
        .provide(Provider::value(1_u8).name("one"))
        .provide(Provider::value(2_u8).ignore())
        .build();
    let copy = module.to_builder().build();

    let describe = |module: &Module| -> Vec<(Type, Option<String>, bool)> {
        module
            .all_components()
            .iter()
            .map(|c| (c.ty(), c.name().map(ToOwned::to_owned), c.is_ignored()))
            .collect()
    };
    assert_eq!(describe(&module), describe(&copy));

    let original = Container::new(module).unwrap();
    let rebuilt = Container::new(copy).unwrap();
    assert_eq!(
        original.repository().all_components().len(),
        rebuilt.repository().all_components().len()
    );
}

#[cfg(feature = "arc")]
#[test]
fn containers_can_be_shared_between_threads() {
    let module = Module::builder()
        .provide(Provider::value(Counter::default()))
        .provide(Provider::func(make_id))
        .build();
    let container = Container::new(module).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            std::thread::spawn(move || {
                let ctx = Ctx::new();
                let first: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
                let second: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
                Svc::ptr_eq(&first, &second)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    let counter: Svc<Counter> = container.get().unwrap();
    assert_eq!(4, counter.count());
}

#[cfg(feature = "arc")]
fn slow_id(counter: Svc<Counter>) -> Id {
    std::thread::sleep(std::time::Duration::from_millis(50));
    Id(counter.next())
}

#[cfg(feature = "arc")]
#[test]
fn shared_contexts_run_each_provider_once() {
    init_logging();
    let module = Module::builder()
        .provide(Provider::value(Counter::default()))
        .provide(Provider::func(slow_id))
        .build();
    let container = Container::new(module).unwrap();
    let ctx = Ctx::new();
    let barrier = Svc::new(std::sync::Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            let ctx = ctx.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                let id: Svc<Id> = container.value_of(&ctx, Consumer::value()).unwrap();
                id
            })
        })
        .collect();
    let ids: Vec<Svc<Id>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let counter: Svc<Counter> = container.get().unwrap();
    assert_eq!(1, counter.count());
    assert!(ids.iter().all(|id| Svc::ptr_eq(id, &ids[0])));
}
