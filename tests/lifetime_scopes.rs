use arbor::{
    ComponentRegistration, Config, ContainerBuilder, Disposable, Factory, Inject, Lifetime, LifetimeScope, RegistrationBuilder,
    ResolveErrorKind, ResolveObserver, ScopeId, Service, Tag,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_test::traced_test;

#[derive(Default)]
struct Journal(Mutex<Vec<&'static str>>);

impl Journal {
    fn record(&self, entry: &'static str) {
        self.0.lock().push(entry);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

struct Session;

struct Connection {
    journal: Arc<Journal>,
}

impl Disposable for Connection {
    fn dispose(&self) {
        self.journal.record("connection");
    }
}

struct Transaction {
    journal: Arc<Journal>,
    #[allow(dead_code)]
    connection: Arc<Connection>,
}

impl Disposable for Transaction {
    fn dispose(&self) {
        self.journal.record("transaction");
    }
}

fn journal() -> RegistrationBuilder<Journal> {
    RegistrationBuilder::new().instance(Journal::default())
}

fn connection() -> RegistrationBuilder<Connection> {
    RegistrationBuilder::new()
        .constructor(|Inject(journal): Inject<Journal>| Ok(Connection { journal }))
        .instance_per_lifetime_scope()
        .disposable()
}

fn transaction() -> RegistrationBuilder<Transaction> {
    RegistrationBuilder::new()
        .constructor(|Inject(journal): Inject<Journal>, Inject(connection): Inject<Connection>| Ok(Transaction { journal, connection }))
        .instance_per_lifetime_scope()
        .disposable()
}

#[test]
#[traced_test]
fn test_instance_per_lifetime_scope() {
    let container = ContainerBuilder::new()
        .provide(RegistrationBuilder::new().constructor(|| Ok(Session)).instance_per_lifetime_scope())
        .build();
    let first = container.begin_lifetime_scope().unwrap();
    let second = container.begin_lifetime_scope().unwrap();

    let a = first.resolve::<Session>().unwrap();
    let b = first.resolve::<Session>().unwrap();
    let c = second.resolve::<Session>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
#[traced_test]
fn test_single_instance_shared_by_all_scopes() {
    let container = ContainerBuilder::new()
        .provide(RegistrationBuilder::new().constructor(|| Ok(Session)).single_instance())
        .build();
    let child = container.begin_lifetime_scope().unwrap();
    let grandchild = child.begin_lifetime_scope().unwrap();

    let from_grandchild = grandchild.resolve::<Session>().unwrap();
    let from_root = container.resolve::<Session>().unwrap();
    assert!(Arc::ptr_eq(&from_grandchild, &from_root));
}

#[test]
#[traced_test]
fn test_matching_lifetime_scope() {
    let container = ContainerBuilder::new()
        .provide(
            RegistrationBuilder::new()
                .constructor(|| Ok(Session))
                .instance_per_matching_lifetime_scope(["request"]),
        )
        .build();

    let err = container.resolve::<Session>().err().unwrap();
    assert!(matches!(err, ResolveErrorKind::LifetimeScopeNotFound { .. }));
    assert!(err.to_string().contains("request"));

    let request = container.begin_lifetime_scope_with_tag("request").unwrap();
    let action = request.begin_lifetime_scope_with_tag("action").unwrap();
    let from_action = action.resolve::<Session>().unwrap();
    let from_request = request.resolve::<Session>().unwrap();
    assert!(Arc::ptr_eq(&from_action, &from_request));

    let other_request = container.begin_lifetime_scope_with_tag(Tag::new("request")).unwrap();
    assert!(!Arc::ptr_eq(&from_request, &other_request.resolve::<Session>().unwrap()));
}

#[test]
#[traced_test]
fn test_disposal_in_reverse_creation_order() {
    let container = ContainerBuilder::new()
        .provide(journal())
        .provide(connection())
        .provide(transaction())
        .build();
    let journal = container.resolve::<Journal>().unwrap();

    let scope = container.begin_lifetime_scope().unwrap();
    scope.resolve::<Transaction>().unwrap();
    scope.resolve::<Transaction>().unwrap();
    assert!(journal.entries().is_empty());

    scope.dispose();
    assert_eq!(journal.entries(), vec!["transaction", "connection"]);

    scope.dispose();
    drop(scope);
    assert_eq!(journal.entries(), vec!["transaction", "connection"]);
}

#[test]
#[traced_test]
fn test_dropping_last_handle_disposes() {
    let container = ContainerBuilder::new().provide(journal()).provide(connection()).build();
    let journal = container.resolve::<Journal>().unwrap();

    {
        let scope = container.begin_lifetime_scope().unwrap();
        scope.resolve::<Connection>().unwrap();
    }

    assert_eq!(journal.entries(), vec!["connection"]);
}

#[test]
#[traced_test]
fn test_shared_dependency_disposed_once() {
    struct Logger {
        journal: Arc<Journal>,
    }

    impl Disposable for Logger {
        fn dispose(&self) {
            self.journal.record("logger");
        }
    }

    struct Worker {
        logger: Arc<Logger>,
    }

    let container = ContainerBuilder::new()
        .provide(journal())
        .provide(
            RegistrationBuilder::new()
                .constructor(|Inject(journal): Inject<Journal>| Ok(Logger { journal }))
                .single_instance()
                .disposable(),
        )
        .provide(RegistrationBuilder::new().constructor(|Inject(logger): Inject<Logger>| Ok(Worker { logger })))
        .build();
    let journal = container.resolve::<Journal>().unwrap();

    let first = container.resolve::<Worker>().unwrap();
    let second = container.resolve::<Worker>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.logger, &second.logger));

    container.dispose();
    container.dispose();
    assert_eq!(journal.entries(), vec!["logger"]);
}

#[test]
#[traced_test]
fn test_child_then_parent_disposal_disposes_once() {
    let container = ContainerBuilder::new()
        .provide(journal())
        .provide(connection().instance_per_dependency())
        .build();
    let journal = container.resolve::<Journal>().unwrap();

    let child = container.begin_lifetime_scope().unwrap();
    child.resolve::<Connection>().unwrap();
    child.dispose();
    assert_eq!(journal.entries(), vec!["connection"]);

    container.dispose();
    drop(child);
    assert_eq!(journal.entries(), vec!["connection"]);
}

#[test]
#[traced_test]
fn test_disposed_owning_scope_creates_nothing() {
    let journal = Arc::new(Journal::default());
    let container = ContainerBuilder::new()
        .provide(
            RegistrationBuilder::new()
                .constructor({
                    let journal = journal.clone();
                    move || {
                        journal.record("opened");
                        Ok(Connection { journal: journal.clone() })
                    }
                })
                .with_config(Config {
                    lifetime: Lifetime::RootScope,
                    ..Config::default()
                })
                .disposable(),
        )
        .build();
    let child = container.begin_lifetime_scope().unwrap();
    container.dispose();

    assert!(matches!(child.resolve::<Connection>(), Err(ResolveErrorKind::ScopeDisposed)));
    assert!(journal.entries().is_empty());
}

#[test]
#[traced_test]
fn test_externally_owned_not_finalized() {
    let container = ContainerBuilder::new()
        .provide(journal())
        .provide(connection().externally_owned())
        .build();
    let journal = container.resolve::<Journal>().unwrap();

    let scope = container.begin_lifetime_scope().unwrap();
    scope.resolve::<Connection>().unwrap();
    scope.dispose();

    assert!(journal.entries().is_empty());
}

#[test]
#[traced_test]
fn test_disposed_scope() {
    let container = ContainerBuilder::new().provide(journal()).provide(connection()).build();
    let scope = container.begin_lifetime_scope().unwrap();
    let child = scope.begin_lifetime_scope().unwrap();
    scope.dispose();

    assert!(scope.is_disposed());
    assert!(!child.is_disposed());
    assert!(matches!(scope.resolve::<Connection>(), Err(ResolveErrorKind::ScopeDisposed)));
    assert!(scope.begin_lifetime_scope().is_err());
    assert!(child.resolve::<Connection>().is_ok());
}

#[test]
#[traced_test]
fn test_child_registrations_override_parent() {
    struct Greeting(&'static str);

    let container = ContainerBuilder::new()
        .provide(RegistrationBuilder::new().constructor(|| Ok(Greeting("hello from root"))))
        .build();
    let child = container
        .enter()
        .with_tag("tenant")
        .with_registrations(|builder| builder.provide(RegistrationBuilder::new().constructor(|| Ok(Greeting("hello from tenant")))))
        .build()
        .unwrap();

    assert_eq!(child.tag(), Some(&Tag::from("tenant")));
    assert_eq!(child.resolve::<Greeting>().unwrap().0, "hello from tenant");
    assert_eq!(container.resolve::<Greeting>().unwrap().0, "hello from root");
    assert_eq!(
        child.registry().registrations_for(&Service::of::<Greeting>()).len(),
        2
    );
}

#[test]
#[traced_test]
fn test_scope_injection() {
    struct UnitOfWork {
        scope: LifetimeScope,
    }

    let container = ContainerBuilder::new()
        .provide(
            RegistrationBuilder::new()
                .constructor(|Inject(scope): Inject<LifetimeScope>| Ok(UnitOfWork { scope: (*scope).clone() }))
                .instance_per_lifetime_scope(),
        )
        .build();
    let child = container.begin_lifetime_scope().unwrap();

    let unit = child.resolve::<UnitOfWork>().unwrap();
    assert_eq!(unit.scope.id(), child.id());
    assert_eq!(unit.scope.parent().map(LifetimeScope::id), Some(container.root().id()));
}

#[test]
#[traced_test]
fn test_scope_held_by_its_own_instance_disposed_on_drop() {
    struct UnitOfWork {
        scope: LifetimeScope,
        #[allow(dead_code)]
        connection: Arc<Connection>,
    }

    let container = ContainerBuilder::new()
        .provide(journal())
        .provide(connection())
        .provide(
            RegistrationBuilder::new()
                .constructor(|Inject(scope): Inject<LifetimeScope>, Inject(connection): Inject<Connection>| {
                    Ok(UnitOfWork {
                        scope: (*scope).clone(),
                        connection,
                    })
                })
                .instance_per_lifetime_scope(),
        )
        .build();
    let journal = container.resolve::<Journal>().unwrap();

    let child = container.begin_lifetime_scope().unwrap();
    let unit = child.resolve::<UnitOfWork>().unwrap();
    drop(child);

    assert_eq!(journal.entries(), vec!["connection"]);
    assert!(unit.scope.is_disposed());
}

#[test]
#[traced_test]
fn test_factory_outliving_scope() {
    let container = ContainerBuilder::new()
        .provide(RegistrationBuilder::new().constructor(|| Ok(Session)).instance_per_lifetime_scope())
        .build();

    let scope = container.begin_lifetime_scope().unwrap();
    let factory = scope.resolve::<Factory<Session>>().unwrap();
    assert!(Arc::ptr_eq(&factory.call().unwrap(), &scope.resolve::<Session>().unwrap()));

    scope.dispose();
    assert!(matches!(factory.call(), Err(ResolveErrorKind::ScopeDisposed)));

    drop(scope);
    assert!(matches!(factory.call(), Err(ResolveErrorKind::ScopeDisposed)));
}

#[derive(Default)]
struct ScopeEvents(Mutex<Vec<String>>);

impl ResolveObserver for ScopeEvents {
    fn scope_beginning(&self, _scope: ScopeId, tag: Option<&Tag>) {
        self.0.lock().push(format!("begin {}", tag.map_or("-", Tag::as_str)));
    }

    fn scope_ending(&self, _scope: ScopeId, tag: Option<&Tag>) {
        self.0.lock().push(format!("end {}", tag.map_or("-", Tag::as_str)));
    }

    fn instance_lookup_beginning(&self, registration: &ComponentRegistration, _activation_scope: ScopeId) {
        self.0.lock().push(format!("lookup {}", registration.limit_type().short_name()));
    }
}

#[test]
#[traced_test]
fn test_observer_sees_scope_lifecycle() {
    let events = Arc::new(ScopeEvents::default());
    let container = ContainerBuilder::new()
        .provide(RegistrationBuilder::new().constructor(|| Ok(Session)))
        .observer(events.clone())
        .build();

    let request = container.begin_lifetime_scope_with_tag("request").unwrap();
    request.resolve::<Session>().unwrap();
    drop(request);
    container.dispose();

    assert_eq!(
        *events.0.lock(),
        vec!["begin root", "begin request", "lookup Session", "end request", "end root"]
    );
}
