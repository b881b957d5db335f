//! Integration tests for replacing an installed service

use service_container::{EventKind, ServiceContainer, ServiceName, State};
use service_txn::Transaction;

mod common;
use common::*;

async fn install_chain(container: &ServiceContainer, journal: &Journal) {
    let txn = Transaction::new();
    let target = container.target();
    target
        .add_service(&txn, "db", RecordingService::new(journal))
        .build()
        .unwrap();
    target
        .add_service(&txn, "web", RecordingService::new(journal))
        .add_dependency("db")
        .unwrap()
        .build()
        .unwrap();
    run_and_commit(&txn).await;
    journal.clear();
}

#[smol_potat::test]
async fn test_replacement_restarts_dependents_in_order() {
    init_tracing();
    let container = ServiceContainer::default();
    let journal = Journal::default();
    install_chain(&container, &journal).await;
    let old = container.controller(&name("db")).unwrap();
    let events = container.subscribe();

    let txn = Transaction::new();
    let install = container
        .target()
        .replace_service(&txn, "db", RecordingService::new(&journal))
        .build()
        .unwrap();
    run_and_commit(&txn).await;

    let new = install.result().flatten().expect("Replacement was not installed");
    assert_ne!(new.id(), old.id());
    assert_eq!(old.state(), State::Removed);
    assert_eq!(new.state(), State::Up);
    assert_eq!(container.controller(&name("db")).unwrap().id(), new.id());
    assert_eq!(container.state_of(&name("web")), Some(State::Up));
    assert_eq!(new.counters().running_dependents, 1);
    assert_eq!(new.counters().up_demanded_by, 1);

    assert_eq!(
        journal.entries(),
        vec!["stop web", "stop db", "start db", "start web"]
    );

    let db = name("db");
    let web = name("web");
    let observed: Vec<(ServiceName, EventKind)> = drain(&events)
        .into_iter()
        .map(|event| (event.service, event.kind))
        .collect();
    assert_eq!(
        observed,
        vec![
            (
                web.clone(),
                EventKind::ReplacementStarted {
                    dependency: db.clone()
                }
            ),
            (
                web.clone(),
                EventKind::StateChanged {
                    from: State::Up,
                    to: State::Down
                }
            ),
            (
                db.clone(),
                EventKind::StateChanged {
                    from: State::Up,
                    to: State::Down
                }
            ),
            (
                db.clone(),
                EventKind::StateChanged {
                    from: State::Down,
                    to: State::Removed
                }
            ),
            (db.clone(), EventKind::Removed),
            (db.clone(), EventKind::Installed),
            (
                web.clone(),
                EventKind::ReplacementConcluded {
                    dependency: db.clone()
                }
            ),
            (
                db.clone(),
                EventKind::StateChanged {
                    from: State::Down,
                    to: State::Up
                }
            ),
            (
                web,
                EventKind::StateChanged {
                    from: State::Down,
                    to: State::Up
                }
            ),
        ]
    );
}

#[smol_potat::test]
async fn test_replacing_an_absent_service_installs_it() {
    init_tracing();
    let container = ServiceContainer::default();
    let journal = Journal::default();

    let txn = Transaction::new();
    container
        .target()
        .replace_service(&txn, "db", RecordingService::new(&journal))
        .build()
        .unwrap();
    run_and_commit(&txn).await;

    assert_eq!(container.state_of(&name("db")), Some(State::Up));
    assert_eq!(journal.entries(), vec!["start db"]);
}

#[smol_potat::test]
async fn test_replacement_rolled_back_restores_original() {
    init_tracing();
    let container = ServiceContainer::default();
    let journal = Journal::default();
    install_chain(&container, &journal).await;
    let old = container.controller(&name("db")).unwrap();
    let web = container.controller(&name("web")).unwrap();

    let txn = Transaction::new();
    container
        .target()
        .replace_service(&txn, "db", RecordingService::new(&journal))
        .build()
        .unwrap();
    txn.prepare().await.unwrap();
    txn.rollback().unwrap();

    assert_eq!(container.controller(&name("db")).unwrap().id(), old.id());
    assert_eq!(old.state(), State::Up);
    assert_eq!(old.counters().running_dependents, 1);
    assert_eq!(old.counters().up_demanded_by, 1);
    assert_eq!(web.state(), State::Up);
    assert_eq!(web.counters().unsatisfied_dependencies, 0);

    let registration = container.registration(&name("db")).unwrap();
    assert_eq!(registration.incoming().len(), 1);
}
