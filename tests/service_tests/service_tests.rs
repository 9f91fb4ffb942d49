//! Tests for the Request Service
//!
//! These tests verify:
//! - Permission checks for every request kind
//! - Response messages for accepted and rejected requests
//! - Concurrent readers and writers see a consistent directory

use std::sync::{Arc, Barrier};
use std::thread;

use phonebook::config::{Config, LogSyncStrategy};
use phonebook::protocol::{Message, MessageKind};
use phonebook::service::INVALID_REQUEST;
use phonebook::{Operation, Permissions, PhonebookService};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn create_test_service() -> (TempDir, PhonebookService) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .entry_log_path(temp_dir.path().join("phonebook.txt"))
        .credential_log_path(temp_dir.path().join("credentials.txt"))
        .log_sync(LogSyncStrategy::OsBuffered)
        .build();
    let service = PhonebookService::bootstrap(&config).unwrap();

    {
        let mut directory = service.write();
        directory.add_credential("reader", "1111", Permissions::READ).unwrap();
        directory.add_credential("writer", "2222", Permissions::WRITE).unwrap();
    }

    (temp_dir, service)
}

fn add(service: &PhonebookService, client: &str, name: &str, number: &str) -> Message {
    service.handle(&Message::request(Operation::AddContact, name, number, client))
}

fn get(service: &PhonebookService, client: &str, name: &str) -> Message {
    service.handle(&Message::request(Operation::GetContact, name, "", client))
}

fn remove(service: &PhonebookService, client: &str, name: &str) -> Message {
    service.handle(&Message::request(Operation::RemoveContact, name, "", client))
}

fn login(service: &PhonebookService, username: &str, password: &str) -> Message {
    service.handle(&Message::request(Operation::Login, username, password, "user"))
}

fn assert_rejected(response: &Message, reason: &str) {
    assert_eq!(response.kind, MessageKind::Rejected);
    assert_eq!(response.name, reason);
}

// =============================================================================
// Request Tests
// =============================================================================

#[test]
fn test_admin_add_get_remove() {
    let (_temp_dir, service) = create_test_service();

    let response = add(&service, "admin", "Anna", "123");
    assert_eq!(response.kind, MessageKind::Accepted);
    assert_eq!(response.name, "Added contact");

    let response = get(&service, "admin", "Anna");
    assert!(response.is_accepted());
    assert_eq!(response.name, "Anna");
    assert_eq!(response.number, "123");

    assert_rejected(&add(&service, "admin", "Anna", "456"), "Add contact failed");

    let response = remove(&service, "admin", "Anna");
    assert!(response.is_accepted());
    assert_eq!(response.name, "Contact removed");

    assert_rejected(&get(&service, "admin", "Anna"), "Contact not found");
    assert_rejected(&remove(&service, "admin", "Anna"), "Contact not found");
}

#[test]
fn test_read_only_user() {
    let (_temp_dir, service) = create_test_service();
    add(&service, "admin", "Anna", "123");

    assert!(get(&service, "reader", "Anna").is_accepted());
    assert_rejected(&add(&service, "reader", "Bruno", "456"), "You don't have permission");
    assert_rejected(&remove(&service, "reader", "Anna"), "You don't have permission");

    // Nothing changed
    assert_eq!(service.read().entry_count(), 1);
}

#[test]
fn test_write_only_user() {
    let (_temp_dir, service) = create_test_service();

    assert!(add(&service, "writer", "Anna", "123").is_accepted());
    assert_rejected(&get(&service, "writer", "Anna"), "You don't have permission");
    assert!(remove(&service, "writer", "Anna").is_accepted());
}

#[test]
fn test_anonymous_user_is_denied() {
    let (_temp_dir, service) = create_test_service();
    add(&service, "admin", "Anna", "123");

    assert_rejected(&get(&service, "user", "Anna"), "You don't have permission");
    assert_rejected(&add(&service, "user", "Bruno", "1"), "You don't have permission");
    assert_rejected(&get(&service, "", "Anna"), "You don't have permission");
}

#[test]
fn test_permission_checked_before_existence() {
    let (_temp_dir, service) = create_test_service();

    // An unknown name still reports the permission failure first
    assert_rejected(&remove(&service, "reader", "Nobody"), "You don't have permission");
    assert_rejected(&get(&service, "writer", "Nobody"), "You don't have permission");
}

#[test]
fn test_invalid_fields_are_rejected() {
    let (_temp_dir, service) = create_test_service();

    assert_rejected(&add(&service, "admin", "Anna", "12ab"), "Invalid name or number");
    assert_rejected(&add(&service, "admin", "An;na", "123"), "Invalid name or number");
    assert_rejected(&add(&service, "admin", "", "123"), "Invalid name or number");
    assert_eq!(service.read().entry_count(), 0);
}

#[test]
fn test_login() {
    let (_temp_dir, service) = create_test_service();

    let response = login(&service, "admin", "0000");
    assert!(response.is_accepted());
    assert_eq!(response.name, "Logged in");

    assert!(login(&service, "reader", "1111").is_accepted());
    assert_rejected(&login(&service, "admin", "1234"), "Wrong password");
    assert_rejected(&login(&service, "ghost", "0000"), "Username unrecognized");
}

#[test]
fn test_invalid_request_kind() {
    let (_temp_dir, service) = create_test_service();

    for kind in [MessageKind::Unknown(9), MessageKind::Accepted, MessageKind::Rejected] {
        let request = Message {
            kind,
            name: "Anna".to_string(),
            number: "123".to_string(),
            client_name: "admin".to_string(),
        };
        assert_rejected(&service.handle(&request), INVALID_REQUEST);
    }

    // Rejected before the permission check
    let request = Message {
        kind: MessageKind::Unknown(7),
        name: String::new(),
        number: String::new(),
        client_name: "user".to_string(),
    };
    assert_rejected(&service.handle(&request), INVALID_REQUEST);
}

#[test]
fn test_execute_returns_errors() {
    let (_temp_dir, service) = create_test_service();

    let request = Message::request(Operation::GetContact, "Anna", "", "admin");
    assert!(matches!(
        service.execute(Operation::GetContact, &request),
        Err(phonebook::PhonebookError::NotFound)
    ));

    let request = Message::request(Operation::AddContact, "Anna", "1", "reader");
    assert!(matches!(
        service.execute(Operation::AddContact, &request),
        Err(phonebook::PhonebookError::PermissionDenied)
    ));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    const READERS: usize = 3;
    const ROUNDS: usize = 200;

    let (_temp_dir, service) = create_test_service();
    let service = Arc::new(service);
    for i in 0..10 {
        add(&service, "admin", &format!("seed{}", i), "1");
    }

    let barrier = Arc::new(Barrier::new(READERS + 1));
    let mut handles = Vec::new();

    {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..ROUNDS {
                let name = format!("contact{}", i);
                assert!(add(&service, "writer", &name, "42").is_accepted());
                if i % 2 == 0 {
                    assert!(remove(&service, "writer", &name).is_accepted());
                }
            }
        }));
    }

    for _ in 0..READERS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..ROUNDS {
                assert!(get(&service, "reader", &format!("seed{}", i % 10)).is_accepted());

                // The index never shows a half-applied mutation
                let directory = service.read();
                assert_eq!(directory.entry_count(), directory.entries().len());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let directory = service.read();
    assert_eq!(directory.entry_count(), 10 + ROUNDS / 2);
    for i in (1..ROUNDS).step_by(2) {
        assert_eq!(directory.get_entry(&format!("contact{}", i)).unwrap().number, "42");
    }
}

#[test]
fn test_concurrent_writers_add_distinct_names() {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 50;

    let (_temp_dir, service) = create_test_service();
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_WRITER {
                    let name = format!("w{}-{}", w, i);
                    assert!(add(&service, "admin", &name, "7").is_accepted());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let directory = service.read();
    assert_eq!(directory.entry_count(), WRITERS * PER_WRITER);

    // Every record landed at a distinct offset
    let mut offsets: Vec<u64> = directory.entries().iter().map(|e| e.offset).collect();
    offsets.sort();
    offsets.dedup();
    assert_eq!(offsets.len(), WRITERS * PER_WRITER);
}

#[test]
fn test_concurrent_duplicate_adds_accept_exactly_one() {
    const WRITERS: usize = 6;

    let (_temp_dir, service) = create_test_service();
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                add(&service, "admin", "Anna", "123").is_accepted()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|accepted| *accepted)
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(service.read().entry_count(), 1);
}
