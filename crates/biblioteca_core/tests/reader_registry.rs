use biblioteca_core::db::open_db_in_memory;
use biblioteca_core::{
    AuthContext, NewReader, PageRequest, Reader, ReaderChanges, ReaderRepository,
    ReaderService, RepoError, ServiceError, SqliteReaderRepository, ValidationError,
};

fn librarian() -> AuthContext {
    AuthContext::user("librarian")
}

fn new_reader(name: &str, email: &str) -> NewReader {
    NewReader {
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[test]
fn duplicate_email_fails_with_unique_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteReaderRepository::try_new(&conn).unwrap();

    repo.create_reader(&Reader::new("Ana", "ana@example.org"))
        .unwrap();
    let err = repo
        .create_reader(&Reader::new("Another Ana", "ana@example.org"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::UniqueConstraintViolation { field: "email", ref value } if value == "ana@example.org"
    ));
}

#[test]
fn email_uniqueness_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let service = ReaderService::new(SqliteReaderRepository::try_new(&conn).unwrap());
    let auth = librarian();

    service
        .create_reader(&auth, new_reader("Ana", "ana@example.org"))
        .unwrap();
    let err = service
        .create_reader(&auth, new_reader("Ana Two", "ANA@Example.org"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail(email) if email == "ANA@Example.org"));

    let listed = service
        .list_readers(&auth, None, PageRequest::default())
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[test]
fn update_to_taken_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = ReaderService::new(SqliteReaderRepository::try_new(&conn).unwrap());
    let auth = librarian();
    service
        .create_reader(&auth, new_reader("Ana", "ana@example.org"))
        .unwrap();
    let bruno = service
        .create_reader(&auth, new_reader("Bruno", "bruno@example.org"))
        .unwrap();

    let err = service
        .update_reader(
            &auth,
            bruno.id,
            ReaderChanges {
                email: Some("ana@example.org".to_string()),
                ..ReaderChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail(_)));

    let unchanged = service.get_reader(&auth, bruno.id).unwrap();
    assert_eq!(unchanged.email, "bruno@example.org");

    let renamed = service
        .update_reader(
            &auth,
            bruno.id,
            ReaderChanges {
                name: Some(" Bruno Silva ".to_string()),
                ..ReaderChanges::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Bruno Silva");
}

#[test]
fn invalid_email_is_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = ReaderService::new(SqliteReaderRepository::try_new(&conn).unwrap());

    let err = service
        .create_reader(&librarian(), new_reader("Ana", "not-an-email"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidEmail(_))
    ));
}

#[test]
fn list_readers_searches_name_and_email() {
    let conn = open_db_in_memory().unwrap();
    let service = ReaderService::new(SqliteReaderRepository::try_new(&conn).unwrap());
    let auth = librarian();
    let ana = service
        .create_reader(&auth, new_reader("Ana", "ana@example.org"))
        .unwrap();
    let bruno = service
        .create_reader(&auth, new_reader("Bruno", "bruno@library.test"))
        .unwrap();

    let by_name = service
        .list_readers(&auth, Some("AN".to_string()), PageRequest::default())
        .unwrap();
    assert_eq!(by_name.items.len(), 1);
    assert_eq!(by_name.items[0].id, ana.id);

    let by_email = service
        .list_readers(&auth, Some("library.test".to_string()), PageRequest::default())
        .unwrap();
    assert_eq!(by_email.items.len(), 1);
    assert_eq!(by_email.items[0].id, bruno.id);

    let paged = service
        .list_readers(&auth, None, PageRequest::new(Some(1), 1))
        .unwrap();
    assert_eq!(paged.applied_limit, 1);
    assert_eq!(paged.total, 2);
    assert_eq!(paged.items[0].id, bruno.id);
}

#[test]
fn get_and_delete_missing_reader_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ReaderService::new(SqliteReaderRepository::try_new(&conn).unwrap());
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        service.get_reader(&librarian(), missing),
        Err(ServiceError::ReaderNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.delete_reader(&librarian(), missing),
        Err(ServiceError::ReaderNotFound(_))
    ));
}
