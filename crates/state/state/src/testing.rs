use crate::error::StateError;
use crate::key::RoleId;
use crate::store::RoleStore;

/// Run the full role store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn RoleStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_set_overwrites(store).await?;
    test_empty_compiled_bytes(store).await?;
    test_list_all(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn RoleStore) -> Result<(), StateError> {
    let val = store.get(&RoleId::new("missing")).await?;
    assert!(val.is_none(), "get on missing role should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn RoleStore) -> Result<(), StateError> {
    let role = RoleId::new("set-get");
    store.set(&role, b"\x01\x02\x03", "allow any").await?;
    let val = store.get(&role).await?.expect("role should exist after set");
    assert_eq!(val.compiled, b"\x01\x02\x03");
    Ok(())
}

async fn test_set_overwrites(store: &dyn RoleStore) -> Result<(), StateError> {
    let role = RoleId::new("overwrite");
    store.set(&role, b"old", "deny any").await?;
    store.set(&role, b"new", "allow any").await?;
    let val = store.get(&role).await?.expect("role should exist after set");
    assert_eq!(val.compiled, b"new", "second set should replace the artifact");

    let sources = store.list_all().await?;
    let source = sources
        .iter()
        .find(|(id, _)| *id == role)
        .map(|(_, src)| src.as_str());
    assert_eq!(source, Some("allow any"), "second set should replace the source");
    Ok(())
}

async fn test_empty_compiled_bytes(store: &dyn RoleStore) -> Result<(), StateError> {
    let role = RoleId::new("empty-bytes");
    store.set(&role, b"", "").await?;
    let val = store.get(&role).await?.expect("role should exist after set");
    assert!(val.compiled.is_empty(), "empty artifact should round-trip");
    Ok(())
}

async fn test_list_all(store: &dyn RoleStore) -> Result<(), StateError> {
    let first = RoleId::new("list-a");
    let second = RoleId::new("list-b");
    store.set(&first, b"a", "allow group 'a'").await?;
    store.set(&second, b"b", "allow group 'b'").await?;

    let all = store.list_all().await?;
    assert!(
        all.iter()
            .any(|(id, src)| *id == first && src == "allow group 'a'"),
        "list_all should include every stored role"
    );
    assert!(
        all.iter()
            .any(|(id, src)| *id == second && src == "allow group 'b'"),
        "list_all should include every stored role"
    );
    Ok(())
}
