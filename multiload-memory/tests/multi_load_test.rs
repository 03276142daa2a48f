//! End-to-end tests for multi-identifier loading against the in-memory store.

use heapless::String as HeaplessString;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use multiload_api::LoadError;
use multiload_db::models::person::PersonModel;
use multiload_db::repository::find_by_id::FindById;
use multiload_db::repository::find_by_ids::FindByIds;
use multiload_db::repository::transactional::Transactional;
use multiload_db::{MultiLoad, UnitOfWork};
use multiload_memory::test_utils::create_test_person;
use multiload_memory::InMemoryStore;

fn seeded_store() -> (InMemoryStore<PersonModel>, Vec<Uuid>) {
    let store = InMemoryStore::new();
    let persons = vec![
        create_test_person("Jane", "Doe"),
        create_test_person("John", "Smith"),
        create_test_person("Erika", "Mustermann"),
    ];
    let ids = persons.iter().map(|p| p.id).collect();
    store.insert_all(persons);
    (store, ids)
}

#[tokio::test]
async fn test_find_each_id() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();

    store.begin_transaction().await?;
    for id in &ids {
        let person = store.find_by_id(*id).await?;
        assert_eq!(person.unwrap().id, *id);
    }
    store.commit().await?;

    // One round trip per identifier
    assert_eq!(store.fetch_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_find_by_ids_bulk() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();

    store.begin_transaction().await?;
    let persons = store.find_by_ids(&ids).await?;
    store.commit().await?;

    assert_eq!(persons.len(), 3);
    assert_eq!(store.fetch_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_multi_load() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;
    let persons = MultiLoad::new(&store).load(&mut uow, &ids).await?;
    store.commit().await?;

    assert_eq!(persons.len(), 3);
    assert_eq!(store.fetch_count(), 1);

    let loaded: HashSet<Uuid> = persons.iter().map(|p| p.read().id).collect();
    assert_eq!(loaded, ids.iter().copied().collect());

    // Everything fetched is now materialized in the unit of work
    assert_eq!(uow.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_multi_load_without_session_check_refetches(
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;

    let person = store.find_by_id(ids[0]).await?.unwrap();
    let handle = uow.attach(person);
    handle.write().first_name = HeaplessString::try_from("changed").unwrap();

    let persons = MultiLoad::new(&store).load(&mut uow, &ids).await?;
    store.commit().await?;

    // All three identifiers went back to the store
    assert_eq!(store.recorded_batches(), vec![ids.clone()]);
    assert_eq!(persons.len(), 3);

    // The fresh row replaced the local mutation, on the same managed handle
    let reloaded = persons.iter().find(|p| p.read().id == ids[0]).unwrap();
    assert!(Arc::ptr_eq(reloaded, &handle));
    assert_eq!(handle.read().first_name.as_str(), "Jane");
    Ok(())
}

#[tokio::test]
async fn test_multi_load_with_session_check() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;

    let person = store.find_by_id(ids[0]).await?.unwrap();
    let handle = uow.attach(person);
    handle.write().first_name = HeaplessString::try_from("changed").unwrap();

    let persons = MultiLoad::new(&store)
        .with_session_check(true)
        .load(&mut uow, &ids)
        .await?;
    store.commit().await?;

    // Only the two uncached identifiers were fetched
    assert_eq!(store.recorded_batches(), vec![ids[1..].to_vec()]);
    assert_eq!(persons.len(), 3);

    // The cached, locally mutated entity came back as-is
    let cached = persons.iter().find(|p| p.read().id == ids[0]).unwrap();
    assert!(Arc::ptr_eq(cached, &handle));
    assert_eq!(cached.read().first_name.as_str(), "changed");
    Ok(())
}

#[tokio::test]
async fn test_multi_load_batch_size() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;
    let persons = MultiLoad::new(&store)
        .with_batch_size(2)
        .load(&mut uow, &ids)
        .await?;
    store.commit().await?;

    assert_eq!(persons.len(), 3);
    assert_eq!(
        store.recorded_batches(),
        vec![ids[..2].to_vec(), ids[2..].to_vec()]
    );
    Ok(())
}

#[tokio::test]
async fn test_batch_size_does_not_change_the_result(
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut sets = Vec::new();
    for batch_size in [1, 2, 3] {
        let (store, ids) = seeded_store();
        let mut uow = UnitOfWork::new();

        store.begin_transaction().await?;
        let persons = MultiLoad::new(&store)
            .with_batch_size(batch_size)
            .load(&mut uow, &ids)
            .await?;
        store.commit().await?;

        assert_eq!(store.fetch_count() as i32, (3 + batch_size - 1) / batch_size);

        let names: HashSet<String> = persons
            .iter()
            .map(|p| p.read().first_name.as_str().to_string())
            .collect();
        sets.push(names);
    }

    assert_eq!(sets[0], sets[1]);
    assert_eq!(sets[1], sets[2]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_ids_resolve_to_one_instance(
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;
    let requested = vec![ids[0], ids[0], ids[1], ids[0]];
    let persons = MultiLoad::new(&store).load(&mut uow, &requested).await?;

    // One handle per unique identifier, deduplicated before the fetch
    assert_eq!(persons.len(), 2);
    assert_eq!(store.recorded_batches(), vec![vec![ids[0], ids[1]]]);

    // A second load resolves to the same managed instances
    let again = MultiLoad::new(&store).load(&mut uow, &[ids[0]]).await?;
    let first = persons.iter().find(|p| p.read().id == ids[0]).unwrap();
    assert!(Arc::ptr_eq(first, &again[0]));

    store.commit().await?;
    Ok(())
}

#[tokio::test]
async fn test_missing_id_is_silently_omitted() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;
    let persons = MultiLoad::new(&store)
        .load(&mut uow, &[ids[0], Uuid::new_v4()])
        .await?;
    store.commit().await?;

    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0].read().id, ids[0]);
    Ok(())
}

#[tokio::test]
async fn test_backing_store_failure_aborts_the_load(
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    store.begin_transaction().await?;
    store.fail_next_fetch("connection reset");

    let result = MultiLoad::new(&store)
        .with_batch_size(1)
        .load(&mut uow, &ids)
        .await;

    match result.unwrap_err() {
        LoadError::BackingStore(source) => {
            assert_eq!(source.to_string(), "connection reset");
        }
        other => panic!("expected BackingStore error, got {:?}", other),
    }

    // The failed first chunk attached nothing
    assert!(uow.is_empty());
    store.commit().await?;
    Ok(())
}

#[tokio::test]
async fn test_load_outside_transaction_is_rejected() {
    let (store, ids) = seeded_store();
    let mut uow = UnitOfWork::new();

    let result = MultiLoad::new(&store).load(&mut uow, &ids).await;
    assert!(matches!(result, Err(LoadError::NoActiveTransaction)));
    assert_eq!(store.fetch_count(), 0);
}
