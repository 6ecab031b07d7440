mod common;

use scaffold::{memory::InMemoryStore, prelude::*};

use common::Task;

fn defaults(ids: &[DocumentId]) -> Vec<DefaultDocument<Task>> {
    ids.iter()
        .enumerate()
        .map(|(n, id)| DefaultDocument::new(*id, Task::new(&format!("seed {n}"))))
        .collect()
}

async fn stored(store: &DocumentStore) -> Vec<Document<Task>> {
    store
        .collection("tasks")
        .find_many(Query::new())
        .await
        .unwrap()
        .into_iter()
        .map(|raw| Document::from_bson(raw).unwrap())
        .collect()
}

#[tokio::test]
async fn seeding_twice_keeps_one_document_per_id() {
    let store = DocumentStore::new(InMemoryStore::new());
    let ids = [DocumentId::new(), DocumentId::new()];

    for _ in 0..2 {
        CollectionConfig::builder("Tasks", "tasks")
            .default_documents(defaults(&ids))
            .build()
            .activate(&store)
            .await
            .unwrap();
    }

    let documents = stored(&store).await;
    assert_eq!(documents.len(), 2);
    assert_eq!(documents.iter().map(|d| d.id).collect::<Vec<_>>(), ids);
}

#[tokio::test]
async fn existing_documents_are_not_overwritten() {
    let store = DocumentStore::new(InMemoryStore::new());
    let id = DocumentId::new();

    let tasks = CollectionConfig::builder("Tasks", "tasks")
        .default_document(DefaultDocument::new(id, Task::new("original")))
        .build()
        .activate(&store)
        .await
        .unwrap();
    let mut seeded = tasks.find_by_id(&Context::new(), id).await.unwrap();
    seeded.set(&tasks, &Context::new(), "title", "edited").await.unwrap();

    CollectionConfig::builder("Tasks", "tasks")
        .default_document(DefaultDocument::new(id, Task::new("original")))
        .build()
        .activate(&store)
        .await
        .unwrap();

    assert_eq!(stored(&store).await[0].data.title, "edited");
}

#[tokio::test]
async fn seeds_bypass_the_write_hook() {
    let store = DocumentStore::new(InMemoryStore::new());
    let id = DocumentId::new();

    let tasks = CollectionConfig::builder("Tasks", "tasks")
        .write(|_ctx, _id, _task: Task| async move { Err(ScaffoldError::forbidden("read only")) })
        .default_document(DefaultDocument::new(id, Task::new("seeded")))
        .build()
        .activate(&store)
        .await
        .unwrap();

    assert_eq!(tasks.find_by_id(&Context::new(), id).await.unwrap().data.title, "seeded");
    assert!(tasks.insert(&Context::new(), Task::new("new")).await.is_err());
}

#[tokio::test]
async fn seed_timestamps_are_kept_when_given() {
    let store = DocumentStore::new(InMemoryStore::new());
    let id = DocumentId::new();
    let created = "2024-01-01T00:00:00Z".parse().unwrap();

    CollectionConfig::builder("Tasks", "tasks")
        .default_document(DefaultDocument::new(id, Task::new("old")).with_created(created))
        .build()
        .activate(&store)
        .await
        .unwrap();

    let document = &stored(&store).await[0];
    assert_eq!(document.created, created);
    assert!(document.last_updated >= created);
}
