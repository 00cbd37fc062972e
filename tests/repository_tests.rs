use catalog_admin::{
    error::RepositoryError,
    models::CategoryPayload,
    repository::{InMemoryRepository, Repository},
};
use tokio::test;

fn payload(name: &str, parent_id: Option<i64>) -> CategoryPayload {
    CategoryPayload {
        name: name.to_string(),
        image: format!("categories/{}.png", name.to_lowercase()),
        parent_id,
    }
}

#[test]
async fn test_create_assigns_increasing_ids_and_timestamps() {
    let repo = InMemoryRepository::new();

    let shoes = repo.create_category(payload("Shoes", None)).await.unwrap();
    let boots = repo.create_category(payload("Boots", Some(shoes.id))).await.unwrap();

    assert!(boots.id > shoes.id);
    assert_eq!(boots.parent_id, Some(shoes.id));
    assert!(!shoes.created_at.is_empty());
    assert!(chrono::DateTime::parse_from_rfc3339(&shoes.created_at).is_ok());
}

#[test]
async fn test_list_is_ordered_by_id() {
    let repo = InMemoryRepository::with_categories(vec![
        payload("Shoes", None),
        payload("Hats", None),
        payload("Socks", None),
    ]);

    let (ids, names): (Vec<i64>, Vec<String>) = repo
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.name))
        .unzip();

    // Seeded ids are assigned from 1 in input order.
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(names, vec!["Shoes", "Hats", "Socks"]);
}

#[test]
async fn test_create_rejects_unknown_parent() {
    let repo = InMemoryRepository::new();

    let result = repo.create_category(payload("Orphan", Some(99))).await;

    assert!(matches!(result, Err(RepositoryError::InvalidParent(_))));
    assert!(repo.list_categories().await.unwrap().is_empty());
}

#[test]
async fn test_update_keeps_id_and_created_at() {
    let repo = InMemoryRepository::with_categories(vec![payload("Shoes", None)]);
    let before = repo.get_category(1).await.unwrap().unwrap();

    let after = repo
        .update_category(1, payload("Sneakers", None))
        .await
        .unwrap();

    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.name, "Sneakers");
}

#[test]
async fn test_update_missing_category_is_not_found() {
    let repo = InMemoryRepository::new();

    let result = repo.update_category(3, payload("Ghost", None)).await;

    assert!(matches!(result, Err(RepositoryError::NotFound(3))));
}

#[test]
async fn test_update_rejects_self_and_descendant_parents() {
    // 1 <- 2 <- 3
    let repo = InMemoryRepository::with_categories(vec![
        payload("Clothing", None),
        payload("Shoes", Some(1)),
        payload("Boots", Some(2)),
    ]);

    let own_parent = repo.update_category(1, payload("Clothing", Some(1))).await;
    let grandchild_parent = repo.update_category(1, payload("Clothing", Some(3))).await;
    let sibling_move = repo.update_category(3, payload("Boots", Some(1))).await;

    assert!(matches!(own_parent, Err(RepositoryError::InvalidParent(_))));
    assert!(matches!(grandchild_parent, Err(RepositoryError::InvalidParent(_))));
    assert_eq!(sibling_move.unwrap().parent_id, Some(1));
}

#[test]
async fn test_delete_detaches_children() {
    let repo = InMemoryRepository::with_categories(vec![
        payload("Clothing", None),
        payload("Shoes", Some(1)),
    ]);

    assert!(repo.delete_category(1).await.unwrap());

    let remaining = repo.list_categories().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].parent_id, None);
}

#[test]
async fn test_second_delete_reports_missing() {
    let repo = InMemoryRepository::with_categories(vec![payload("Shoes", None)]);

    assert!(repo.delete_category(1).await.unwrap());
    assert!(!repo.delete_category(1).await.unwrap());
}
