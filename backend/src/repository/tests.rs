//! Repository Integration Tests
//!
//! Tests for the repositories with in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::config::{DatabaseConfig, OrderingConfig, RetryConfig};
    use crate::domain::{Checklist, Item};
    use crate::repository::{
        init_db, ChecklistRepository, ItemPositioningOperations, ItemRepository, Repository,
        TransactionRetryExecutor,
    };

    async fn setup_test_db() -> (ChecklistRepository, ItemRepository) {
        // Use in-memory database for tests
        let db_state = init_db(&DatabaseConfig::in_memory()).await.expect("Failed to init test DB");
        let executor = TransactionRetryExecutor::new(&db_state, RetryConfig::default());
        (
            ChecklistRepository::new(executor.clone()),
            ItemRepository::new(executor, OrderingConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_create_checklist() {
        let (lists, _) = setup_test_db().await;

        let created = lists
            .create(&Checklist::new("Groceries".to_string()))
            .await
            .expect("Failed to create");
        assert!(created.id > 0);
        assert_eq!(created.name, "Groceries");

        let found = lists.find_by_id(created.id).await.expect("Find failed");
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_blank_checklist_name_rejected() {
        let (lists, _) = setup_test_db().await;
        assert!(lists.create(&Checklist::new("   ".to_string())).await.is_err());
    }

    #[tokio::test]
    async fn test_items_are_appended_with_gap() {
        let (lists, items) = setup_test_db().await;
        let list = lists.create(&Checklist::new("Trip".to_string())).await.unwrap();

        let first = items.create(&Item::new(list.id, "Passport".to_string())).await.unwrap();
        let second = items.create(&Item::new(list.id, "Charger".to_string())).await.unwrap();

        assert_eq!(first.position, 0.0);
        assert_eq!(second.position, 1000.0);
        assert_eq!(items.get_next_position(list.id).await.unwrap(), 2000.0);

        let partition = items.list_partition(list.id, false).await.unwrap();
        let texts: Vec<_> = partition.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Passport", "Charger"]);
    }

    #[tokio::test]
    async fn test_create_item_in_missing_checklist() {
        let (_, items) = setup_test_db().await;
        let err = items.create(&Item::new(77, "Orphan".to_string())).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_changes_text_only() {
        let (lists, items) = setup_test_db().await;
        let list = lists.create(&Checklist::new("Home".to_string())).await.unwrap();
        let created = items.create(&Item::new(list.id, "Original".to_string())).await.unwrap();

        let mut edited = created.clone();
        edited.text = "Updated".to_string();
        edited.completed = true;
        edited.position = -50.0;

        let updated = items.update(&edited).await.expect("Update failed");
        assert_eq!(updated.text, "Updated");
        assert!(!updated.completed);
        assert_eq!(updated.position, created.position);
    }

    #[tokio::test]
    async fn test_delete_checklist_cascades() {
        let (lists, items) = setup_test_db().await;
        let list = lists.create(&Checklist::new("Temp".to_string())).await.unwrap();
        let item = items.create(&Item::new(list.id, "Gone soon".to_string())).await.unwrap();

        lists.delete(list.id).await.expect("Delete failed");

        assert!(items.find_by_id(item.id).await.unwrap().is_none());
        assert!(lists.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_checklist_orders_partitions() {
        let (lists, items) = setup_test_db().await;
        let a = lists.create(&Checklist::new("A".to_string())).await.unwrap();
        let b = lists.create(&Checklist::new("B".to_string())).await.unwrap();
        items.create(&Item::new(a.id, "a1".to_string())).await.unwrap();
        items.create(&Item::new(b.id, "b1".to_string())).await.unwrap();
        items.create(&Item::new(a.id, "a2".to_string())).await.unwrap();

        let in_a = items.list_by_checklist(a.id).await.unwrap();
        assert_eq!(in_a.len(), 2);
        assert!(in_a.iter().all(|i| i.list_id == a.id));
        assert_eq!(items.list().await.unwrap().len(), 3);
    }
}
