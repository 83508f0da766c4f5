// Per-project ticket numbering.
//
// Read-then-write: the next number is MAX(ticket_number) + 1 over the project's
// live tasks. Two concurrent creators can read the same maximum; the
// (project_id, ticket_number) unique index turns the loser's insert into a
// TicketNumber conflict, which `insert_with_next_number` answers by reading
// the maximum again.

use uuid::Uuid;

use crate::database::store::{Constraint, Store, StoreError};
use crate::database::models::Task;

/// Next ticket number for a project, starting at 1
pub async fn next_ticket_number(store: &dyn Store, project_id: Uuid) -> Result<i32, StoreError> {
    let current = store.max_ticket_number(project_id).await?;
    Ok(current.map_or(1, |n| n + 1))
}

/// Assign the next ticket number to `task` and insert it. Retries up to
/// `retries` extra times when another writer claims the same number first.
pub async fn insert_with_next_number(store: &dyn Store, task: &mut Task, retries: u32) -> Result<(), StoreError> {
    let mut attempt = 0;
    loop {
        task.ticket_number = next_ticket_number(store, task.project_id).await?;
        match store.insert_task(task).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_conflict_on(Constraint::TicketNumber) && attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    "Ticket number {} in project {} taken concurrently, retrying ({}/{})",
                    task.ticket_number,
                    task.project_id,
                    attempt,
                    retries
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::database::models::{TaskPriority, TaskStatus};

    fn task(project_id: Uuid) -> Task {
        let now = crate::database::now();
        Task {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            project_id,
            ticket_number: 0,
            title: "t".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            reporter_id: Uuid::new_v4(),
            assignee_ids: vec![],
            label_ids: vec![],
            due_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn numbers_start_at_one_and_increase_without_gaps() {
        let store = MemoryStore::new();
        let project_id = Uuid::new_v4();

        let mut numbers = vec![];
        for _ in 0..5 {
            let mut t = task(project_id);
            insert_with_next_number(&store, &mut t, 3).await.unwrap();
            numbers.push(t.ticket_number);
        }
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn sequences_are_independent_per_project() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        insert_with_next_number(&store, &mut task(a), 3).await.unwrap();
        insert_with_next_number(&store, &mut task(a), 3).await.unwrap();
        let mut first_b = task(b);
        insert_with_next_number(&store, &mut first_b, 3).await.unwrap();

        assert_eq!(first_b.ticket_number, 1);
    }

    #[tokio::test]
    async fn concurrent_creation_never_duplicates_numbers() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let project_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut t = task(project_id);
                    insert_with_next_number(store.as_ref(), &mut t, 32).await.map(|_| t.ticket_number)
                })
            })
            .collect();

        let mut numbers = vec![];
        for h in handles {
            numbers.push(h.await.unwrap().unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=16).collect::<Vec<i32>>());
    }

    #[tokio::test]
    async fn duplicate_live_number_is_rejected_by_store() {
        let store = MemoryStore::new();
        let project_id = Uuid::new_v4();
        let mut existing = task(project_id);
        existing.ticket_number = 1;
        store.insert_task(&existing).await.unwrap();

        // A stale duplicate of the same number is what a lost race looks like
        let mut dup = task(project_id);
        dup.ticket_number = 1;
        let err = store.insert_task(&dup).await.unwrap_err();
        assert!(err.is_conflict_on(Constraint::TicketNumber));
    }
}
