// src/cache/policy.rs

use super::CacheKey;

/// The kind of record that was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Lecture,
    Quiz,
    Thread,
    Post { thread_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
    /// A thread save whose only change is `views + 1`.
    IncrementViews,
}

/// Cache keys made stale by `mutation` on `entity`.
///
/// View-count bumps happen on every thread page load and leave the thread
/// list untouched. Any other mutation drops the entity's list.
pub fn keys_to_invalidate(entity: Entity, mutation: Mutation) -> Vec<CacheKey> {
    match (entity, mutation) {
        (Entity::Thread, Mutation::IncrementViews) => Vec::new(),
        (Entity::Lecture, _) => vec![CacheKey::LectureList],
        (Entity::Quiz, _) => vec![CacheKey::CurrentQuizList],
        (Entity::Thread, _) => vec![CacheKey::ThreadList],
        (Entity::Post { thread_id }, _) => vec![CacheKey::PostList(thread_id)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITES: [Mutation; 3] = [Mutation::Create, Mutation::Update, Mutation::Delete];

    #[test]
    fn lecture_writes_drop_lecture_list() {
        for m in WRITES {
            assert_eq!(keys_to_invalidate(Entity::Lecture, m), vec![CacheKey::LectureList]);
        }
    }

    #[test]
    fn quiz_writes_drop_current_quiz_list() {
        for m in WRITES {
            assert_eq!(keys_to_invalidate(Entity::Quiz, m), vec![CacheKey::CurrentQuizList]);
        }
    }

    #[test]
    fn thread_view_increment_invalidates_nothing() {
        assert!(keys_to_invalidate(Entity::Thread, Mutation::IncrementViews).is_empty());
    }

    #[test]
    fn other_thread_writes_drop_thread_list() {
        for m in WRITES {
            assert_eq!(keys_to_invalidate(Entity::Thread, m), vec![CacheKey::ThreadList]);
        }
    }

    #[test]
    fn post_writes_drop_their_thread_posts() {
        assert_eq!(
            keys_to_invalidate(Entity::Post { thread_id: 3 }, Mutation::Create),
            vec![CacheKey::PostList(3)]
        );
    }
}
