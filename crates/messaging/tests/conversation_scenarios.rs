//! End-to-end behavior of the chat core over real stores.

use std::collections::HashSet;
use std::sync::Arc;

use kv_store::{Database, KvStore, MemoryStore};
use messaging::{
    conversation_key, BuddyIndex, ChatService, ConversationStore, MessagingError, UserId,
    CONVERSATION_COLLECTION,
};

fn user(id: &str) -> UserId {
    UserId::parse(id).unwrap()
}

async fn memory_service() -> (Arc<MemoryStore>, ChatService) {
    let memory = Arc::new(MemoryStore::new());
    let service = ChatService::open(memory.clone()).await.unwrap();
    (memory, service)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_first_message_gets_id_one() {
    let (_memory, service) = memory_service().await;

    let id = service
        .session("alice")
        .unwrap()
        .send_message("bob", "Hello")
        .await
        .unwrap();
    assert_eq!(id, 1);

    let conversation = service
        .conversations()
        .resolve(&user("alice"), &user("bob"))
        .await
        .unwrap();
    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.messages()[0].content, "Hello");
}

#[tokio::test]
async fn test_deleted_ids_are_not_reused() {
    let (_memory, service) = memory_service().await;
    let alice = service.session("alice").unwrap();

    assert_eq!(alice.send_message("bob", "one").await.unwrap(), 1);
    assert_eq!(alice.send_message("bob", "two").await.unwrap(), 2);
    alice.delete_message("bob", 1).await.unwrap();

    let conversation = alice.conversation_with("bob").await.unwrap();
    let ids: Vec<_> = conversation.messages().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![2]);

    assert_eq!(alice.send_message("bob", "three").await.unwrap(), 3);
}

#[tokio::test]
async fn test_only_sender_can_edit_or_delete() {
    let (_memory, service) = memory_service().await;
    let alice = service.session("alice").unwrap();
    let bob = service.session("bob").unwrap();

    alice.send_message("bob", "mine").await.unwrap();

    assert!(matches!(
        bob.edit_message("alice", 1, "yours now").await,
        Err(MessagingError::MessageNotFound { id: 1 })
    ));
    assert!(matches!(
        bob.delete_message("alice", 1).await,
        Err(MessagingError::MessageNotFound { id: 1 })
    ));

    let conversation = alice.conversation_with("bob").await.unwrap();
    assert_eq!(conversation.messages()[0].content, "mine");
}

#[tokio::test]
async fn test_edit_by_sender() {
    let (_memory, service) = memory_service().await;
    let alice = service.session("alice").unwrap();

    alice.send_message("bob", "helo").await.unwrap();
    alice.edit_message("BOB", 1, "hello").await.unwrap();

    let conversation = service
        .session("bob")
        .unwrap()
        .conversation_with("alice")
        .await
        .unwrap();
    let message = &conversation.messages()[0];
    assert_eq!(message.content, "hello");
    assert!(message.updated_at >= message.created_at);

    assert!(matches!(
        alice.edit_message("bob", 1, "   ").await,
        Err(MessagingError::Validation(_))
    ));
    assert!(matches!(
        alice.edit_message("bob", 9, "nope").await,
        Err(MessagingError::MessageNotFound { id: 9 })
    ));
}

#[tokio::test]
async fn test_self_conversation_persists_nothing() {
    let (memory, service) = memory_service().await;
    let alice = service.session("alice").unwrap();

    assert!(matches!(
        alice.send_message(" ALICE ", "hi me").await,
        Err(MessagingError::SelfConversation)
    ));
    assert!(memory.is_empty().await);
    assert!(alice.buddies().await.is_empty());
}

#[tokio::test]
async fn test_list_conversations_one_per_counterpart() {
    let (_memory, service) = memory_service().await;

    service
        .session("alice")
        .unwrap()
        .send_message("bob", "from alice")
        .await
        .unwrap();
    service
        .session("carol")
        .unwrap()
        .send_message("bob", "from carol")
        .await
        .unwrap();

    let bob = user("bob");
    let conversations = service
        .session("bob")
        .unwrap()
        .list_conversations()
        .await
        .unwrap();
    assert_eq!(conversations.len(), 2);

    let counterparts: Vec<_> = conversations
        .iter()
        .map(|c| c.counterpart(&bob).unwrap().as_str().to_string())
        .collect();
    assert_eq!(counterparts, vec!["alice", "carol"]);
}

#[tokio::test]
async fn test_resolve_is_order_independent() {
    let (memory, service) = memory_service().await;
    service
        .session("bob")
        .unwrap()
        .send_message("alice", "hi")
        .await
        .unwrap();

    let store = service.conversations();
    let ab = store.resolve(&user("alice"), &user("bob")).await.unwrap();
    let ba = store.resolve(&user("bob"), &user("alice")).await.unwrap();
    assert_eq!(ab, ba);
    assert_eq!(ab.key(), conversation_key(&user("bob"), &user("alice")));

    let raw = memory
        .get(CONVERSATION_COLLECTION, "conversation_alice_bob")
        .await
        .unwrap();
    assert!(raw.is_some());
}

#[tokio::test]
async fn test_pairs_sharing_a_key_stay_apart() {
    let (_memory, service) = memory_service().await;
    let a_b = service.session("a_b").unwrap();
    let a = service.session("a").unwrap();
    let c = service.session("c").unwrap();

    assert_eq!(a_b.send_message("c", "secret for c").await.unwrap(), 1);
    assert_eq!(
        conversation_key(&user("a"), &user("b_c")),
        conversation_key(&user("a_b"), &user("c"))
    );

    let err = a.conversation_with("b_c").await.unwrap_err();
    assert!(matches!(
        err,
        MessagingError::KeyCollision { ref key } if key == "conversation_a_b_c"
    ));

    let err = a.send_message("b_c", "hi").await.unwrap_err();
    assert!(matches!(err, MessagingError::KeyCollision { .. }));
    assert!(a.buddies().await.is_empty());

    let conversation = c.conversation_with("a_b").await.unwrap();
    assert_eq!(conversation.participants(), &[user("a_b"), user("c")]);
    let log: Vec<_> = conversation
        .messages()
        .iter()
        .map(|m| (m.content.as_str(), m.from.as_str()))
        .collect();
    assert_eq!(log, vec![("secret for c", "a_b")]);
    assert_eq!(conversation.last_message_id(), 1);
}

// ============================================================================
// Persistence across restarts
// ============================================================================

#[tokio::test]
async fn test_state_survives_restart_on_sqlite() {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    let store: Arc<dyn KvStore> = Arc::new(db);

    {
        let service = ChatService::open(store.clone()).await.unwrap();
        let alice = service.session("alice").unwrap();
        alice.send_message("bob", "one").await.unwrap();
        alice.send_message("bob", "two").await.unwrap();
        alice.delete_message("bob", 2).await.unwrap();
    }

    let service = ChatService::open(store).await.unwrap();
    let bob = service.session("bob").unwrap();
    assert_eq!(bob.buddies().await, vec![user("alice")]);

    let conversations = bob.list_conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].last_message_id(), 2);
    assert_eq!(bob.send_message("alice", "three").await.unwrap(), 3);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_get_distinct_ids() {
    let memory = Arc::new(MemoryStore::new());
    let service = Arc::new(ChatService::open(memory).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
            service
                .session(from)
                .unwrap()
                .send_message(to, &format!("message {}", i))
                .await
                .unwrap()
        }));
    }

    let ids: HashSet<u64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids, (1..=32).collect::<HashSet<u64>>());

    let conversation = service
        .session("alice")
        .unwrap()
        .conversation_with("bob")
        .await
        .unwrap();
    assert_eq!(conversation.messages().len(), 32);
    assert_eq!(conversation.last_message_id(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_pair_loses_no_updates() {
    let memory = Arc::new(MemoryStore::new());
    let index = Arc::new(BuddyIndex::load(memory.clone()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..24 {
        let index = index.clone();
        handles.push(tokio::spawn(async move {
            let other = user(&format!("user{}", i));
            index.register_pair(&user("hub"), &other).await.unwrap();
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.unwrap();
    }

    assert_eq!(index.buddies_of(&user("hub")).await.len(), 24);

    let reloaded = BuddyIndex::load(memory).await.unwrap();
    assert_eq!(reloaded.buddies_of(&user("hub")).await.len(), 24);
    assert_eq!(reloaded.user_count().await, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mutations_on_one_conversation() {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(ConversationStore::new(memory));
    let (alice, bob) = (user("alice"), user("bob"));

    let mut conversation = store.resolve(&alice, &bob).await.unwrap();
    for i in 0..10 {
        store
            .add_message(&mut conversation, &format!("seed {}", i), &alice)
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for id in 1..=10u64 {
        let store = store.clone();
        let (alice, bob) = (alice.clone(), bob.clone());
        handles.push(tokio::spawn(async move {
            let mut conversation = store.resolve(&alice, &bob).await.unwrap();
            if id % 2 == 0 {
                store
                    .delete_message(&mut conversation, id, &alice)
                    .await
                    .unwrap();
            } else {
                store
                    .add_message(&mut conversation, "extra", &bob)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.unwrap();
    }

    let conversation = store.resolve(&alice, &bob).await.unwrap();
    // 10 seeds - 5 deletions + 5 additions
    assert_eq!(conversation.messages().len(), 10);
    assert_eq!(conversation.last_message_id(), 15);

    let ids: HashSet<_> = conversation.messages().iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 10);
    assert!(!ids.contains(&2));
    assert!(ids.contains(&15));
}
