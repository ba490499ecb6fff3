use std::{sync::Arc, time::Duration};

use storefront_api::{
    cart::{
        CartEngine, CartSnapshot, CartStore, LineKey, MemoryCartStore, MemoryCatalog,
        ProductSnapshot,
    },
    identity::{Identity, IdentityHub},
};
use uuid::Uuid;

/// Polls the engine until `check` holds for its identity and snapshot.
async fn wait_for(engine: &CartEngine, check: impl Fn(Option<&Identity>, &CartSnapshot) -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let identity = engine.identity().await;
            let snapshot = engine.snapshot().await;
            if check(identity.as_ref(), &snapshot) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "engine did not reach the expected state in time");
}

#[tokio::test]
async fn subscription_sees_transitions_in_order() {
    let hub = IdentityHub::default();
    let mut subscription = hub.subscribe();
    let first = Identity::new(Uuid::new_v4(), "customer");
    let second = Identity::new(Uuid::new_v4(), "admin");

    hub.sign_in(first.clone());
    hub.sign_out();
    hub.sign_in(second.clone());

    assert_eq!(subscription.next().await, Some(Some(first)));
    assert_eq!(subscription.next().await, Some(None));
    assert_eq!(subscription.next().await, Some(Some(second.clone())));
    assert_eq!(hub.current(), Some(second));
    subscription.unsubscribe();
}

#[tokio::test]
async fn engine_follows_sign_in_and_sign_out() -> anyhow::Result<()> {
    let store = Arc::new(MemoryCartStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = Arc::new(CartEngine::new(store.clone(), catalog.clone()));

    let identity = Identity::new(Uuid::new_v4(), "customer");
    let product_id = Uuid::new_v4();
    catalog
        .put(ProductSnapshot {
            id: product_id,
            name: "Scarf".into(),
            price: 1200,
            sale_price: None,
        })
        .await;
    store
        .insert(LineKey::new(identity.user_id, product_id, Some("M"), None), 2)
        .await?;
    store
        .insert(LineKey::new(identity.user_id, product_id, Some("L"), None), 1)
        .await?;

    let hub = IdentityHub::default();
    let handle = engine.follow(&hub);

    hub.sign_in(identity.clone());
    wait_for(&engine, |_, snapshot| snapshot.count == 3 && !snapshot.loading).await;
    assert_eq!(engine.subtotal().await, 3600);
    assert_eq!(engine.identity().await, Some(identity.clone()));

    hub.sign_out();
    wait_for(&engine, |identity, _| identity.is_none()).await;
    assert!(engine.lines().await.is_empty());
    assert_eq!(store.rows().await.len(), 2, "signing out leaves stored lines alone");

    handle.stop();
    hub.sign_in(identity);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(engine.identity().await.is_none());
    Ok(())
}

#[tokio::test]
async fn follow_syncs_an_already_signed_in_identity() {
    let store = Arc::new(MemoryCartStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = Arc::new(CartEngine::new(store, catalog));
    let identity = Identity::new(Uuid::new_v4(), "customer");

    let hub = IdentityHub::signed_in(identity.clone());
    let _handle = engine.follow(&hub);

    wait_for(&engine, |current, snapshot| current == Some(&identity) && !snapshot.loading).await;
    assert!(!engine.is_loading().await);
}
