//! Backend conformance suite.
//!
//! Call [`run_store_conformance_tests`] from a backend's test module with
//! a fresh store instance. The suite covers the operation contracts plus
//! the concurrent-increment race property (20 parallel workers, zero lost
//! updates).

use std::sync::Arc;

use copysmith_core::{
    CreativeAngle, CreativeAngles, ImagePromptSet, ImagePromptSpec, MarketingBrief,
    MarketingEmail, NewImage, SessionStatus, SourceTexts, TextAssets,
};

use crate::error::StateError;
use crate::store::SessionStore;

fn test_sources() -> SourceTexts {
    SourceTexts {
        ppt_text: Some("slide one\nslide two".to_owned()),
        website_text: Some("landing page copy".to_owned()),
        website_url: Some("https://example.com".to_owned()),
    }
}

fn test_assets() -> TextAssets {
    TextAssets {
        brief: MarketingBrief {
            product_or_service: "Widget".into(),
            target_audience: "Ops teams".into(),
            value_proposition: "Less toil".into(),
            key_benefits: vec!["fast".into(), "cheap".into()],
            tone_of_voice: "direct".into(),
            call_to_action: "Try it".into(),
        },
        angles: CreativeAngles {
            angles: vec![CreativeAngle {
                angle_name: "Workflow".into(),
                intent: "show the flow".into(),
                visual_focus: "workflow".into(),
            }],
        },
        email: MarketingEmail {
            subject: "Widget".into(),
            body: "Hello".into(),
        },
        image_prompts: ImagePromptSet {
            prompts: vec![ImagePromptSpec {
                angle_name: "Workflow".into(),
                summary: "the flow".into(),
                prompt: "Title: Flow".into(),
            }],
        },
    }
}

fn test_image(session_id: &str, index: u32) -> NewImage {
    NewImage {
        generation_id: session_id.to_owned(),
        user_id: "conformance-user".to_owned(),
        angle_name: format!("Angle_{index}"),
        image_summary: "a diagram".to_owned(),
        prompt: "Title: ...".to_owned(),
        image_url: format!("https://cdn.example.com/{index}.png"),
        storage_path: format!("{session_id}/{index}.png"),
        storage_backend: "memory".to_owned(),
        image_index: index,
        generation_time: 1.5,
    }
}

/// Run the full session store conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: Arc<dyn SessionStore>) -> Result<(), StateError> {
    test_get_missing(store.as_ref()).await?;
    test_create_and_get(store.as_ref()).await?;
    test_ownership_filter(store.as_ref()).await?;
    test_update_assets(store.as_ref()).await?;
    test_images_ordered_by_index(store.as_ref()).await?;
    test_complete_is_terminal(store.as_ref()).await?;
    test_fail_truncates_message(store.as_ref()).await?;
    test_list_newest_first(store.as_ref()).await?;
    test_concurrent_increments(Arc::clone(&store)).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn SessionStore) -> Result<(), StateError> {
    let found = store.get("no-such-session", None).await?;
    assert!(found.is_none(), "get on missing session should return None");
    Ok(())
}

async fn test_create_and_get(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    let found = store.get(&id, None).await?.expect("session should exist");
    assert_eq!(found.session.id, id);
    assert_eq!(found.session.user_id, "conformance-user");
    assert_eq!(found.session.status, SessionStatus::Processing);
    assert_eq!(found.session.completed_images, 0);
    assert!(found.images.is_empty());
    Ok(())
}

async fn test_ownership_filter(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store.create_session("owner-a", &test_sources()).await?;
    assert!(store.get(&id, Some("owner-a")).await?.is_some());
    assert!(
        store.get(&id, Some("owner-b")).await?.is_none(),
        "foreign owner should not see the session"
    );
    Ok(())
}

async fn test_update_assets(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    store.update_assets(&id, &test_assets(), 3).await?;
    let found = store.get(&id, None).await?.expect("session should exist");
    assert_eq!(found.session.total_images, 3);
    assert_eq!(
        found
            .session
            .marketing_brief
            .as_ref()
            .map(|b| b.product_or_service.as_str()),
        Some("Widget")
    );
    assert!(found.session.image_prompts.is_some());
    Ok(())
}

async fn test_images_ordered_by_index(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    // Insert out of canonical order; reads must come back sorted.
    for index in [2, 0, 1] {
        store.add_image(test_image(&id, index)).await?;
    }
    let found = store.get(&id, None).await?.expect("session should exist");
    let indices: Vec<u32> = found.images.iter().map(|i| i.image_index).collect();
    assert_eq!(indices, vec![0, 1, 2], "images must be ordered by index");
    Ok(())
}

async fn test_complete_is_terminal(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    store.complete(&id, 42.5).await?;
    let found = store.get(&id, None).await?.expect("session should exist");
    assert_eq!(found.session.status, SessionStatus::Completed);
    assert_eq!(found.session.generation_time, Some(42.5));

    let again = store.fail(&id, "late failure").await;
    assert!(
        matches!(again, Err(StateError::AlreadyTerminal { .. })),
        "terminal status must never reverse"
    );
    Ok(())
}

async fn test_fail_truncates_message(store: &dyn SessionStore) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    let long = "e".repeat(2000);
    store.fail(&id, &long).await?;
    let found = store.get(&id, None).await?.expect("session should exist");
    assert_eq!(found.session.status, SessionStatus::Failed);
    assert_eq!(
        found.session.error_message.as_ref().map(String::len),
        Some(500),
        "error message should be truncated to 500 chars"
    );
    Ok(())
}

async fn test_list_newest_first(store: &dyn SessionStore) -> Result<(), StateError> {
    let user = format!("list-user-{}", unique_suffix());
    let first = store.create_session(&user, &test_sources()).await?;
    // Timestamps have millisecond precision in some backends.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store.create_session(&user, &test_sources()).await?;

    let listed = store.list_sessions(&user, 10).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].session.id, second, "newest session first");
    assert_eq!(listed[1].session.id, first);

    let limited = store.list_sessions(&user, 1).await?;
    assert_eq!(limited.len(), 1);
    Ok(())
}

async fn test_concurrent_increments(store: Arc<dyn SessionStore>) -> Result<(), StateError> {
    let id = store
        .create_session("conformance-user", &test_sources())
        .await?;
    store.update_assets(&id, &test_assets(), 20).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        let id = id.clone();
        handles.push(tokio::spawn(
            async move { store.increment_completed(&id).await },
        ));
    }
    for handle in handles {
        handle.await.expect("increment task panicked")?;
    }

    let found = store.get(&id, None).await?.expect("session should exist");
    assert_eq!(
        found.session.completed_images, 20,
        "no increment may be lost under 20 concurrent workers"
    );
    Ok(())
}

fn unique_suffix() -> u128 {
    // Keeps repeated runs against a persistent backend isolated.
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}
