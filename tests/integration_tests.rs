use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn test_health_and_catalog() {
    let test_env = TestEnvironment::new().await;

    let (status, body) = test_env.get("/health/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["service"], "robobar");

    let (status, body) = test_env.get("/api/drinks").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 3);
    let names: Vec<&str> = body["drinks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Roba Cola", "Robo Beer", "Rob(w)ine"]);
}

#[tokio::test]
async fn test_fresh_order_is_empty() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;

    let (status, body) = test_env.get(&format!("/api/orders/{}", session_id)).await;

    assert_eq!(status, 200);
    assert_eq!(body["stage"], "placing_order");
    assert_eq!(body["total_price"], "0.00");
    assert_eq!(body["total_count"], 0);
    assert_eq!(quantities(&body), vec![0, 0, 0]);
}

#[tokio::test]
async fn test_two_beers_cost_four() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;

    test_env.increment(&session_id, 2).await;
    let (status, body) = test_env.increment(&session_id, 2).await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "place_order");
    assert_eq!(quantities(&body), vec![0, 2, 0]);
    assert_eq!(body["total_price"], "4.00");
}

#[tokio::test]
async fn test_decrement_never_goes_negative() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;

    let (status, body) = test_env.decrement(&session_id, 1).await;
    assert_eq!(status, 200);
    assert_eq!(quantities(&body), vec![0, 0, 0]);

    test_env.increment(&session_id, 1).await;
    test_env.decrement(&session_id, 1).await;
    let (_, body) = test_env.decrement(&session_id, 1).await;
    assert_eq!(quantities(&body), vec![0, 0, 0]);
}

#[tokio::test]
async fn test_review_mixed_order() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;

    test_env.increment(&session_id, 1).await;
    test_env.increment(&session_id, 1).await;
    test_env.increment(&session_id, 2).await;

    let (status, body) = test_env
        .get(&format!("/api/orders/{}/review", session_id))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "review_order");
    assert_eq!(body["stage"], "reviewing");
    assert_eq!(body["number_of_drinks"], 3);
    assert_eq!(body["total_price"], "4.50");
    assert_eq!(body["age_check"], true);
}

#[tokio::test]
async fn test_review_empty_order_stays_on_place_order() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;

    let (status, body) = test_env
        .get(&format!("/api/orders/{}/review", session_id))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "place_order");
}

#[tokio::test]
async fn test_submit_alcohol_with_adult_age() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 2).await;

    let (status, body) = test_env
        .post(
            &format!("/api/orders/{}/submit", session_id),
            Some(json!({ "age": 24 })),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "order_submitted");
    assert_eq!(body["stage"], "completed");
    assert_eq!(body["number_of_drinks"], 1);
    assert_eq!(body["total_price"], "2.00");
}

#[tokio::test]
async fn test_submit_alcohol_without_age_keeps_selection() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 3).await;

    let (status, body) = test_env
        .post(&format!("/api/orders/{}/submit", session_id), None)
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "review_order");
    assert_eq!(body["error"], "Only adults can buy alcohol");
    assert_eq!(quantities(&body), vec![0, 0, 1]);

    let (_, body) = test_env.get(&format!("/api/orders/{}", session_id)).await;
    assert_eq!(body["total_count"], 1);
}

#[tokio::test]
async fn test_submit_age_boundary() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 2).await;

    let (_, body) = test_env
        .post(
            &format!("/api/orders/{}/submit", session_id),
            Some(json!({ "age": 18 })),
        )
        .await;
    assert_eq!(body["view"], "review_order");
    assert_eq!(body["age"], 18);

    let (_, body) = test_env
        .post(
            &format!("/api/orders/{}/submit", session_id),
            Some(json!({ "age": "19" })),
        )
        .await;
    assert_eq!(body["view"], "order_submitted");
}

#[tokio::test]
async fn test_submit_form_encoded_age() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 2).await;

    let response = test_env
        .client
        .post(format!(
            "{}/api/orders/{}/submit",
            test_env.base_url, session_id
        ))
        .form(&[("age", "24")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["view"], "order_submitted");
    assert_eq!(body["total_price"], "2.00");
}

#[tokio::test]
async fn test_submit_soft_drink_without_age() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 1).await;

    let (status, body) = test_env
        .post(&format!("/api/orders/{}/submit", session_id), None)
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "order_submitted");
    assert_eq!(body["total_price"], "1.25");
}

#[tokio::test]
async fn test_completed_order_rejects_changes() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 1).await;
    test_env
        .post(&format!("/api/orders/{}/submit", session_id), None)
        .await;

    let (status, body) = test_env.increment(&session_id, 1).await;
    assert_eq!(status, 409);
    assert!(body["error"].is_string());

    let (status, body) = test_env
        .post(&format!("/api/orders/{}/place", session_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["view"], "place_order");
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn test_cancel_resets_order() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 2).await;
    test_env
        .get(&format!("/api/orders/{}/review", session_id))
        .await;

    let (status, body) = test_env
        .post(&format!("/api/orders/{}/cancel", session_id), None)
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["view"], "place_order");
    assert_eq!(body["stage"], "placing_order");
    assert_eq!(quantities(&body), vec![0, 0, 0]);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let test_env = TestEnvironment::new().await;
    let first = test_env.open_session().await;
    let second = test_env.open_session().await;

    test_env.increment(&first, 2).await;

    let (_, body) = test_env.get(&format!("/api/orders/{}", second)).await;
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn test_concurrent_increments_on_one_session() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    let url = format!(
        "{}/api/orders/{}/drinks/1/increment",
        test_env.base_url, session_id
    );

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let client = test_env.client.clone();
            let url = url.clone();
            tokio::spawn(async move { client.post(url).send().await.map(|r| r.status().as_u16()) })
        })
        .collect();

    for task in tasks {
        let status = task.await.unwrap().expect("Failed to send request");
        assert_eq!(status, 200);
    }

    let (_, body) = test_env.get(&format!("/api/orders/{}", session_id)).await;
    assert_eq!(body["total_count"], 20);
    assert_eq!(body["total_price"], "25.00");
}

#[tokio::test]
async fn test_unknown_session_and_capacity() {
    let test_env = TestEnvironment::with_max_sessions(1).await;

    let (status, _) = test_env
        .get(&format!("/api/orders/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, 404);

    let session_id = test_env.open_session().await;
    let (status, body) = test_env.post("/api/orders", None).await;
    assert_eq!(status, 503);
    assert!(body["error"].is_string());

    let response = test_env
        .client
        .delete(format!("{}/api/orders/{}", test_env.base_url, session_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 204);

    test_env.open_session().await;
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test_env = TestEnvironment::new().await;
    let session_id = test_env.open_session().await;
    test_env.increment(&session_id, 2).await;

    let response = test_env
        .client
        .get(format!("{}/metrics", test_env.base_url))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("order_operations_total{operation=\"increment\",status=\"success\"} 1"));
}
