//! End-to-end tests: real service, real HTTP, scripted upstreams.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use portfolio_feeds::cache::ManualClock;
use portfolio_feeds::http::X_FEED_OUTCOME;

mod common;

use common::{config_for, MockUpstream, TestService, ADMIN_KEY};

const TOKEN: &str = "/api/token";
const CURRENTLY_PLAYING: &str = "/v1/me/player/currently-playing";
const PRESENCE: &str = "/v1/users/42";
const STATS: &str = "/api/websites/site/stats";
const QUERY: &str = "/v2023-05-03/data/query/production";
const SESSIONS: &str = "/v1/checkout/sessions";
const GITHUB_USER: &str = "/users/octocat";
const GITHUB_REPOS: &str = "/users/octocat/repos";

fn outcome(res: &reqwest::Response) -> String {
    res.headers()
        .get(X_FEED_OUTCOME)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn playing(track: &str) -> Value {
    json!({
        "is_playing": true,
        "item": {
            "name": track,
            "artists": [{"name": "Boards of Canada"}],
            "external_urls": {"spotify": "https://open.spotify.com/track/9"},
            "album": {"images": [{"url": "https://i.scdn.co/cover"}]}
        }
    })
}

fn repo(name: &str, stars: u64, language: &str, fork: bool) -> Value {
    json!({
        "name": name,
        "description": null,
        "stargazers_count": stars,
        "language": language,
        "html_url": format!("https://github.com/octocat/{name}"),
        "fork": fork
    })
}

fn presence_body(status: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "discord_user": {"id": "42", "username": "kai", "global_name": "Kai", "avatar": "a1b2"},
            "discord_status": status,
            "activities": [{"name": "Visual Studio Code", "type": 0, "details": "Editing main.rs"}]
        }
    })
}

#[tokio::test]
async fn test_healthz_carries_request_id() {
    let upstream = MockUpstream::start().await;
    let service = TestService::start(config_for(&upstream)).await;

    let res = service.get("/healthz").await;
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_analytics_outage_serves_empty_fallback() {
    let upstream = MockUpstream::start().await;
    upstream.respond(STATS, 503, json!({"error": "maintenance"}));

    let mut config = config_for(&upstream);
    config.providers.analytics.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/analytics").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "degraded");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"totalPageviews": 0}));
    // One retry for a 503, then give up.
    assert_eq!(upstream.hits(STATS), 2);
}

#[tokio::test]
async fn test_retry_recovers_from_one_bad_gateway() {
    let upstream = MockUpstream::start().await;
    upstream
        .respond(STATS, 503, json!({}))
        .respond(STATS, 200, json!({"pageviews": {"value": 1234}}));

    let mut config = config_for(&upstream);
    config.providers.analytics.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/analytics").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "public, s-maxage=3600, stale-while-revalidate=1800"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"totalPageviews": 1234}));
    assert_eq!(upstream.hits(STATS), 2);
}

#[tokio::test]
async fn test_invalid_presence_without_cache_is_500() {
    let upstream = MockUpstream::start().await;
    let mut body = presence_body("online");
    body["data"].as_object_mut().unwrap().remove("discord_status");
    upstream.respond(PRESENCE, 200, body);

    let mut config = config_for(&upstream);
    config.providers.presence.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/presence").await;
    assert_eq!(res.status(), 500);
    assert_eq!(outcome(&res), "failed");
    assert!(res.headers().get("cache-control").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "upstream service returned an unexpected response"})
    );
}

#[tokio::test]
async fn test_invalid_presence_serves_stale_value() {
    let upstream = MockUpstream::start().await;
    upstream.respond(PRESENCE, 200, presence_body("dnd"));

    let mut config = config_for(&upstream);
    config.providers.presence.feed.enabled = true;
    let clock = Arc::new(ManualClock::new(1_000_000));
    let service = TestService::start_with_clock(config, clock.clone()).await;

    let res = service.get("/api/presence").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["status"], "dnd");
    assert_eq!(first["displayName"], "Kai");
    assert_eq!(first["activities"][0]["kind"], "playing");

    upstream.replace(PRESENCE, 200, json!({"success": true, "data": {}}));
    clock.advance(Duration::from_secs(16));

    let res = service.get("/api/presence").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "cached");
    let stale: Value = res.json().await.unwrap();
    assert_eq!(stale, first);
    assert_eq!(upstream.hits(PRESENCE), 2);
}

#[tokio::test]
async fn test_now_playing_is_cached_within_ttl() {
    let upstream = MockUpstream::start().await;
    upstream.respond(TOKEN, 200, json!({"access_token": "at-1", "expires_in": 3600}));
    upstream.respond(
        CURRENTLY_PLAYING,
        200,
        json!({
            "is_playing": true,
            "item": {
                "name": "Roygbiv",
                "artists": [{"name": "Boards of Canada"}],
                "external_urls": {"spotify": "https://open.spotify.com/track/9"},
                "album": {"images": [{"url": "https://i.scdn.co/cover"}]}
            }
        }),
    );

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/now-playing").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "isPlaying": true,
            "songName": "Roygbiv",
            "artistName": "Boards of Canada",
            "songURL": "https://open.spotify.com/track/9",
            "imageURL": "https://i.scdn.co/cover"
        })
    );

    let res = service.get("/api/now-playing").await;
    assert_eq!(outcome(&res), "cached");
    let again: Value = res.json().await.unwrap();
    assert_eq!(again, body);

    assert_eq!(upstream.hits(TOKEN), 1);
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 1);
}

#[tokio::test]
async fn test_now_playing_nothing_playing() {
    let upstream = MockUpstream::start().await;
    upstream.respond(TOKEN, 200, json!({"access_token": "at-1", "expires_in": 3600}));
    upstream.respond_empty(CURRENTLY_PLAYING, 204);

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/now-playing").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"isPlaying": false}));
}

#[tokio::test]
async fn test_rejected_refresh_token_masks_as_idle() {
    let upstream = MockUpstream::start().await;
    upstream.respond(TOKEN, 400, json!({"error": "invalid_grant"}));

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/now-playing").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "degraded");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"isPlaying": false}));
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 0);
}

#[tokio::test]
async fn test_disabled_feed_is_500() {
    let upstream = MockUpstream::start().await;
    let service = TestService::start(config_for(&upstream)).await;

    for path in ["/api/github", "/api/presence", "/api/content/project"] {
        let res = service.get(path).await;
        assert_eq!(res.status(), 500, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "feed is not configured"}));
    }
}

#[tokio::test]
async fn test_content_collections() {
    let upstream = MockUpstream::start().await;
    upstream.respond(QUERY, 502, json!({}));

    let mut config = config_for(&upstream);
    config.providers.content.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/content/experience").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "degraded");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));

    upstream.replace(
        QUERY,
        200,
        json!({
            "result": [{
                "_id": "p1",
                "_createdAt": "2024-01-01T00:00:00Z",
                "_updatedAt": "2024-02-01T00:00:00Z",
                "title": "Feeds",
                "technologies": ["rust"]
            }]
        }),
    );
    let res = service.get("/api/content/project").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["_id"], "p1");
    assert_eq!(body[0]["title"], "Feeds");

    let res = service.get("/api/content/recipes").await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_checkout_creates_session() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        SESSIONS,
        200,
        json!({"id": "cs_test_1", "url": "https://checkout.stripe.com/c/pay/cs_test_1"}),
    );

    let mut config = config_for(&upstream);
    config.checkout.enabled = true;
    let service = TestService::start(config).await;

    let res = service
        .client
        .post(service.url("/api/checkout"))
        .json(&json!({"priceId": "price_123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"sessionId": "cs_test_1", "url": "https://checkout.stripe.com/c/pay/cs_test_1"})
    );
    assert_eq!(upstream.hits(SESSIONS), 1);
}

#[tokio::test]
async fn test_checkout_rejects_bad_requests() {
    let upstream = MockUpstream::start().await;
    let mut config = config_for(&upstream);
    config.checkout.enabled = true;
    let service = TestService::start(config).await;

    let res = service
        .client
        .post(service.url("/api/checkout"))
        .json(&json!({"priceId": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = service
        .client
        .post(service.url("/api/checkout"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(upstream.hits(SESSIONS), 0);
}

#[tokio::test]
async fn test_checkout_failure_is_generic_500() {
    let upstream = MockUpstream::start().await;
    upstream.respond(SESSIONS, 400, json!({"error": {"message": "No such price: 'price_x'"}}));

    let mut config = config_for(&upstream);
    config.checkout.enabled = true;
    let service = TestService::start(config).await;

    let res = service
        .client
        .post(service.url("/api/checkout"))
        .json(&json!({"priceId": "price_x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "upstream service unavailable"}));
}

#[tokio::test]
async fn test_admin_requires_key() {
    let upstream = MockUpstream::start().await;
    upstream.respond(STATS, 200, json!({"pageviews": {"value": 7}}));

    let mut config = config_for(&upstream);
    config.admin.enabled = true;
    config.providers.analytics.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/admin/status").await;
    assert_eq!(res.status(), 401);

    let res = service
        .client
        .get(service.url("/admin/status"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = service
        .client
        .get(service.url("/admin/status"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["checkoutEnabled"], false);
    assert_eq!(status["feeds"][2], json!({"provider": "analytics", "enabled": true}));
    assert_eq!(status["feeds"][0], json!({"provider": "now-playing", "enabled": false}));

    service.get("/api/analytics").await;
    let res = service
        .client
        .get(service.url("/admin/cache"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cache: Value = res.json().await.unwrap();
    assert_eq!(cache[0]["provider"], "analytics");
    assert_eq!(cache[0]["ttlSecs"], 3600);
    assert_eq!(cache[0]["entries"][0]["key"], "default");
    assert_eq!(cache[0]["entries"][0]["fresh"], true);
}

#[tokio::test]
async fn test_admin_not_mounted_when_disabled() {
    let upstream = MockUpstream::start().await;
    let service = TestService::start(config_for(&upstream)).await;

    let res = service
        .client
        .get(service.url("/admin/status"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_now_playing_concurrent_requests_within_ttl() {
    let upstream = MockUpstream::start().await;
    upstream.respond(TOKEN, 200, json!({"access_token": "at-1", "expires_in": 3600}));
    upstream.respond(CURRENTLY_PLAYING, 200, playing("Dayvan Cowboy"));

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let service = TestService::start(config).await;

    let first = service.get("/api/now-playing").await;
    assert_eq!(outcome(&first), "fresh");
    let first = first.bytes().await.unwrap();

    let (a, b) = tokio::join!(service.get("/api/now-playing"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.get("/api/now-playing").await
    });
    assert_eq!(outcome(&a), "cached");
    assert_eq!(outcome(&b), "cached");
    assert_eq!(a.bytes().await.unwrap(), first);
    assert_eq!(b.bytes().await.unwrap(), first);

    assert_eq!(upstream.hits(TOKEN), 1);
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 1);
}

#[tokio::test]
async fn test_now_playing_unauthorized_forces_new_token() {
    let upstream = MockUpstream::start().await;
    upstream
        .respond(TOKEN, 200, json!({"access_token": "at-1", "expires_in": 3600}))
        .respond(TOKEN, 200, json!({"access_token": "at-2", "expires_in": 3600}));
    upstream
        .respond(CURRENTLY_PLAYING, 401, json!({"error": {"status": 401}}))
        .respond(CURRENTLY_PLAYING, 200, playing("Olson"));

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/now-playing").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "degraded");
    assert_eq!(upstream.hits(TOKEN), 1);
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 1);

    let res = service.get("/api/now-playing").await;
    assert_eq!(outcome(&res), "fresh");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["songName"], "Olson");
    assert_eq!(upstream.hits(TOKEN), 2);
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 2);
}

#[tokio::test]
async fn test_now_playing_expired_token_is_exchanged_again() {
    let upstream = MockUpstream::start().await;
    // Inside the expiry margin: unusable as soon as it is issued.
    upstream.respond(TOKEN, 200, json!({"access_token": "short", "expires_in": 60}));
    upstream.respond(CURRENTLY_PLAYING, 200, playing("Olson"));

    let mut config = config_for(&upstream);
    config.providers.now_playing.feed.enabled = true;
    let clock = Arc::new(ManualClock::new(1_000_000));
    let service = TestService::start_with_clock(config, clock.clone()).await;

    assert_eq!(outcome(&service.get("/api/now-playing").await), "fresh");
    clock.advance(Duration::from_secs(31));
    assert_eq!(outcome(&service.get("/api/now-playing").await), "fresh");

    assert_eq!(upstream.hits(TOKEN), 2);
    assert_eq!(upstream.hits(CURRENTLY_PLAYING), 2);
}

#[tokio::test]
async fn test_github_summary() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        GITHUB_USER,
        200,
        json!({"login": "octocat", "public_repos": 4, "followers": 12, "avatar_url": "https://avatars.example/u/1"}),
    );
    upstream.respond(
        GITHUB_REPOS,
        200,
        json!([
            repo("site", 5, "Rust", false),
            repo("cli", 9, "Go", false),
            repo("upstream-fork", 100, "C", true),
            repo("notes", 5, "Rust", false),
        ]),
    );

    let mut config = config_for(&upstream);
    config.providers.github.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/github").await;
    assert_eq!(res.status(), 200);
    assert_eq!(outcome(&res), "fresh");
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "public, s-maxage=3600, stale-while-revalidate=1800"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["user"],
        json!({"repoCount": 4, "followerCount": 12, "avatarUrl": "https://avatars.example/u/1"})
    );
    assert_eq!(body["stats"], json!({"totalStars": 19, "topLanguages": ["Rust", "Go"]}));
    let names: Vec<&str> = body["topRepos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|repo| repo["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["cli", "notes", "site"]);
    assert_eq!(body["topRepos"][0]["url"], "https://github.com/octocat/cli");

    assert_eq!(upstream.hits(GITHUB_USER), 1);
    assert_eq!(upstream.hits(GITHUB_REPOS), 1);
}

#[tokio::test]
async fn test_github_partial_failure_is_500() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        GITHUB_USER,
        200,
        json!({"public_repos": 4, "followers": 12, "avatar_url": "https://avatars.example/u/1"}),
    );
    upstream.respond(GITHUB_REPOS, 404, json!({"message": "Not Found"}));

    let mut config = config_for(&upstream);
    config.providers.github.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/github").await;
    assert_eq!(res.status(), 500);
    assert_eq!(outcome(&res), "failed");
    assert!(res.headers().get("cache-control").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "upstream service unavailable"}));
    // 404 is not worth a retry.
    assert_eq!(upstream.hits(GITHUB_REPOS), 1);
}

#[tokio::test]
async fn test_github_negative_count_is_rejected() {
    let upstream = MockUpstream::start().await;
    upstream.respond(
        GITHUB_USER,
        200,
        json!({"public_repos": -4, "followers": 12, "avatar_url": "https://avatars.example/u/1"}),
    );
    upstream.respond(GITHUB_REPOS, 200, json!([]));

    let mut config = config_for(&upstream);
    config.providers.github.feed.enabled = true;
    let service = TestService::start(config).await;

    let res = service.get("/api/github").await;
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "upstream service returned an unexpected response"})
    );
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let upstream = MockUpstream::start().await;
    let mut config = config_for(&upstream);
    config.checkout.enabled = true;
    config.listener.max_body_bytes = 64;
    let service = TestService::start(config).await;

    let res = service
        .client
        .post(service.url("/api/checkout"))
        .json(&json!({"priceId": "p".repeat(256)}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(upstream.hits(SESSIONS), 0);
}
